//! External service integrations
//!
//! - [`oauth`]: authorization provider backed by the OAuth refresh client
//! - [`marketplace`]: HTTP fetch pipeline against the listings endpoint

pub mod marketplace;
pub mod oauth;

pub use marketplace::HttpFetchPipeline;
pub use oauth::OAuthAuthorizationProvider;
