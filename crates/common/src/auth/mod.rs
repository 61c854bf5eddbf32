//! OAuth 2.0 refresh infrastructure
//!
//! The initial authorization happens out of band. What runs unattended is
//! the refresh-token grant, so this module only covers that:
//!
//! ```text
//! ┌──────────────────┐
//! │ OAuthClientTrait │  seam for tests and alternative providers
//! └────────┬─────────┘
//!          │
//!          └──► OAuthClient   (reqwest, RFC 6749 §6 refresh grant)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Core OAuth types (`TokenSet`, `OAuthConfig`, `OAuthError`)
//! - **[`client`]**: HTTP client and failure classification
//! - **[`traits`]**: `OAuthClientTrait`

pub mod client;
pub mod traits;
pub mod types;

pub use client::{OAuthClient, OAuthClientError};
pub use traits::OAuthClientTrait;
pub use types::{
    OAuthConfig, OAuthError, TokenResponse, TokenSet, MAX_TOKEN_LIFETIME_SECS,
};
