//! OAuth credential lifecycle

pub mod error;
pub mod ports;
pub mod service;

pub use error::AuthError;
pub use ports::{AuthorizationProvider, CredentialStore, ProviderError};
pub use service::{TokenLifecycleManager, TokenSource};
