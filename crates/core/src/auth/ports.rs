//! Port interfaces for credential lifecycle
//!
//! These traits define the boundaries between the token lifecycle manager
//! and infrastructure implementations.

use async_trait::async_trait;
use jobscout_common::auth::TokenSet;
use jobscout_domain::{CredentialRecord, Result};
use thiserror::Error;

/// Trait for persisting the OAuth credential document
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential stored under `id`
    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>>;

    /// Unconditionally store a credential (out-of-band seeding)
    async fn put(&self, id: &str, record: &CredentialRecord) -> Result<()>;

    /// Replace all fields of the credential in one write, provided the stored
    /// refresh token still equals `expected_refresh_token`.
    ///
    /// Returns `false` without writing when the stored record changed.
    async fn replace_if_unchanged(
        &self,
        id: &str,
        expected_refresh_token: &str,
        record: &CredentialRecord,
    ) -> Result<bool>;
}

/// Refresh failure reported by the authorization provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The refresh token or client was refused; retrying cannot succeed
    #[error("authorization provider rejected the refresh: {0}")]
    Rejected(String),

    /// Network failure, throttling or server error
    #[error("authorization provider unavailable: {0}")]
    Transient(String),
}

/// Trait for exchanging a refresh token at the authorization server
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Exchange `refresh_token` for a new token set
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<TokenSet, ProviderError>;
}
