//! OAuth-backed `AuthorizationProvider`
//!
//! Adapts [`OAuthClientTrait`] to the core port. The only decision made here
//! is the fatal/retryable split: a rejected refresh token must stop the
//! scheduler, everything else is left to the circuit breaker.

use async_trait::async_trait;
use jobscout_common::auth::{OAuthClient, OAuthClientTrait, OAuthConfig, TokenSet};
use jobscout_core::{AuthorizationProvider, ProviderError};
use jobscout_domain::AuthConfig;
use tracing::debug;

/// Authorization provider that performs the refresh-token grant
pub struct OAuthAuthorizationProvider<C = OAuthClient> {
    client: C,
}

impl OAuthAuthorizationProvider<OAuthClient> {
    /// Build a provider for the configured token endpoint
    pub fn from_config(auth: &AuthConfig) -> Self {
        let config = OAuthConfig::new(
            auth.token_url.clone(),
            auth.client_id.clone(),
            auth.client_secret.clone(),
        )
        .with_request_timeout(auth.refresh_timeout());
        Self::new(OAuthClient::new(config))
    }
}

impl<C: OAuthClientTrait> OAuthAuthorizationProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: OAuthClientTrait> AuthorizationProvider for OAuthAuthorizationProvider<C> {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, ProviderError> {
        self.client.refresh_access_token(refresh_token).await.map_err(|err| {
            debug!(error = %err, status = ?err.status(), rejected = err.is_rejection(), "refresh grant failed");
            if err.is_rejection() {
                ProviderError::Rejected(err.to_string())
            } else {
                ProviderError::Transient(err.to_string())
            }
        })
    }
}
