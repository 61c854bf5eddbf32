//! Token lifecycle manager
//!
//! Keeps one OAuth credential usable:
//! - fast path hands out the stored access token while it outlives the skew
//! - otherwise refreshes under a per-credential lock (single-flight)
//! - persists the new pair in one conditional write
//! - never discards the stored refresh token on failure

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobscout_common::resilience::Clock;
use jobscout_domain::constants::MAX_REFRESH_SKEW_SECS;
use jobscout_domain::{AccessToken, CredentialRecord};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::error::AuthError;
use super::ports::{AuthorizationProvider, CredentialStore, ProviderError};

/// Anything that can hand out a currently valid access token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn valid_token(&self) -> Result<AccessToken, AuthError>;
}

/// Owns one credential identity and its refresh policy
pub struct TokenLifecycleManager {
    credential_id: String,
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn AuthorizationProvider>,
    clock: Arc<dyn Clock>,
    refresh_skew: chrono::Duration,
    refresh_timeout: Duration,
    refresh_lock: Mutex<()>,
}

impl TokenLifecycleManager {
    /// Create a new manager
    ///
    /// # Arguments
    /// * `credential_id` - Document id of the credential in `store`
    /// * `refresh_skew` - Tokens expiring within this margin are refreshed
    ///   before being handed out; capped at one day
    /// * `refresh_timeout` - Deadline for one provider round-trip
    pub fn new(
        credential_id: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        provider: Arc<dyn AuthorizationProvider>,
        clock: Arc<dyn Clock>,
        refresh_skew: Duration,
        refresh_timeout: Duration,
    ) -> Self {
        let refresh_skew = refresh_skew.min(Duration::from_secs(MAX_REFRESH_SKEW_SECS));
        Self {
            credential_id: credential_id.into(),
            store,
            provider,
            clock,
            refresh_skew: chrono::Duration::from_std(refresh_skew)
                .unwrap_or_else(|_| chrono::Duration::days(1)),
            refresh_timeout,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn credential_id(&self) -> &str {
        &self.credential_id
    }

    /// Return an access token valid for strictly longer than the refresh
    /// skew, refreshing first when needed.
    ///
    /// # Errors
    /// - `AuthError::MissingCredential` if nothing is stored
    /// - `AuthError::RefreshRejected` if the provider refuses the refresh
    ///   token (not retried)
    /// - `AuthError::Transient` / `AuthError::Timeout` for retryable failures
    #[instrument(skip(self), fields(credential_id = %self.credential_id))]
    pub async fn get_valid_token(&self) -> Result<AccessToken, AuthError> {
        let record = self.load_required().await?;
        if record.is_valid_for(self.clock.now(), self.refresh_skew) {
            return Ok(record.access_token());
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        let record = self.load_required().await?;
        if record.is_valid_for(self.clock.now(), self.refresh_skew) {
            debug!("Token already refreshed by a concurrent caller");
            return Ok(record.access_token());
        }

        let refreshed = self.refresh_locked(record).await?;
        Ok(refreshed.access_token())
    }

    /// Force a refresh regardless of the current token's remaining lifetime
    ///
    /// # Errors
    /// Same as [`Self::get_valid_token`].
    #[instrument(skip(self), fields(credential_id = %self.credential_id))]
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        let record = self.load_required().await?;
        self.refresh_locked(record).await.map(|_| ())
    }

    async fn load_required(&self) -> Result<CredentialRecord, AuthError> {
        self.store
            .load(&self.credential_id)
            .await?
            .ok_or_else(|| AuthError::MissingCredential(self.credential_id.clone()))
    }

    /// Exchange the stored refresh token and persist the result.
    ///
    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self, current: CredentialRecord) -> Result<CredentialRecord, AuthError> {
        if current.refresh_token.is_empty() {
            return Err(AuthError::MissingCredential(self.credential_id.clone()));
        }

        debug!(
            remaining_secs = current.remaining(self.clock.now()).num_seconds(),
            "Refreshing access token"
        );

        let tokens = match tokio::time::timeout(
            self.refresh_timeout,
            self.provider.refresh(&current.refresh_token),
        )
        .await
        {
            Err(_) => {
                warn!(timeout = ?self.refresh_timeout, "Token refresh timed out");
                return Err(AuthError::Timeout(self.refresh_timeout));
            }
            Ok(Err(ProviderError::Rejected(reason))) => {
                error!(reason = %reason, "Refresh token rejected; re-authorization required");
                return Err(AuthError::RefreshRejected(reason));
            }
            Ok(Err(ProviderError::Transient(reason))) => {
                warn!(reason = %reason, "Token refresh failed");
                return Err(AuthError::Transient(reason));
            }
            Ok(Ok(tokens)) => tokens,
        };

        let now = self.clock.now();
        let Some(expires_at) = tokens.expires_at(now) else {
            warn!(expires_in = tokens.expires_in, "Token lifetime not representable");
            return Err(AuthError::Transient(format!(
                "provider returned an unusable token lifetime ({}s)",
                tokens.expires_in
            )));
        };
        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| current.refresh_token.clone());
        let updated = CredentialRecord::new(
            tokens.access_token.clone(),
            refresh_token,
            expires_at,
            now,
        );

        let swapped = self
            .store
            .replace_if_unchanged(&self.credential_id, &current.refresh_token, &updated)
            .await?;

        let stored = if swapped {
            info!(expires_at = %updated.expires_at, "Access token refreshed");
            updated
        } else {
            // A different process refreshed between our read and our write;
            // its record is authoritative.
            warn!("Credential changed during refresh; adopting stored record");
            let stored = self.load_required().await?;
            if !stored.is_valid_for(now, self.refresh_skew) {
                return Err(AuthError::Transient(
                    "credential changed concurrently during refresh".to_string(),
                ));
            }
            stored
        };

        if !stored.is_valid_for(now, self.refresh_skew) {
            warn!(expires_in = tokens.expires_in, "Refreshed token expires within refresh skew");
            return Err(AuthError::InsufficientLifetime {
                lifetime_secs: stored.remaining(now).num_seconds(),
                skew_secs: self.refresh_skew.num_seconds(),
            });
        }

        Ok(stored)
    }
}

#[async_trait]
impl TokenSource for TokenLifecycleManager {
    async fn valid_token(&self) -> Result<AccessToken, AuthError> {
        self.get_valid_token().await
    }
}
