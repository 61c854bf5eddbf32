//! OAuth 2.0 refresh-token client
//!
//! Exchanges a refresh token for a new access/refresh pair at the configured
//! token endpoint (RFC 6749 §6) and classifies failures so callers can tell
//! a revoked grant apart from a network blip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
use crate::error::{ErrorClassification, ErrorSeverity};

/// Error type for OAuth client operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// HTTP request failed before a response arrived (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Token endpoint answered with an RFC 6749 error body
    #[error("OAuth error (HTTP {status}): {error}")]
    OAuthError { status: u16, error: OAuthError, retry_after: Option<Duration> },

    /// Token endpoint answered with a non-success status and no usable body
    #[error("Token endpoint returned HTTP {status}")]
    HttpStatus { status: u16, retry_after: Option<Duration> },

    /// Failed to parse a success response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl OAuthClientError {
    /// True when the provider refused the refresh grant itself.
    ///
    /// Retrying with the same refresh token cannot succeed. Rate limiting and
    /// server errors never count as rejection, whatever the body says.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::OAuthError { status, error, .. } => {
                !is_transient_status(*status) && (error.is_rejection() || is_auth_status(*status))
            }
            Self::HttpStatus { status, .. } => is_auth_status(*status),
            Self::NoRefreshToken => true,
            Self::RequestFailed(_) | Self::ParseError(_) | Self::ConfigError(_) => false,
        }
    }

    /// HTTP status returned by the token endpoint, if one was received
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::OAuthError { status, .. } | Self::HttpStatus { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl ErrorClassification for OAuthClientError {
    fn is_retryable(&self) -> bool {
        !self.is_rejection() && !matches!(self, Self::ConfigError(_))
    }

    fn severity(&self) -> ErrorSeverity {
        if self.is_rejection() {
            ErrorSeverity::Critical
        } else if matches!(self, Self::ConfigError(_)) {
            ErrorSeverity::Error
        } else {
            ErrorSeverity::Warning
        }
    }

    fn is_critical(&self) -> bool {
        self.is_rejection()
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::OAuthError { retry_after, .. } | Self::HttpStatus { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS.as_u16() || status >= 500
}

fn is_auth_status(status: u16) -> bool {
    status == StatusCode::BAD_REQUEST.as_u16() || status == StatusCode::UNAUTHORIZED.as_u16()
}

/// OAuth 2.0 client for the refresh-token grant
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Examples
    /// ```
    /// use jobscout_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "https://auth.example.com/oauth/token".to_string(),
    ///     "client_id".to_string(),
    ///     None,
    /// );
    /// let client = OAuthClient::new(config);
    /// assert_eq!(client.config().client_id, "client_id");
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Refresh access token using refresh token
    ///
    /// # Returns
    /// New `TokenSet` with updated access token and possibly a rotated
    /// refresh token
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - The request fails or times out
    /// - The provider rejects the grant (see [`OAuthClientError::is_rejection`])
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        if self.config.token_url.trim().is_empty() {
            return Err(OAuthClientError::ConfigError("token_url is empty".to_string()));
        }

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        if let Some(secret) = self.config.client_secret() {
            params.push(("client_secret", secret));
        }

        debug!(token_url = %self.config.token_url, "Requesting token refresh");
        let response = self.client.post(&self.config.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response.into())
    }

    async fn error_from_response(response: Response) -> OAuthClientError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<OAuthError>(&body) {
            Ok(error) => {
                warn!(status, error = %error.error, "Token endpoint returned OAuth error");
                OAuthClientError::OAuthError { status, error, retry_after }
            }
            Err(_) => {
                warn!(status, "Token endpoint returned non-success status");
                OAuthClientError::HttpStatus { status, retry_after }
            }
        }
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }
}
