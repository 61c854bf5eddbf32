//! OAuth 2.0 types and structures
//!
//! Data structures for the refresh-token grant: the token set handed back by
//! the authorization server, the RFC 6749 error body, and client
//! configuration.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest access token lifetime honored from a token response (one year)
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// OAuth 2.0 access and refresh tokens with metadata
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API authentication
    pub access_token: String,

    /// Rotated refresh token, when the provider issues one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer" for OAuth 2.0)
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        Self { access_token, refresh_token, token_type: "Bearer".to_string(), expires_in, scope }
    }

    /// Absolute expiry for a token issued at `issued_at`
    ///
    /// Negative lifetimes are treated as already expired and lifetimes are
    /// capped at [`MAX_TOKEN_LIFETIME_SECS`]. Returns `None` only when the
    /// result falls outside the representable calendar.
    #[must_use]
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = self.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let lifetime = chrono::TimeDelta::try_seconds(secs)?;
        issued_at.checked_add_signed(lifetime)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            scope: response.scope,
        }
    }
}

/// Client configuration for the refresh-token grant
#[derive(Clone)]
pub struct OAuthConfig {
    /// Token endpoint (e.g. `https://auth.example.com/oauth/token`)
    pub token_url: String,

    /// OAuth client ID
    pub client_id: String,

    /// Client secret for confidential clients
    pub client_secret: Option<String>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(token_url: String, client_id: String, client_secret: Option<String>) -> Self {
        Self { token_url, client_id, client_secret, request_timeout: Duration::from_secs(30) }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl OAuthError {
    /// Error codes meaning the grant itself is unusable
    const REJECTION_CODES: [&'static str; 4] =
        ["invalid_grant", "invalid_client", "unauthorized_client", "unsupported_grant_type"];

    /// True when the provider refused the grant or client outright
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        Self::REJECTION_CODES.contains(&self.error.as_str())
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
