//! OAuth credential document

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Persisted OAuth credential pair for one marketplace identity.
///
/// The refresh token is retained across failed refresh attempts; only a
/// successful refresh replaces it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CredentialRecord {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            updated_at,
        }
    }

    /// True when the access token stays valid for strictly longer than `skew`.
    ///
    /// A horizon past the end of the calendar is never satisfied.
    pub fn is_valid_for(&self, now: Timestamp, skew: Duration) -> bool {
        now.checked_add_signed(skew).is_some_and(|horizon| self.expires_at > horizon)
    }

    /// Remaining lifetime of the access token (negative when expired).
    pub fn remaining(&self, now: Timestamp) -> Duration {
        self.expires_at - now
    }

    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone())
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Bearer token handed to the fetch pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn validity_requires_lifetime_strictly_beyond_skew() {
        let record = CredentialRecord::new("a", "r", at(300), at(0));
        let skew = Duration::seconds(300);

        assert!(!record.is_valid_for(at(0), skew));
        assert!(record.is_valid_for(at(-1), skew));
    }

    #[test]
    fn expiring_in_two_minutes_is_invalid_with_five_minute_skew() {
        let record = CredentialRecord::new("a", "r", at(120), at(0));
        assert!(!record.is_valid_for(at(0), Duration::minutes(5)));
        assert_eq!(record.remaining(at(0)), Duration::minutes(2));
    }

    #[test]
    fn oversized_skew_is_invalid_instead_of_overflowing() {
        let record = CredentialRecord::new("a", "r", at(3600), at(0));
        assert!(!record.is_valid_for(at(0), Duration::MAX));
        assert!(!record.is_valid_for(Timestamp::MAX_UTC, Duration::seconds(1)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let record = CredentialRecord::new("secret-access", "secret-refresh", at(60), at(0));
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("[REDACTED]"));

        let token = record.access_token();
        assert_eq!(token.as_str(), "secret-access");
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
    }
}
