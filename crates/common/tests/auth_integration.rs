//! Integration tests for auth module
//!
//! Drives `OAuthClient` against a mock token endpoint to check the
//! refresh-grant request shape and failure classification.

#![cfg(feature = "platform")]

use std::time::Duration;

use jobscout_common::auth::{OAuthClient, OAuthClientError, OAuthConfig};
use jobscout_common::ErrorClassification;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, secret: Option<&str>) -> OAuthClient {
    let config = OAuthConfig::new(
        format!("{}/oauth/token", server.uri()),
        "scout-client".to_string(),
        secret.map(str::to_string),
    )
    .with_request_timeout(Duration::from_secs(2));
    OAuthClient::new(config)
}

/// Validates a successful refresh-token exchange.
///
/// # Test Steps
/// 1. Mount a token endpoint expecting the refresh grant form fields
/// 2. Refresh with a known refresh token
/// 3. Verify the rotated token pair and lifetime are returned
#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_success_returns_rotated_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-old"))
        .and(body_string_contains("client_id=scout-client"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-new",
            "refresh_token": "rt-new",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("s3cret"));
    let tokens = client.refresh_access_token("rt-old").await.expect("refresh should succeed");

    assert_eq!(tokens.access_token, "at-new");
    assert_eq!(tokens.refresh_token.as_deref(), Some("rt-new"));
    assert_eq!(tokens.expires_in, 3600);
}

/// Validates that a revoked refresh token is classified as a rejection.
///
/// # Test Steps
/// 1. Token endpoint answers 400 with `invalid_grant`
/// 2. Verify the error is a non-retryable rejection carrying the OAuth body
#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_grant_is_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Refresh token has been revoked"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.refresh_access_token("rt-revoked").await.unwrap_err();

    assert!(err.is_rejection(), "expected rejection, got {err:?}");
    assert!(!err.is_retryable());
    assert_eq!(err.status(), Some(400));
    match err {
        OAuthClientError::OAuthError { error, .. } => assert_eq!(error.error, "invalid_grant"),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

/// Validates that throttling is transient and surfaces `Retry-After`.
#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limited_refresh_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.refresh_access_token("rt").await.unwrap_err();

    assert!(!err.is_rejection());
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));
}

/// Validates that a server error with an HTML body is transient.
#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.refresh_access_token("rt").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::HttpStatus { status: 502, .. }));
    assert!(err.is_retryable());
}

/// Validates that a malformed success body is reported as a parse error.
#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_success_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.refresh_access_token("rt").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::ParseError(_)));
    assert!(!err.is_rejection());
}

/// Validates that an unreachable endpoint yields a retryable request error.
#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_endpoint_is_transient() {
    let config = OAuthConfig::new(
        "http://127.0.0.1:1/oauth/token".to_string(),
        "scout-client".to_string(),
        None,
    )
    .with_request_timeout(Duration::from_secs(2));
    let client = OAuthClient::new(config);

    let err = client.refresh_access_token("rt").await.unwrap_err();

    assert!(matches!(err, OAuthClientError::RequestFailed(_)));
    assert!(err.is_retryable());
}
