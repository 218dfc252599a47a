//! Identity-service client against a live mock service.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;

use auth_gateway::auth::client::{INVALID_TOKEN, SERVICE_ERROR, SERVICE_UNAVAILABLE, VALIDATION_FAILED};
use auth_gateway::auth::{AuthClient, AuthenticationOutcome, RejectionCause, Token};
use auth_gateway::config::AuthConfig;

use common::*;

fn client_for(addr: SocketAddr) -> AuthClient {
    let config = AuthConfig {
        service_url: format!("http://{}", addr),
        connect_timeout_ms: 500,
        response_timeout_ms: 300,
        ..AuthConfig::default()
    };
    AuthClient::new(&config).unwrap()
}

fn token(raw: &str) -> Token {
    Token::new(raw).unwrap()
}

#[tokio::test]
async fn test_valid_token() {
    let (addr, auth) = start_standard_auth().await;

    let outcome = client_for(addr).validate(Some(&token(VALID_TOKEN))).await;

    assert_eq!(outcome, AuthenticationOutcome::authenticated(OPERATOR_ID));
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_missing_token_makes_no_call() {
    let (addr, auth) = start_standard_auth().await;

    let outcome = client_for(addr).validate(None).await;

    assert!(!outcome.is_authenticated());
    assert_eq!(auth.calls(), 0);
}

#[tokio::test]
async fn test_success_false_uses_service_message() {
    let (addr, _auth) = start_standard_auth().await;

    let outcome = client_for(addr).validate(Some(&token("other"))).await;

    assert_eq!(outcome, AuthenticationOutcome::invalid("Token expired"));
}

#[tokio::test]
async fn test_success_without_message_uses_default() {
    let (addr, _auth) = start_mock_auth(Duration::ZERO, |_| (200, json!({"success": false}))).await;

    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(outcome, AuthenticationOutcome::invalid(VALIDATION_FAILED));
}

#[tokio::test]
async fn test_client_error_status() {
    let (addr, _auth) = start_mock_auth(Duration::ZERO, |_| (403, json!({"error": "nope"}))).await;

    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(outcome, AuthenticationOutcome::invalid(INVALID_TOKEN));
}

#[tokio::test]
async fn test_server_error_status() {
    let (addr, _auth) = start_mock_auth(Duration::ZERO, |_| (500, json!({}))).await;

    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(
        outcome,
        AuthenticationOutcome::rejected(SERVICE_UNAVAILABLE, RejectionCause::ServiceUnavailable)
    );
}

#[tokio::test]
async fn test_response_timeout() {
    let (addr, _auth) = start_mock_auth(Duration::from_secs(2), |_| {
        (200, json!({"success": true, "operatorId": 1}))
    })
    .await;

    let started = std::time::Instant::now();
    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(
        outcome,
        AuthenticationOutcome::rejected(SERVICE_UNAVAILABLE, RejectionCause::ServiceUnavailable)
    );
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connect_timeout_independent_of_response_timeout() {
    // Blackholed address: SYNs get no answer, so only the connect timeout can end the call.
    // Hosts without a route fail fast instead, which maps to the same outcome.
    let config = AuthConfig {
        service_url: "http://10.255.255.1:81".into(),
        connect_timeout_ms: 200,
        response_timeout_ms: 30_000,
        ..AuthConfig::default()
    };
    let client = AuthClient::new(&config).unwrap();

    let started = std::time::Instant::now();
    let outcome = client.validate(Some(&token("t"))).await;

    assert_eq!(
        outcome,
        AuthenticationOutcome::rejected(SERVICE_UNAVAILABLE, RejectionCause::ServiceUnavailable)
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_connection_refused() {
    let addr = closed_port().await;

    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(
        outcome,
        AuthenticationOutcome::rejected(SERVICE_UNAVAILABLE, RejectionCause::ServiceUnavailable)
    );
}

#[tokio::test]
async fn test_unparseable_body() {
    let (addr, _auth) = start_mock_auth(Duration::ZERO, |_| (200, json!("not an object"))).await;

    let outcome = client_for(addr).validate(Some(&token("t"))).await;

    assert_eq!(
        outcome,
        AuthenticationOutcome::rejected(SERVICE_ERROR, RejectionCause::ServiceError)
    );
}
