//! Remote token validation against the identity service.
//!
//! # Wire Contract
//! ```text
//! POST <service_url><validate_endpoint>
//!     {"token": "<raw token>"}
//! ← 2xx {"success": bool, "operatorId": int|null, "message": string|null}
//! ```
//!
//! # Outcome Mapping
//! - 2xx, success=true, operatorId present → Authenticated
//! - 2xx otherwise → Rejected(message or "Token validation failed")
//! - 4xx → Rejected("Invalid token")
//! - 5xx, connect failure, timeout → Rejected("Auth service unavailable")
//! - anything else → Rejected("Authentication service error")

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::auth::identity::{AuthenticationOutcome, RejectionCause, Token};
use crate::auth::Authenticate;
use crate::config::AuthConfig;

pub const MISSING_TOKEN: &str = "missing or invalid token";
pub const VALIDATION_FAILED: &str = "Token validation failed";
pub const INVALID_TOKEN: &str = "Invalid token";
pub const SERVICE_UNAVAILABLE: &str = "Auth service unavailable";
pub const SERVICE_ERROR: &str = "Authentication service error";

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    #[serde(default)]
    success: bool,
    operator_id: Option<i64>,
    message: Option<String>,
}

/// HTTP client for the identity service.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    validate_url: String,
    response_timeout: Duration,
}

impl AuthClient {
    /// Build a client with the configured connect and response timeouts.
    pub fn new(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .no_proxy()
            .build()?;

        let validate_url = format!(
            "{}{}",
            config.service_url.trim_end_matches('/'),
            config.validate_endpoint
        );

        tracing::info!(
            validate_url = %validate_url,
            connect_timeout_ms = config.connect_timeout_ms,
            response_timeout_ms = config.response_timeout_ms,
            "Auth client initialized"
        );

        Ok(Self {
            http,
            validate_url,
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        })
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }

    /// Validate a token. Never fails: every error becomes a `Rejected` outcome.
    pub async fn validate(&self, token: Option<&Token>) -> AuthenticationOutcome {
        let token = match token {
            Some(t) => t,
            None => return AuthenticationOutcome::invalid(MISSING_TOKEN),
        };

        tracing::debug!(url = %self.validate_url, "Validating token with auth service");

        let response = match self
            .http
            .post(&self.validate_url)
            .timeout(self.response_timeout)
            .json(&ValidateRequest {
                token: token.as_str(),
            })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return map_transport_error(&e),
        };

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = %status, "Auth service rejected token");
            return AuthenticationOutcome::invalid(INVALID_TOKEN);
        }
        if status.is_server_error() {
            tracing::warn!(status = %status, "Auth service returned server error");
            return unavailable();
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Unexpected status from auth service");
            return service_error();
        }

        match response.json::<ValidateResponse>().await {
            Ok(body) => to_outcome(body),
            Err(e) => map_transport_error(&e),
        }
    }
}

impl Authenticate for AuthClient {
    fn authenticate<'a>(&'a self, token: Option<&'a Token>) -> BoxFuture<'a, AuthenticationOutcome> {
        Box::pin(self.validate(token))
    }
}

fn to_outcome(body: ValidateResponse) -> AuthenticationOutcome {
    match (body.success, body.operator_id) {
        (true, Some(id)) => {
            tracing::debug!(identity_id = id, "Token validated");
            AuthenticationOutcome::authenticated(id)
        }
        _ => {
            let reason = body.message.unwrap_or_else(|| VALIDATION_FAILED.to_string());
            tracing::debug!(reason = %reason, "Token validation failed");
            AuthenticationOutcome::invalid(reason)
        }
    }
}

fn map_transport_error(e: &reqwest::Error) -> AuthenticationOutcome {
    if e.is_timeout() || e.is_connect() {
        tracing::warn!(error = %e, "Auth service unreachable");
        unavailable()
    } else {
        tracing::error!(error = %e, "Error calling auth service");
        service_error()
    }
}

fn unavailable() -> AuthenticationOutcome {
    AuthenticationOutcome::rejected(SERVICE_UNAVAILABLE, RejectionCause::ServiceUnavailable)
}

fn service_error() -> AuthenticationOutcome {
    AuthenticationOutcome::rejected(SERVICE_ERROR, RejectionCause::ServiceError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AuthenticationOutcome {
        to_outcome(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_success_body() {
        assert_eq!(
            parse(r#"{"success":true,"operatorId":7,"message":null}"#),
            AuthenticationOutcome::authenticated(7)
        );
    }

    #[test]
    fn test_success_without_identity() {
        assert_eq!(
            parse(r#"{"success":true}"#),
            AuthenticationOutcome::invalid(VALIDATION_FAILED)
        );
    }

    #[test]
    fn test_failure_carries_message() {
        assert_eq!(
            parse(r#"{"success":false,"operatorId":null,"message":"Token expired"}"#),
            AuthenticationOutcome::invalid("Token expired")
        );
    }

    #[test]
    fn test_validate_url_joins_cleanly() {
        let config = AuthConfig {
            service_url: "http://auth.internal:9000/".into(),
            ..AuthConfig::default()
        };
        let client = AuthClient::new(&config).unwrap();
        assert_eq!(client.validate_url(), "http://auth.internal:9000/auth/validate");
    }

    #[tokio::test]
    async fn test_missing_token_skips_network() {
        // Unroutable on purpose: a network call would surface as "unavailable".
        let config = AuthConfig {
            service_url: "http://192.0.2.1:1".into(),
            ..AuthConfig::default()
        };
        let client = AuthClient::new(&config).unwrap();

        assert_eq!(
            client.validate(None).await,
            AuthenticationOutcome::invalid(MISSING_TOKEN)
        );
    }
}
