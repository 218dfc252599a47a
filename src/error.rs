//! Gateway-level error taxonomy.
//!
//! Every failure the pipeline (or the proxy engine behind it) can raise is
//! one of these variants. The Error Responder in [`crate::http::response`]
//! turns them into a status code plus a JSON error envelope.

use axum::http::StatusCode;
use thiserror::Error;

/// Message rendered to clients for unclassified failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Typed failure raised by a pipeline stage or the proxy engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing/invalid credentials or rejected by the auth backend.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed. No stage raises this yet.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No route matches the request.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body larger than the rewrite buffer allows.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Malformed or failed response from a backend.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Auth backend or upstream unreachable / timed out.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Anything else. The detail is logged, never rendered.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status for this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized(_) => "UNAUTHORIZED",
            GatewayError::Forbidden(_) => "FORBIDDEN",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            GatewayError::BadGateway(_) => "BAD_GATEWAY",
            GatewayError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> &str {
        match self {
            GatewayError::Unauthorized(m)
            | GatewayError::Forbidden(m)
            | GatewayError::NotFound(m)
            | GatewayError::PayloadTooLarge(m)
            | GatewayError::BadGateway(m)
            | GatewayError::ServiceUnavailable(m) => m,
            GatewayError::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}
