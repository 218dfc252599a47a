//! Error responses.
//!
//! # Responsibilities
//! - Map a `GatewayError` to its status code and stable error code
//! - Render the JSON error envelope `{code, message, path, timestamp}`
//! - Fall back to a fixed JSON literal if the envelope cannot be serialized
//!
//! # Design Decisions
//! - Internal error details are logged by the caller, never rendered
//! - Backend-produced error bodies never pass through here

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::GatewayError;

/// Body sent when the envelope itself cannot be serialized.
pub const FALLBACK_ERROR_BODY: &str = r#"{"code":"INTERNAL_ERROR","message":"Error processing response"}"#;

/// Wire shape of every error the gateway itself produces.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub path: String,
    /// ISO-8601, UTC.
    pub timestamp: String,
}

impl ErrorEnvelope {
    pub fn new(err: &GatewayError, path: &str) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.public_message().to_string(),
            path: path.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Build the response for `err` raised while serving `path`.
pub fn error_response(err: &GatewayError, path: &str) -> Response {
    let body = encode_envelope(&ErrorEnvelope::new(err, path));

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = err.status();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Serialize an envelope, or fall back to `FALLBACK_ERROR_BODY`.
fn encode_envelope<T: Serialize>(envelope: &T) -> Vec<u8> {
    match serde_json::to_vec(envelope) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error envelope");
            FALLBACK_ERROR_BODY.as_bytes().to_vec()
        }
    }
}
