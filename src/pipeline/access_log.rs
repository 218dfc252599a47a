//! Access logging and request correlation.
//!
//! # Responsibilities
//! - Reuse the client's `X-Request-ID` or generate a UUID v4
//! - Propagate the id to the forwarded request and the response
//! - Log one entry line and one exit line per request
//!
//! Exit lines are graded by status: info below 400, warn for 4xx, error for 5xx.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::pipeline::{Flow, RequestContext, Stage};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// First stage of the chain. Never short-circuits.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

impl Stage for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn on_request<'a>(
        &'a self,
        mut request: Request<Body>,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, GatewayError>> {
        Box::pin(async move {
            let (request_id, header) = match incoming_request_id(request.headers()) {
                Some((id, value)) => (id, value),
                None => {
                    let id = Uuid::new_v4().to_string();
                    let value = HeaderValue::from_str(&id)
                        .map_err(|e| GatewayError::Internal(format!("request id header: {}", e)))?;
                    (id, value)
                }
            };
            request.headers_mut().insert(X_REQUEST_ID, header);
            ctx.request_id = request_id;

            let client = client_address(request.headers(), ctx.peer_addr);
            info!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                client = %client,
                "-->"
            );

            Ok(Flow::Continue(request))
        })
    }

    fn on_response(&self, response: &mut Response, ctx: &RequestContext) {
        if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }

        let status = response.status().as_u16();
        let elapsed = ctx.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let route = ctx.route_id();

        if status >= 500 {
            error!(request_id = %ctx.request_id, method = %ctx.method, path = %ctx.path, status, elapsed_ms, route, "<--");
        } else if status >= 400 {
            warn!(request_id = %ctx.request_id, method = %ctx.method, path = %ctx.path, status, elapsed_ms, route, "<--");
        } else {
            info!(request_id = %ctx.request_id, method = %ctx.method, path = %ctx.path, status, elapsed_ms, route, "<--");
        }

        metrics::record_request(ctx.method.as_str(), status, route, elapsed);
    }
}

/// Client-supplied correlation id, if present and non-empty.
fn incoming_request_id(headers: &HeaderMap) -> Option<(String, HeaderValue)> {
    let value = headers.get(X_REQUEST_ID)?;
    let id = value.to_str().ok()?.trim();
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), value.clone()))
}

/// Resolve the client address.
///
/// Precedence: first `X-Forwarded-For` entry, `X-Real-IP`, transport peer,
/// then `"unknown"`.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header(X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real_ip) = header(X_REAL_IP) {
        return real_ip.to_string();
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}
