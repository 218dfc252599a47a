//! Identity injection into JSON request bodies.
//!
//! # Responsibilities
//! - Decide whether a request is eligible (non-public route, configured
//!   method, JSON content type, authenticated identity present)
//! - Buffer the body up to `max_body_size`
//! - Set the identity field on a top-level JSON object, leaving every other
//!   field and its position untouched
//! - Forward the new body with an exact `Content-Length`
//!
//! Ineligible requests keep their original, unbuffered body stream.
//! Malformed JSON and non-object JSON are forwarded byte-for-byte.

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use futures_util::future::BoxFuture;
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::IdentityId;
use crate::config::BodyRewriteConfig;
use crate::error::GatewayError;
use crate::pipeline::{Flow, RequestContext, Stage};

pub struct BodyRewrite {
    max_body_size: usize,
    methods: Vec<Method>,
    identity_field: String,
}

impl BodyRewrite {
    pub fn new(config: &BodyRewriteConfig) -> Self {
        let methods = config
            .methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();

        Self {
            max_body_size: config.max_body_size,
            methods,
            identity_field: config.identity_field.clone(),
        }
    }

    fn applies_to(&self, request: &Request<Body>, ctx: &RequestContext) -> bool {
        !ctx.is_public_route()
            && self.methods.contains(request.method())
            && is_json_content_type(request.headers())
    }
}

impl Stage for BodyRewrite {
    fn name(&self) -> &'static str {
        "body_rewrite"
    }

    fn on_request<'a>(
        &'a self,
        request: Request<Body>,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, GatewayError>> {
        Box::pin(async move {
            if !self.applies_to(&request, ctx) {
                return Ok(Flow::Continue(request));
            }
            let identity = match ctx.identity {
                Some(id) => id,
                None => {
                    debug!(request_id = %ctx.request_id, "No authenticated identity, skipping injection");
                    return Ok(Flow::Continue(request));
                }
            };

            if let Some(declared) = declared_content_length(request.headers()) {
                if declared > self.max_body_size as u64 {
                    return Err(too_large(self.max_body_size));
                }
            }

            let (mut parts, body) = request.into_parts();
            let original = axum::body::to_bytes(body, self.max_body_size)
                .await
                .map_err(|e| classify_body_error(e, self.max_body_size))?;

            let forwarded = match inject_identity(&original, &self.identity_field, identity) {
                Ok(rewritten) => {
                    debug!(request_id = %ctx.request_id, identity_id = %identity, "Injected identity into request body");
                    Bytes::from(rewritten)
                }
                Err(skip) => {
                    warn!(request_id = %ctx.request_id, reason = %skip, "Request body not rewritten, forwarding original");
                    original
                }
            };

            parts.headers.remove(TRANSFER_ENCODING);
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(forwarded.len()));

            Ok(Flow::Continue(Request::from_parts(parts, Body::from(forwarded))))
        })
    }
}

/// Why a body was left as-is.
#[derive(Debug)]
pub enum SkipReason {
    Malformed(serde_json::Error),
    NotAnObject,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "malformed JSON: {}", e),
            SkipReason::NotAnObject => write!(f, "top-level JSON value is not an object"),
        }
    }
}

/// Set `field` to `value` if `target` is an object. Existing keys keep their
/// position; new keys are appended.
pub fn set_if_object(target: &mut Value, field: &str, value: Value) -> bool {
    match target.as_object_mut() {
        Some(object) => {
            object.insert(field.to_string(), value);
            true
        }
        None => false,
    }
}

/// Parse `body`, set the identity field, and re-serialize.
///
/// An empty body is treated as `{}`.
pub fn inject_identity(body: &[u8], field: &str, identity: IdentityId) -> Result<Vec<u8>, SkipReason> {
    let mut root = if body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(SkipReason::Malformed)?
    };

    if !set_if_object(&mut root, field, Value::from(identity.get())) {
        return Err(SkipReason::NotAnObject);
    }

    serde_json::to_vec(&root).map_err(SkipReason::Malformed)
}

/// `application/json` or any `application/*+json`, parameters ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("application", "json")) => true,
        Some(("application", subtype)) => subtype.ends_with("+json"),
        _ => false,
    }
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn too_large(limit: usize) -> GatewayError {
    GatewayError::PayloadTooLarge(format!("Request body exceeds {} bytes", limit))
}

fn classify_body_error(err: axum::Error, limit: usize) -> GatewayError {
    let inner = err.into_inner();
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(inner.as_ref());
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return too_large(limit);
        }
        source = e.source();
    }
    GatewayError::Internal(format!("failed to read request body: {}", inner))
}
