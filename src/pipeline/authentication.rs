//! Bearer-token authentication stage.
//!
//! # State Machine
//! ```text
//! START ── auth disabled / public route ──▶ SKIP (continue, no RPC)
//!   │
//!   ▼
//! EXTRACT ── no "Bearer <token>" ──▶ DENY 401 (no RPC)
//!   │
//!   ▼
//! VALIDATE ── Authenticated{id} ──▶ ALLOW (ctx.identity = id)
//!          └─ Rejected{reason}  ──▶ DENY 401, or 503 when the backend is down
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Request};
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::auth::{Authenticate, AuthenticationOutcome, RejectionCause, Token};
use crate::error::GatewayError;
use crate::observability::metrics;
use crate::pipeline::{Flow, RequestContext, Stage};

pub const MISSING_AUTHORIZATION: &str = "Missing or invalid Authorization header";

pub struct Authentication {
    enabled: bool,
    authenticator: Arc<dyn Authenticate>,
}

impl Authentication {
    pub fn new(enabled: bool, authenticator: Arc<dyn Authenticate>) -> Self {
        tracing::info!(enabled, "Authentication stage initialized");
        Self {
            enabled,
            authenticator,
        }
    }
}

impl Stage for Authentication {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn on_request<'a>(
        &'a self,
        request: Request<Body>,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, GatewayError>> {
        Box::pin(async move {
            if !self.enabled {
                debug!(request_id = %ctx.request_id, "Authentication disabled, skipping");
                return Ok(Flow::Continue(request));
            }
            if ctx.is_public_route() {
                debug!(request_id = %ctx.request_id, route = ctx.route_id(), "Public route, skipping authentication");
                return Ok(Flow::Continue(request));
            }

            let header = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            let token = match Token::from_bearer_header(header) {
                Some(t) => t,
                None => {
                    debug!(request_id = %ctx.request_id, "Missing or invalid Authorization header");
                    metrics::record_auth_outcome("missing");
                    return Err(GatewayError::Unauthorized(MISSING_AUTHORIZATION.to_string()));
                }
            };

            let outcome = self.authenticator.authenticate(Some(&token)).await;
            metrics::record_auth_outcome(outcome.label());

            match outcome {
                AuthenticationOutcome::Authenticated { identity_id } => {
                    debug!(request_id = %ctx.request_id, identity_id = %identity_id, "Authentication successful");
                    ctx.identity = Some(identity_id);
                    Ok(Flow::Continue(request))
                }
                AuthenticationOutcome::Rejected { reason, cause } => {
                    debug!(request_id = %ctx.request_id, reason = %reason, cause = ?cause, "Authentication failed");
                    match cause {
                        RejectionCause::ServiceUnavailable => Err(GatewayError::ServiceUnavailable(reason)),
                        RejectionCause::InvalidCredentials | RejectionCause::ServiceError => {
                            Err(GatewayError::Unauthorized(reason))
                        }
                    }
                }
            }
        })
    }
}
