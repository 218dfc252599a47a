//! Pipeline dispatch.
//!
//! Owns the ordered stage list and the proxy engine. For each request:
//! resolve route → run stages in order → forward (only if every stage
//! continued) → render any error → run `on_response` in reverse for the
//! stages that were entered.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::FutureExt;

use crate::auth::Authenticate;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::response::error_response;
use crate::pipeline::{AccessLog, Authentication, BodyRewrite, Flow, RequestContext, Stage};
use crate::proxy::ProxyEngine;

/// The request pipeline. Built once at startup and shared by `Arc`.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    engine: Arc<dyn ProxyEngine>,
}

impl Pipeline {
    /// Standard chain: Access-Log → Authentication → Body-Rewrite.
    pub fn new(
        config: &GatewayConfig,
        authenticator: Arc<dyn Authenticate>,
        engine: Arc<dyn ProxyEngine>,
    ) -> Self {
        Self::with_stages(
            vec![
                Box::new(AccessLog),
                Box::new(Authentication::new(config.auth.enabled, authenticator)),
                Box::new(BodyRewrite::new(&config.body_rewrite)),
            ],
            engine,
        )
    }

    /// Custom chain, run in the given order.
    pub fn with_stages(stages: Vec<Box<dyn Stage>>, engine: Arc<dyn ProxyEngine>) -> Self {
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        tracing::debug!(stages = ?names, "Pipeline assembled");
        Self { stages, engine }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Process one request to completion. Always yields exactly one response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let route = self.engine.resolve(&request);
        let mut ctx = RequestContext::new(&request, route);
        let mut entered = 0;

        let result = AssertUnwindSafe(self.run_chain(request, &mut ctx, &mut entered))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(GatewayError::Internal("pipeline stage panicked".to_string())));

        let mut response = match result {
            Ok(response) => response,
            Err(err) => {
                log_error(&err, &ctx);
                error_response(&err, &ctx.path)
            }
        };

        for stage in self.stages[..entered].iter().rev() {
            stage.on_response(&mut response, &ctx);
        }

        response
    }

    async fn run_chain(
        &self,
        mut request: Request<Body>,
        ctx: &mut RequestContext,
        entered: &mut usize,
    ) -> Result<Response, GatewayError> {
        for stage in &self.stages {
            *entered += 1;
            match stage.on_request(request, ctx).await? {
                Flow::Continue(next) => request = next,
                Flow::Respond(response) => {
                    tracing::debug!(request_id = %ctx.request_id, stage = stage.name(), "Stage short-circuited");
                    return Ok(response);
                }
            }
        }

        self.engine.forward(request, ctx).await
    }
}

fn log_error(err: &GatewayError, ctx: &RequestContext) {
    if err.status().is_server_error() {
        tracing::error!(request_id = %ctx.request_id, path = %ctx.path, error = %err, "Request failed");
    } else {
        tracing::warn!(request_id = %ctx.request_id, path = %ctx.path, error = %err, "Request rejected");
    }
}
