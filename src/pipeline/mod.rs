//! Request-processing pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → dispatcher.rs (resolve route, build RequestContext)
//!     → access_log.rs      (correlation id, entry log)
//!     → authentication.rs  (bearer token → identity, or 401/503)
//!     → body_rewrite.rs    (inject identity into JSON body)
//!     → ProxyEngine::forward
//!     ← stages' on_response in reverse (exit log, X-Request-ID)
//!
//! Any Err along the way → http::response (JSON error envelope)
//! ```
//!
//! # Design Decisions
//! - Stage order is a list built once at startup, not priority numbers
//! - A stage either continues with a (possibly new) request or answers itself
//! - Stages hold only read-only config; per-request state lives in RequestContext

pub mod access_log;
pub mod authentication;
pub mod body_rewrite;
pub mod context;
pub mod dispatcher;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::GatewayError;

pub use access_log::AccessLog;
pub use authentication::Authentication;
pub use body_rewrite::BodyRewrite;
pub use context::{RequestContext, RouteMetadata};
pub use dispatcher::Pipeline;

/// What a stage decided to do with the request.
#[derive(Debug)]
pub enum Flow {
    /// Hand this request to the next stage.
    Continue(Request<Body>),
    /// Stop here and send this response.
    Respond(Response),
}

/// One unit of the ordered middleware chain.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect or replace the request on the way in.
    fn on_request<'a>(
        &'a self,
        request: Request<Body>,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, GatewayError>>;

    /// Observe or decorate the final response on the way out.
    ///
    /// Called for every stage whose `on_request` ran, in reverse order,
    /// whether the chain succeeded, short-circuited, or failed.
    fn on_response(&self, _response: &mut Response, _ctx: &RequestContext) {}
}
