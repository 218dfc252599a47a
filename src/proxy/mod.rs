//! Proxy engine boundary.
//!
//! The pipeline only needs two things from whatever actually talks to
//! backends: route metadata for a request, and a way to forward it.
//! `upstream.rs` is the engine the binary ships with.

pub mod upstream;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::GatewayError;
use crate::pipeline::{RequestContext, RouteMetadata};

pub use upstream::UpstreamProxy;

/// Route selection and backend dispatch.
pub trait ProxyEngine: Send + Sync {
    /// Metadata of the route this request would be forwarded on.
    fn resolve(&self, request: &Request<Body>) -> Option<Arc<RouteMetadata>>;

    /// Forward the request. Called at most once per request, after every
    /// stage has continued.
    fn forward<'a>(
        &'a self,
        request: Request<Body>,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Response, GatewayError>>;
}
