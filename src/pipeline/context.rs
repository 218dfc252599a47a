//! Per-request scratch space shared by the pipeline stages.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};

use crate::auth::IdentityId;

/// Read-only route metadata supplied by the proxy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetadata {
    /// Route identifier used in logs and metrics.
    pub id: String,
    /// Public routes bypass authentication and body rewriting.
    pub public: bool,
    /// Backend service the route forwards to.
    pub service: String,
}

/// State owned by exactly one in-flight request.
///
/// Created by the dispatcher, threaded through every stage by `&mut`, and
/// dropped when the request completes or is cancelled.
#[derive(Debug)]
pub struct RequestContext {
    /// Correlation id. Assigned by the Access-Log stage.
    pub request_id: String,
    pub method: Method,
    pub path: String,
    /// Transport-level peer address, when the server exposes it.
    pub peer_addr: Option<SocketAddr>,
    pub route: Option<Arc<RouteMetadata>>,
    /// Set by the Authentication stage on success.
    pub identity: Option<IdentityId>,
    started: Instant,
}

impl RequestContext {
    pub fn new(request: &Request<Body>, route: Option<Arc<RouteMetadata>>) -> Self {
        let peer_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            request_id: String::new(),
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            peer_addr,
            route,
            identity: None,
            started: Instant::now(),
        }
    }

    /// True only when a route matched and it is flagged public.
    pub fn is_public_route(&self) -> bool {
        self.route.as_ref().is_some_and(|r| r.public)
    }

    pub fn route_id(&self) -> &str {
        self.route.as_ref().map(|r| r.id.as_str()).unwrap_or("unknown")
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_route_is_not_public() {
        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let ctx = RequestContext::new(&req, None);
        assert!(!ctx.is_public_route());
        assert_eq!(ctx.route_id(), "unknown");
        assert!(ctx.peer_addr.is_none());
    }

    #[test]
    fn test_peer_address_from_connect_info() {
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        let mut req = Request::builder().uri("/x?y=1").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let route = Arc::new(RouteMetadata {
            id: "login".into(),
            public: true,
            service: "http://auth".into(),
        });
        let ctx = RequestContext::new(&req, Some(route));

        assert_eq!(ctx.peer_addr, Some(addr));
        assert_eq!(ctx.path, "/x");
        assert!(ctx.is_public_route());
        assert_eq!(ctx.route_id(), "login");
    }
}
