//! Forwarding to backend services over HTTP/1.1.
//!
//! # Responsibilities
//! - Resolve the route for a request (prefix/host matching)
//! - Rewrite the URI onto the route's upstream base URL
//! - Strip `Host` and hop-by-hop headers, stream bodies both ways
//! - Map transport failures to `BadGateway` and deadline expiry to
//!   `ServiceUnavailable`

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Uri, Version};
use axum::response::Response;
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::pipeline::{RequestContext, RouteMetadata};
use crate::proxy::ProxyEngine;
use crate::routing::Router;

const HOP_BY_HOP: [header::HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Reference proxy engine backed by a static route table.
pub struct UpstreamProxy {
    router: Router,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl UpstreamProxy {
    pub fn new(config: &GatewayConfig) -> Self {
        let timeout = Duration::from_millis(config.upstream.timeout_ms);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            router: Router::from_config(&config.routes),
            client,
            timeout,
        }
    }
}

impl ProxyEngine for UpstreamProxy {
    fn resolve(&self, request: &Request<Body>) -> Option<Arc<RouteMetadata>> {
        self.router
            .match_request(request)
            .map(|r| Arc::clone(&r.metadata))
    }

    fn forward<'a>(
        &'a self,
        request: Request<Body>,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Response, GatewayError>> {
        Box::pin(async move {
            let route = ctx
                .route
                .as_ref()
                .and_then(|meta| self.router.get(&meta.id))
                .ok_or_else(|| GatewayError::NotFound("No matching route found".to_string()))?;

            let (mut parts, body) = request.into_parts();
            parts.uri = upstream_uri(&route.upstream, &parts.uri)?;
            parts.version = Version::HTTP_11;
            parts.headers.remove(header::HOST);
            strip_hop_by_hop(&mut parts.headers);

            tracing::debug!(
                request_id = %ctx.request_id,
                route = %route.metadata.id,
                uri = %parts.uri,
                "Forwarding request"
            );

            let upstream_request = Request::from_parts(parts, body);
            match tokio::time::timeout(self.timeout, self.client.request(upstream_request)).await {
                Ok(Ok(response)) => {
                    let (mut parts, body) = response.into_parts();
                    strip_hop_by_hop(&mut parts.headers);
                    Ok(Response::from_parts(parts, Body::new(body)))
                }
                Ok(Err(e)) => {
                    tracing::error!(request_id = %ctx.request_id, route = %route.metadata.id, error = %e, "Upstream error");
                    Err(GatewayError::BadGateway("Upstream request failed".to_string()))
                }
                Err(_) => {
                    tracing::error!(request_id = %ctx.request_id, route = %route.metadata.id, "Upstream timed out");
                    Err(GatewayError::ServiceUnavailable("Upstream request timed out".to_string()))
                }
            }
        })
    }
}

/// Join the upstream base URL with the original path and query.
pub fn upstream_uri(base: &Uri, original: &Uri) -> Result<Uri, GatewayError> {
    let base_path = base.path().trim_end_matches('/');
    let path_and_query = match original.query() {
        Some(query) => format!("{}{}?{}", base_path, original.path(), query),
        None => format!("{}{}", base_path, original.path()),
    };

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e| GatewayError::Internal(format!("upstream path: {}", e)))?,
    );
    Uri::from_parts(parts).map_err(|e| GatewayError::Internal(format!("upstream uri: {}", e)))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_uri_join() {
        let base: Uri = "http://10.0.0.5:8080".parse().unwrap();
        let uri = upstream_uri(&base, &"/api/service/items?page=2".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://10.0.0.5:8080/api/service/items?page=2");

        let base: Uri = "http://svc.local/prefix/".parse().unwrap();
        let uri = upstream_uri(&base, &"/x".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://svc.local/prefix/x");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::AUTHORIZATION, "Bearer t".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::AUTHORIZATION));
    }
}
