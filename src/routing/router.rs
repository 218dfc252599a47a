//! Route lookup.
//!
//! # Responsibilities
//! - Compile `RouteConfig`s into matchers once at startup
//! - Look up the matching route for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Higher priority checked first; ties keep config order
//! - O(n) scan (acceptable for typical route counts)

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Uri};

use crate::config::RouteConfig;
use crate::pipeline::RouteMetadata;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A route ready for matching and forwarding.
#[derive(Debug)]
pub struct CompiledRoute {
    pub metadata: Arc<RouteMetadata>,
    /// Parsed upstream base URL.
    pub upstream: Uri,
    priority: u32,
    matcher: AndMatcher,
}

/// Immutable route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Build from configuration. Routes with an unparseable upstream are
    /// skipped with an error log; validation normally catches them first.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes: Vec<CompiledRoute> = configs
            .iter()
            .filter_map(|config| {
                let upstream: Uri = match config.upstream.parse() {
                    Ok(uri) => uri,
                    Err(e) => {
                        tracing::error!(route = %config.name, upstream = %config.upstream, error = %e, "Invalid upstream, route skipped");
                        return None;
                    }
                };

                let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
                if let Some(host) = &config.host {
                    matchers.push(Box::new(HostMatcher::new(host.clone())));
                }
                if let Some(prefix) = &config.path_prefix {
                    matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
                }

                Some(CompiledRoute {
                    metadata: Arc::new(RouteMetadata {
                        id: config.name.clone(),
                        public: config.public,
                        service: config.upstream.clone(),
                    }),
                    upstream,
                    priority: config.priority,
                    matcher: AndMatcher::new(matchers),
                })
            })
            .collect();

        // Stable sort keeps config order among equal priorities.
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        for route in &routes {
            tracing::info!(
                route = %route.metadata.id,
                upstream = %route.upstream,
                public = route.metadata.public,
                priority = route.priority,
                "Route registered"
            );
        }

        Self { routes }
    }

    /// First matching route, if any.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.matcher.matches(req))
    }

    /// Route by id.
    pub fn get(&self, id: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.metadata.id == id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
