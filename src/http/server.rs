//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up tracing middleware
//! - Hand every request to the shared `Pipeline`
//! - Serve until the shutdown broadcast fires, then drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::auth::AuthClient;
use crate::config::GatewayConfig;
use crate::pipeline::Pipeline;
use crate::proxy::UpstreamProxy;

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Build the server with the identity-service client and the upstream
    /// proxy engine described by `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let authenticator = Arc::new(AuthClient::new(&config.auth)?);
        let engine = Arc::new(UpstreamProxy::new(&config));
        let pipeline = Arc::new(Pipeline::new(&config, authenticator, engine));
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Build the server around an already-assembled pipeline.
    pub fn with_pipeline(config: GatewayConfig, pipeline: Arc<Pipeline>) -> Self {
        let router = Self::build_router(pipeline);
        Self { router, config }
    }

    fn build_router(pipeline: Arc<Pipeline>) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(pipeline)
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            auth_enabled = self.config.auth.enabled,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch(State(pipeline): State<Arc<Pipeline>>, request: Request<Body>) -> Response {
    pipeline.handle(request).await
}
