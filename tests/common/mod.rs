//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use auth_gateway::config::{GatewayConfig, RouteConfig};
use auth_gateway::{HttpServer, Shutdown};

pub const VALID_TOKEN: &str = "good-token";
pub const OPERATOR_ID: i64 = 42;

type Behaviour = dyn Fn(&str) -> (u16, Value) + Send + Sync;

/// Programmable identity service. Counts every validation call it receives.
pub struct MockAuth {
    behaviour: Box<Behaviour>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockAuth {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start an identity service answering with `behaviour(token)`.
pub async fn start_mock_auth<F>(delay: Duration, behaviour: F) -> (SocketAddr, Arc<MockAuth>)
where
    F: Fn(&str) -> (u16, Value) + Send + Sync + 'static,
{
    let state = Arc::new(MockAuth {
        behaviour: Box::new(behaviour),
        delay,
        calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/auth/validate", post(validate))
        .with_state(state.clone());

    (serve(app).await, state)
}

/// Identity service that accepts `VALID_TOKEN` as `OPERATOR_ID` and rejects
/// anything else with `success: false`.
pub async fn start_standard_auth() -> (SocketAddr, Arc<MockAuth>) {
    start_mock_auth(Duration::ZERO, |token| {
        if token == VALID_TOKEN {
            (200, json!({"success": true, "operatorId": OPERATOR_ID, "message": null}))
        } else {
            (200, json!({"success": false, "operatorId": null, "message": "Token expired"}))
        }
    })
    .await
}

async fn validate(State(state): State<Arc<MockAuth>>, Json(request): Json<Value>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    let token = request["token"].as_str().unwrap_or_default();
    let (status, body) = (state.behaviour)(token);
    (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
}

/// Backend that echoes the request body it received, and reports what it
/// saw in `x-echo-*` response headers.
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new()
        .route("/{*path}", any(echo))
        .route("/", any(echo));
    serve(app).await
}

async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.clone().into_response();
    let seen = response.headers_mut();
    seen.insert("x-echo-body-length", body.len().into());
    for name in ["content-length", "x-request-id", "authorization", "transfer-encoding"] {
        if let Some(value) = headers.get(name) {
            seen.insert(format!("x-echo-{}", name).parse::<axum::http::HeaderName>().unwrap(), value.clone());
        }
    }
    response
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Gateway config with a public login route and a protected service route,
/// both pointing at `backend`.
pub fn gateway_config(auth: SocketAddr, backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.service_url = format!("http://{}", auth);
    config.auth.connect_timeout_ms = 500;
    config.auth.response_timeout_ms = 500;
    config.body_rewrite.max_body_size = 1024;
    config.routes = vec![
        RouteConfig {
            name: "login".into(),
            host: None,
            path_prefix: Some("/api/auth/login".into()),
            upstream: format!("http://{}", backend),
            public: true,
            priority: 10,
        },
        RouteConfig {
            name: "service".into(),
            host: None,
            path_prefix: Some("/api".into()),
            upstream: format!("http://{}", backend),
            public: false,
            priority: 0,
        },
    ];
    config
}

/// Run a gateway on an ephemeral port. Keep the returned `Shutdown` alive
/// for the duration of the test.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
