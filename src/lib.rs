//! Authenticating API gateway library.
//!
//! Every inbound request runs through an ordered pipeline (access log,
//! bearer-token authentication against a remote identity service, JSON body
//! rewrite) before a proxy engine forwards it to a backend.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod proxy;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::Pipeline;
