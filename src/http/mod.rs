//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → pipeline::Pipeline (stages + proxy engine)
//!     → response.rs (JSON error envelope on failure)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::{error_response, ErrorEnvelope};
pub use server::HttpServer;
