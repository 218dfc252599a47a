//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → identity.rs (Token extraction)
//!     → client.rs (POST to identity service)
//!     → AuthenticationOutcome { Authenticated | Rejected }
//!     → pipeline::authentication (continue or short-circuit)
//! ```

pub mod client;
pub mod identity;

use futures_util::future::BoxFuture;

pub use client::AuthClient;
pub use identity::{AuthenticationOutcome, IdentityId, RejectionCause, Token};

/// Anything that can turn a token into an authentication outcome.
///
/// Implementations must not fail: transport problems resolve to `Rejected`.
pub trait Authenticate: Send + Sync {
    fn authenticate<'a>(&'a self, token: Option<&'a Token>) -> BoxFuture<'a, AuthenticationOutcome>;
}
