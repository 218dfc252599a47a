//! Routing subsystem used by the reference proxy engine.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched route (metadata + upstream) or no match
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile matchers
//!     → Sort by priority
//!     → Freeze as immutable Router
//! ```

pub mod matcher;
pub mod router;

pub use router::{CompiledRoute, Router};
