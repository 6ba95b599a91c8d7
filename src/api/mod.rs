//! HTTP surface for FlashVerify.
//!
//! Serves the upload page and the JSON verification API. The router is
//! composable: `verification_router()` returns a `Router` that any axum
//! server can mount.

pub mod endpoints;
pub mod error;
pub mod page;
pub mod router;
pub mod server;
pub mod types;

pub use router::verification_router;
pub use server::{start_server, ServerSession, VerificationServer};
pub use types::ApiContext;
