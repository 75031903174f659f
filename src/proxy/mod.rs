//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → handler.rs (loop check, outbound build, dispatch, relay)
//!     → client.rs (shared upstream client: timeouts, TLS policy)
//!     → body.rs (byte accounting on the pass-through stream)
//! ```

pub mod body;
pub mod client;
pub mod handler;

pub use handler::{router, AppState};
