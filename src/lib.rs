//! Minimal forwarding HTTP/HTTPS gateway.
//!
//! Accepts requests on a single listening socket and relays each one to a
//! fixed upstream target, streaming bodies in both directions. TLS is
//! terminated at the listener when certificate material is present, and
//! forwarding loops are cut short via a `Via` hop marker.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌───────────────────────────────────────────────┐
//!                │                 RELAY GATEWAY                 │
//!                │                                               │
//!   Client ─────▶│ net (listener, TLS) ──▶ proxy::handler ──────│──▶ Upstream
//!                │                             │                 │
//!                │        headers (allow-set, hop marker)        │
//!                │                             │                 │
//!   Client ◀─────│──────── response relay ◀── proxy::client ◀───│─── Upstream
//!                │                                               │
//!                │    config (immutable, built once from CLI)    │
//!                └───────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod headers;
pub mod net;
pub mod proxy;

pub use config::GatewayConfig;
pub use headers::HeaderPolicy;
pub use proxy::AppState;
