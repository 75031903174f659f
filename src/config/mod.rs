//! Configuration for the gateway.
//!
//! # Design Decisions
//! - Built once at startup from the CLI surface, immutable thereafter
//! - Shared read-only (via `Arc`) with every handler invocation
//! - All fields have defaults so partial configuration works

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS material, keep-alive).
    pub listener: ListenerConfig,

    /// Fixed upstream target.
    pub target: TargetConfig,

    /// Timeouts for the outbound call and the inbound request.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path to the TLS certificate file (PEM).
    pub cert_path: String,

    /// Path to the TLS private key file (PEM).
    pub key_path: String,

    /// Skip the TLS file probe and serve plaintext.
    pub disable_tls: bool,

    /// HTTP/1.1 keep-alive on inbound connections.
    pub keep_alive: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
            disable_tls: false,
            keep_alive: true,
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the fixed upstream (scheme + host, e.g. "http://localhost").
    pub base_url: String,

    /// Reuse upstream connections across requests.
    pub keep_alive: bool,

    /// Accept any certificate presented by an https target.
    /// Off by default; enabling this is an explicit operator decision.
    pub insecure: bool,
}

impl TargetConfig {
    /// Whether the outbound hop uses TLS, derived from the scheme.
    pub fn is_https(&self) -> bool {
        self.base_url
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            keep_alive: true,
            insecure: false,
        }
    }
}

/// Timeout configuration.
///
/// The connect, read and call timeouts bound the outbound hop; the request
/// timeout bounds the whole inbound cycle. The read timeout doubles as the
/// response-header wait.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream inter-read timeout in seconds.
    pub read_secs: u64,

    /// Overall upstream call timeout in seconds.
    pub call_secs: u64,

    /// Overall inbound request timeout in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn call(&self) -> Duration {
        Duration::from_secs(self.call_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 10,
            call_secs: 15,
            request_secs: 30,
        }
    }
}
