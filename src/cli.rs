//! Command-line surface.
//!
//! The CLI is the only configuration input; everything it produces is
//! immutable for the process lifetime.

use clap::Parser;

use crate::config::{GatewayConfig, ListenerConfig, TargetConfig, TimeoutConfig};
use crate::headers::HeaderPolicy;

/// Minimal forwarding gateway: relays every request to one fixed upstream.
#[derive(Debug, Parser)]
#[command(name = "relay-gateway", version)]
pub struct Cli {
    /// TLS key file
    #[arg(long, default_value = "key.pem")]
    pub key: String,

    /// TLS cert file
    #[arg(long, default_value = "cert.pem")]
    pub cert: String,

    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Target base URL
    #[arg(long, default_value = "http://localhost")]
    pub target: String,

    /// Disable keep-alive on both the listener and the upstream client
    #[arg(long)]
    pub disable_keepalive: bool,

    /// Serve plaintext even if TLS key material is present
    #[arg(long)]
    pub disable_tls: bool,

    /// Accept any certificate presented by an https target
    #[arg(long)]
    pub insecure_upstream: bool,

    /// Header name allowed to cross to the upstream request (repeatable;
    /// defaults to authorization, content-type, accept, expect)
    #[arg(long = "forward-header", value_name = "NAME")]
    pub forward_headers: Vec<String>,
}

impl Cli {
    /// Assemble the immutable gateway configuration.
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            listener: ListenerConfig {
                bind_address: self.listen.clone(),
                cert_path: self.cert.clone(),
                key_path: self.key.clone(),
                disable_tls: self.disable_tls,
                keep_alive: !self.disable_keepalive,
            },
            target: TargetConfig {
                base_url: self.target.clone(),
                keep_alive: !self.disable_keepalive,
                insecure: self.insecure_upstream,
            },
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Header policy from the repeatable flag, or the default allow-set.
    pub fn header_policy(&self) -> HeaderPolicy {
        if self.forward_headers.is_empty() {
            HeaderPolicy::default()
        } else {
            HeaderPolicy::new(&self.forward_headers)
        }
    }
}
