//! Upstream HTTP client construction.
//!
//! One client is built at startup and shared by every handler invocation;
//! its internal connection pool is the only mutable shared state in the
//! process and its thread safety is reqwest's contract.

use crate::config::{TargetConfig, TimeoutConfig};

/// Build the shared upstream client from the target configuration.
///
/// TLS is negotiated only when the target scheme is `https`. Certificate
/// verification stays on unless the operator opted into `insecure`.
pub fn build(
    target: &TargetConfig,
    timeouts: &TimeoutConfig,
) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(timeouts.connect())
        .read_timeout(timeouts.read())
        .timeout(timeouts.call());

    if !target.keep_alive {
        builder = builder.pool_max_idle_per_host(0);
    }

    if target.is_https() && target.insecure {
        tracing::warn!("upstream certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build()
}
