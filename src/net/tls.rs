//! TLS material probing and loading for the listener.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::ListenerConfig;

/// Resolve the listener's TLS configuration.
///
/// Missing key or cert material degrades to plaintext with a warning
/// rather than failing startup. An explicit disable skips the file probe
/// entirely.
pub async fn resolve(config: &ListenerConfig) -> Option<RustlsConfig> {
    if config.disable_tls {
        tracing::info!("disabling TLS from command-line switch");
        return None;
    }

    let mut available = true;
    if !Path::new(&config.key_path).exists() {
        tracing::warn!(path = %config.key_path, "TLS key file not found, disabling TLS");
        available = false;
    }
    if !Path::new(&config.cert_path).exists() {
        tracing::warn!(path = %config.cert_path, "TLS cert file not found, disabling TLS");
        available = false;
    }
    if !available {
        return None;
    }

    match RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await {
        Ok(tls) => Some(tls),
        Err(error) => {
            tracing::warn!(error = %error, "failed to load TLS material, disabling TLS");
            None
        }
    }
}
