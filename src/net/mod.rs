//! Network edge: listener bring-up and TLS material.
//!
//! # Responsibilities
//! - Serve the router over plaintext or TLS from one code path
//! - Honor the inbound keep-alive switch
//! - Drain connections on shutdown signal

pub mod tls;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

/// Serve the router, terminating TLS when material is available.
///
/// Bind or accept failures surface as the returned error; per-request
/// failures never reach this level.
pub async fn serve(
    addr: SocketAddr,
    tls: Option<RustlsConfig>,
    keep_alive: bool,
    app: Router,
) -> std::io::Result<()> {
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    match tls {
        Some(tls) => {
            let mut server = axum_server::bind_rustls(addr, tls);
            server.http_builder().http1().keep_alive(keep_alive);
            server.handle(handle).serve(service).await
        }
        None => {
            let mut server = axum_server::bind(addr);
            server.http_builder().http1().keep_alive(keep_alive);
            server.handle(handle).serve(service).await
        }
    }
}

/// Wait for Ctrl+C, then drain in-flight connections.
async fn shutdown_signal(handle: Handle) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
    handle.graceful_shutdown(Some(Duration::from_secs(30)));
}
