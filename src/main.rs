//! Process entrypoint: configuration, TLS probing, listener bring-up.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_gateway::cli::Cli;
use relay_gateway::net;
use relay_gateway::proxy::{self, client, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-gateway starting");

    let cli = Cli::parse();
    let config = Arc::new(cli.config());
    let policy = cli.header_policy();

    let identity = match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(error) => {
            tracing::warn!(error = %error, "failure finding hostname");
            "unknown-host".to_string()
        }
    };
    tracing::info!(hostname = %identity, "host identity");
    tracing::info!(keep_alive = config.listener.keep_alive, "inbound keep-alive");

    let tls = net::tls::resolve(&config.listener).await;

    let client = client::build(&config.target, &config.timeouts)?;
    let state = AppState::new(
        Arc::clone(&config),
        policy,
        client,
        &identity,
        tls.is_some(),
    );
    let app = proxy::router(state);

    let addr: SocketAddr = config.listener.bind_address.parse()?;

    if tls.is_some() {
        tracing::info!(listen = %addr, target = %config.target.base_url, "forwarding HTTPS");
    } else {
        tracing::info!(listen = %addr, target = %config.target.base_url, "forwarding HTTP");
    }

    net::serve(addr, tls, config.listener.keep_alive, app).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
