//! Shared utilities for the forwarding integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;

use relay_gateway::config::GatewayConfig;
use relay_gateway::headers::HeaderPolicy;
use relay_gateway::proxy::{self, client, AppState};

/// Headers observed by the capture backend, one entry per request.
pub type Captured = Arc<Mutex<Vec<HeaderMap>>>;

/// Serve an app on an ephemeral port, returning the bound address.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Spawn a gateway forwarding to `target`, with a fixed identity so tests
/// can predict the hop marker.
pub async fn spawn_gateway(target: &str, policy: HeaderPolicy, identity: &str) -> SocketAddr {
    let config = GatewayConfig {
        target: relay_gateway::config::TargetConfig {
            base_url: target.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let config = Arc::new(config);
    let client = client::build(&config.target, &config.timeouts).unwrap();
    let state = AppState::new(config, policy, client, identity, false);
    spawn_app(proxy::router(state)).await
}

/// Backend echoing method, path, query and body back to the caller.
///
/// The query is reported as the literal string "none" when absent, so tests
/// can tell a missing query from an empty one.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(request: Request<Body>) -> Response<Body> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let query = request.uri().query().unwrap_or("none").to_string();
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap();

        Response::builder()
            .header("x-echo-method", method.as_str())
            .header("x-echo-path", path)
            .header("x-echo-query", query)
            .body(Body::from(body))
            .unwrap()
    }

    let app = Router::new()
        .route("/{*path}", any(echo))
        .route("/", any(echo));
    spawn_app(app).await
}

/// Backend answering every request with a fixed status and empty body.
pub async fn start_status_backend(status: StatusCode) -> SocketAddr {
    let app = Router::new()
        .route("/{*path}", any(move || async move { status }))
        .route("/", any(move || async move { status }));
    spawn_app(app).await
}

/// Backend recording the headers of every request it receives.
pub async fn start_capture_backend() -> (SocketAddr, Captured) {
    async fn capture(State(captured): State<Captured>, request: Request<Body>) -> StatusCode {
        captured.lock().unwrap().push(request.headers().clone());
        StatusCode::OK
    }

    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/{*path}", any(capture))
        .route("/", any(capture))
        .with_state(Arc::clone(&captured));
    (spawn_app(app).await, captured)
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
