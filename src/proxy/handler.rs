//! The forwarding handler: one request cycle per inbound call.
//!
//! # Responsibilities
//! - Detect forwarding loops via the hop marker before dialing out
//! - Build the outbound request (verbatim method/path/query, filtered headers)
//! - Stream the inbound body out and the upstream body back, unbuffered
//! - Convert every per-request failure into an HTTP response
//!
//! No state is mutated across invocations; everything reachable from
//! [`AppState`] is read-only or internally synchronized (the client pool).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::{HOST, VIA};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use thiserror::Error;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::GatewayConfig;
use crate::headers::{self, HeaderPolicy};
use crate::proxy::body::{metered, relayed};

/// Read-only state shared by every handler invocation.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub policy: Arc<HeaderPolicy>,
    pub client: reqwest::Client,
    /// Hop-marker value identifying this instance ("1.1 <host>").
    marker: Arc<str>,
    /// The same marker, pre-validated as a header value.
    marker_header: HeaderValue,
    /// Whether the inbound listener terminates TLS (log field only).
    tls_inbound: bool,
}

impl AppState {
    /// Assemble the per-process state from configuration and host identity.
    ///
    /// An identity that does not form a valid header value falls back to a
    /// fixed placeholder rather than failing startup.
    pub fn new(
        config: Arc<GatewayConfig>,
        policy: HeaderPolicy,
        client: reqwest::Client,
        identity: &str,
        tls_inbound: bool,
    ) -> Self {
        let marker = headers::marker_value(identity);
        let (marker, marker_header) = match HeaderValue::from_str(&marker) {
            Ok(value) => (marker, value),
            Err(_) => {
                tracing::warn!(identity, "host identity not usable in a header, using fallback");
                (
                    headers::marker_value("unknown-host"),
                    HeaderValue::from_static("1.1 unknown-host"),
                )
            }
        };

        Self {
            config,
            policy: Arc::new(policy),
            client,
            marker: marker.into(),
            marker_header,
            tls_inbound,
        }
    }

    /// This instance's hop-marker value.
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

/// Build the gateway router: a single catch-all forwarding route behind the
/// trace and timeout layers.
pub fn router(state: AppState) -> Router {
    let request_timeout = state.config.timeouts.request();
    Router::new()
        .route("/{*path}", any(forward))
        .route("/", any(forward))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Per-request failures, each mapped to a client-visible response.
///
/// Nothing here propagates past the handler; the listener never sees a
/// request-cycle error.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound request already carries this instance's hop marker.
    #[error("loop detected from via header")]
    LoopDetected,

    /// The outbound URL could not be assembled.
    #[error("outbound request error: {0}")]
    BuildRequest(#[from] url::ParseError),

    /// The outbound call failed in transport (connect, TLS, timeout, reset).
    #[error("upstream call error: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            RelayError::LoopDetected => StatusCode::LOOP_DETECTED,
            RelayError::BuildRequest(_) | RelayError::Upstream(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Forward one inbound request to the fixed upstream and relay the result.
async fn forward(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let target = state.config.target.base_url.clone();

    tracing::info!(
        tls = state.tls_inbound,
        method = %method,
        host = %host,
        path = %path,
        query = %query,
        peer = %peer,
        target = %target,
        "request begin"
    );

    let response = match relay(&state, request).await {
        Ok(response) => response,
        Err(error) => {
            match &error {
                RelayError::LoopDetected => {
                    tracing::info!(marker = %state.marker, "request loop found")
                }
                RelayError::BuildRequest(cause) => {
                    tracing::warn!(error = %cause, "outbound request error")
                }
                RelayError::Upstream(cause) => {
                    tracing::warn!(error = %cause, "upstream call error")
                }
            }
            error.into_response()
        }
    };

    tracing::info!(
        tls = state.tls_inbound,
        method = %method,
        host = %host,
        path = %path,
        query = %query,
        peer = %peer,
        target = %target,
        status = %response.status(),
        "request end"
    );

    response
}

/// The forwarding cycle proper: loop check, outbound build, dispatch, relay.
async fn relay(state: &AppState, request: Request<Body>) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();

    log_headers("inbound", &parts.headers);

    if headers::contains_marker(&parts.headers, &VIA, &state.marker) {
        return Err(RelayError::LoopDetected);
    }

    let url = outbound_url(
        &state.config.target.base_url,
        parts.uri.path(),
        parts.uri.query(),
    );
    let url = Url::parse(&url)?;

    tracing::debug!(
        tls = state.config.target.is_https(),
        method = %parts.method,
        url = %url,
        "dialing upstream"
    );

    let mut out_headers = HeaderMap::new();
    state.policy.copy_allowed(&mut out_headers, &parts.headers);
    out_headers.append(VIA, state.marker_header.clone());

    log_headers("outbound", &out_headers);

    let (stream, meter) = metered(body);

    let result = state
        .client
        .request(parts.method, url)
        .headers(out_headers)
        .body(reqwest::Body::wrap_stream(stream))
        .send()
        .await;

    tracing::debug!(
        bytes = meter.bytes(),
        error = ?meter.error(),
        "inbound body transferred"
    );

    let upstream = result?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();

    log_headers("upstream", &upstream_headers);
    tracing::debug!(status = %status, "upstream status");

    let mut response = Response::new(Body::from_stream(relayed(upstream.bytes_stream())));
    *response.status_mut() = status;
    headers::copy_all(response.headers_mut(), &upstream_headers);

    Ok(response)
}

/// Concatenate base URL, verbatim path and raw query.
///
/// The `?` is appended only when a non-empty query is present.
fn outbound_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{base}{path}");
    if let Some(query) = query.filter(|query| !query.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn log_headers(label: &'static str, headers: &HeaderMap) {
    for (name, value) in headers {
        tracing::debug!(label, header = %name, value = ?value, "header");
    }
}
