//! HTTP server setup and the per-connection request state machine.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (request ID, tracing, timeout, CORS origin)
//! - Serve over TLS (production) or plaintext (tests)
//! - Drive each request: preflight / diagnostic shortcuts, body
//!   accumulation, routing, forwarding, relay
//!
//! ```text
//! NEW --OPTIONS--> CORS_REPLY
//! NEW --diagnostic path--> STATIC_REPLY
//! NEW --else--> ACCUMULATING --(more bytes)--> ACCUMULATING
//! ACCUMULATING --(done)--> COMPLETE
//! COMPLETE --(route miss)--> NOT_FOUND
//! COMPLETE --(route hit)--> FORWARD --> RELAY
//! FORWARD --(timeout/error)--> ERROR_REPLY
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::forwarder::Forwarder;
use crate::http::request::{request_id, MakeRequestUuidV4, OutboundRequest};
use crate::net::connection::{CompletedContext, ConnectionContext, ConnectionTracker};
use crate::observability::metrics;
use crate::routing::{PathRouter, RoutingTable};
use crate::security::headers::preflight_headers;

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub router: Arc<PathRouter>,
    pub forwarder: Forwarder,
    pub tracker: ConnectionTracker,
}

/// The gateway's HTTP front door.
pub struct HttpServer {
    router: Router,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server for `config`, routing through `table`.
    pub fn new(config: GatewayConfig, table: RoutingTable) -> Self {
        let config = Arc::new(config);
        let router = Arc::new(PathRouter::new(
            Arc::new(table),
            config.limits.max_service_segment_len,
        ));
        let tracker = ConnectionTracker::new();

        let state = AppState {
            config: Arc::clone(&config),
            router,
            forwarder: Forwarder::new(config.upstream.max_response_bytes),
            tracker: tracker.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, tracker }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let allow_origin = HeaderValue::from_str(&config.cors.allow_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("*"));

        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                allow_origin,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Serve plaintext HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting (plaintext)");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Draining connections");
            signal_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        tracing::info!(address = %addr, "HTTPS server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Live connection-context accounting.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }
}

/// Main gateway handler.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    // Requests that never allocate a context.
    if method == Method::OPTIONS {
        tracing::debug!(request_id = %request_id, path = %request.uri().path(), "Preflight");
        metrics::record_request(method.as_str(), 200, "preflight", start);
        return (StatusCode::OK, preflight_headers(&state.config.cors)).into_response();
    }
    if method == Method::GET && request.uri().path() == state.config.diagnostics.path {
        metrics::record_request(method.as_str(), 200, "diagnostics", start);
        return Html(state.config.diagnostics.page.clone()).into_response();
    }

    let ctx = ConnectionContext::open(&state.tracker, state.config.limits.max_body_bytes);
    let connection_id = ctx.id();
    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        connection_id = %connection_id,
        peer = ?peer,
        method = %method,
        path = %parts.uri.path(),
        "Request accepted"
    );

    let completed = match accumulate(ctx, body).await {
        Ok(completed) => completed,
        Err(e) => return reject(&request_id, &method, "none", e, start),
    };

    let route = match state.router.resolve(&parts.uri) {
        Ok(route) => route,
        Err(e) => return reject(&request_id, &method, "none", e, start),
    };

    let outbound = match OutboundRequest::build(
        &method,
        &parts.headers,
        &route,
        &state.config.upstream.host,
        completed.body(),
        Duration::from_secs(state.config.upstream.timeout_secs),
    ) {
        Ok(outbound) => outbound,
        Err(e) => return reject(&request_id, &method, &route.service, e, start),
    };

    match state.forwarder.forward(&route.service, outbound).await {
        Ok(capture) => {
            tracing::info!(
                request_id = %request_id,
                connection_id = %completed.id(),
                service = %route.service,
                status = capture.status.as_u16(),
                body_len = capture.body.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request relayed"
            );
            metrics::record_request(method.as_str(), capture.status.as_u16(), &route.service, start);
            capture.into_response()
        }
        Err(e) => {
            metrics::record_upstream_failure(&route.service, e.kind());
            reject(&request_id, &method, &route.service, e, start)
        }
    }
}

/// Drain the request body into the context, one chunk at a time.
async fn accumulate(mut ctx: ConnectionContext, body: Body) -> Result<CompletedContext, GatewayError> {
    let mut chunks = body.into_data_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| GatewayError::ClientBody(e.to_string()))?;
        ctx.accept_chunk(&chunk)?;
    }
    Ok(ctx.finish())
}

/// Log, count and render a per-request failure.
fn reject(
    request_id: &str,
    method: &Method,
    service: &str,
    error: GatewayError,
    start: Instant,
) -> Response {
    let status = error.status();
    if status.is_server_error() {
        tracing::error!(request_id = %request_id, service = %service, error = %error, "Request failed");
    } else {
        tracing::warn!(request_id = %request_id, service = %service, error = %error, "Request rejected");
    }
    metrics::record_request(method.as_str(), status.as_u16(), service, start);
    error.into_response()
}
