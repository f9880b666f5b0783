//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router (/health, /, catch-all proxy, admin dashboard)
//! - Wire up the HTTP trace layer and the inbound body-size cap
//! - Drive the per-request pipeline: stats start → target/credential
//!   resolution → body rewrite → header construction → forward
//! - Graceful shutdown via the lifecycle coordinator

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Path, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::ProxyConfig;
use crate::http::headers::prepare_forward_headers;
use crate::proxy::body::{rewrite_system_prompt, should_rewrite};
use crate::proxy::credentials;
use crate::proxy::forward::{forward, ProxiedRequest};
use crate::proxy::target::UpstreamTarget;
use crate::stats::StatsTracker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    /// The process-wide pooled upstream client.
    pub client: reqwest::Client,
    pub stats: Arc<StatsTracker>,
}

/// HTTP server for the transparent proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server around the shared client and stats tracker.
    pub fn new(config: ProxyConfig, client: reqwest::Client, stats: Arc<StatsTracker>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            client,
            stats,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/health", get(health))
            .route("/", any(root_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state.clone());

        if config.dashboard.enabled {
            router = router.merge(admin::setup_admin_router(state));
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Liveness probe; independent of upstream reachability.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "anthropic-transparent-proxy"
    }))
}

/// Root path: browsers get redirected to the dashboard, API callers are
/// proxied with an empty path.
async fn root_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let accept = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if accept.contains("text/html") || accept.contains("application/xhtml+xml") {
        return Redirect::temporary("/admin").into_response();
    }

    proxy_request(state, addr, String::new(), request).await
}

/// Catch-all proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(path): Path<String>,
    request: Request<Body>,
) -> Response {
    proxy_request(state, addr, path, request).await
}

/// Administrative paths belong to the dashboard and are excluded from
/// statistics tracking.
fn is_administrative(path: &str) -> bool {
    path.starts_with("api/admin") || path.starts_with("admin")
}

async fn proxy_request(
    state: AppState,
    addr: SocketAddr,
    path: String,
    request: Request<Body>,
) -> Response {
    let started_at = Instant::now();
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.config.listener.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request_id = if is_administrative(&path) {
        None
    } else {
        Some(
            state
                .stats
                .record_request_start(&path, parts.method.as_str(), body.len()),
        )
    };

    // Resolved once; immutable for the lifetime of the request.
    let target = UpstreamTarget::resolve(&parts.headers, &state.config.upstream.base_url);
    let credential = credentials::read_override(&parts.headers);

    let body = if should_rewrite(&path, &state.config.rewrite) {
        rewrite_system_prompt(body, &state.config.rewrite)
    } else {
        body
    };

    let headers = prepare_forward_headers(
        &parts.headers,
        Some(addr.ip()),
        &target,
        credential.as_deref(),
        &state.config.custom_headers,
        state.config.upstream.preserve_host,
    );

    tracing::debug!(
        method = %parts.method,
        path = %path,
        target = %target.base_url,
        body_bytes = body.len(),
        "proxying request"
    );

    forward(
        &state.client,
        state.stats.clone(),
        target,
        ProxiedRequest {
            method: parts.method,
            path,
            query: parts.uri.query().map(str::to_owned),
            headers,
            body,
            request_id,
            started_at,
        },
    )
    .await
}
