//! Upstream forwarding and streaming relay.
//!
//! # Responsibilities
//! - Build the shared pooled upstream client at startup
//! - Issue the upstream call with the prepared header set and body
//! - Relay the response body chunk-by-chunk as it arrives
//! - Capture a bounded preview of error-response content
//! - Emit exactly one statistics event after the stream closes, on every
//!   exit path (normal completion, caller disconnect, upstream abort)
//!
//! # Design Decisions
//! - Status and filtered headers are sent before the body is received
//! - Relay failures end the stream silently; the caller is already gone
//! - The completion hook is a drop guard owned by the relay stream, not a
//!   detached task

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};

use crate::config::UpstreamConfig;
use crate::http::headers::filter_response_headers;
use crate::proxy::target::UpstreamTarget;
use crate::stats::{RequestId, StatsTracker};

/// Hard cap on captured error-response content.
pub const ERROR_CAPTURE_LIMIT: usize = 50 * 1024;

/// Maximum characters in the logged error preview.
const ERROR_PREVIEW_CHARS: usize = 200;

/// Upstream connectivity failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("connect failed: {0}")]
    Connect(reqwest::Error),
    #[error("timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("request failed: {0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err)
        } else if err.is_connect() {
            UpstreamError::Connect(err)
        } else {
            UpstreamError::Request(err)
        }
    }
}

/// Build the process-wide upstream connection manager.
///
/// Redirects are disabled so 3xx responses relay untouched; decompression is
/// transparent (the response filter strips Content-Encoding accordingly).
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(proxy) = &config.http_proxy {
        builder = builder.proxy(reqwest::Proxy::http(ensure_proxy_scheme(proxy))?);
        tracing::info!(proxy = %proxy, "outbound HTTP proxy configured");
    }
    if let Some(proxy) = &config.https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(ensure_proxy_scheme(proxy))?);
        tracing::info!(proxy = %proxy, "outbound HTTPS proxy configured");
    }

    builder.build()
}

// An HTTPS proxy is still usually addressed over http://.
fn ensure_proxy_scheme(proxy: &str) -> String {
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}

/// Everything the forwarding engine needs for one upstream exchange.
pub struct ProxiedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Prepared outbound header set (already filtered and credential-injected).
    pub headers: HeaderMap,
    /// Possibly rewritten body bytes.
    pub body: Bytes,
    /// Correlation id; absent for administrative paths.
    pub request_id: Option<RequestId>,
    pub started_at: Instant,
}

/// Issue the upstream call and return a streaming response.
///
/// When the call cannot be established at all, returns a fixed 502 and
/// records the error event immediately; otherwise the statistics event is
/// deferred to the relay stream's completion guard.
pub async fn forward(
    client: &reqwest::Client,
    stats: Arc<StatsTracker>,
    target: UpstreamTarget,
    request: ProxiedRequest,
) -> Response {
    let url = target.url_for(&request.path, request.query.as_deref());

    let outcome = client
        .request(request.method.clone(), &url)
        .headers(request.headers)
        .body(request.body)
        .send()
        .await;

    let upstream = match outcome {
        Ok(upstream) => upstream,
        Err(err) => {
            let err = UpstreamError::from(err);
            tracing::error!(
                method = %request.method,
                path = %request.path,
                target = %target.base_url,
                error = %err,
                "upstream request failed"
            );
            if let Some(id) = request.request_id {
                stats.record_request_error(
                    id,
                    &request.path,
                    request.method.as_str(),
                    &err.to_string(),
                    request.started_at.elapsed(),
                    None,
                    StatusCode::BAD_GATEWAY.as_u16(),
                );
            }
            return (
                StatusCode::BAD_GATEWAY,
                format!("Upstream request failed: {}", err),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    let response_headers = filter_response_headers(upstream.headers());

    let guard = CompletionGuard {
        stats,
        request_id: request.request_id,
        path: request.path,
        method: request.method.as_str().to_string(),
        target: target.base_url,
        status,
        started_at: request.started_at,
        bytes_relayed: 0,
        error_capture: Vec::new(),
    };
    let relay = RelayStream {
        upstream: upstream.bytes_stream().boxed(),
        capture_errors: status.as_u16() >= 400,
        guard,
    };

    let mut response = Response::new(Body::from_stream(relay));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}

/// Byte stream relaying the upstream body to the caller.
///
/// Field order matters: the upstream stream drops before the guard, so the
/// connection is released by the time the completion event is emitted.
struct RelayStream {
    upstream: BoxStream<'static, reqwest::Result<Bytes>>,
    capture_errors: bool,
    guard: CompletionGuard,
}

impl Stream for RelayStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.guard.bytes_relayed += chunk.len() as u64;
                if this.capture_errors {
                    this.guard.capture_error_chunk(&chunk);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                // Mid-stream failure: the caller hung up or the upstream
                // aborted. Nothing can be surfaced anymore; end quietly.
                tracing::debug!(error = %err, "relay stream ended early");
                Poll::Ready(None)
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Deferred completion hook, run when the relay stream is dropped.
struct CompletionGuard {
    stats: Arc<StatsTracker>,
    request_id: Option<RequestId>,
    path: String,
    method: String,
    target: String,
    status: StatusCode,
    started_at: Instant,
    bytes_relayed: u64,
    error_capture: Vec<u8>,
}

impl CompletionGuard {
    fn capture_error_chunk(&mut self, chunk: &[u8]) {
        let remaining = ERROR_CAPTURE_LIMIT - self.error_capture.len();
        if remaining == 0 {
            return;
        }
        let take = remaining.min(chunk.len());
        self.error_capture.extend_from_slice(&chunk[..take]);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let Some(id) = self.request_id else {
            // Administrative paths are excluded from statistics entirely.
            return;
        };
        let elapsed = self.started_at.elapsed();

        if self.status.as_u16() < 400 {
            self.stats.record_request_success(
                id,
                &self.path,
                &self.method,
                self.bytes_relayed,
                elapsed,
                self.status.as_u16(),
            );
            return;
        }

        let body_text = String::from_utf8_lossy(&self.error_capture);
        tracing::warn!(
            method = %self.method,
            path = %self.path,
            target = %self.target,
            status = self.status.as_u16(),
            captured_bytes = self.error_capture.len(),
            preview = %truncate_preview(&body_text),
            "upstream returned error status"
        );
        self.stats.record_request_error(
            id,
            &self.path,
            &self.method,
            &format!(
                "HTTP {}: {}",
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or("")
            ),
            elapsed,
            (!body_text.is_empty()).then(|| body_text.into_owned()),
            self.status.as_u16(),
        );
    }
}

fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= ERROR_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(ERROR_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
