//! Upstream target resolution.
//!
//! The upstream origin is normally the statically configured base URL. A
//! caller may redirect a single request elsewhere with the
//! `x-target-base-url` header; resolution never fails, absence of the
//! override always falls back to configuration.

use axum::http::HeaderMap;
use url::Url;

/// Per-request override header naming the upstream origin.
pub const TARGET_OVERRIDE_HEADER: &str = "x-target-base-url";

/// The upstream origin for one request. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Base origin URL, no trailing slash.
    pub base_url: String,
    /// Whether the origin came from the per-request override header.
    pub overridden: bool,
}

impl UpstreamTarget {
    /// Resolve the target for a request from its headers, falling back to
    /// the configured origin.
    pub fn resolve(headers: &HeaderMap, configured: &str) -> Self {
        if let Some(dynamic) = headers
            .get(TARGET_OVERRIDE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        {
            let base_url = dynamic.trim_end_matches('/').to_string();
            tracing::debug!(target = %base_url, "using per-request upstream override");
            return Self {
                base_url,
                overridden: true,
            };
        }

        Self {
            base_url: configured.trim_end_matches('/').to_string(),
            overridden: false,
        }
    }

    /// Build the full upstream URL for a request path and query string.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// The authority (`host[:port]`) of the target, used to recompute the
    /// outbound Host header. None when the base URL does not parse.
    pub fn authority(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}
