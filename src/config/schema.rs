//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the transparent proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, inbound limits).
    pub listener: ListenerConfig,

    /// Upstream origin and client settings.
    pub upstream: UpstreamConfig,

    /// System-prompt rewrite policy.
    pub rewrite: RewriteConfig,

    /// Static headers merged into every outbound request.
    pub custom_headers: HashMap<String, String>,

    /// Admin dashboard settings.
    pub dashboard: DashboardConfig,

    /// Statistics engine settings.
    pub stats: StatsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Upstream origin and connection-manager configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Default upstream origin. Overridable per request via the
    /// `x-target-base-url` header.
    pub base_url: String,

    /// Forward the caller's Host header instead of recomputing it from the
    /// resolved target.
    pub preserve_host: bool,

    /// Total per-request timeout in seconds for the upstream call.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Outbound proxy for plaintext upstream targets.
    pub http_proxy: Option<String>,

    /// Outbound proxy for TLS upstream targets.
    pub https_proxy: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            preserve_host: false,
            timeout_secs: 60,
            connect_timeout_secs: 10,
            http_proxy: None,
            https_proxy: None,
        }
    }
}

/// System-prompt rewrite configuration.
///
/// The rewrite only runs for requests whose path is listed in `paths`;
/// everything else passes through byte-for-byte.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Replacement text for the leading system-prompt block. Rewriting is
    /// disabled entirely when unset.
    pub replacement: Option<String>,

    /// Keyword searched (case-insensitively) in the first block's text to
    /// decide between replace and insert in insert-if-missing mode.
    pub keyword: String,

    /// Insert a new leading block when the keyword is absent instead of
    /// overwriting unconditionally.
    pub insert_if_missing: bool,

    /// Request paths (no leading slash) whose bodies are eligible for the
    /// rewrite.
    pub paths: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            replacement: None,
            keyword: "Claude Code".to_string(),
            insert_if_missing: true,
            paths: vec!["v1/messages".to_string()],
        }
    }
}

/// Admin dashboard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Enable the admin dashboard and its API.
    pub enabled: bool,

    /// Access key required by the dashboard API.
    pub access_key: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_key: String::new(),
        }
    }
}

/// Statistics engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Interval in seconds between periodic summary log lines.
    pub summary_interval_secs: u64,

    /// Age in seconds after which a started-but-never-finished request is
    /// swept from the in-flight registry.
    pub stale_after_secs: u64,

    /// Number of recent upstream errors retained for the dashboard.
    pub recent_errors: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            summary_interval_secs: 60,
            stale_after_secs: 600,
            recent_errors: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Debug mode: forces debug-level logging and per-request tracing.
    pub debug: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
        }
    }
}
