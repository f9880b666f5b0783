//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees. Returns every
//! violation found, not just the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic configuration violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress { address: String },
    InvalidUpstreamUrl { url: String, reason: String },
    ZeroTimeout { field: &'static str },
    MissingDashboardKey,
    EmptyRewritePath,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress { address } => {
                write!(f, "listener.bind_address '{}' is not a socket address", address)
            }
            ValidationError::InvalidUpstreamUrl { url, reason } => {
                write!(f, "upstream.base_url '{}' is invalid: {}", url, reason)
            }
            ValidationError::ZeroTimeout { field } => {
                write!(f, "{} must be greater than zero", field)
            }
            ValidationError::MissingDashboardKey => {
                write!(f, "dashboard.access_key must be set when the dashboard is enabled")
            }
            ValidationError::EmptyRewritePath => {
                write!(f, "rewrite.paths entries must not be empty")
            }
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
        });
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUpstreamUrl {
            url: config.upstream.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUpstreamUrl {
            url: config.upstream.base_url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.timeout_secs",
        });
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.connect_timeout_secs",
        });
    }
    if config.stats.stale_after_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "stats.stale_after_secs",
        });
    }

    if config.dashboard.enabled && config.dashboard.access_key.is_empty() {
        errors.push(ValidationError::MissingDashboardKey);
    }

    if config.rewrite.paths.iter().any(|p| p.trim_matches('/').is_empty()) {
        errors.push(ValidationError::EmptyRewritePath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
