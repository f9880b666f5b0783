//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set; debug mode forces
/// debug-level output for the proxy and its HTTP trace layer.
pub fn init_tracing(config: &ObservabilityConfig) {
    let default_filter = if config.debug {
        "claude_proxy=debug,tower_http=debug".to_string()
    } else {
        format!("claude_proxy={}", config.log_level)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
