//! claude-proxy binary: configuration, wiring, and startup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use claude_proxy::config::loader::load_config_or_default;
use claude_proxy::observability::logging::init_tracing;
use claude_proxy::{proxy, stats, HttpServer, ProxyConfig, Shutdown, StatsTracker};

#[derive(Parser, Debug)]
#[command(name = "claude-proxy", version, about = "Transparent forwarding proxy for an upstream LLM API")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listener port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config_or_default(args.config.as_deref())?;
    if let Some(port) = args.port {
        let mut addr: std::net::SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }

    init_tracing(&config.observability);
    log_startup(&config);

    // Exactly one pooled upstream client for the whole process; dropped once
    // on the way out of main.
    let client = proxy::build_client(&config.upstream)?;
    let stats_tracker = Arc::new(StatsTracker::new(config.stats.recent_errors));

    let shutdown = Shutdown::new();
    tokio::spawn(stats::maintenance::run_summary_log(
        stats_tracker.clone(),
        config.stats.clone(),
        shutdown.subscribe(),
    ));
    tokio::spawn(stats::maintenance::run_stale_sweep(
        stats_tracker.clone(),
        config.stats.clone(),
        shutdown.subscribe(),
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown.listen_for_signals().await;
    });

    let server = HttpServer::new(config, client, stats_tracker);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn log_startup(config: &ProxyConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        preserve_host = config.upstream.preserve_host,
        timeout_secs = config.upstream.timeout_secs,
        custom_headers = config.custom_headers.len(),
        rewrite_enabled = config.rewrite.replacement.is_some(),
        rewrite_insert_if_missing = config.rewrite.insert_if_missing,
        dashboard_enabled = config.dashboard.enabled,
        debug = config.observability.debug,
        "Configuration loaded"
    );
    if config.dashboard.enabled {
        tracing::info!(
            access_key_configured = !config.dashboard.access_key.is_empty(),
            "Dashboard enabled at /admin"
        );
    }
}
