//! Periodic statistics maintenance.
//!
//! Two long-running tasks, both subscribed to the shutdown coordinator:
//! a periodic summary log line and a sweep that evicts in-flight entries
//! whose request task vanished without completing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::StatsConfig;
use crate::stats::StatsTracker;

/// Log a one-line aggregate summary every `summary_interval_secs`.
pub async fn run_summary_log(
    stats: Arc<StatsTracker>,
    config: StatsConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(Duration::from_secs(config.summary_interval_secs.max(1)));
    // The first tick completes immediately; skip it so the initial summary
    // carries real traffic.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = stats.snapshot();
                tracing::info!(
                    started = snapshot.started,
                    completed = snapshot.completed,
                    errored = snapshot.errored,
                    in_flight = snapshot.in_flight.len(),
                    bytes_relayed = snapshot.bytes_relayed,
                    "stats summary"
                );
            }
            _ = shutdown.recv() => {
                tracing::debug!("stats summary task received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

/// Sweep in-flight entries older than `stale_after_secs`.
pub async fn run_stale_sweep(
    stats: Arc<StatsTracker>,
    config: StatsConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let stale_after = Duration::from_secs(config.stale_after_secs.max(1));
    let mut ticker = time::interval(stale_after);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let swept = stats.sweep_stale(stale_after);
                if swept > 0 {
                    tracing::warn!(swept, stale_after_secs = stale_after.as_secs(), "swept stale in-flight requests");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("stale sweep task received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
