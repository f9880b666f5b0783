//! Statistics subsystem.
//!
//! # Data Flow
//! ```text
//! proxy handler ── record_request_start ──▶ in-flight registry
//! completion guard ─ record_request_success/error ─▶ aggregates + recent errors
//! maintenance.rs ──▶ periodic summary log, stale in-flight sweep
//! admin handlers ──▶ snapshot() for the dashboard
//! ```
//!
//! # Design Decisions
//! - Aggregates are atomic counters; recording never blocks the relay path
//! - Administrative paths never enter the tracker (no correlation id)
//! - Exactly one event per request that reached the forwarding engine

pub mod maintenance;
pub mod tracker;

pub use tracker::{RequestId, StatsSnapshot, StatsTracker};
