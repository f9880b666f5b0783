//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; level from config, `RUST_LOG` wins
//! - Request statistics live in the `stats` subsystem, not here
//! - Per-request HTTP traces come from tower-http's `TraceLayer`

pub mod logging;
