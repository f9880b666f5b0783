//! Transparent forwarding proxy for an upstream Anthropic-style LLM API.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │              TRANSPARENT PROXY                 │
//!                     │                                                │
//!   Client Request    │  ┌────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│  proxy   │──▶│   pooled    │──┼──▶ Upstream
//!                     │  │ server │   │ pipeline │   │   client    │  │    LLM API
//!                     │  └────────┘   └──────────┘   └──────┬──────┘  │
//!                     │                                     │         │
//!   Client Response   │  ┌──────────────────────────┐       │         │
//!   ◀─────────────────┼──│ streaming relay + guard  │◀──────┘         │
//!                     │  └────────────┬─────────────┘                 │
//!                     │               │ completion event              │
//!                     │               ▼                               │
//!                     │  ┌────────┐ ┌───────┐ ┌───────────────────┐   │
//!                     │  │ config │ │ stats │ │  admin dashboard  │   │
//!                     │  └────────┘ └───────┘ └───────────────────┘   │
//!                     └────────────────────────────────────────────────┘
//! ```
//!
//! Per-request pipeline: resolve upstream target and credential → rewrite
//! the system prompt (designated paths only) → build the outbound header
//! set → forward → stream the response back byte-for-byte → emit one
//! statistics event once the stream has closed.

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;

// Downstream consumers
pub mod admin;
pub mod stats;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use stats::StatsTracker;
