//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build client + stats → Start listener
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/Ctrl+C → broadcast → server drains, maintenance tasks exit
//!     → upstream client dropped exactly once
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
