//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router: /health, /, /{*path}, admin)
//!     → headers.rs (outbound header set)
//!     → [proxy pipeline resolves target, rewrites body, forwards]
//!     → streaming response back to the caller
//! ```

pub mod headers;
pub mod server;

pub use server::{AppState, HttpServer};
