//! Request forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → target.rs (resolve upstream origin, per-request override aware)
//!     → credentials.rs (classify and translate the caller credential)
//!     → body.rs (system-prompt rewrite, designated paths only)
//!     → http::headers (outbound header set)
//!     → forward.rs (upstream call, streaming relay, completion guard)
//! ```
//!
//! # Design Decisions
//! - Every body-mutation failure degrades to passthrough, never to an error
//! - Target and credential are resolved once per request, never re-resolved
//! - Statistics are emitted by a drop guard after the stream closes

pub mod body;
pub mod credentials;
pub mod forward;
pub mod target;

pub use credentials::CredentialKind;
pub use forward::{build_client, forward, ProxiedRequest};
pub use target::UpstreamTarget;
