//! Request statistics tracking.
//!
//! The tracker pairs a start event with exactly one completion event per
//! request via an opaque correlation id. Aggregates are lock-free; the
//! in-flight registry and the recent-error ring are the only shared
//! structures, and neither sits on the streaming path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// Opaque per-request correlation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A started request that has not yet completed.
#[derive(Debug, Clone)]
struct InFlightRequest {
    path: String,
    method: String,
    body_bytes: usize,
    started_at: Instant,
}

/// One recorded upstream failure, retained for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub path: String,
    pub method: String,
    pub status: u16,
    pub message: String,
    /// Full decoded error body, when one was captured.
    pub body: Option<String>,
    pub duration_ms: u64,
}

/// Point-in-time view of the tracker for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub started: u64,
    pub completed: u64,
    pub errored: u64,
    pub bytes_relayed: u64,
    pub in_flight: Vec<InFlightSnapshot>,
    pub recent_errors: Vec<ErrorRecord>,
}

/// Serializable view of one in-flight request.
#[derive(Debug, Clone, Serialize)]
pub struct InFlightSnapshot {
    pub id: RequestId,
    pub path: String,
    pub method: String,
    pub body_bytes: usize,
    pub age_secs: u64,
}

/// Statistics engine shared across all request tasks.
pub struct StatsTracker {
    started: AtomicU64,
    completed: AtomicU64,
    errored: AtomicU64,
    bytes_relayed: AtomicU64,
    in_flight: DashMap<RequestId, InFlightRequest>,
    recent_errors: Mutex<VecDeque<ErrorRecord>>,
    recent_errors_cap: usize,
}

impl StatsTracker {
    pub fn new(recent_errors_cap: usize) -> Self {
        Self {
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            bytes_relayed: AtomicU64::new(0),
            in_flight: DashMap::new(),
            recent_errors: Mutex::new(VecDeque::with_capacity(recent_errors_cap)),
            recent_errors_cap,
        }
    }

    /// Register a request entering the forwarding engine.
    pub fn record_request_start(&self, path: &str, method: &str, body_bytes: usize) -> RequestId {
        let id = RequestId::new();
        self.started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.insert(
            id,
            InFlightRequest {
                path: path.to_string(),
                method: method.to_string(),
                body_bytes,
                started_at: Instant::now(),
            },
        );
        id
    }

    /// Record a successfully relayed request.
    pub fn record_request_success(
        &self,
        id: RequestId,
        path: &str,
        method: &str,
        bytes: u64,
        duration: Duration,
        status: u16,
    ) {
        self.in_flight.remove(&id);
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_relayed.fetch_add(bytes, Ordering::Relaxed);
        tracing::debug!(
            %id,
            path,
            method,
            bytes,
            status,
            duration_ms = duration.as_millis() as u64,
            "request completed"
        );
    }

    /// Record a failed request (upstream error status or connectivity
    /// failure). `body` carries the full decoded error capture, when any.
    pub fn record_request_error(
        &self,
        id: RequestId,
        path: &str,
        method: &str,
        message: &str,
        duration: Duration,
        body: Option<String>,
        status: u16,
    ) {
        self.in_flight.remove(&id);
        self.errored.fetch_add(1, Ordering::Relaxed);
        self.push_error(ErrorRecord {
            path: path.to_string(),
            method: method.to_string(),
            status,
            message: message.to_string(),
            body,
            duration_ms: duration.as_millis() as u64,
        });
    }

    /// Evict in-flight entries older than `older_than`, counting each as an
    /// error. Returns how many entries were swept.
    pub fn sweep_stale(&self, older_than: Duration) -> usize {
        let stale: Vec<(RequestId, InFlightRequest)> = self
            .in_flight
            .iter()
            .filter(|entry| entry.value().started_at.elapsed() > older_than)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, request) in &stale {
            if self.in_flight.remove(id).is_none() {
                continue;
            }
            self.errored.fetch_add(1, Ordering::Relaxed);
            self.push_error(ErrorRecord {
                path: request.path.clone(),
                method: request.method.clone(),
                status: 0,
                message: "request tracking entry went stale".to_string(),
                body: None,
                duration_ms: request.started_at.elapsed().as_millis() as u64,
            });
        }

        stale.len()
    }

    /// Point-in-time view for the dashboard.
    pub fn snapshot(&self) -> StatsSnapshot {
        let in_flight = self
            .in_flight
            .iter()
            .map(|entry| InFlightSnapshot {
                id: *entry.key(),
                path: entry.value().path.clone(),
                method: entry.value().method.clone(),
                body_bytes: entry.value().body_bytes,
                age_secs: entry.value().started_at.elapsed().as_secs(),
            })
            .collect();

        let recent_errors = self
            .recent_errors
            .lock()
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default();

        StatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            bytes_relayed: self.bytes_relayed.load(Ordering::Relaxed),
            in_flight,
            recent_errors,
        }
    }

    fn push_error(&self, record: ErrorRecord) {
        if let Ok(mut ring) = self.recent_errors.lock() {
            if ring.len() == self.recent_errors_cap {
                ring.pop_front();
            }
            ring.push_back(record);
        }
    }
}
