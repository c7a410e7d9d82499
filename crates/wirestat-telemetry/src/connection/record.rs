//! Per-connection statistics record.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wirestat_core::error::AppError;
use wirestat_core::result::AppResult;
use wirestat_core::types::id::ConnectionId;

/// A concurrency-safe record of one connection's lifecycle and traffic.
///
/// One record exists per physical connection: the handler that accepted
/// the connection drives all mutation from its own thread, while the
/// reporting subsystem reads the same record from arbitrary threads at
/// arbitrary times. The id is assigned at construction from the
/// process-wide counter and never changes. All other fields live behind a
/// per-record `RwLock`: reads take shared guards, writes take exclusive
/// guards, and operations on different records never contend.
#[derive(Debug)]
pub struct ConnectionRecord {
    /// Unique connection ID, immutable after construction.
    id: ConnectionId,
    /// Mutable state, guarded as a whole so composite reads stay consistent.
    state: RwLock<RecordState>,
}

#[derive(Debug, Default)]
struct RecordState {
    established_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    remote_address: Option<String>,
    // A client can visit many resources over one connection via keep-alive.
    visited_resources: HashSet<String>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl ConnectionRecord {
    /// Create a new record with a fresh unique id, empty resource set,
    /// zero counters, and unset timestamps and address.
    pub fn new() -> Self {
        Self {
            id: ConnectionId::next(),
            state: RwLock::new(RecordState::default()),
        }
    }

    /// Rebuild a record from a previously taken snapshot.
    ///
    /// The snapshot's id is kept as-is; the allocator is not consulted.
    pub fn from_snapshot(snapshot: &ConnectionSnapshot) -> Self {
        Self {
            id: snapshot.id,
            state: RwLock::new(RecordState {
                established_at: snapshot.established_at,
                closed_at: snapshot.closed_at,
                remote_address: snapshot.remote_address.clone(),
                visited_resources: snapshot.visited_resources.iter().cloned().collect(),
                bytes_sent: snapshot.bytes_sent,
                bytes_received: snapshot.bytes_received,
            }),
        }
    }

    /// The record's unique connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// When the connection was opened, if already recorded.
    pub fn established_at(&self) -> Option<DateTime<Utc>> {
        self.read().established_at
    }

    /// Record the connection-open timestamp. Called once by the owning
    /// handler, at or shortly after construction.
    pub fn set_established(&self, at: DateTime<Utc>) {
        self.write().established_at = Some(at);
    }

    /// When the connection was closed, if already recorded.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.read().closed_at
    }

    /// Record the connection-close timestamp. Called once by the owning
    /// handler when the connection goes away.
    pub fn set_closed(&self, at: DateTime<Utc>) {
        self.write().closed_at = Some(at);
        tracing::debug!("connection {} closed", self.id);
    }

    /// The client's textual address, if it has been determined.
    pub fn remote_address(&self) -> Option<String> {
        self.read().remote_address.clone()
    }

    /// Record the client's address. May never be called if the connection
    /// closes before the address is determined.
    pub fn set_remote_address(&self, address: impl Into<String>) {
        self.write().remote_address = Some(address.into());
    }

    /// Cumulative bytes sent to the client.
    pub fn bytes_sent(&self) -> u64 {
        self.read().bytes_sent
    }

    /// Set the cumulative bytes-sent total reported by the handler.
    pub fn set_bytes_sent(&self, bytes: u64) {
        self.write().bytes_sent = bytes;
    }

    /// Cumulative bytes received from the client.
    pub fn bytes_received(&self) -> u64 {
        self.read().bytes_received
    }

    /// Set the cumulative bytes-received total reported by the handler.
    pub fn set_bytes_received(&self, bytes: u64) {
        self.write().bytes_received = bytes;
    }

    /// Record a visited resource. Empty identifiers are ignored and
    /// duplicates are absorbed silently.
    pub fn add_resource(&self, resource: &str) {
        if resource.is_empty() {
            return;
        }
        let mut state = self.write();
        if !state.visited_resources.contains(resource) {
            state.visited_resources.insert(resource.to_string());
        }
    }

    /// A copy of the visited-resource set.
    pub fn visited_resources(&self) -> HashSet<String> {
        self.read().visited_resources.clone()
    }

    /// Number of distinct resources visited.
    pub fn resource_count(&self) -> usize {
        self.read().visited_resources.len()
    }

    /// The visited resources joined with `", "`, empty string for an empty
    /// set. Enumeration order is unspecified; callers must not depend on it.
    pub fn resources_as_text(&self) -> String {
        let state = self.read();
        state
            .visited_resources
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Derived throughput in bytes per second: total bytes transferred over
    /// the connection's duration, rounded half-up to 3 decimal places.
    ///
    /// Fails with an invalid-state error when either timestamp is unset or
    /// the elapsed duration is not strictly positive, rather than producing
    /// `Infinity`/`NaN`. All participating fields are read in one critical
    /// section, so the result is consistent even while the owning handler
    /// is still mutating the record.
    pub fn throughput(&self) -> AppResult<f64> {
        let state = self.read();
        let (Some(established), Some(closed)) = (state.established_at, state.closed_at) else {
            return Err(AppError::invalid_state(format!(
                "connection {}: throughput requires both open and close timestamps",
                self.id
            )));
        };

        let elapsed_ms = closed.signed_duration_since(established).num_milliseconds();
        if elapsed_ms <= 0 {
            return Err(AppError::invalid_state(format!(
                "connection {}: non-positive duration of {elapsed_ms} ms",
                self.id
            )));
        }

        let total_bytes = (state.bytes_sent + state.bytes_received) as f64;
        let elapsed_seconds = elapsed_ms as f64 / 1000.0;
        Ok(round3(total_bytes / elapsed_seconds))
    }

    /// Take a point-in-time copy of every field under a single lock
    /// acquisition. The snapshot is internally consistent even while the
    /// owning handler keeps mutating the record.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let state = self.read();
        let mut resources: Vec<String> = state.visited_resources.iter().cloned().collect();
        resources.sort();
        ConnectionSnapshot {
            id: self.id,
            established_at: state.established_at,
            closed_at: state.closed_at,
            remote_address: state.remote_address.clone(),
            visited_resources: resources,
            bytes_sent: state.bytes_sent,
            bytes_received: state.bytes_received,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RecordState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ConnectionRecord {
    fn default() -> Self {
        Self::new()
    }
}

// Equality covers every field, with set equality independent of insertion
// order. Each side snapshots itself, so no two record locks are held at once.
impl PartialEq for ConnectionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for ConnectionRecord {}

impl Hash for ConnectionRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.snapshot().hash(state);
    }
}

/// Serializable point-in-time copy of a [`ConnectionRecord`]'s fields.
///
/// Resources are carried as a sorted list, which keeps equality and hashing
/// order-independent and the serialized form stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// Connection ID.
    pub id: ConnectionId,
    /// When the connection was opened.
    pub established_at: Option<DateTime<Utc>>,
    /// When the connection was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Client address.
    pub remote_address: Option<String>,
    /// Distinct resources visited, sorted.
    pub visited_resources: Vec<String>,
    /// Cumulative bytes sent.
    pub bytes_sent: u64,
    /// Cumulative bytes received.
    pub bytes_received: u64,
}

/// Round to 3 decimal places, half away from zero.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
