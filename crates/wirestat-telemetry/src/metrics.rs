//! Connection lifecycle metrics.
//!
//! Independent atomic counters only; per-record state is never aggregated
//! here.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level connection lifecycle counters.
///
/// All operations are thread-safe and suitable for concurrent access from
/// handler and reporting threads.
#[derive(Debug)]
pub struct TelemetryMetrics {
    /// Total connections ever opened.
    pub connections_opened: AtomicU64,
    /// Connections currently tracked.
    pub connections_active: AtomicU64,
    /// Total connections closed and released.
    pub connections_closed: AtomicU64,
}

impl TelemetryMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self {
            connections_opened: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
        }
    }

    /// Record a new connection.
    pub fn record_open(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection release.
    pub fn record_close(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever opened.
    pub connections_opened: u64,
    /// Connections currently tracked.
    pub connections_active: u64,
    /// Total connections closed and released.
    pub connections_closed: u64,
}
