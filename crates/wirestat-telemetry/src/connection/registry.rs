//! Connection registry — tracks all live records for the reporting path.

use std::sync::Arc;

use dashmap::DashMap;

use wirestat_core::config::telemetry::TelemetryConfig;
use wirestat_core::types::id::ConnectionId;

use super::record::{ConnectionRecord, ConnectionSnapshot};
use crate::metrics::TelemetryMetrics;

/// Thread-safe registry of all live connection records.
///
/// The connection-handling side adds a record at accept and removes it
/// after close; the reporting side looks records up or iterates them at
/// any time. The registry never touches a record's fields, so it imposes
/// no cross-record ordering of its own.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Connection ID → record, for direct lookup and iteration.
    records: DashMap<ConnectionId, Arc<ConnectionRecord>>,
    /// Lifecycle counters, bumped as records come and go.
    metrics: TelemetryMetrics,
    /// Soft capacity from config; 0 disables the warning.
    max_tracked: usize,
}

impl ConnectionRegistry {
    /// Creates a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&TelemetryConfig::default())
    }

    /// Creates a registry with the given telemetry settings.
    pub fn with_config(config: &TelemetryConfig) -> Self {
        Self {
            records: DashMap::new(),
            metrics: TelemetryMetrics::new(),
            max_tracked: config.max_tracked_connections,
        }
    }

    /// Adds a record to the registry.
    ///
    /// Exceeding the configured soft capacity logs a warning but never
    /// refuses the record; dropping it would leave a hole in the
    /// reporting picture.
    pub fn add(&self, record: Arc<ConnectionRecord>) {
        self.records.insert(record.id(), record);
        self.metrics.record_open();

        let tracked = self.records.len();
        if self.max_tracked > 0 && tracked > self.max_tracked {
            tracing::warn!(
                "tracking {tracked} connections, above the configured limit of {}",
                self.max_tracked
            );
        }
    }

    /// Removes a record, returning it if it was present.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ConnectionRecord>> {
        let removed = self.records.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            self.metrics.record_close();
        }
        removed
    }

    /// Gets a record by connection id.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ConnectionRecord>> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Returns all live records.
    pub fn all_records(&self) -> Vec<Arc<ConnectionRecord>> {
        self.records
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Takes a per-record snapshot of every live record.
    ///
    /// Each snapshot is consistent within itself; no consistency is
    /// promised across records.
    pub fn snapshots(&self) -> Vec<ConnectionSnapshot> {
        self.records
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect()
    }

    /// Returns the number of live records.
    pub fn connection_count(&self) -> usize {
        self.records.len()
    }

    /// The registry's lifecycle counters.
    pub fn metrics(&self) -> &TelemetryMetrics {
        &self.metrics
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
