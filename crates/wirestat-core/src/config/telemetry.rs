//! Connection telemetry configuration.

use serde::{Deserialize, Serialize};

/// Connection telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Soft limit on concurrently tracked connections. Exceeding it logs a
    /// warning; tracking is never refused. `0` disables the limit.
    #[serde(default = "default_max_tracked_connections")]
    pub max_tracked_connections: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_tracked_connections: default_max_tracked_connections(),
        }
    }
}

fn default_max_tracked_connections() -> usize {
    10_000
}
