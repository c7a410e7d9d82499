//! # wirestat-telemetry
//!
//! Per-connection telemetry for a network server. Provides:
//!
//! - [`ConnectionRecord`] — a concurrency-safe record of one connection's
//!   identity, timing, visited resources, and byte counters, with a derived
//!   throughput metric
//! - [`ConnectionRegistry`] — the set of live records the reporting
//!   subsystem iterates
//! - [`TelemetryMetrics`] — engine-level connection lifecycle counters
//!
//! A record is owned and mutated by the connection's handler thread and read
//! concurrently by any number of reporting threads. All operations are
//! synchronous and in-memory; nothing in this crate blocks on I/O.

pub mod connection;
pub mod metrics;

pub use connection::record::{ConnectionRecord, ConnectionSnapshot};
pub use connection::registry::ConnectionRegistry;
pub use metrics::{MetricsSnapshot, TelemetryMetrics};
