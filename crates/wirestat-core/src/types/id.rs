//! Newtype wrapper for connection identifiers.
//!
//! Connection ids are process-lifetime-unique integers drawn from a shared
//! monotonically increasing counter. The counter is the only state shared
//! across all connection records, and its fetch-and-increment is atomic so
//! that concurrent construction from multiple handler threads can never
//! produce a duplicate.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide allocator state for [`ConnectionId::next`].
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a tracked connection.
///
/// Assigned sequentially at record construction and never reused within a
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Allocate the next identifier from the process-wide counter.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create an identifier from a raw value without touching the allocator.
    ///
    /// Intended for deserialization paths and tests; a raw id does not
    /// carry the uniqueness guarantee of [`ConnectionId::next`].
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the inner value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<ConnectionId> for u64 {
    fn from(id: ConnectionId) -> u64 {
        id.0
    }
}
