//! Cache entry metadata record

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Access metadata stored alongside each cached entry.
///
/// Advisory only: it steers least-recently-accessed eviction and is allowed
/// to lose concurrent refreshes (last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Unix timestamp (milliseconds) when the entry was first written
    pub created_at: u64,
    /// Unix timestamp (milliseconds) of the most recent hit or write
    pub last_access: u64,
    /// Number of times the entry has been served, including the write
    pub access_count: u32,
}

impl EntryMetadata {
    /// Metadata for a freshly written entry
    pub fn new() -> Self {
        let now = unix_now_millis();
        Self {
            created_at: now,
            last_access: now,
            access_count: 1,
        }
    }

    /// Record a hit, preserving the creation timestamp
    pub fn touch(&mut self) {
        self.last_access = unix_now_millis();
        self.access_count = self.access_count.saturating_add(1);
    }
}

impl Default for EntryMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Current Unix time in milliseconds
pub fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
