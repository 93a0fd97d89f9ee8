use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_L1_CAPACITY, default_cache_ttl};

/// Settings for [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Root directory of the durable tier.
    pub storage_path: PathBuf,
    /// Entries older than this are treated as absent.
    pub ttl: Duration,
    /// Max entries held by the hot tier.
    pub hot_capacity: u64,
}

impl MemoryConfig {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ttl: default_cache_ttl(),
            hot_capacity: DEFAULT_L1_CAPACITY,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_hot_capacity(mut self, hot_capacity: u64) -> Self {
        self.hot_capacity = hot_capacity;
        self
    }
}

/// Snapshot returned by `GET /memory/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Fresh (non-expired) entries.
    pub total_entries: usize,
    /// Expired entries still on disk, awaiting prune.
    pub expired_entries: usize,
    /// Sum of access counters over fresh entries.
    pub total_accesses: u64,
    /// `total_accesses / max(total_entries, 1)`.
    pub hit_rate: f64,
    /// Bytes on disk across all entry files.
    pub total_bytes: u64,
}
