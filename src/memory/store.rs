use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use moka::sync::Cache;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use super::types::{CacheStats, MemoryConfig};
use crate::hashing::{ClaimKey, normalize_claim};
use crate::model::ClaimAnalysis;
use crate::storage::{
    CacheEntry, DiskStore, StorageError, StorageResult, decode_payload, encode_payload,
};

/// Lock stripes serializing read-modify-write per key.
const LOCK_STRIPES: usize = 64;

/// Decoded entry kept in the hot tier.
struct HotRecord {
    stored_at_ms: i64,
    analyses: Vec<ClaimAnalysis>,
    /// Hot hits not yet folded into the durable counter.
    pending_accesses: AtomicU64,
    last_accessed_ms: AtomicI64,
}

impl HotRecord {
    fn new(stored_at_ms: i64, analyses: Vec<ClaimAnalysis>) -> Self {
        Self {
            stored_at_ms,
            analyses,
            pending_accesses: AtomicU64::new(0),
            last_accessed_ms: AtomicI64::new(0),
        }
    }
}

struct Inner {
    disk: DiskStore,
    hot: Cache<ClaimKey, Arc<HotRecord>>,
    ttl_ms: i64,
    stripes: Vec<Mutex<()>>,
    clock: Arc<dyn Clock>,
}

/// Shared handle to the two-tier claim cache. Cheap to clone.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("root", &self.inner.disk.root())
            .field("ttl_ms", &self.inner.ttl_ms)
            .field("hot_entries", &self.inner.hot.entry_count())
            .finish()
    }
}

impl MemoryStore {
    /// Opens (creating if needed) the store rooted at `config.storage_path`.
    pub fn open(config: MemoryConfig) -> StorageResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: MemoryConfig, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        let disk = DiskStore::new(config.storage_path.clone());
        disk.ensure_root()?;

        let hot = Cache::builder()
            .max_capacity(config.hot_capacity)
            .time_to_live(config.ttl)
            .build();

        info!(
            path = %config.storage_path.display(),
            ttl_secs = config.ttl.as_secs(),
            hot_capacity = config.hot_capacity,
            "Memory store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                disk,
                hot,
                ttl_ms: i64::try_from(config.ttl.as_millis()).unwrap_or(i64::MAX),
                stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
                clock,
            }),
        })
    }

    /// Fresh analyses stored for `claim`, each with `cached = true`.
    pub async fn get(&self, claim: &str) -> Option<Vec<ClaimAnalysis>> {
        self.get_by_key(ClaimKey::from_claim(claim)).await
    }

    /// Like [`get`](Self::get) with a precomputed key.
    ///
    /// Storage failures are logged and reported as a miss.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get_by_key(&self, key: ClaimKey) -> Option<Vec<ClaimAnalysis>> {
        match self.blocking(move |inner| inner.get(&key)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores `analyses` for `claim`, replacing any previous entry.
    pub async fn put(&self, claim: &str, analyses: Vec<ClaimAnalysis>) -> StorageResult<()> {
        self.put_by_key(ClaimKey::from_claim(claim), claim, analyses)
            .await
    }

    #[instrument(skip(self, claim, analyses), fields(key = %key, count = analyses.len()))]
    pub async fn put_by_key(
        &self,
        key: ClaimKey,
        claim: &str,
        analyses: Vec<ClaimAnalysis>,
    ) -> StorageResult<()> {
        let claim = normalize_claim(claim);
        self.blocking(move |inner| inner.put(key, claim, analyses))
            .await?
    }

    /// Counts entries and accesses across the durable tier.
    pub async fn stats(&self) -> StorageResult<CacheStats> {
        self.blocking(Inner::stats).await?
    }

    /// Deletes expired (and unreadable) entries; returns how many were removed.
    pub async fn prune_expired(&self) -> StorageResult<usize> {
        self.blocking(Inner::prune_expired).await?
    }

    pub fn ttl_ms(&self) -> i64 {
        self.inner.ttl_ms
    }

    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Inner) -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| StorageError::TaskFailed(e.to_string()))
    }
}

impl Inner {
    fn lock(&self, key: &ClaimKey) -> MutexGuard<'_, ()> {
        self.stripes[key.as_bytes()[0] as usize % LOCK_STRIPES].lock()
    }

    fn is_expired(&self, stored_at_ms: i64, now_ms: i64) -> bool {
        now_ms.saturating_sub(stored_at_ms) > self.ttl_ms
    }

    fn get(&self, key: &ClaimKey) -> Option<Vec<ClaimAnalysis>> {
        let now = self.clock.now_ms();
        let _guard = self.lock(key);

        if let Some(record) = self.hot.get(key) {
            if !self.is_expired(record.stored_at_ms, now) {
                record.pending_accesses.fetch_add(1, Ordering::Relaxed);
                record.last_accessed_ms.fetch_max(now, Ordering::Relaxed);
                debug!("Hot tier hit");
                return Some(mark_cached(&record.analyses));
            }
            self.hot.invalidate(key);
        }

        let mut entry = match self.disk.load(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e @ StorageError::Corrupted { .. }) => {
                warn!(error = %e, "Discarding unreadable entry");
                self.discard(key);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed");
                return None;
            }
        };

        if entry.is_expired(now, self.ttl_ms) {
            debug!(stored_at_ms = entry.stored_at_ms, "Purging expired entry");
            self.discard(key);
            return None;
        }

        let analyses = match decode_payload(&entry.payload_blob) {
            Ok(analyses) => analyses,
            Err(e) => {
                warn!(error = %e, "Discarding entry with undecodable payload");
                self.discard(key);
                return None;
            }
        };

        entry.record_access(now);
        if let Err(e) = self.disk.store(&entry) {
            warn!(error = %e, "Failed to persist access counter");
        }

        let result = mark_cached(&analyses);
        self.hot
            .insert(*key, Arc::new(HotRecord::new(entry.stored_at_ms, analyses)));
        Some(result)
    }

    fn put(&self, key: ClaimKey, claim: String, mut analyses: Vec<ClaimAnalysis>) -> StorageResult<()> {
        for analysis in &mut analyses {
            analysis.cached = false;
        }

        let blob = encode_payload(&analyses)?;
        let entry = CacheEntry::new(*key.as_bytes(), claim, blob, self.clock.now_ms());

        let _guard = self.lock(&key);
        match self.disk.store(&entry) {
            Ok(bytes) => {
                debug!(bytes = bytes, "Cached analysis");
                self.hot
                    .insert(key, Arc::new(HotRecord::new(entry.stored_at_ms, analyses)));
                Ok(())
            }
            Err(e) => {
                self.hot.invalidate(&key);
                Err(e)
            }
        }
    }

    fn discard(&self, key: &ClaimKey) {
        self.hot.invalidate(key);
        if let Err(e) = self.disk.delete(key) {
            warn!(key = %key, error = %e, "Failed to delete entry");
        }
    }

    /// Folds hot-tier hits into the durable access counters.
    fn flush_accesses(&self) {
        for (key, record) in self.hot.iter() {
            let pending = record.pending_accesses.swap(0, Ordering::Relaxed);
            if pending == 0 {
                continue;
            }

            let _guard = self.lock(&key);
            if let Ok(Some(mut entry)) = self.disk.load(&key)
                && entry.stored_at_ms == record.stored_at_ms
            {
                entry.access_count = entry.access_count.saturating_add(pending);
                let last = record.last_accessed_ms.load(Ordering::Relaxed);
                entry.last_accessed_ms = entry.last_accessed_ms.max(Some(last));
                if let Err(e) = self.disk.store(&entry) {
                    warn!(key = %*key, error = %e, "Failed to flush access counter");
                }
            }
        }
    }

    fn stats(&self) -> StorageResult<CacheStats> {
        self.flush_accesses();

        let now = self.clock.now_ms();
        let mut stats = CacheStats {
            total_bytes: self.disk.stats()?.total_bytes,
            ..CacheStats::default()
        };

        for key in self.disk.list_keys()? {
            let _guard = self.lock(&key);
            match self.disk.load(&key) {
                Ok(Some(entry)) if entry.is_expired(now, self.ttl_ms) => {
                    stats.expired_entries += 1;
                }
                Ok(Some(entry)) => {
                    stats.total_entries += 1;
                    stats.total_accesses += entry.access_count;
                }
                Ok(None) => {}
                Err(e) => debug!(key = %key, error = %e, "Skipping unreadable entry in stats"),
            }
        }

        stats.hit_rate = stats.total_accesses as f64 / stats.total_entries.max(1) as f64;
        Ok(stats)
    }

    fn prune_expired(&self) -> StorageResult<usize> {
        self.flush_accesses();

        let now = self.clock.now_ms();
        let mut removed = 0;

        for key in self.disk.list_keys()? {
            let _guard = self.lock(&key);
            let stale = match self.disk.load(&key) {
                Ok(Some(entry)) => entry.is_expired(now, self.ttl_ms),
                Ok(None) => false,
                Err(StorageError::Corrupted { .. }) => true,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping entry during prune");
                    false
                }
            };

            if stale && self.disk.delete(&key)? {
                self.hot.invalidate(&key);
                removed += 1;
            }
        }

        let shards = self.disk.cleanup_empty_shards()?;
        info!(removed = removed, shards = shards, "Pruned expired entries");
        Ok(removed)
    }
}

fn mark_cached(analyses: &[ClaimAnalysis]) -> Vec<ClaimAnalysis> {
    analyses
        .iter()
        .cloned()
        .map(|mut a| {
            a.cached = true;
            a
        })
        .collect()
}
