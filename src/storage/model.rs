//! Persisted entry envelope.

use rkyv::{Archive, Deserialize, Serialize};

use super::error::{StorageError, StorageResult};
use crate::model::ClaimAnalysis;

/// One cached claim on disk.
///
/// The envelope is rkyv; `payload_blob` is the JSON array of [`ClaimAnalysis`]
/// values so the analysis schema can evolve independently of the envelope.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct CacheEntry {
    /// BLAKE3 digest of the folded claim.
    pub key: [u8; 32],
    /// Normalized claim text, for inspection.
    pub claim: String,
    /// Unix millis of the last write.
    pub stored_at_ms: i64,
    pub access_count: u64,
    pub last_accessed_ms: Option<i64>,
    pub payload_blob: Vec<u8>,
}

impl CacheEntry {
    pub fn new(key: [u8; 32], claim: impl Into<String>, payload_blob: Vec<u8>, now_ms: i64) -> Self {
        Self {
            key,
            claim: claim.into(),
            stored_at_ms: now_ms,
            access_count: 0,
            last_accessed_ms: None,
            payload_blob,
        }
    }

    /// `true` once `now_ms - stored_at_ms` exceeds `ttl_ms`.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.stored_at_ms) > ttl_ms
    }

    pub fn record_access(&mut self, now_ms: i64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_ms = Some(now_ms);
    }
}

/// Encodes analyses for [`CacheEntry::payload_blob`].
pub fn encode_payload(analyses: &[ClaimAnalysis]) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(analyses).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub fn decode_payload(blob: &[u8]) -> StorageResult<Vec<ClaimAnalysis>> {
    serde_json::from_slice(blob).map_err(|e| StorageError::Serialization(e.to_string()))
}
