//! Integration tests for the durable tier and the memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use claimguard::hashing::ClaimKey;
use claimguard::memory::{Clock, ManualClock};
use claimguard::model::Verdict;
use claimguard::storage::{CacheEntry, DiskStore, decode_payload, encode_payload};

use common::fixtures::{AnalysisBuilder, CLAIM, memory};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[test]
fn test_disk_store_round_trip_with_payload() {
    let dir = TempDir::new().unwrap();
    let store = DiskStore::new(dir.path());
    let key = ClaimKey::from_claim(CLAIM);

    let analyses = vec![AnalysisBuilder::new(CLAIM).build()];
    let blob = encode_payload(&analyses).unwrap();
    let entry = CacheEntry::new(*key.as_bytes(), CLAIM, blob, 1_700_000_000_000);

    let written = store.store(&entry).expect("store should succeed");
    assert!(written > 0);

    let loaded = store.load(&key).unwrap().expect("entry present");
    assert_eq!(loaded, entry);
    assert_eq!(decode_payload(&loaded.payload_blob).unwrap(), analyses);
}

#[test]
fn test_disk_store_shards_by_key_prefix() {
    let dir = TempDir::new().unwrap();
    let store = DiskStore::new(dir.path());
    let key = ClaimKey::from_claim(CLAIM);

    store
        .store(&CacheEntry::new(*key.as_bytes(), CLAIM, b"[]".to_vec(), 0))
        .unwrap();

    let hex = key.to_hex();
    let path = dir.path().join(&hex[..2]).join(format!("{}.rkyv", hex));
    assert!(path.exists(), "expected {} to exist", path.display());
    assert_eq!(store.list_keys().unwrap(), vec![key]);
}

#[tokio::test]
async fn test_memory_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let analysis = AnalysisBuilder::new(CLAIM)
        .verdict(Verdict::Misleading)
        .confidence((0.61 + 0.74) / 2.0)
        .build();

    {
        let store = memory(&dir, None);
        store.put(CLAIM, vec![analysis.clone()]).await.unwrap();
    }

    let reopened = memory(&dir, None);
    let mut found = reopened.get(CLAIM).await.expect("entry should survive reopen");

    assert_eq!(found.len(), 1);
    assert!(found[0].cached);
    found[0].cached = false;
    assert_eq!(found[0], analysis);
}

#[tokio::test]
async fn test_memory_expiry_across_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    {
        let store = memory(&dir, Some(clock.clone() as Arc<dyn Clock>));
        store
            .put(CLAIM, vec![AnalysisBuilder::new(CLAIM).build()])
            .await
            .unwrap();
    }

    clock.advance(DAY + Duration::from_secs(60));
    let reopened = memory(&dir, Some(clock.clone() as Arc<dyn Clock>));

    assert!(reopened.get(CLAIM).await.is_none());
    assert_eq!(reopened.stats().await.unwrap().total_entries, 0);
}

#[tokio::test]
async fn test_prune_keeps_fresh_entries() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = memory(&dir, Some(clock.clone() as Arc<dyn Clock>));

    store
        .put("old claim about tides", vec![AnalysisBuilder::new("old claim about tides").build()])
        .await
        .unwrap();
    clock.advance(DAY - Duration::from_secs(3600));
    store
        .put("new claim about tides", vec![AnalysisBuilder::new("new claim about tides").build()])
        .await
        .unwrap();
    clock.advance(Duration::from_secs(7200));

    assert_eq!(store.prune_expired().await.unwrap(), 1);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.expired_entries, 0);
    assert!(store.get("new claim about tides").await.is_some());
}

#[tokio::test]
async fn test_latest_write_wins() {
    let dir = TempDir::new().unwrap();
    let store = memory(&dir, None);

    store
        .put(CLAIM, vec![AnalysisBuilder::new(CLAIM).confidence(0.4).build()])
        .await
        .unwrap();
    store
        .put(CLAIM, vec![AnalysisBuilder::new(CLAIM).confidence(0.9).build()])
        .await
        .unwrap();

    let reopened = memory(&dir, None);
    let found = reopened.get(CLAIM).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!((found[0].confidence - 0.9).abs() < 1e-9);
}
