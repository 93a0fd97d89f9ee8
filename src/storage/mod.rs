//! Durable storage for cache entries.
//!
//! One rkyv-encoded [`CacheEntry`] per claim key, written atomically and read back
//! through a memory map.

pub mod disk;
pub mod error;
pub mod mmap;
mod model;

pub use disk::{DiskStore, StorageStats};
pub use error::{StorageError, StorageResult};
pub use model::{ArchivedCacheEntry, CacheEntry, decode_payload, encode_payload};
