//! Memory/Cache Store.
//!
//! Content-addressed, TTL-bound analyses keyed by [`ClaimKey`](crate::hashing::ClaimKey):
//! a bounded in-memory hot tier (`moka`) in front of the durable
//! [`DiskStore`](crate::storage::DiskStore). Survives restarts; expired entries are
//! invisible to reads and removed by [`MemoryStore::prune_expired`] or the
//! background [`PruneScheduler`].

pub mod clock;
pub mod scheduler;
pub mod store;
pub mod types;


#[cfg(any(test, feature = "mock"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use scheduler::PruneScheduler;
pub use store::MemoryStore;
pub use types::{CacheStats, MemoryConfig};
