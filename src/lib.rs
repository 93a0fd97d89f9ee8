//! ClaimGuard library crate (used by the server binary and integration tests).
//!
//! A claim flows through the [`Analyzer`]: normalized and hashed into a
//! [`ClaimKey`], looked up in the [`MemoryStore`], and on a miss handed to the
//! [`EvidenceAggregator`], the [`ConsensusEngine`] and the [`Explainer`] in turn.
//! The result is persisted keyed by content hash so repeated claims are served
//! from memory until their TTL lapses.
//!
//! ## Test/Mock Support
//! Scripted providers and a manual clock are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod consensus;
pub mod constants;
pub mod evidence;
pub mod explain;
pub mod gateway;
pub mod hashing;
pub mod memory;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod retry;
pub mod storage;

pub use config::{Config, ConfigError};
pub use consensus::{
    ALL_BACKENDS_FAILED, Consensus, ConsensusEngine, ParseError, Verification,
    parse_backend_output, reach_consensus,
};
pub use evidence::{AggregatorConfig, CredibilityTable, EvidenceAggregator};
pub use explain::Explainer;
pub use gateway::{AppState, GatewayError, create_router};
pub use hashing::{ClaimKey, hash_claim, normalize_claim};
#[cfg(any(test, feature = "mock"))]
pub use memory::ManualClock;
pub use memory::{CacheStats, Clock, MemoryConfig, MemoryStore, PruneScheduler, SystemClock};
pub use model::{
    AnalysisRequest, AnalysisResponse, BackendVerdict, ClaimAnalysis, Credibility, Evidence,
    Verdict,
};
pub use observability::{SpanGuard, SpanSink, Telemetry};
pub use pipeline::{Analyzer, NO_EVIDENCE_EXPLANATION};
#[cfg(any(test, feature = "mock"))]
pub use providers::{ScriptedCompletion, StaticSearch};
pub use providers::{
    CompletionProvider, DuckDuckGoSearch, GenaiProvider, ProviderError, SearchHit, SearchProvider,
};
pub use retry::RetryPolicy;
pub use storage::{CacheEntry, DiskStore, StorageError};
