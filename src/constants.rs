//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.

use std::time::Duration;

/// Default time-to-live for cached analyses (24h).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default bound on a single external call (search query, backend, explanation).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Interval of the background prune task. Zero disables it.
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60 * 60;

/// Max entries held by the in-memory hot tier.
pub const DEFAULT_L1_CAPACITY: u64 = 10_000;

/// Results requested from the search capability per query variant.
pub const RESULTS_PER_QUERY: usize = 3;

/// Max characters kept from a search result body.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Max evidence items returned by one aggregation run.
pub const MAX_EVIDENCE: usize = 10;

/// Evidence items included in the verifier prompt.
pub const PROMPT_EVIDENCE: usize = 5;

/// Evidence items persisted with a [`ClaimAnalysis`](crate::model::ClaimAnalysis).
pub const STORED_SOURCES: usize = 5;

/// Sources offered to the explanation capability as citations.
pub const CITED_SOURCES: usize = 3;

/// Accepted claim length (characters, after trimming) at the HTTP boundary.
pub const MIN_CLAIM_CHARS: usize = 3;
pub const MAX_CLAIM_CHARS: usize = 500;

pub const DEFAULT_VERIFIER_MODELS: &[&str] = &["gemini-2.0-flash", "llama-3.3-70b-versatile"];
pub const DEFAULT_EXPLAINER_MODEL: &str = "gemini-2.0-flash";

/// Query suffixes appended to the claim to widen search recall.
pub const DEFAULT_QUERY_SUFFIXES: &[&str] = &["official statement", "fact check", "verification"];

/// Host suffixes dropped before classification.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".cn", ".ru", ".xyz"];

/// Returns the default TTL as a [`Duration`].
pub fn default_cache_ttl() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_TTL_SECS)
}
