//! Top-level claim analysis.
//!
//! `memory lookup -> evidence -> consensus -> explanation -> memory write`.
//! Concurrent requests for the same claim share one in-flight computation.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::consensus::ConsensusEngine;
use crate::constants::STORED_SOURCES;
use crate::evidence::EvidenceAggregator;
use crate::explain::Explainer;
use crate::hashing::{ClaimKey, normalize_claim};
use crate::memory::MemoryStore;
use crate::model::ClaimAnalysis;
use crate::observability::Telemetry;

/// Explanation returned when the search capability found nothing usable.
pub const NO_EVIDENCE_EXPLANATION: &str = "Unable to find sufficient evidence to verify this claim.";

type InFlight = Shared<BoxFuture<'static, ClaimAnalysis>>;

struct Components {
    evidence: EvidenceAggregator,
    consensus: ConsensusEngine,
    explainer: Explainer,
    memory: MemoryStore,
    telemetry: Telemetry,
    stored_sources: usize,
    in_flight: Mutex<HashMap<ClaimKey, InFlight>>,
}

/// Orchestrates one analysis per claim. Cheap to clone.
#[derive(Clone)]
pub struct Analyzer {
    inner: Arc<Components>,
}

impl Analyzer {
    pub fn new(
        evidence: EvidenceAggregator,
        consensus: ConsensusEngine,
        explainer: Explainer,
        memory: MemoryStore,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            inner: Arc::new(Components {
                evidence,
                consensus,
                explainer,
                memory,
                telemetry,
                stored_sources: STORED_SOURCES,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner.memory
    }

    /// Number of claims currently being computed.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// Analyzes `claim`, serving from the memory store when possible.
    ///
    /// Always returns a well-formed analysis. The computation runs on its own task:
    /// dropping this future does not cancel it, so an abandoned request still
    /// completes and warms the cache.
    #[instrument(skip(self, claim), fields(claim_len = claim.len()))]
    pub async fn analyze(&self, claim: &str) -> ClaimAnalysis {
        let mut span = self.inner.telemetry.span("coordination");
        let claim = normalize_claim(claim);
        let key = ClaimKey::from_claim(&claim);
        span.tag("key", key);

        if let Some(latest) = self
            .inner
            .memory
            .get_by_key(key)
            .await
            .and_then(|mut hits| hits.pop())
        {
            info!(key = %key, "Served from memory");
            span.tag("cached", true);
            span.succeed();
            return latest;
        }

        let computation = self.join_or_start(key, claim);
        let analysis = computation.await;

        span.tag("cached", false);
        span.tag("verdict", analysis.final_verdict);
        span.succeed();
        analysis
    }

    fn join_or_start(&self, key: ClaimKey, claim: String) -> InFlight {
        let mut in_flight = self.inner.in_flight.lock();

        if let Some(existing) = in_flight.get(&key) {
            debug!(key = %key, "Joining in-flight analysis");
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let fallback_claim = claim.clone();
        let task = tokio::spawn(async move {
            let analysis = inner.compute(key, &claim).await;
            // removed only after the cache write, so later callers hit memory
            inner.in_flight.lock().remove(&key);
            analysis
        });

        let shared = async move {
            match task.await {
                Ok(analysis) => analysis,
                Err(e) => {
                    error!(error = %e, "Analysis task failed");
                    ClaimAnalysis::unverified(fallback_claim, "Analysis failed unexpectedly.")
                }
            }
        }
        .boxed()
        .shared();

        in_flight.insert(key, shared.clone());
        shared
    }
}

impl Components {
    /// Runs the miss path. Only analyses backed by at least one verifier are
    /// cached: no-evidence and all-backends-failed results are returned without
    /// an explainer call and without a cache write, so the next request retries.
    async fn compute(&self, key: ClaimKey, claim: &str) -> ClaimAnalysis {
        let evidence = self.evidence.gather(claim).await;
        if evidence.is_empty() {
            warn!(key = %key, "No evidence found");
            return ClaimAnalysis::unverified(claim, NO_EVIDENCE_EXPLANATION);
        }

        let verification = self.consensus.verify(claim, &evidence).await;
        let sources: Vec<_> = evidence.into_iter().take(self.stored_sources).collect();

        if verification.all_failed() {
            warn!(key = %key, "Every verifier backend failed");
            return ClaimAnalysis {
                sources,
                ..ClaimAnalysis::unverified(claim, verification.consensus.reasoning)
            };
        }

        let consensus = verification.consensus;
        let explanation = self
            .explainer
            .explain(claim, consensus.verdict, &consensus.reasoning, &sources)
            .await;

        let analysis = ClaimAnalysis {
            claim: claim.to_string(),
            final_verdict: consensus.verdict,
            confidence: consensus.confidence,
            explanation,
            backend_verdicts: verification.backend_verdicts,
            sources,
            analyzed_at: Utc::now(),
            cached: false,
        };

        if let Err(e) = self
            .memory
            .put_by_key(key, claim, vec![analysis.clone()])
            .await
        {
            warn!(key = %key, error = %e, "Cache write dropped");
        }

        info!(
            key = %key,
            verdict = %analysis.final_verdict,
            confidence = analysis.confidence,
            "Analysis complete"
        );
        analysis
    }
}
