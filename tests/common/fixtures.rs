//! Shared builders for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use claimguard::consensus::ConsensusEngine;
use claimguard::evidence::{AggregatorConfig, EvidenceAggregator};
use claimguard::explain::Explainer;
use claimguard::memory::{Clock, MemoryConfig, MemoryStore};
use claimguard::model::{BackendVerdict, ClaimAnalysis, Credibility, Evidence, Verdict};
use claimguard::observability::Telemetry;
use claimguard::pipeline::Analyzer;
use claimguard::providers::{CompletionProvider, ScriptedCompletion, SearchHit, StaticSearch};
use claimguard::retry::RetryPolicy;

pub const CLAIM: &str = "The Eiffel Tower was sold for scrap in 1925";

/// Builder for [`ClaimAnalysis`] values with sensible defaults.
pub struct AnalysisBuilder {
    analysis: ClaimAnalysis,
}

impl AnalysisBuilder {
    pub fn new(claim: &str) -> Self {
        Self {
            analysis: ClaimAnalysis {
                claim: claim.to_string(),
                final_verdict: Verdict::False,
                confidence: 0.85,
                explanation: "**FALSE**: a con artist pretended to sell it.".to_string(),
                backend_verdicts: vec![BackendVerdict {
                    backend_name: "verifier".to_string(),
                    verdict: Verdict::False,
                    confidence: 0.85,
                    reasoning: "Historical con, not an actual sale.".to_string(),
                }],
                sources: vec![Evidence {
                    title: "Victor Lustig".to_string(),
                    url: "https://www.bbc.com/lustig".to_string(),
                    snippet: "Lustig 'sold' the tower twice.".to_string(),
                    credibility: Credibility::High,
                }],
                analyzed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                cached: false,
            },
        }
    }

    pub fn verdict(mut self, verdict: Verdict) -> Self {
        self.analysis.final_verdict = verdict;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.analysis.confidence = confidence;
        self
    }

    pub fn build(self) -> ClaimAnalysis {
        self.analysis
    }
}

pub fn search_hits() -> Vec<SearchHit> {
    vec![
        SearchHit::new("Forum thread", "https://blog.example.net/tower", "It was sold!"),
        SearchHit::new("Victor Lustig", "https://www.bbc.com/lustig", "Lustig 'sold' the tower twice."),
        SearchHit::new("Paris history", "https://example.org/paris", "The tower still stands."),
    ]
}

/// Memory store over `dir`, optionally driven by `clock`.
pub fn memory(dir: &TempDir, clock: Option<Arc<dyn Clock>>) -> MemoryStore {
    let config = MemoryConfig::new(dir.path());
    match clock {
        Some(clock) => MemoryStore::open_with_clock(config, clock).expect("open memory"),
        None => MemoryStore::open(config).expect("open memory"),
    }
}

/// Analyzer wired to scripted providers.
pub fn analyzer(
    memory: MemoryStore,
    search: StaticSearch,
    backends: &[ScriptedCompletion],
    explainer: ScriptedCompletion,
) -> Analyzer {
    let telemetry = Telemetry::default();
    let backends = backends
        .iter()
        .cloned()
        .map(|b| Arc::new(b) as Arc<dyn CompletionProvider>)
        .collect();

    Analyzer::new(
        EvidenceAggregator::new(Arc::new(search), AggregatorConfig::default(), telemetry.clone()),
        ConsensusEngine::new(backends, telemetry.clone()).with_retry(RetryPolicy::none()),
        Explainer::new(Arc::new(explainer), telemetry.clone()),
        memory,
        telemetry,
    )
}
