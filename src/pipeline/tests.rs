use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tempfile::TempDir;

use super::*;
use crate::consensus::ALL_BACKENDS_FAILED;
use crate::evidence::AggregatorConfig;
use crate::memory::MemoryConfig;
use crate::model::Verdict;
use crate::providers::{CompletionProvider, ScriptedCompletion, SearchHit, StaticSearch};
use crate::retry::RetryPolicy;

struct Harness {
    analyzer: Analyzer,
    search: StaticSearch,
    explainer: ScriptedCompletion,
    _dir: TempDir,
}

fn hits(n: usize) -> Vec<SearchHit> {
    (0..n)
        .map(|i| SearchHit::new(format!("Story {i}"), format!("https://example.org/{i}"), "text"))
        .collect()
}

fn harness(search: StaticSearch, backends: &[ScriptedCompletion], explainer: ScriptedCompletion) -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let telemetry = Telemetry::default();

    let evidence = EvidenceAggregator::new(
        Arc::new(search.clone()),
        AggregatorConfig::default(),
        telemetry.clone(),
    );
    let backends = backends
        .iter()
        .cloned()
        .map(|b| Arc::new(b) as Arc<dyn CompletionProvider>)
        .collect();
    let consensus = ConsensusEngine::new(backends, telemetry.clone()).with_retry(RetryPolicy::none());
    let explain = Explainer::new(Arc::new(explainer.clone()), telemetry.clone());
    let memory = MemoryStore::open(MemoryConfig::new(dir.path())).expect("open memory");

    Harness {
        analyzer: Analyzer::new(evidence, consensus, explain, memory, telemetry),
        search,
        explainer,
        _dir: dir,
    }
}

fn agreeing_backends() -> Vec<ScriptedCompletion> {
    vec![
        ScriptedCompletion::verdict("a", "FALSE", 0.9, "debunked by police"),
        ScriptedCompletion::verdict("b", "FALSE", 0.7, "no such report"),
    ]
}

#[tokio::test]
async fn test_fresh_analysis_then_cache_hit() {
    let backends = agreeing_backends();
    let h = harness(
        StaticSearch::returning(hits(2)),
        &backends,
        ScriptedCompletion::replying("explainer", "**FALSE**: drill only."),
    );

    let first = h.analyzer.analyze("Bridge  collapsed today").await;

    assert_eq!(first.final_verdict, Verdict::False);
    assert!((first.confidence - 0.8).abs() < 1e-9);
    assert_eq!(first.explanation, "**FALSE**: drill only.");
    assert_eq!(first.claim, "Bridge collapsed today");
    assert_eq!(first.backend_verdicts.len(), 2);
    assert!(!first.cached);

    let second = h.analyzer.analyze("bridge collapsed today ").await;

    assert!(second.cached);
    assert_eq!(second.final_verdict, Verdict::False);
    assert_eq!(second.analyzed_at, first.analyzed_at);
    assert_eq!(backends[0].calls(), 1);
    assert_eq!(h.search.calls(), 3);
}

#[tokio::test]
async fn test_sources_capped_at_five() {
    let h = harness(
        StaticSearch::returning(hits(3)).with_query("c fact check", hits(8)),
        &agreeing_backends(),
        ScriptedCompletion::replying("explainer", "x"),
    );

    let analysis = h.analyzer.analyze("c").await;

    assert_eq!(analysis.sources.len(), 5);
}

#[tokio::test]
async fn test_no_evidence_is_unverified_and_not_cached() {
    let backends = agreeing_backends();
    let h = harness(
        StaticSearch::new(),
        &backends,
        ScriptedCompletion::replying("explainer", "x"),
    );

    let analysis = h.analyzer.analyze("obscure claim").await;

    assert_eq!(analysis.final_verdict, Verdict::Unverified);
    assert_eq!(analysis.confidence, 0.0);
    assert_eq!(analysis.explanation, NO_EVIDENCE_EXPLANATION);
    assert!(analysis.sources.is_empty());
    assert_eq!(backends[0].calls(), 0);

    h.analyzer.analyze("obscure claim").await;
    assert_eq!(h.search.calls(), 6);
}

#[tokio::test]
async fn test_all_backends_failing_skips_explainer() {
    let h = harness(
        StaticSearch::returning(hits(2)),
        &[
            ScriptedCompletion::failing("a", "503"),
            ScriptedCompletion::replying("b", "not json"),
        ],
        ScriptedCompletion::replying("explainer", "x"),
    );

    let analysis = h.analyzer.analyze("claim").await;

    assert_eq!(analysis.final_verdict, Verdict::Unverified);
    assert_eq!(analysis.confidence, 0.0);
    assert!(analysis.backend_verdicts.is_empty());
    assert_eq!(analysis.explanation, ALL_BACKENDS_FAILED);
    assert_eq!(analysis.sources.len(), 2);
    assert_eq!(h.explainer.calls(), 0);
    assert!(h.analyzer.memory().get("claim").await.is_none());
}

#[tokio::test]
async fn test_explainer_failure_falls_back_to_reasoning() {
    let h = harness(
        StaticSearch::returning(hits(1)),
        &[ScriptedCompletion::verdict("a", "TRUE", 0.6, "confirmed")],
        ScriptedCompletion::failing("explainer", "quota"),
    );

    let analysis = h.analyzer.analyze("claim").await;

    assert_eq!(analysis.final_verdict, Verdict::True);
    assert_eq!(analysis.explanation, "a: confirmed");
}

#[tokio::test]
async fn test_concurrent_identical_requests_compute_once() {
    let backend = ScriptedCompletion::verdict("a", "MISLEADING", 0.5, "context")
        .with_delay(Duration::from_millis(200));
    let h = harness(
        StaticSearch::returning(hits(1)),
        std::slice::from_ref(&backend),
        ScriptedCompletion::replying("explainer", "x"),
    );

    let results = join_all((0..5).map(|_| h.analyzer.analyze("same claim"))).await;

    assert_eq!(backend.calls(), 1);
    assert!(results.iter().all(|a| a.final_verdict == Verdict::Misleading));
    assert_eq!(h.analyzer.in_flight(), 0);
}

#[tokio::test]
async fn test_abandoned_request_still_warms_cache() {
    let backend = ScriptedCompletion::verdict("a", "TRUE", 0.9, "ok")
        .with_delay(Duration::from_millis(200));
    let h = harness(
        StaticSearch::returning(hits(1)),
        std::slice::from_ref(&backend),
        ScriptedCompletion::replying("explainer", "x"),
    );

    let caller = tokio::spawn({
        let analyzer = h.analyzer.clone();
        async move { analyzer.analyze("walk away").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    caller.abort();

    tokio::time::sleep(Duration::from_millis(500)).await;

    let cached = h.analyzer.memory().get("walk away").await;
    assert_eq!(cached.expect("warmed")[0].final_verdict, Verdict::True);
    assert_eq!(backend.calls(), 1);
}
