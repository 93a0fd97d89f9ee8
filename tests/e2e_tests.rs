//! End-to-end HTTP tests against a server bound to an ephemeral port.

mod common;

use std::net::SocketAddr;

use tempfile::TempDir;
use tokio::net::TcpListener;

use claimguard::gateway::{AppState, STATUS_HEADER, STATUS_HIT, STATUS_MISS, create_router};
use claimguard::memory::CacheStats;
use claimguard::model::{AnalysisResponse, Credibility, Verdict};
use claimguard::providers::{ScriptedCompletion, StaticSearch};

use common::fixtures::{CLAIM, analyzer, memory, search_hits};

struct TestServer {
    addr: SocketAddr,
    verifiers: Vec<ScriptedCompletion>,
    explainer: ScriptedCompletion,
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn spawn_server(verifiers: Vec<ScriptedCompletion>) -> TestServer {
    let dir = TempDir::new().expect("temp dir");
    let explainer = ScriptedCompletion::replying("explainer", "**FALSE**: it was a con.");

    let analyzer = analyzer(
        memory(&dir, None),
        StaticSearch::returning(search_hits()),
        &verifiers,
        explainer.clone(),
    );
    let app = create_router(AppState::new(analyzer));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    TestServer {
        addr,
        verifiers,
        explainer,
        _dir: dir,
    }
}

fn majority_false() -> Vec<ScriptedCompletion> {
    vec![
        ScriptedCompletion::verdict("alpha", "FALSE", 0.9, "A famous swindle."),
        ScriptedCompletion::verdict("beta", "TRUE", 0.6, "Some reports say sold."),
        ScriptedCompletion::verdict("gamma", "FALSE", 0.7, "Tower still standing."),
    ]
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = spawn_server(majority_false()).await;

    let response = reqwest::get(server.url("/healthz")).await.unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_analyze_reaches_majority_and_caches() {
    let server = spawn_server(majority_false()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/analyze"))
        .json(&serde_json::json!({"claim": CLAIM}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()[STATUS_HEADER], STATUS_MISS);

    let body: AnalysisResponse = response.json().await.unwrap();
    let analysis = &body.analysis;
    assert_eq!(analysis.final_verdict, Verdict::False);
    assert!((analysis.confidence - 0.8).abs() < 1e-9);
    assert_eq!(analysis.backend_verdicts.len(), 3);
    assert_eq!(analysis.sources[0].credibility, Credibility::High);
    assert_eq!(analysis.sources.last().unwrap().credibility, Credibility::Low);
    assert_eq!(analysis.explanation, "**FALSE**: it was a con.");

    let response = client
        .post(server.url("/analyze"))
        .json(&serde_json::json!({"claim": format!("  {}  ", CLAIM.to_uppercase())}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[STATUS_HEADER], STATUS_HIT);
    let body: AnalysisResponse = response.json().await.unwrap();
    assert!(body.cached);

    for verifier in &server.verifiers {
        assert_eq!(verifier.calls(), 1);
    }
    assert_eq!(server.explainer.calls(), 1);

    let stats: CacheStats = client
        .get(server.url("/memory/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_entries, 1);
    assert!(stats.total_accesses >= 1);
}

#[tokio::test]
async fn test_all_verifiers_failing_returns_unverified_uncached() {
    let server = spawn_server(vec![
        ScriptedCompletion::failing("alpha", "quota exceeded"),
        ScriptedCompletion::replying("beta", "I cannot answer that."),
    ])
    .await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .post(server.url("/analyze"))
            .json(&serde_json::json!({"claim": CLAIM}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()[STATUS_HEADER], STATUS_MISS);

        let body: AnalysisResponse = response.json().await.unwrap();
        assert_eq!(body.analysis.final_verdict, Verdict::Unverified);
        assert_eq!(body.analysis.confidence, 0.0);
        assert!(body.analysis.backend_verdicts.is_empty());
    }

    assert_eq!(server.explainer.calls(), 0);
}

#[tokio::test]
async fn test_invalid_body_is_rejected() {
    let server = spawn_server(majority_false()).await;

    let response = reqwest::Client::new()
        .post(server.url("/analyze"))
        .json(&serde_json::json!({"claim": 42}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    for verifier in &server.verifiers {
        assert_eq!(verifier.calls(), 0);
    }
}
