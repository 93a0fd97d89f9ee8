//! Scripted providers for tests and offline runs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::{CompletionProvider, SearchHit, SearchProvider};

type Reply = Result<String, String>;

/// Completion provider that replays queued replies, then repeats a fallback reply.
#[derive(Clone)]
pub struct ScriptedCompletion {
    name: String,
    queue: Arc<Mutex<VecDeque<Reply>>>,
    fallback: Reply,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedCompletion {
    /// Always answers `text`.
    pub fn replying(name: &str, text: impl Into<String>) -> Self {
        Self::build(name, VecDeque::new(), Ok(text.into()))
    }

    /// Always fails with `message`.
    pub fn failing(name: &str, message: impl Into<String>) -> Self {
        Self::build(name, VecDeque::new(), Err(message.into()))
    }

    /// Replays `replies` in order; once exhausted, repeats the last one.
    pub fn sequence(name: &str, replies: Vec<Reply>) -> Self {
        let fallback = replies
            .last()
            .cloned()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        Self::build(name, replies.into_iter().collect(), fallback)
    }

    /// Replies with a well-formed verdict object.
    pub fn verdict(name: &str, verdict: &str, confidence: f64, reasoning: &str) -> Self {
        let body = serde_json::json!({
            "verdict": verdict,
            "confidence": confidence,
            "reasoning": reasoning,
        });
        Self::replying(name, body.to_string())
    }

    fn build(name: &str, queue: VecDeque<Reply>, fallback: Reply) -> Self {
        Self {
            name: name.to_string(),
            queue: Arc::new(Mutex::new(queue)),
            fallback,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleeps `delay` before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, _prompt: &str) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        reply.map_err(ProviderError::Unavailable)
    }
}

/// Search provider with fixed per-query results.
#[derive(Clone, Default)]
pub struct StaticSearch {
    results: Arc<Mutex<HashMap<String, Vec<SearchHit>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    fallback: Vec<SearchHit>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query (not otherwise scripted) returns `hits`.
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self {
            fallback: hits,
            ..Self::default()
        }
    }

    pub fn with_query(self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results
            .lock()
            .insert(query.to_string(), hits);
        self
    }

    pub fn with_failing_query(self, query: &str) -> Self {
        self.failing
            .lock()
            .insert(query.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, max_results: usize) -> ProviderResult<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(query) {
            return Err(ProviderError::Unavailable(format!("search failed: {}", query)));
        }

        let mut hits = self
            .results
            .lock()
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        hits.truncate(max_results);
        Ok(hits)
    }
}
