use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use super::credibility::{CredibilityTable, host_of};
use crate::constants::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_EXCLUDED_SUFFIXES, DEFAULT_QUERY_SUFFIXES, MAX_EVIDENCE,
    RESULTS_PER_QUERY, SNIPPET_MAX_CHARS,
};
use crate::model::Evidence;
use crate::observability::Telemetry;
use crate::providers::{SearchHit, SearchProvider};

const UNKNOWN_TITLE: &str = "Unknown";

/// Tunables for [`EvidenceAggregator`].
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Appended to the claim, one query per suffix.
    pub query_suffixes: Vec<String>,
    pub results_per_query: usize,
    pub snippet_max_chars: usize,
    pub max_evidence: usize,
    /// Host suffixes dropped before classification (e.g. `.xyz`).
    pub excluded_suffixes: Vec<String>,
    /// Bound on each individual search query.
    pub call_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            query_suffixes: DEFAULT_QUERY_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            results_per_query: RESULTS_PER_QUERY,
            snippet_max_chars: SNIPPET_MAX_CHARS,
            max_evidence: MAX_EVIDENCE,
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

/// Gathers ranked [`Evidence`] for a claim.
#[derive(Clone)]
pub struct EvidenceAggregator {
    search: Arc<dyn SearchProvider>,
    table: CredibilityTable,
    config: AggregatorConfig,
    telemetry: Telemetry,
}

impl EvidenceAggregator {
    pub fn new(search: Arc<dyn SearchProvider>, config: AggregatorConfig, telemetry: Telemetry) -> Self {
        Self {
            search,
            table: CredibilityTable::default(),
            config,
            telemetry,
        }
    }

    pub fn with_table(mut self, table: CredibilityTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Query variants issued for `claim`, in order.
    pub fn queries(&self, claim: &str) -> Vec<String> {
        self.config
            .query_suffixes
            .iter()
            .map(|suffix| format!("{} {}", claim, suffix))
            .collect()
    }

    /// Runs every query variant concurrently and ranks the merged hits.
    ///
    /// Never fails: a query that errors or times out contributes nothing.
    #[instrument(skip(self), fields(claim_len = claim.len()))]
    pub async fn gather(&self, claim: &str) -> Vec<Evidence> {
        let mut span = self.telemetry.span("evidence_gathering");

        let queries = self.queries(claim);
        let batches = join_all(queries.iter().map(|q| self.run_query(q))).await;
        let evidence = self.rank(batches);

        span.tag("queries", queries.len());
        span.tag("evidence", evidence.len());
        span.succeed();
        evidence
    }

    async fn run_query(&self, query: &str) -> Vec<SearchHit> {
        let search = self
            .search
            .search(query, self.config.results_per_query);

        match tokio::time::timeout(self.config.call_timeout, search).await {
            Ok(Ok(hits)) => {
                debug!(query = query, hits = hits.len(), "Search query completed");
                hits
            }
            Ok(Err(e)) => {
                warn!(query = query, error = %e, "Search query failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    query = query,
                    timeout_ms = self.config.call_timeout.as_millis() as u64,
                    "Search query timed out"
                );
                Vec::new()
            }
        }
    }

    /// Deduplicates by URL (first sight wins), filters, classifies and sorts by tier.
    pub fn rank(&self, batches: Vec<Vec<SearchHit>>) -> Vec<Evidence> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut evidence = Vec::new();

        for hit in batches.into_iter().flatten() {
            let url = hit.url.trim();
            if url.is_empty() || !seen.insert(url.to_string()) {
                continue;
            }

            let Some(host) = host_of(url) else {
                debug!(url = url, "Skipping hit without a host");
                continue;
            };

            if self.is_excluded(&host) {
                debug!(host = %host, "Skipping excluded host");
                continue;
            }

            let title = hit.title.trim();
            evidence.push(Evidence {
                title: if title.is_empty() {
                    UNKNOWN_TITLE.to_string()
                } else {
                    title.to_string()
                },
                url: url.to_string(),
                snippet: truncate_chars(hit.body.trim(), self.config.snippet_max_chars),
                credibility: self.table.classify(&host),
            });
        }

        // Vec::sort_by_key is stable: discovery order survives within a tier.
        evidence.sort_by_key(|e| e.credibility);
        evidence.truncate(self.config.max_evidence);
        evidence
    }

    fn is_excluded(&self, host: &str) -> bool {
        self.config
            .excluded_suffixes
            .iter()
            .any(|suffix| host.ends_with(suffix.as_str()))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
