use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::parse::{ParseError, parse_backend_output};
use super::{Consensus, reach_consensus};
use crate::constants::{DEFAULT_CALL_TIMEOUT_SECS, PROMPT_EVIDENCE};
use crate::model::{BackendVerdict, Evidence};
use crate::observability::Telemetry;
use crate::providers::{CompletionProvider, ProviderError};
use crate::retry::RetryPolicy;

const NO_EVIDENCE: &str = "No evidence found.";

/// Failure of one backend call. Never escapes [`ConsensusEngine::verify`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("unparseable reply: {0}")]
    Parse(#[from] ParseError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Output of [`ConsensusEngine::verify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub consensus: Consensus,
    /// Successful verdicts in backend call order; empty when every backend failed.
    pub backend_verdicts: Vec<BackendVerdict>,
}

impl Verification {
    pub fn all_failed(&self) -> bool {
        self.backend_verdicts.is_empty()
    }
}

/// Runs every verifier backend concurrently and reduces their verdicts.
#[derive(Clone)]
pub struct ConsensusEngine {
    backends: Vec<Arc<dyn CompletionProvider>>,
    retry: RetryPolicy,
    call_timeout: Duration,
    prompt_evidence: usize,
    telemetry: Telemetry,
}

impl ConsensusEngine {
    pub fn new(backends: Vec<Arc<dyn CompletionProvider>>, telemetry: Telemetry) -> Self {
        Self {
            backends,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            prompt_evidence: PROMPT_EVIDENCE,
            telemetry,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound on one backend call, retries included.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Asks every backend and waits for all of them to settle.
    ///
    /// Backend failures only shrink the vote; zero survivors yields
    /// [`Consensus::unverified`].
    #[instrument(skip(self, evidence), fields(backends = self.backends.len(), evidence = evidence.len()))]
    pub async fn verify(&self, claim: &str, evidence: &[Evidence]) -> Verification {
        let mut span = self.telemetry.span("fact_checking");

        let prompt = build_prompt(claim, &format_evidence(evidence, self.prompt_evidence));
        let results = join_all(
            self.backends
                .iter()
                .map(|backend| self.call_backend(backend.as_ref(), &prompt)),
        )
        .await;

        let mut backend_verdicts = Vec::with_capacity(results.len());
        for (backend, result) in self.backends.iter().zip(results) {
            match result {
                Ok(verdict) => backend_verdicts.push(verdict),
                Err(e) => warn!(backend = backend.name(), error = %e, "Verifier backend failed"),
            }
        }

        let consensus = reach_consensus(&backend_verdicts);
        info!(
            verdict = %consensus.verdict,
            confidence = consensus.confidence,
            succeeded = backend_verdicts.len(),
            "Consensus reached"
        );

        span.tag("verdict", consensus.verdict);
        span.tag("succeeded", backend_verdicts.len());
        span.succeed();

        Verification {
            consensus,
            backend_verdicts,
        }
    }

    async fn call_backend(
        &self,
        backend: &dyn CompletionProvider,
        prompt: &str,
    ) -> Result<BackendVerdict, BackendError> {
        let attempts = self.retry.run(backend.name(), |attempt| async move {
            debug!(backend = backend.name(), attempt = attempt, "Calling verifier");
            let raw = backend.complete(prompt).await?;
            Ok::<_, BackendError>(parse_backend_output(&raw)?)
        });

        let parsed = tokio::time::timeout(self.call_timeout, attempts)
            .await
            .map_err(|_| BackendError::Timeout(self.call_timeout))??;

        Ok(BackendVerdict {
            backend_name: backend.name().to_string(),
            verdict: parsed.verdict,
            confidence: parsed.confidence,
            reasoning: parsed.reasoning,
        })
    }
}

/// Numbered evidence summary shared by every backend prompt.
pub fn format_evidence(evidence: &[Evidence], limit: usize) -> String {
    if evidence.is_empty() {
        return NO_EVIDENCE.to_string();
    }

    evidence
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{}. [{}] {}\n   {}\n   Source: {}",
                i + 1,
                e.credibility.as_str().to_uppercase(),
                e.title,
                e.snippet,
                e.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_prompt(claim: &str, evidence: &str) -> String {
    let mut prompt = String::with_capacity(1024 + evidence.len());
    let _ = write!(
        prompt,
        "You are a fact-checking analyst. Judge the claim below using only the evidence provided.\n\n\
         CLAIM: \"{claim}\"\n\n\
         EVIDENCE:\n{evidence}\n\n\
         Choose exactly one verdict:\n\
         - TRUE: confirmed by official sources or several reliable outlets.\n\
         - FALSE: contradicted or debunked by reliable sources.\n\
         - MISLEADING: partly accurate but exaggerated or missing context.\n\
         - UNVERIFIED: no credible evidence either way.\n\n\
         Reply with a single JSON object and nothing else:\n\
         {{\"verdict\": \"TRUE|FALSE|MISLEADING|UNVERIFIED\", \"confidence\": 0.0-1.0, \"reasoning\": \"short justification\"}}"
    );
    prompt
}
