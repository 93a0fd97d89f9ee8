//! Explanation Synthesizer.
//!
//! One best-effort call to a completion provider. Any failure, timeout or empty
//! reply degrades to the consensus reasoning, so this step never fails the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::constants::{CITED_SOURCES, DEFAULT_CALL_TIMEOUT_SECS};
use crate::model::{Evidence, Verdict};
use crate::observability::Telemetry;
use crate::providers::CompletionProvider;

#[derive(Clone)]
pub struct Explainer {
    provider: Arc<dyn CompletionProvider>,
    call_timeout: Duration,
    cited_sources: usize,
    telemetry: Telemetry,
}

impl Explainer {
    pub fn new(provider: Arc<dyn CompletionProvider>, telemetry: Telemetry) -> Self {
        Self {
            provider,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            cited_sources: CITED_SOURCES,
            telemetry,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Returns a reader-facing explanation, or `reasoning` unchanged on failure.
    #[instrument(skip_all, fields(provider = self.provider.name(), verdict = %verdict))]
    pub async fn explain(
        &self,
        claim: &str,
        verdict: Verdict,
        reasoning: &str,
        sources: &[Evidence],
    ) -> String {
        let mut span = self.telemetry.span("explanation_generation");
        let prompt = build_prompt(claim, verdict, reasoning, &sources[..sources.len().min(self.cited_sources)]);

        let text = match tokio::time::timeout(self.call_timeout, self.provider.complete(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                warn!("Explanation provider returned empty text, using reasoning");
                return reasoning.to_string();
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Explanation failed, using reasoning");
                return reasoning.to_string();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Explanation timed out, using reasoning"
                );
                return reasoning.to_string();
            }
        };

        span.succeed();
        text
    }
}

fn build_prompt(claim: &str, verdict: Verdict, reasoning: &str, sources: &[Evidence]) -> String {
    let citations = if sources.is_empty() {
        "(none)".to_string()
    } else {
        sources
            .iter()
            .map(|s| format!("- [{}]({})", s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Write a short, clear note for the public about this claim.\n\n\
         Claim: \"{claim}\"\n\
         Verdict: {verdict}\n\
         Analysis: {reasoning}\n\n\
         Top sources:\n{citations}\n\n\
         Guidelines:\n\
         1. Open with the verdict in bold.\n\
         2. Say what the evidence shows and name the authority behind it.\n\
         3. Cite the sources above as Markdown links where relevant.\n\
         4. Keep it under three paragraphs."
    )
}
