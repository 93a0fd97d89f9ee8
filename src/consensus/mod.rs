//! Multi-backend consensus.
//!
//! Every configured verifier sees the same claim and evidence prompt. Failures are
//! local to a backend; survivors are reduced by majority vote (see
//! [`reach_consensus`]).

pub mod engine;
pub mod parse;


pub use engine::{ConsensusEngine, Verification};
pub use parse::{ParseError, ParsedVerdict, parse_backend_output};

use crate::model::{BackendVerdict, Verdict};

/// Reasoning reported when no backend produced a usable verdict.
pub const ALL_BACKENDS_FAILED: &str = "Unable to verify claim - all verifier backends failed";

/// Result of reducing a set of backend verdicts.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
}

impl Consensus {
    /// Terminal outcome for zero successful backends.
    pub fn unverified() -> Self {
        Self {
            verdict: Verdict::Unverified,
            confidence: 0.0,
            reasoning: ALL_BACKENDS_FAILED.to_string(),
        }
    }
}

/// Majority vote over `verdicts` (call order).
///
/// Ties go to the verdict seen first. Confidence is the mean over the agreeing
/// subset only. Pure: identical input always yields identical output.
pub fn reach_consensus(verdicts: &[BackendVerdict]) -> Consensus {
    if verdicts.is_empty() {
        return Consensus::unverified();
    }

    // (verdict, votes) in first-seen order
    let mut tally: Vec<(Verdict, usize)> = Vec::with_capacity(Verdict::ALL.len());
    for v in verdicts {
        match tally.iter_mut().find(|(seen, _)| *seen == v.verdict) {
            Some((_, votes)) => *votes += 1,
            None => tally.push((v.verdict, 1)),
        }
    }

    let mut winner = tally[0];
    for &(verdict, votes) in &tally[1..] {
        if votes > winner.1 {
            winner = (verdict, votes);
        }
    }
    let (verdict, votes) = winner;

    let sum: f64 = verdicts
        .iter()
        .filter(|v| v.verdict == verdict)
        .map(|v| v.confidence)
        .sum();
    let confidence = (sum / votes as f64).clamp(0.0, 1.0);

    let reasoning = verdicts
        .iter()
        .map(|v| format!("{}: {}", v.backend_name, v.reasoning))
        .collect::<Vec<_>>()
        .join("\n\n");

    Consensus {
        verdict,
        confidence,
        reasoning,
    }
}
