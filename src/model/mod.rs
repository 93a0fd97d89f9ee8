//! Domain types shared by the aggregation, consensus and cache layers.

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict reached by a single backend or by consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    True,
    False,
    Misleading,
    Unverified,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [
        Verdict::True,
        Verdict::False,
        Verdict::Misleading,
        Verdict::Unverified,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Misleading => "MISLEADING",
            Verdict::Unverified => "UNVERIFIED",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRUE" => Ok(Verdict::True),
            "FALSE" => Ok(Verdict::False),
            "MISLEADING" => Ok(Verdict::Misleading),
            "UNVERIFIED" => Ok(Verdict::Unverified),
            _ => Err(format!("unknown verdict: {}", s)),
        }
    }
}

/// Source credibility tier. Ordering is by ascending risk: `High < Medium < Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Credibility {
    High,
    #[default]
    Medium,
    Low,
}

impl Credibility {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Credibility::High => "high",
            Credibility::Medium => "medium",
            Credibility::Low => "low",
        }
    }
}

impl fmt::Display for Credibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered source supporting or refuting a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub title: String,
    /// Unique within one aggregation run.
    pub url: String,
    pub snippet: String,
    pub credibility: Credibility,
}

/// One backend's independent judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendVerdict {
    pub backend_name: String,
    pub verdict: Verdict,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub reasoning: String,
}

/// The unit of work and the cache value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    pub claim: String,
    pub final_verdict: Verdict,
    pub confidence: f64,
    pub explanation: String,
    /// Successful backend verdicts in call order.
    #[serde(default)]
    pub backend_verdicts: Vec<BackendVerdict>,
    #[serde(default)]
    pub sources: Vec<Evidence>,
    /// When the analysis ran (not when it was read back).
    pub analyzed_at: DateTime<Utc>,
    /// `true` only when served by the memory store.
    #[serde(default)]
    pub cached: bool,
}

impl ClaimAnalysis {
    /// Terminal `UNVERIFIED` result with zero confidence.
    pub fn unverified(claim: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            final_verdict: Verdict::Unverified,
            confidence: 0.0,
            explanation: explanation.into(),
            backend_verdicts: Vec::new(),
            sources: Vec::new(),
            analyzed_at: Utc::now(),
            cached: false,
        }
    }
}

/// HTTP request body for `POST /analyze`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisRequest {
    pub claim: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// HTTP response body for `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: ClaimAnalysis,
    /// Wall-clock seconds spent serving the request.
    pub processing_time: f64,
    pub cached: bool,
}
