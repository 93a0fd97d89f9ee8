//! Structured parsing of free-form verifier output.

use serde_json::Value;
use thiserror::Error;

use crate::model::Verdict;

/// Why a backend reply was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no JSON object found in backend output")]
    NoObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has the wrong type")]
    WrongType { field: &'static str },

    #[error("unknown verdict: {0}")]
    UnknownVerdict(String),

    #[error("confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),
}

/// A validated `{verdict, confidence, reasoning}` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
}

/// Parses a verifier reply.
///
/// Tolerates Markdown code fences and prose around the object; the outermost
/// `{...}` span is decoded. `confidence` may be a number or a numeric string and
/// must be finite and within `[0.0, 1.0]`.
pub fn parse_backend_output(raw: &str) -> Result<ParsedVerdict, ParseError> {
    let body = extract_object(strip_fences(raw)).ok_or(ParseError::NoObject)?;

    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let obj = value.as_object().ok_or(ParseError::NoObject)?;

    let verdict = match obj.get("verdict") {
        None | Some(Value::Null) => return Err(ParseError::MissingField("verdict")),
        Some(Value::String(s)) => s
            .parse::<Verdict>()
            .map_err(|_| ParseError::UnknownVerdict(s.clone()))?,
        Some(_) => return Err(ParseError::WrongType { field: "verdict" }),
    };

    let confidence = match obj.get("confidence") {
        None | Some(Value::Null) => return Err(ParseError::MissingField("confidence")),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or(ParseError::WrongType { field: "confidence" })?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseError::WrongType { field: "confidence" })?,
        Some(_) => return Err(ParseError::WrongType { field: "confidence" }),
    };
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(ParseError::ConfidenceOutOfRange(confidence));
    }

    let reasoning = match obj.get("reasoning") {
        None | Some(Value::Null) => return Err(ParseError::MissingField("reasoning")),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(ParseError::WrongType { field: "reasoning" }),
    };

    Ok(ParsedVerdict {
        verdict,
        confidence,
        reasoning,
    })
}

fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (e.g. `json`) up to the first newline
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
