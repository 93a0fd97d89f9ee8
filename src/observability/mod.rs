//! Explicit telemetry context.
//!
//! Components receive a [`Telemetry`] at construction instead of reaching for a
//! process-wide tracer. A unit of work is wrapped with [`Telemetry::span`]; the
//! returned [`SpanGuard`] reports to the sink when dropped, on every exit path,
//! whether the surrounding code is sync or async.

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Outcome recorded for a finished span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::Error => "error",
        }
    }
}

/// A completed span.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub operation: &'static str,
    pub span_id: String,
    pub duration: Duration,
    pub status: SpanStatus,
    pub tags: Vec<(&'static str, String)>,
}

/// Destination for completed spans.
pub trait SpanSink: Send + Sync {
    fn record(&self, span: SpanRecord);
}

/// Logs completed spans through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SpanSink for TracingSink {
    fn record(&self, span: SpanRecord) {
        let duration_ms = span.duration.as_secs_f64() * 1000.0;
        let tags = span
            .tags
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");

        match span.status {
            SpanStatus::Ok => info!(
                operation = span.operation,
                span_id = %span.span_id,
                duration_ms = duration_ms,
                tags = %tags,
                "Span completed"
            ),
            SpanStatus::Error => warn!(
                operation = span.operation,
                span_id = %span.span_id,
                duration_ms = duration_ms,
                tags = %tags,
                "Span failed"
            ),
        }
    }
}

/// Shared handle to a span sink.
#[derive(Clone)]
pub struct Telemetry {
    sink: Arc<dyn SpanSink>,
}

impl Telemetry {
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self { sink }
    }

    /// Telemetry that logs through `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Opens a span. It is reported as failed unless [`SpanGuard::succeed`] is called.
    pub fn span(&self, operation: &'static str) -> SpanGuard {
        let id = uuid::Uuid::new_v4().simple().to_string();
        SpanGuard {
            sink: Arc::clone(&self.sink),
            operation,
            span_id: id[..8].to_string(),
            start: Instant::now(),
            status: SpanStatus::Error,
            tags: Vec::new(),
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

/// Scoped span; records itself on drop.
pub struct SpanGuard {
    sink: Arc<dyn SpanSink>,
    operation: &'static str,
    span_id: String,
    start: Instant,
    status: SpanStatus,
    tags: Vec<(&'static str, String)>,
}

impl SpanGuard {
    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn tag(&mut self, key: &'static str, value: impl Display) {
        self.tags.push((key, value.to_string()));
    }

    pub fn succeed(&mut self) {
        self.status = SpanStatus::Ok;
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.sink.record(SpanRecord {
            operation: self.operation,
            span_id: std::mem::take(&mut self.span_id),
            duration: self.start.elapsed(),
            status: self.status,
            tags: std::mem::take(&mut self.tags),
        });
    }
}

#[cfg(any(test, feature = "mock"))]
/// Sink that keeps every record in memory.
#[derive(Default)]
pub struct RecordingSink {
    records: parking_lot::Mutex<Vec<SpanRecord>>,
}

#[cfg(any(test, feature = "mock"))]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SpanRecord> {
        self.records.lock().clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.records.lock().iter().map(|r| r.operation).collect()
    }
}

#[cfg(any(test, feature = "mock"))]
impl SpanSink for RecordingSink {
    fn record(&self, span: SpanRecord) {
        self.records.lock().push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (Arc<RecordingSink>, Telemetry) {
        let sink = Arc::new(RecordingSink::new());
        let telemetry = Telemetry::new(sink.clone());
        (sink, telemetry)
    }

    #[test]
    fn test_span_records_success() {
        let (sink, telemetry) = recording();
        {
            let mut span = telemetry.span("unit");
            span.tag("items", 3);
            span.succeed();
        }

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "unit");
        assert_eq!(records[0].status, SpanStatus::Ok);
        assert_eq!(records[0].tags, vec![("items", "3".to_string())]);
        assert_eq!(records[0].span_id.len(), 8);
    }

    #[test]
    fn test_span_defaults_to_error_on_early_exit() {
        let (sink, telemetry) = recording();

        fn fallible(telemetry: &Telemetry) -> Result<(), &'static str> {
            let mut span = telemetry.span("fallible");
            Err::<(), _>("early")?;
            span.succeed();
            Ok(())
        }

        assert!(fallible(&telemetry).is_err());
        assert_eq!(sink.records()[0].status, SpanStatus::Error);
    }

    #[tokio::test]
    async fn test_span_held_across_await() {
        let (sink, telemetry) = recording();

        let task = tokio::spawn({
            let telemetry = telemetry.clone();
            async move {
                let mut span = telemetry.span("async");
                tokio::task::yield_now().await;
                span.succeed();
            }
        });
        task.await.unwrap();

        assert_eq!(sink.operations(), vec!["async"]);
    }

    #[test]
    fn test_span_ids_are_distinct() {
        let telemetry = Telemetry::tracing();
        let a = telemetry.span("a");
        let b = telemetry.span("b");
        assert_ne!(a.span_id(), b.span_id());
    }
}
