//! Thread-safe telemetry engine: collects spans, keeps a bounded window of
//! traces and serves latency summaries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use crate::TelemetryError;
use crate::model::*;

const DEFAULT_MAX_TRACES: usize = 5_000;

/// The core telemetry engine.
///
/// Thread-safe via `RwLock`. A poisoned lock is recovered rather than
/// propagated: timing data is never worth failing a request over.
pub struct TelemetryEngine {
    /// All recorded traces (most recent last).
    traces: RwLock<Vec<Trace>>,
    max_traces: usize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self::with_max_traces(DEFAULT_MAX_TRACES)
    }

    /// Keep at most `max_traces` traces; the oldest finished ones go first.
    pub fn with_max_traces(max_traces: usize) -> Self {
        Self {
            traces: RwLock::new(Vec::new()),
            max_traces: max_traces.max(1),
        }
    }

    // ── Trace management ──────────────────────────────────────────────

    /// Start a new trace for one request.
    pub fn start_trace(&self, session_id: impl Into<String>) -> String {
        let trace = Trace::new(session_id);
        let id = trace.id.clone();
        let mut traces = write(&self.traces);

        if traces.len() >= self.max_traces {
            let drain_count = (self.max_traces / 10).max(1);
            let mut removed = 0;
            traces.retain(|t| {
                if removed >= drain_count || t.ended_at.is_none() {
                    return true;
                }
                removed += 1;
                false
            });
        }

        traces.push(trace);
        id
    }

    pub fn end_trace(&self, trace_id: &str) {
        let mut traces = write(&self.traces);
        if let Some(trace) = traces.iter_mut().find(|t| t.id == trace_id) {
            trace.end();
        }
    }

    /// Record a completed span in a trace. Unknown trace ids are ignored.
    pub fn record_span(&self, trace_id: &str, span: Span) {
        let mut traces = write(&self.traces);
        if let Some(trace) = traces.iter_mut().find(|t| t.id == trace_id) {
            trace.add_span(span);
        }
    }

    // ── Middleware ────────────────────────────────────────────────────

    /// Time a fallible operation.
    ///
    /// Starts a span, awaits `operation`, ends the span with the result's
    /// success flag, records it under `trace_id` and logs the duration.
    /// The result is returned untouched.
    pub async fn instrument<T, E, F>(
        &self,
        trace_id: &str,
        kind: SpanKind,
        label: &str,
        operation: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let mut span = Span::new(kind, label);
        let result = operation.await;
        span.end(result.is_ok());
        debug!("{label} took {}ms", span.duration_ms.unwrap_or(0));
        self.record_span(trace_id, span);
        result
    }

    /// Time an infallible operation.
    pub async fn time<T, F>(&self, trace_id: &str, kind: SpanKind, label: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut span = Span::new(kind, label);
        let value = operation.await;
        span.end(true);
        debug!("{label} took {}ms", span.duration_ms.unwrap_or(0));
        self.record_span(trace_id, span);
        value
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn get_trace(&self, trace_id: &str) -> Option<Trace> {
        read(&self.traces).iter().find(|t| t.id == trace_id).cloned()
    }

    /// Most recent first.
    pub fn recent_traces(&self, limit: usize) -> Vec<Trace> {
        read(&self.traces).iter().rev().take(limit).cloned().collect()
    }

    pub fn traces_for_session(&self, session_id: &str) -> Vec<Trace> {
        read(&self.traces)
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn trace_count(&self) -> usize {
        read(&self.traces).len()
    }

    /// Serialize one trace as pretty JSON.
    pub fn export_trace(&self, trace_id: &str) -> Result<String, TelemetryError> {
        let trace = self
            .get_trace(trace_id)
            .ok_or_else(|| TelemetryError::UnknownTrace(trace_id.to_string()))?;
        Ok(serde_json::to_string_pretty(&trace)?)
    }

    /// Per-label latency statistics over all finished spans, sorted by label.
    pub fn latency_summary(&self) -> Vec<LatencyStat> {
        let traces = read(&self.traces);
        let mut by_label: HashMap<&str, LatencyStat> = HashMap::new();

        for span in traces.iter().flat_map(|t| t.spans.iter()) {
            let Some(ms) = span.duration_ms else {
                continue;
            };
            let stat = by_label.entry(span.label.as_str()).or_insert_with(|| LatencyStat {
                label: span.label.clone(),
                kind: span.kind,
                calls: 0,
                failures: 0,
                total_ms: 0,
                max_ms: 0,
            });
            stat.calls += 1;
            stat.total_ms += ms;
            stat.max_ms = stat.max_ms.max(ms);
            if span.success == Some(false) {
                stat.failures += 1;
            }
        }

        let mut stats: Vec<LatencyStat> = by_label.into_values().collect();
        stats.sort_by(|a, b| a.label.cmp(&b.label));
        stats
    }

    /// Prune traces started before `cutoff`.
    pub fn prune_before(&self, cutoff: chrono::DateTime<Utc>) -> usize {
        let mut traces = write(&self.traces);
        let before = traces.len();
        traces.retain(|t| t.started_at >= cutoff);
        before - traces.len()
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A trace id bound to its engine.
///
/// Handed to components that time their own phases, so they can record
/// spans without knowing how traces are managed.
#[derive(Clone, Copy)]
pub struct TraceScope<'a> {
    engine: &'a TelemetryEngine,
    trace_id: &'a str,
}

impl TelemetryEngine {
    pub fn scope<'a>(&'a self, trace_id: &'a str) -> TraceScope<'a> {
        TraceScope {
            engine: self,
            trace_id,
        }
    }
}

impl TraceScope<'_> {
    pub fn trace_id(&self) -> &str {
        self.trace_id
    }

    /// [`TelemetryEngine::instrument`] within this trace.
    pub async fn instrument<T, E, F>(&self, kind: SpanKind, label: &str, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.engine.instrument(self.trace_id, kind, label, operation).await
    }

    /// [`TelemetryEngine::time`] within this trace.
    pub async fn time<T, F>(&self, kind: SpanKind, label: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        self.engine.time(self.trace_id, kind, label, operation).await
    }
}
