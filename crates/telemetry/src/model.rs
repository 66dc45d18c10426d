//! Data model for timing traces, spans and latency summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Span ──────────────────────────────────────────────────────────────────

/// The kind of work a span represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Rule-based or model-assisted classification.
    Classification,
    /// A completion model call.
    Completion,
    /// A retrieve-and-generate call.
    Retrieval,
    /// Source URI → URL lookup.
    UrlResolution,
    /// A question record write.
    RecordWrite,
    /// Top-level request (query in → response out).
    Turn,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classification => write!(f, "classification"),
            Self::Completion => write!(f, "completion"),
            Self::Retrieval => write!(f, "retrieval"),
            Self::UrlResolution => write!(f, "url_resolution"),
            Self::RecordWrite => write!(f, "record_write"),
            Self::Turn => write!(f, "turn"),
        }
    }
}

/// A single timed execution unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    pub kind: SpanKind,
    /// Operation name (e.g. `classify_complexity`).
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Computed on end.
    pub duration_ms: Option<u64>,
    pub success: Option<bool>,
}

impl Span {
    pub fn new(kind: SpanKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            success: None,
        }
    }

    /// Mark the span as ended with the given success status.
    pub fn end(&mut self, success: bool) {
        let now = Utc::now();
        self.ended_at = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
        self.success = Some(success);
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }
}

// ── Trace ─────────────────────────────────────────────────────────────────

/// The spans of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,
    /// Session id, or a fixed label for stateless operations.
    pub session_id: String,
    pub spans: Vec<Span>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Trace {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            spans: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn add_span(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn end(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    /// Sum of span durations in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.spans.iter().filter_map(|s| s.duration_ms).sum()
    }

    pub fn count_of(&self, kind: SpanKind) -> usize {
        self.spans.iter().filter(|s| s.kind == kind).count()
    }

    pub fn failed_spans(&self) -> usize {
        self.spans.iter().filter(|s| s.success == Some(false)).count()
    }
}

// ── Aggregated views ──────────────────────────────────────────────────────

/// Latency statistics for one span label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyStat {
    pub label: String,
    pub kind: SpanKind,
    pub calls: u64,
    pub failures: u64,
    pub total_ms: u64,
    pub max_ms: u64,
}

impl LatencyStat {
    pub fn mean_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.calls as f64
        }
    }
}
