//! Timing instrumentation for VaxChecker.
//!
//! Every classifier, retrieval and record-store call runs inside a span.
//! Spans are grouped into traces (one per request) and summarized per label,
//! so the core operations stay free of timing code.

pub mod engine;
pub mod model;

pub use engine::{TelemetryEngine, TraceScope};
pub use model::{LatencyStat, Span, SpanKind, Trace};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("unknown trace id: {0}")]
    UnknownTrace(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
