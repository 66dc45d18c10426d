//! JSON response envelopes printed by `ask`.

use serde_json::{Value, json};
use vaxchecker_agent::AnswerOutcome;
use vaxchecker_core::Error;

pub const ERROR_MESSAGE: &str = "An error occurred while processing the request";

pub fn success(outcome: &AnswerOutcome) -> Value {
    json!({
        "status_code": 200,
        "session_id": outcome.session_id,
        "query": outcome.query,
        "generated_response": outcome.generation.text,
        "s3_location": outcome.generation.primary.source_uri,
        "source_url": outcome.generation.primary.resolved_url,
        "has_context": outcome.has_context,
        "execution_time_ms": outcome.execution_time_ms,
    })
}

pub fn failure(error: &Error) -> Value {
    json!({
        "status_code": 500,
        "error_kind": error.kind(),
        "error": error.to_string(),
        "message": ERROR_MESSAGE,
    })
}
