//! Query understanding: rule+model complexity scoring and taxonomy tagging.

pub mod complexity;
pub mod patterns;
pub mod tags;

pub use complexity::{ClassifierSettings, ComplexityClassifier};
pub use patterns::{PatternCategory, PatternSet};
pub use tags::{TagClassifier, parse_tags};

/// Strip surrounding whitespace and an optional Markdown code fence from a
/// model reply, leaving the JSON payload.
pub(crate) fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}
