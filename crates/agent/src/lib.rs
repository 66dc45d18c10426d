//! Query understanding and answer orchestration for VaxChecker.
//!
//! A request flows through three components:
//!
//! 1. **Complexity classifier**: keyword rules, with a completion model
//!    consulted only for low-confidence COMPLEX verdicts
//! 2. **Tag classifier**: up to five taxonomy labels, validated locally
//! 3. **RAG orchestrator**: conversation history + question in, grounded
//!    answer with citation provenance out
//!
//! [`VaxChecker`] ties them to per-session context, question persistence
//! and timing spans. [`analytics`] summarizes recorded questions by tag.

pub mod analytics;
pub mod classify;
pub mod rag;
pub mod service;

pub use analytics::{TOP_TAGS, TagCount, TagSummary, tag_counts};
pub use classify::{
    ClassifierSettings, ComplexityClassifier, PatternCategory, PatternSet, TagClassifier,
    parse_tags,
};
pub use rag::{
    DEFAULT_PROMPT_TEMPLATE, GenerationResult, RagOrchestrator, RagSettings, compose_input,
};
pub use service::{AnswerOutcome, VaxChecker, open_context_store, open_record_store};

#[cfg(test)]
pub(crate) mod test_helpers;
