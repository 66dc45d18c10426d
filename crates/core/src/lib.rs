//! # VaxChecker Core
//!
//! Domain types, collaborator traits, and error definitions for the VaxChecker
//! question-answering service. This crate has **no I/O**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion model, knowledge-base
//! retrieve-and-generate, source URL lookup, question persistence) is a trait
//! here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod classification;
pub mod completion;
pub mod error;
pub mod record;
pub mod resolver;
pub mod retrieval;
pub mod taxonomy;

// Re-export key types at crate root for ergonomics
pub use classification::{ClassificationVerdict, QueryType, TagSet};
pub use completion::{CompletionRequest, CompletionService};
pub use error::{Error, InvocationError, RecordError, Result};
pub use record::{QuestionRecord, RecordStore};
pub use resolver::UriToUrlResolver;
pub use retrieval::{
    Citation, CitationGroup, GeneratedOutput, RetrievalGenerationService, RetrievalRequest,
    RetrievalResponse, RetrievedReference,
};
pub use taxonomy::TagTaxonomy;
