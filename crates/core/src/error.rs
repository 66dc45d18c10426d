//! Error types for the VaxChecker domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Failures are distinguishable by kind so the entry point can map them
//! to structured responses.

use thiserror::Error;

/// The top-level error type for all VaxChecker operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Collaborator call failures ---
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    // --- Collaborator returned text that failed validation ---
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // --- Question record persistence ---
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable, machine-readable tag for this error's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invocation(_) => "invocation",
            Self::MalformedOutput(_) => "malformed_output",
            Self::Configuration { .. } => "configuration",
            Self::Record(_) => "record",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

/// A call to an external collaborator (completion model, knowledge base) failed.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service not configured: {0}")]
    NotConfigured(String),

    #[error("Service returned no text content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
