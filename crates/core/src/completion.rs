//! CompletionService trait: the abstraction over text-generation backends.
//!
//! A completion service takes a single user prompt plus sampling parameters
//! and returns the first generated text block. The model is a property of
//! the service instance, not of the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InvocationError;

/// Parameters for a single completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }

    /// A deterministic (temperature 0) request.
    pub fn deterministic(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self::new(prompt, 0.0, max_tokens)
    }
}

/// The core completion trait.
///
/// Calls are single-attempt; failures surface as [`InvocationError`] and the
/// caller decides whether to degrade.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Generate text for the prompt and return the first text block.
    async fn invoke(&self, request: CompletionRequest) -> Result<String, InvocationError>;
}
