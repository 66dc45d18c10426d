//! Retrieval-and-generation: request, response, and citation provenance.
//!
//! The response types mirror the knowledge-base wire shape
//! (`output.text`, `citations[].retrievedReferences[].location.s3Location.uri`)
//! so a raw service response deserializes directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InvocationError;

/// A fully-resolved retrieve-and-generate request. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Conversation history + current question (+ additional context).
    pub composed_text: String,
    pub knowledge_base_id: String,
    pub model_arn: String,
    /// Number of passages to retrieve.
    pub num_results: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompt_template: String,
}

/// Raw response of a retrieve-and-generate call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResponse {
    pub output: GeneratedOutput,
    #[serde(default)]
    pub citations: Vec<CitationGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedOutput {
    pub text: String,
}

/// One citation group: a span of generated text and the passages behind it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_response_part: Option<serde_json::Value>,
    #[serde(default)]
    pub retrieved_references: Vec<RetrievedReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub location: ReferenceLocation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLocation {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Location {
    #[serde(default)]
    pub uri: String,
}

impl RetrievedReference {
    /// Reference pointing at an S3 object.
    pub fn s3(uri: impl Into<String>) -> Self {
        Self {
            content: None,
            location: ReferenceLocation {
                kind: Some("S3".into()),
                s3_location: Some(S3Location { uri: uri.into() }),
            },
        }
    }

    /// The S3 URI, if this reference has one.
    pub fn s3_uri(&self) -> Option<&str> {
        self.location
            .s3_location
            .as_ref()
            .map(|l| l.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

impl RetrievalResponse {
    /// URI of the first reference of the first citation group, or `""`.
    pub fn primary_source_uri(&self) -> &str {
        self.citations
            .first()
            .and_then(|group| group.retrieved_references.first())
            .and_then(RetrievedReference::s3_uri)
            .unwrap_or("")
    }
}

/// Primary provenance of a generated answer. Empty fields mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_uri: String,
    pub resolved_url: String,
}

impl Citation {
    pub fn is_empty(&self) -> bool {
        self.source_uri.is_empty()
    }
}

/// The retrieval+generation collaborator.
#[async_trait]
pub trait RetrievalGenerationService: Send + Sync {
    fn name(&self) -> &str;

    /// Retrieve passages and generate a grounded answer in one call.
    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResponse, InvocationError>;
}
