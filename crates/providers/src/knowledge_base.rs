//! Knowledge-base retrieve-and-generate client.
//!
//! Sends one `retrieveAndGenerate` request per question: vector search over
//! the knowledge base, then generation with the configured model and prompt
//! template. The raw response deserializes straight into
//! [`RetrievalResponse`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use vaxchecker_core::error::InvocationError;
use vaxchecker_core::retrieval::{RetrievalGenerationService, RetrievalRequest, RetrievalResponse};

use crate::http;

/// HTTP client for the knowledge-base runtime.
pub struct KnowledgeBaseClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl KnowledgeBaseClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InvocationError> {
        Ok(Self {
            name: "knowledge_base".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http::build_client(timeout)?,
        })
    }

    /// Build the wire body for a retrieval request.
    fn request_body(request: &RetrievalRequest) -> serde_json::Value {
        serde_json::json!({
            "input": { "text": request.composed_text },
            "retrieveAndGenerateConfiguration": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseConfiguration": {
                    "knowledgeBaseId": request.knowledge_base_id,
                    "modelArn": request.model_arn,
                    "retrievalConfiguration": {
                        "vectorSearchConfiguration": {
                            "numberOfResults": request.num_results
                        }
                    },
                    "generationConfiguration": {
                        "inferenceConfig": {
                            "textInferenceConfig": {
                                "temperature": request.temperature,
                                "maxTokens": request.max_tokens
                            }
                        },
                        "promptTemplate": {
                            "textPromptTemplate": request.prompt_template
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl RetrievalGenerationService for KnowledgeBaseClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResponse, InvocationError> {
        let url = http::join_segments(&self.base_url, &["retrieveAndGenerate"])?;
        let body = Self::request_body(request);

        debug!(
            knowledge_base = %request.knowledge_base_id,
            num_results = request.num_results,
            input_len = request.composed_text.len(),
            "Sending retrieve-and-generate request"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Retrieve-and-generate failed");
            return Err(http::status_error("knowledge_base", status, error_body));
        }

        response.json().await.map_err(|e| InvocationError::ApiError {
            status_code: status,
            message: format!("Failed to parse retrieve-and-generate response: {e}"),
        })
    }
}
