//! Bedrock runtime completion service.
//!
//! Invokes an Anthropic-family model through the runtime `invoke` endpoint:
//!
//! - Bearer-token authentication
//! - `anthropic_version` body field (`bedrock-2023-05-31`)
//! - Single user message, first text block returned

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use vaxchecker_core::completion::{CompletionRequest, CompletionService};
use vaxchecker_core::error::InvocationError;

use crate::http;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_TOP_P: f32 = 0.9;

/// Completion service bound to one model on a Bedrock runtime endpoint.
pub struct BedrockCompletion {
    name: String,
    base_url: String,
    model_id: String,
    api_key: String,
    top_p: f32,
    client: reqwest::Client,
}

impl BedrockCompletion {
    /// Create a client for `model_id` on the given runtime base URL.
    pub fn new(
        base_url: impl Into<String>,
        model_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InvocationError> {
        Ok(Self {
            name: "bedrock".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_id: model_id.into(),
            api_key: api_key.into(),
            top_p: DEFAULT_TOP_P,
            client: http::build_client(timeout)?,
        })
    }

    /// Override the nucleus sampling parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Build the invoke body for a request.
    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "anthropic_version": ANTHROPIC_VERSION,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": self.top_p,
        })
    }

    /// Pull the first text block out of an invoke response.
    fn first_text(response: InvokeResponse) -> Result<String, InvocationError> {
        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or(InvocationError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl CompletionService for BedrockCompletion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: CompletionRequest) -> Result<String, InvocationError> {
        let url = http::join_segments(&self.base_url, &["model", &self.model_id, "invoke"])?;
        let body = self.request_body(&request);

        debug!(model = %self.model_id, max_tokens = request.max_tokens, "Invoking model");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model invocation failed");
            return Err(http::status_error("bedrock", status, error_body));
        }

        let parsed: InvokeResponse = response.json().await.map_err(|e| InvocationError::ApiError {
            status_code: status,
            message: format!("Failed to parse invoke response: {e}"),
        })?;

        Self::first_text(parsed)
    }
}
