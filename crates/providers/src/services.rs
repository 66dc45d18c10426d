//! Builds the collaborator set from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use vaxchecker_config::{AppConfig, ConfigError};
use vaxchecker_core::completion::CompletionService;
use vaxchecker_core::resolver::UriToUrlResolver;
use vaxchecker_core::retrieval::RetrievalGenerationService;

use crate::bedrock::BedrockCompletion;
use crate::knowledge_base::KnowledgeBaseClient;
use crate::resolver::{NoopResolver, S3TagUrlResolver, StaticUrlResolver};

/// Every external collaborator the agent layer needs.
pub struct Services {
    /// Model used for complexity disambiguation.
    pub classifier: Arc<dyn CompletionService>,
    /// Model used for tag classification.
    pub tagger: Arc<dyn CompletionService>,
    pub retrieval: Arc<dyn RetrievalGenerationService>,
    pub resolver: Arc<dyn UriToUrlResolver>,
}

/// Build HTTP-backed services from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Services, ConfigError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ConfigError::ValidationError(
            "no API key configured (VAXCHECKER_API_KEY or AWS_BEARER_TOKEN_BEDROCK)".into(),
        )
    })?;
    let rag = config.require_rag()?;
    let timeout = Duration::from_secs(config.endpoints.timeout_secs);
    let runtime_url = config.runtime_url();

    let to_config_error = |e: vaxchecker_core::InvocationError| ConfigError::ValidationError(e.to_string());

    let classifier_model = config
        .classifier_model()
        .unwrap_or(rag.model_arn.as_str())
        .to_string();

    let classifier = BedrockCompletion::new(&runtime_url, classifier_model, &api_key, timeout)
        .map_err(to_config_error)?;
    let tagger = BedrockCompletion::new(&runtime_url, &config.tagging.model_id, &api_key, timeout)
        .map_err(to_config_error)?;
    let retrieval = KnowledgeBaseClient::new(config.agent_runtime_url(), &api_key, timeout)
        .map_err(to_config_error)?;

    let resolver: Arc<dyn UriToUrlResolver> = match &config.endpoints.tagging_url {
        Some(url) => Arc::new(S3TagUrlResolver::new(url, timeout).map_err(to_config_error)?),
        None if !config.source_urls.is_empty() => {
            Arc::new(StaticUrlResolver::new(config.source_urls.clone()))
        }
        None => Arc::new(NoopResolver),
    };

    info!(
        classifier = %classifier.model_id(),
        tagger = %tagger.model_id(),
        resolver = %resolver.name(),
        "Services configured"
    );

    Ok(Services {
        classifier: Arc::new(classifier),
        tagger: Arc::new(tagger),
        retrieval: Arc::new(retrieval),
        resolver,
    })
}
