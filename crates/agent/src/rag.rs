//! Retrieval-augmented answer generation.
//!
//! # Flow
//!
//! 1. Render the session's conversation history
//! 2. Compose history + current question (+ additional context) into one input
//! 3. Send a single retrieve-and-generate request with the persona template
//! 4. Pull the answer text and citation groups out of the response
//! 5. Resolve the primary source URI to a public URL
//! 6. Record the exchange in the conversation context

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use vaxchecker_config::AppConfig;
use vaxchecker_core::error::{Error, Result};
use vaxchecker_core::resolver::UriToUrlResolver;
use vaxchecker_core::retrieval::{
    Citation, CitationGroup, RetrievalGenerationService, RetrievalRequest, RetrievalResponse,
};
use vaxchecker_memory::ConversationContext;
use vaxchecker_telemetry::{SpanKind, TraceScope};

/// Generation prompt for the knowledge base. `$search_results$`,
/// `$output_format_instructions$` and `$query$` are filled in by the service.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are VAXCHECKER, a vaccine information consultant. If a question is not related to \
vaccines, explain that you only answer vaccine-related questions. Use the following \
information to answer the question accurately and concisely.

Previous conversation and current question: $query$

Context: $search_results$

$output_format_instructions$

Guidelines:
1. Consider the conversation history when answering
2. End with a follow-up question to gather relevant details from the user
3. Keep the answer under three sentences
4. Use a friendly and engaging tone, like a caring doctor
5. Do not add disclaimers or consultation reminders to the body of the response

Answer:";

/// Retrieval identifiers and generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RagSettings {
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub num_results: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompt_template: String,
}

impl RagSettings {
    pub fn new(knowledge_base_id: impl Into<String>, model_arn: impl Into<String>) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.into(),
            model_arn: model_arn.into(),
            num_results: 3,
            temperature: 0.9,
            max_tokens: 1000,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let ids = config.require_rag()?;
        Ok(Self {
            num_results: config.rag.num_results,
            temperature: config.rag.temperature,
            max_tokens: config.rag.max_tokens,
            prompt_template: config
                .rag
                .prompt_template
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            ..Self::new(ids.knowledge_base_id, ids.model_arn)
        })
    }
}

/// Outcome of one orchestrated answer.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub citations: Vec<CitationGroup>,
    pub primary: Citation,
    #[serde(skip)]
    pub raw_response: RetrievalResponse,
}

pub struct RagOrchestrator {
    retrieval: Arc<dyn RetrievalGenerationService>,
    resolver: Arc<dyn UriToUrlResolver>,
    settings: RagSettings,
}

impl RagOrchestrator {
    /// Fails with a configuration error when either identifier is blank.
    pub fn new(
        retrieval: Arc<dyn RetrievalGenerationService>,
        resolver: Arc<dyn UriToUrlResolver>,
        settings: RagSettings,
    ) -> Result<Self> {
        if settings.knowledge_base_id.trim().is_empty() {
            return Err(Error::config("knowledge base id is empty"));
        }
        if settings.model_arn.trim().is_empty() {
            return Err(Error::config("model ARN is empty"));
        }
        Ok(Self {
            retrieval,
            resolver,
            settings,
        })
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Build the request for an already-composed input.
    pub fn build_request(&self, composed_text: String) -> RetrievalRequest {
        RetrievalRequest {
            composed_text,
            knowledge_base_id: self.settings.knowledge_base_id.clone(),
            model_arn: self.settings.model_arn.clone(),
            num_results: self.settings.num_results,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            prompt_template: self.settings.prompt_template.clone(),
        }
    }

    /// Answer `query` in the light of `context`, then record the exchange.
    ///
    /// Collaborator failures propagate unchanged and leave `context` untouched.
    pub async fn answer(
        &self,
        context: &mut ConversationContext,
        query: &str,
        additional_context: Option<&str>,
    ) -> Result<GenerationResult> {
        self.answer_in(context, query, additional_context, None).await
    }

    /// [`answer`](Self::answer), timing the retrieval and URL resolution
    /// phases as their own spans when a trace is given.
    pub async fn answer_in(
        &self,
        context: &mut ConversationContext,
        query: &str,
        additional_context: Option<&str>,
        scope: Option<TraceScope<'_>>,
    ) -> Result<GenerationResult> {
        let composed = compose_input(&context.get_context_string(), query, additional_context);
        let request = self.build_request(composed);
        debug!(
            prior_turns = context.len(),
            input_len = request.composed_text.len(),
            "Prepared retrieve-and-generate request"
        );

        let retrieval = self.retrieval.retrieve_and_generate(&request);
        let response = match scope {
            Some(scope) => {
                scope
                    .instrument(SpanKind::Retrieval, "retrieve_and_generate", retrieval)
                    .await?
            }
            None => retrieval.await?,
        };

        let text = response.output.text.clone();
        let citations = response.citations.clone();
        let source_uri = response.primary_source_uri().to_string();
        let resolved_url = if source_uri.is_empty() {
            String::new()
        } else {
            let resolve = self.resolver.resolve(&source_uri);
            match scope {
                Some(scope) => {
                    scope
                        .time(SpanKind::UrlResolution, "resolve_source_url", resolve)
                        .await
                }
                None => resolve.await,
            }
        };

        context.add_exchange(query, text.clone(), Some(citations.clone()));

        info!(
            citations = citations.len(),
            answer_len = text.len(),
            has_source = !source_uri.is_empty(),
            "Answer generated"
        );

        Ok(GenerationResult {
            text,
            citations,
            primary: Citation {
                source_uri,
                resolved_url,
            },
            raw_response: response,
        })
    }
}

/// `history + "\nCurrent question: " + query`, plus the additional context
/// line when it is non-empty.
pub fn compose_input(history: &str, query: &str, additional_context: Option<&str>) -> String {
    let mut composed = format!("{history}\nCurrent question: {query}");
    if let Some(extra) = additional_context.filter(|s| !s.is_empty()) {
        composed.push_str("\nAdditional context: ");
        composed.push_str(extra);
    }
    composed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{RecordingResolver, StubRetrieval, response_with_citations};
    use vaxchecker_core::error::InvocationError;
    use vaxchecker_telemetry::TelemetryEngine;

    fn orchestrator(retrieval: Arc<StubRetrieval>, resolver: Arc<RecordingResolver>) -> RagOrchestrator {
        RagOrchestrator::new(retrieval, resolver, RagSettings::new("KB123", "arn:model")).unwrap()
    }

    #[test]
    fn compose_without_history() {
        assert_eq!(
            compose_input("", "Is it safe?", None),
            "\nCurrent question: Is it safe?"
        );
    }

    #[test]
    fn compose_with_history_and_extra() {
        let history = "Previous conversation:\nUser: a\nAssistant: b\n";
        assert_eq!(
            compose_input(history, "And boosters?", Some("age 70")),
            "Previous conversation:\nUser: a\nAssistant: b\n\nCurrent question: And boosters?\nAdditional context: age 70"
        );
        assert_eq!(
            compose_input("", "q", Some("")),
            "\nCurrent question: q"
        );
    }

    #[test]
    fn default_template_has_placeholders() {
        for placeholder in ["$search_results$", "$output_format_instructions$", "$query$"] {
            assert!(DEFAULT_PROMPT_TEMPLATE.contains(placeholder), "{placeholder}");
        }
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("VAXCHECKER"));
    }

    #[test]
    fn empty_identifiers_are_configuration_errors() {
        let retrieval = Arc::new(StubRetrieval::answering(RetrievalResponse::default()));
        let resolver = Arc::new(RecordingResolver::default());

        let err = RagOrchestrator::new(retrieval.clone(), resolver.clone(), RagSettings::new("", "arn"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "configuration");

        let err = RagOrchestrator::new(retrieval, resolver, RagSettings::new("KB", " "))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn settings_from_config_require_identifiers() {
        let mut config = AppConfig::default();
        assert_eq!(RagSettings::from_config(&config).err().unwrap().kind(), "configuration");

        config.knowledge_base_id = Some("KB".into());
        config.model_arn = Some("arn".into());
        config.rag.num_results = 5;
        let settings = RagSettings::from_config(&config).unwrap();
        assert_eq!(settings.num_results, 5);
        assert_eq!(settings.prompt_template, DEFAULT_PROMPT_TEMPLATE);
    }

    #[tokio::test]
    async fn answer_extracts_citations_and_primary_url() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations(
            "Wait at least two months between doses.",
            &[&["s3://kb/doc1.pdf", "s3://kb/doc2.pdf"], &["s3://kb/doc3.pdf"]],
        )));
        let resolver = Arc::new(RecordingResolver::with("s3://kb/doc1.pdf", "https://example.org/doc1"));
        let rag = orchestrator(retrieval.clone(), resolver.clone());
        let mut ctx = ConversationContext::default();

        let result = rag
            .answer(&mut ctx, "How long between booster doses?", None)
            .await
            .unwrap();

        assert_eq!(result.text, "Wait at least two months between doses.");
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.primary.source_uri, "s3://kb/doc1.pdf");
        assert_eq!(result.primary.resolved_url, "https://example.org/doc1");
        assert_eq!(resolver.calls(), vec!["s3://kb/doc1.pdf".to_string()]);

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.turns()[0].citations.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn traced_answer_times_retrieval_and_resolution() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations(
            "ok",
            &[&["s3://kb/doc1.pdf"]],
        )));
        let resolver = Arc::new(RecordingResolver::with("s3://kb/doc1.pdf", "https://example.org/doc1"));
        let rag = orchestrator(retrieval, resolver);
        let engine = TelemetryEngine::new();
        let trace_id = engine.start_trace("s1");
        let mut ctx = ConversationContext::default();

        rag.answer_in(&mut ctx, "Is it safe?", None, Some(engine.scope(&trace_id)))
            .await
            .unwrap();

        let trace = engine.get_trace(&trace_id).unwrap();
        assert_eq!(trace.count_of(SpanKind::Retrieval), 1);
        assert_eq!(trace.count_of(SpanKind::UrlResolution), 1);
        assert!(trace.spans.iter().all(|s| s.success == Some(true)));
    }

    #[tokio::test]
    async fn failed_retrieval_span_is_marked_failed() {
        let retrieval = Arc::new(StubRetrieval::failing(InvocationError::Network("reset".into())));
        let resolver = Arc::new(RecordingResolver::default());
        let rag = orchestrator(retrieval, resolver.clone());
        let engine = TelemetryEngine::new();
        let trace_id = engine.start_trace("s1");
        let mut ctx = ConversationContext::default();

        let result = rag
            .answer_in(&mut ctx, "Is it safe?", None, Some(engine.scope(&trace_id)))
            .await;

        assert!(result.is_err());
        let trace = engine.get_trace(&trace_id).unwrap();
        assert_eq!(trace.failed_spans(), 1);
        assert_eq!(trace.count_of(SpanKind::UrlResolution), 0);
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test]
    async fn request_carries_settings_and_history() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations("ok", &[])));
        let rag = orchestrator(retrieval.clone(), Arc::new(RecordingResolver::default()));
        let mut ctx = ConversationContext::default();
        ctx.add_exchange("Is it safe?", "Yes.", None);

        rag.answer(&mut ctx, "For kids too?", Some("child is 6")).await.unwrap();

        let requests = retrieval.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.knowledge_base_id, "KB123");
        assert_eq!(req.model_arn, "arn:model");
        assert_eq!(req.num_results, 3);
        assert_eq!(req.temperature, 0.9);
        assert_eq!(req.max_tokens, 1000);
        assert_eq!(
            req.composed_text,
            "Previous conversation:\nUser: Is it safe?\nAssistant: Yes.\n\nCurrent question: For kids too?\nAdditional context: child is 6"
        );
        assert_eq!(ctx.len(), 2);
    }

    #[tokio::test]
    async fn no_citations_means_empty_primary() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations("ok", &[])));
        let resolver = Arc::new(RecordingResolver::default());
        let rag = orchestrator(retrieval, resolver.clone());
        let mut ctx = ConversationContext::default();

        let result = rag.answer(&mut ctx, "q", None).await.unwrap();

        assert!(result.primary.is_empty());
        assert_eq!(result.primary.resolved_url, "");
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test]
    async fn group_without_references_means_empty_primary() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations("ok", &[&[]])));
        let rag = orchestrator(retrieval, Arc::new(RecordingResolver::default()));
        let result = rag.answer(&mut ConversationContext::default(), "q", None).await.unwrap();
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.primary.source_uri, "");
    }

    #[tokio::test]
    async fn unresolved_uri_keeps_source() {
        let retrieval = Arc::new(StubRetrieval::answering(response_with_citations(
            "ok",
            &[&["s3://kb/unknown.pdf"]],
        )));
        let rag = orchestrator(retrieval, Arc::new(RecordingResolver::default()));
        let result = rag.answer(&mut ConversationContext::default(), "q", None).await.unwrap();
        assert_eq!(result.primary.source_uri, "s3://kb/unknown.pdf");
        assert_eq!(result.primary.resolved_url, "");
    }

    #[tokio::test]
    async fn invocation_error_propagates_and_context_unchanged() {
        let retrieval = Arc::new(StubRetrieval::failing(InvocationError::ApiError {
            status_code: 503,
            message: "unavailable".into(),
        }));
        let rag = orchestrator(retrieval, Arc::new(RecordingResolver::default()));
        let mut ctx = ConversationContext::default();

        let err = rag.answer(&mut ctx, "q", None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Invocation(InvocationError::ApiError { status_code: 503, .. })
        ));
        assert!(ctx.is_empty());
    }
}
