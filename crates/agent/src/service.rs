//! The VaxChecker service facade.
//!
//! Owns the classifiers, the orchestrator, per-session conversation state,
//! the question record store and the telemetry engine. Every public
//! operation runs inside a telemetry span; the components themselves carry
//! no timing code. With a [`ContextStore`] attached, session history is
//! restored on first use and saved after every turn.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use vaxchecker_config::AppConfig;
use vaxchecker_core::classification::{ClassificationVerdict, TagSet};
use vaxchecker_core::error::{Error, Result};
use vaxchecker_core::record::{QuestionRecord, RecordStore};
use vaxchecker_memory::{
    ContextStore, ConversationContext, InMemoryRecordStore, NoopRecordStore, SessionStore,
    SharedContext, SqliteRecordStore,
};
use vaxchecker_providers::Services;
use vaxchecker_telemetry::{SpanKind, TelemetryEngine};

use crate::classify::{ClassifierSettings, ComplexityClassifier, TagClassifier};
use crate::rag::{GenerationResult, RagOrchestrator, RagSettings};

/// Trace key for stateless classification calls.
const CLASSIFICATION_TRACE: &str = "classification";

/// Result of [`VaxChecker::answer`].
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub session_id: String,
    pub query: String,
    pub generation: GenerationResult,
    /// Whether the session holds conversation history after this turn.
    pub has_context: bool,
    /// Turns of history that were sent along with the question.
    pub prior_turns: usize,
    pub execution_time_ms: u64,
}

pub struct VaxChecker {
    complexity: ComplexityClassifier,
    tags: TagClassifier,
    rag: RagOrchestrator,
    sessions: SessionStore,
    records: Arc<dyn RecordStore>,
    contexts: Option<Arc<dyn ContextStore>>,
    telemetry: Arc<TelemetryEngine>,
}

impl VaxChecker {
    pub fn new(
        complexity: ComplexityClassifier,
        tags: TagClassifier,
        rag: RagOrchestrator,
        sessions: SessionStore,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            complexity,
            tags,
            rag,
            sessions,
            records,
            contexts: None,
            telemetry: Arc::new(TelemetryEngine::new()),
        }
    }

    /// Wire every component from configuration and a set of collaborators.
    pub fn from_config(
        config: &AppConfig,
        services: Services,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self> {
        let complexity = ComplexityClassifier::new(services.classifier)
            .with_settings(ClassifierSettings::from(&config.classifier));
        let tags = TagClassifier::new(services.tagger).with_max_tokens(config.tagging.max_tokens);
        let rag = RagOrchestrator::new(
            services.retrieval,
            services.resolver,
            RagSettings::from_config(config)?,
        )?;
        let max_idle = i64::try_from(config.context.max_idle_seconds)
            .map(Duration::seconds)
            .map_err(|_| Error::config("context.max_idle_seconds is too large"))?;
        let sessions = SessionStore::new(config.context.max_turns, max_idle);

        info!(records = %records.name(), "VaxChecker ready");
        Ok(Self::new(complexity, tags, rag, sessions, records))
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryEngine>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Keep session history in `store` across runs.
    pub fn with_context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.contexts = Some(store);
        self
    }

    pub fn telemetry(&self) -> &Arc<TelemetryEngine> {
        &self.telemetry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Classify a query's type and complexity.
    pub async fn classify_complexity(&self, query: &str) -> ClassificationVerdict {
        let trace_id = self.telemetry.start_trace(CLASSIFICATION_TRACE);
        let verdict = self
            .telemetry
            .time(
                &trace_id,
                SpanKind::Classification,
                "classify_complexity",
                self.complexity.classify(query),
            )
            .await;
        self.telemetry.end_trace(&trace_id);
        verdict
    }

    /// Tag a query and record it. Record failures are logged, not returned.
    pub async fn classify_tags(&self, query: &str) -> TagSet {
        let trace_id = self.telemetry.start_trace(CLASSIFICATION_TRACE);
        let tags = self
            .telemetry
            .time(
                &trace_id,
                SpanKind::Completion,
                "classify_tags",
                self.tags.classify(query),
            )
            .await;

        let record = QuestionRecord::new(query, tags.clone());
        let question_id = record.question_id.clone();
        let stored = self
            .telemetry
            .instrument(
                &trace_id,
                SpanKind::RecordWrite,
                "put_question",
                self.records.put(record),
            )
            .await;
        if let Err(e) = stored {
            warn!(question_id = %question_id, error = %e, "Failed to store question record");
        }

        self.telemetry.end_trace(&trace_id);
        tags
    }

    /// Answer a question within a session.
    ///
    /// With `clear_session`, the session's history is dropped first. Turns of
    /// the same session are serialized by the session lock. Idle sessions are
    /// pruned from memory before the turn starts.
    pub async fn answer(
        &self,
        session_id: &str,
        query: &str,
        clear_session: bool,
        additional_context: Option<&str>,
    ) -> Result<AnswerOutcome> {
        let started = Instant::now();
        let trace_id = self.telemetry.start_trace(session_id);
        self.sessions.prune_idle(Utc::now()).await;

        let shared = self.session(session_id, &trace_id).await;
        let mut context = shared.lock().await;
        if clear_session {
            context.clear();
            info!(session_id, "Conversation context cleared");
        }
        let prior_turns = context.len();

        let generation = self
            .telemetry
            .instrument(
                &trace_id,
                SpanKind::Turn,
                "answer",
                self.rag.answer_in(
                    &mut context,
                    query,
                    additional_context,
                    Some(self.telemetry.scope(&trace_id)),
                ),
            )
            .await;
        if generation.is_ok() || clear_session {
            self.save_context(session_id, &context, &trace_id).await;
        }
        let has_context = !context.is_empty();
        drop(context);
        self.telemetry.end_trace(&trace_id);

        let generation = generation?;
        Ok(AnswerOutcome {
            session_id: session_id.to_string(),
            query: query.to_string(),
            generation,
            has_context,
            prior_turns,
            execution_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// The live context of `session_id`, restored from the context store on
    /// first use. A failed restore starts the session empty.
    async fn session(&self, session_id: &str, trace_id: &str) -> SharedContext {
        if let Some(shared) = self.sessions.get(session_id).await {
            return shared;
        }
        let Some(store) = &self.contexts else {
            return self.sessions.get_or_create(session_id).await;
        };

        let loaded = self
            .telemetry
            .instrument(
                trace_id,
                SpanKind::RecordWrite,
                "load_context",
                store.load(session_id),
            )
            .await;
        match loaded {
            Ok(Some(context)) => self.sessions.adopt(session_id, context).await,
            Ok(None) => self.sessions.get_or_create(session_id).await,
            Err(e) => {
                warn!(session_id, error = %e, "Failed to restore conversation context");
                self.sessions.get_or_create(session_id).await
            }
        }
    }

    async fn save_context(&self, session_id: &str, context: &ConversationContext, trace_id: &str) {
        let Some(store) = &self.contexts else {
            return;
        };
        let saved = self
            .telemetry
            .instrument(
                trace_id,
                SpanKind::RecordWrite,
                "save_context",
                store.save(session_id, context),
            )
            .await;
        if let Err(e) = saved {
            warn!(session_id, error = %e, "Failed to save conversation context");
        }
    }

    /// Drop a session's in-memory state. A stored copy, if any, is kept.
    pub async fn end_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).await
    }
}

/// Open the question record store named by `tagging.record_backend`.
pub async fn open_record_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    match config.tagging.record_backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryRecordStore::new())),
        "none" => Ok(Arc::new(NoopRecordStore)),
        "sqlite" => Ok(Arc::new(open_sqlite(&config.tagging.database_path).await?)),
        other => Err(Error::config(format!("unknown record backend '{other}'"))),
    }
}

/// Open the session history store named by `context.store`.
///
/// `"memory"` keeps history in the process only and yields `None`.
pub async fn open_context_store(config: &AppConfig) -> Result<Option<Arc<dyn ContextStore>>> {
    match config.context.store.as_str() {
        "memory" => Ok(None),
        "sqlite" => Ok(Some(Arc::new(open_sqlite(&config.context.database_path).await?))),
        other => Err(Error::config(format!("unknown context store '{other}'"))),
    }
}

async fn open_sqlite(path: &str) -> Result<SqliteRecordStore> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("cannot create {}: {e}", parent.display())))?;
        }
    }
    Ok(SqliteRecordStore::new(&format!("sqlite://{path}")).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        FailingRecordStore, RecordingResolver, ScriptedCompletion, StubRetrieval,
        response_with_citations,
    };
    use vaxchecker_core::error::InvocationError;
    use vaxchecker_core::retrieval::RetrievalGenerationService;

    fn checker_with(
        tagger_reply: &str,
        retrieval: Arc<dyn RetrievalGenerationService>,
        records: Arc<dyn RecordStore>,
    ) -> VaxChecker {
        let rag = RagOrchestrator::new(
            retrieval,
            Arc::new(RecordingResolver::with("s3://kb/doc1.pdf", "https://example.org/doc1")),
            RagSettings::new("KB123", "arn:model"),
        )
        .unwrap();
        VaxChecker::new(
            ComplexityClassifier::new(Arc::new(ScriptedCompletion::unused())),
            TagClassifier::new(Arc::new(ScriptedCompletion::text(tagger_reply))),
            rag,
            SessionStore::default(),
            records,
        )
    }

    fn answering() -> Arc<dyn RetrievalGenerationService> {
        Arc::new(StubRetrieval::answering(response_with_citations(
            "Yes, it is safe.",
            &[&["s3://kb/doc1.pdf"]],
        )))
    }

    #[tokio::test]
    async fn classify_complexity_is_traced() {
        let checker = checker_with("[]", answering(), Arc::new(InMemoryRecordStore::new()));
        let verdict = checker.classify_complexity("Is the vaccine safe for children?").await;
        assert_eq!(verdict, ClassificationVerdict::broad(1));

        let traces = checker.telemetry().traces_for_session(CLASSIFICATION_TRACE);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].count_of(SpanKind::Classification), 1);
    }

    #[tokio::test]
    async fn classify_tags_records_question() {
        let records = Arc::new(InMemoryRecordStore::new());
        let checker = checker_with(r#"["safety", "children safety"]"#, answering(), records.clone());

        let tags = checker.classify_tags("Is the vaccine safe for children?").await;

        assert_eq!(tags.as_slice(), ["safety", "children safety"]);
        let stored = records.list(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].question, "Is the vaccine safe for children?");
        assert_eq!(stored[0].tags, tags);
        assert!(stored[0].question_id.starts_with("q_"));
    }

    #[tokio::test]
    async fn record_failure_does_not_fail_tagging() {
        let checker = checker_with(r#"["efficacy"]"#, answering(), Arc::new(FailingRecordStore));
        let tags = checker.classify_tags("Does it work?").await;
        assert_eq!(tags.as_slice(), ["efficacy"]);

        let summary = checker.telemetry().latency_summary();
        let put = summary.iter().find(|s| s.label == "put_question").unwrap();
        assert_eq!(put.failures, 1);
    }

    #[tokio::test]
    async fn answer_accumulates_session_context() {
        let checker = checker_with("[]", answering(), Arc::new(NoopRecordStore));

        let first = checker.answer("s1", "Is it safe?", false, None).await.unwrap();
        assert_eq!(first.prior_turns, 0);
        assert!(first.has_context);
        assert_eq!(first.generation.primary.resolved_url, "https://example.org/doc1");

        let second = checker.answer("s1", "For kids?", false, None).await.unwrap();
        assert_eq!(second.prior_turns, 1);

        let other = checker.answer("s2", "Hello", false, None).await.unwrap();
        assert_eq!(other.prior_turns, 0);
    }

    #[tokio::test]
    async fn clear_session_drops_history_first() {
        let checker = checker_with("[]", answering(), Arc::new(NoopRecordStore));
        checker.answer("s1", "q1", false, None).await.unwrap();
        checker.answer("s1", "q2", false, None).await.unwrap();

        let cleared = checker.answer("s1", "q3", true, None).await.unwrap();
        assert_eq!(cleared.prior_turns, 0);

        let ctx = checker.sessions().get("s1").await.unwrap();
        assert_eq!(ctx.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn answer_failure_is_returned_and_traced() {
        let failing: Arc<dyn RetrievalGenerationService> =
            Arc::new(StubRetrieval::failing(InvocationError::Network("reset".into())));
        let checker = checker_with("[]", failing, Arc::new(NoopRecordStore));

        let err = checker.answer("s1", "q", false, None).await.unwrap_err();
        assert_eq!(err.kind(), "invocation");

        let traces = checker.telemetry().traces_for_session("s1");
        assert_eq!(traces[0].failed_spans(), 2);
        assert_eq!(traces[0].count_of(SpanKind::Retrieval), 1);
        assert!(traces[0].ended_at.is_some());
    }

    #[tokio::test]
    async fn back_to_back_tagging_keeps_every_record() {
        let records = Arc::new(InMemoryRecordStore::new());
        let replies = (0..50).map(|_| Ok(r#"["safety"]"#.to_string())).collect();
        let rag = RagOrchestrator::new(
            answering(),
            Arc::new(RecordingResolver::default()),
            RagSettings::new("KB123", "arn:model"),
        )
        .unwrap();
        let checker = VaxChecker::new(
            ComplexityClassifier::new(Arc::new(ScriptedCompletion::unused())),
            TagClassifier::new(Arc::new(ScriptedCompletion::new(replies))),
            rag,
            SessionStore::default(),
            records.clone(),
        );

        for i in 0..50 {
            checker.classify_tags(&format!("Question {i}?")).await;
        }

        assert_eq!(records.count().await, 50);
    }

    #[tokio::test]
    async fn answer_trace_has_phase_spans() {
        let checker = checker_with("[]", answering(), Arc::new(NoopRecordStore));
        let outcome = checker.answer("s1", "Is it safe?", false, None).await.unwrap();
        assert!(outcome.execution_time_ms < 60_000);

        let trace = &checker.telemetry().traces_for_session("s1")[0];
        assert_eq!(trace.count_of(SpanKind::Turn), 1);
        assert_eq!(trace.count_of(SpanKind::Retrieval), 1);
        assert_eq!(trace.count_of(SpanKind::UrlResolution), 1);
    }

    #[tokio::test]
    async fn answer_prunes_idle_sessions() {
        let rag = RagOrchestrator::new(
            answering(),
            Arc::new(RecordingResolver::default()),
            RagSettings::new("KB123", "arn:model"),
        )
        .unwrap();
        let checker = VaxChecker::new(
            ComplexityClassifier::new(Arc::new(ScriptedCompletion::unused())),
            TagClassifier::new(Arc::new(ScriptedCompletion::unused())),
            rag,
            SessionStore::new(5, Duration::zero()),
            Arc::new(NoopRecordStore),
        );

        for id in ["a", "b", "c"] {
            checker.answer(id, "Is it safe?", false, None).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        checker.answer("d", "Is it safe?", false, None).await.unwrap();

        assert_eq!(checker.sessions().len().await, 1);
        assert!(checker.sessions().get("d").await.is_some());
    }

    #[tokio::test]
    async fn context_store_carries_history_between_instances() {
        let store = Arc::new(SqliteRecordStore::new("sqlite::memory:").await.unwrap());

        let first = checker_with("[]", answering(), Arc::new(NoopRecordStore))
            .with_context_store(store.clone());
        first.answer("s1", "Is it safe?", false, None).await.unwrap();
        drop(first);

        let second = checker_with("[]", answering(), Arc::new(NoopRecordStore))
            .with_context_store(store.clone());
        let outcome = second.answer("s1", "For kids?", false, None).await.unwrap();
        assert_eq!(outcome.prior_turns, 1);

        let cleared = checker_with("[]", answering(), Arc::new(NoopRecordStore))
            .with_context_store(store.clone());
        let outcome = cleared.answer("s1", "Who can get it?", true, None).await.unwrap();
        assert_eq!(outcome.prior_turns, 0);

        let saved = ContextStore::load(store.as_ref(), "s1").await.unwrap().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved.turns()[0].user_query, "Who can get it?");
    }

    #[tokio::test]
    async fn failed_turn_is_not_saved() {
        let store = Arc::new(SqliteRecordStore::new("sqlite::memory:").await.unwrap());
        let failing: Arc<dyn RetrievalGenerationService> =
            Arc::new(StubRetrieval::failing(InvocationError::Network("reset".into())));
        let checker =
            checker_with("[]", failing, Arc::new(NoopRecordStore)).with_context_store(store.clone());

        checker.answer("s1", "q", false, None).await.unwrap_err();

        assert!(ContextStore::load(store.as_ref(), "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_session_removes_state() {
        let checker = checker_with("[]", answering(), Arc::new(NoopRecordStore));
        checker.answer("s1", "q", false, None).await.unwrap();
        assert!(checker.end_session("s1").await);
        assert!(checker.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn record_backends_from_config() {
        let mut config = AppConfig::default();
        config.tagging.record_backend = "memory".into();
        assert_eq!(open_record_store(&config).await.unwrap().name(), "in_memory");

        config.tagging.record_backend = "none".into();
        assert_eq!(open_record_store(&config).await.unwrap().name(), "none");

        config.tagging.record_backend = "carrier-pigeon".into();
        assert_eq!(open_record_store(&config).await.err().unwrap().kind(), "configuration");
    }

    #[tokio::test]
    async fn context_stores_from_config() {
        let dir = std::env::temp_dir().join(format!("vaxchecker-contexts-{}", std::process::id()));
        let mut config = AppConfig::default();

        config.context.store = "memory".into();
        assert!(open_context_store(&config).await.unwrap().is_none());

        config.context.store = "sqlite".into();
        config.context.database_path = dir.join("nested/sessions.db").to_string_lossy().into_owned();
        let store = open_context_store(&config).await.unwrap().unwrap();
        assert_eq!(store.name(), "sqlite");

        config.context.store = "etcd".into();
        assert_eq!(open_context_store(&config).await.err().unwrap().kind(), "configuration");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
