//! Shared scripted collaborators for agent tests.

use std::collections::HashMap;
use std::sync::Mutex;

use vaxchecker_core::completion::{CompletionRequest, CompletionService};
use vaxchecker_core::error::{InvocationError, RecordError};
use vaxchecker_core::record::{QuestionRecord, RecordStore};
use vaxchecker_core::resolver::UriToUrlResolver;
use vaxchecker_core::retrieval::{
    CitationGroup, GeneratedOutput, RetrievalGenerationService, RetrievalRequest,
    RetrievalResponse, RetrievedReference,
};

/// A completion service that returns a sequence of scripted replies.
///
/// Each call to `invoke` returns the next reply in the queue.
/// Panics if more calls are made than replies provided.
pub struct ScriptedCompletion {
    replies: Mutex<Vec<Result<String, InvocationError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, InvocationError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(error: InvocationError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// A service that must never be called.
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: CompletionRequest) -> Result<String, InvocationError> {
        let mut requests = self.requests.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let idx = requests.len();
        if idx >= replies.len() {
            panic!(
                "ScriptedCompletion: no more replies (call #{}, have {})",
                idx,
                replies.len()
            );
        }
        requests.push(request);
        replies[idx].clone()
    }
}

/// Retrieval service returning one canned response (or error) for every call.
pub struct StubRetrieval {
    reply: Result<RetrievalResponse, InvocationError>,
    requests: Mutex<Vec<RetrievalRequest>>,
}

impl StubRetrieval {
    pub fn answering(response: RetrievalResponse) -> Self {
        Self {
            reply: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: InvocationError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RetrievalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RetrievalGenerationService for StubRetrieval {
    fn name(&self) -> &str {
        "stub_retrieval"
    }

    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResponse, InvocationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}

/// Resolver backed by a map that records every URI it is asked about.
#[derive(Default)]
pub struct RecordingResolver {
    urls: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingResolver {
    pub fn with(uri: &str, url: &str) -> Self {
        Self {
            urls: HashMap::from([(uri.to_string(), url.to_string())]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl UriToUrlResolver for RecordingResolver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn resolve(&self, uri: &str) -> String {
        self.calls.lock().unwrap().push(uri.to_string());
        self.urls.get(uri).cloned().unwrap_or_default()
    }
}

/// Record store whose writes always fail.
pub struct FailingRecordStore;

#[async_trait::async_trait]
impl RecordStore for FailingRecordStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn put(&self, _record: QuestionRecord) -> Result<(), RecordError> {
        Err(RecordError::Storage("disk full".into()))
    }

    async fn list(&self, _limit: usize) -> Result<Vec<QuestionRecord>, RecordError> {
        Err(RecordError::QueryFailed("unavailable".into()))
    }
}

/// A response with one citation group per entry of `groups`, each listing
/// the given S3 URIs as references.
pub fn response_with_citations(text: &str, groups: &[&[&str]]) -> RetrievalResponse {
    RetrievalResponse {
        output: GeneratedOutput { text: text.into() },
        citations: groups
            .iter()
            .map(|uris| CitationGroup {
                generated_response_part: None,
                retrieved_references: uris.iter().map(|u| RetrievedReference::s3(*u)).collect(),
            })
            .collect(),
        session_id: None,
    }
}
