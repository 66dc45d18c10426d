//! Taxonomy tag classifier.
//!
//! Asks a completion model to pick up to five labels from the fixed vaccine
//! taxonomy, then enforces the output shape locally: only taxonomy members
//! survive, and anything unusable collapses to `["other"]`.

use std::sync::Arc;

use tracing::{debug, warn};
use vaxchecker_core::classification::TagSet;
use vaxchecker_core::completion::{CompletionRequest, CompletionService};
use vaxchecker_core::taxonomy::TagTaxonomy;

use super::extract_json;

const DEFAULT_MAX_TOKENS: u32 = 1000;

pub struct TagClassifier {
    completion: Arc<dyn CompletionService>,
    taxonomy: TagTaxonomy,
    max_tokens: u32,
}

impl TagClassifier {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            taxonomy: TagTaxonomy::vaccine(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn taxonomy(&self) -> &TagTaxonomy {
        &self.taxonomy
    }

    /// The prompt sent for `query`, embedding the taxonomy as a JSON array.
    pub fn prompt(&self, query: &str) -> String {
        format!(
            "Given this question about vaccines: \"{query}\"\n\n\
             If the question is about vaccines, analyze it and return only the most relevant \
             tags (at most five) from this list: {taxonomy}\n\n\
             Return the tags in a JSON array format. If no tags match or the question is not \
             about vaccines, return [\"other\"].\n\
             Only return the JSON array, nothing else.",
            taxonomy = self.taxonomy.to_json_array()
        )
    }

    /// Tag a query. Never fails: every failure yields `["other"]`.
    pub async fn classify(&self, query: &str) -> TagSet {
        let request = CompletionRequest::deterministic(self.prompt(query), self.max_tokens);

        match self.completion.invoke(request).await {
            Ok(reply) => {
                let tags = parse_tags(&reply, &self.taxonomy);
                debug!(tags = ?tags.as_slice(), "Question tagged");
                tags
            }
            Err(e) => {
                warn!(error = %e, "Tag classification failed");
                TagSet::other()
            }
        }
    }
}

/// Validate a raw model reply into a [`TagSet`].
///
/// Accepts a JSON array (optionally fenced); non-string items and labels
/// outside the taxonomy are dropped.
pub fn parse_tags(reply: &str, taxonomy: &TagTaxonomy) -> TagSet {
    let payload = extract_json(reply);
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Array(items)) => {
            let labels = items.iter().filter_map(serde_json::Value::as_str);
            TagSet::from_labels(labels, taxonomy)
        }
        Ok(other) => {
            warn!(content = %other, "Tag reply is not a JSON array");
            TagSet::other()
        }
        Err(e) => {
            warn!(content = %reply, error = %e, "Failed to parse tag reply as JSON");
            TagSet::other()
        }
    }
}
