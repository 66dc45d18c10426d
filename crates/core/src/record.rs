//! Question records: persisted tag-classification results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classification::TagSet;
use crate::error::RecordError;

/// One classified question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// `q_<unix millis>_<8 hex chars>`; the suffix keeps questions recorded
    /// in the same millisecond apart.
    pub question_id: String,
    pub question: String,
    pub tags: TagSet,
    pub timestamp: DateTime<Utc>,
}

impl QuestionRecord {
    pub fn new(question: impl Into<String>, tags: TagSet) -> Self {
        Self::at(question, tags, Utc::now())
    }

    pub fn at(question: impl Into<String>, tags: TagSet, timestamp: DateTime<Utc>) -> Self {
        Self {
            question_id: format!(
                "q_{}_{}",
                timestamp.timestamp_millis(),
                &Uuid::new_v4().simple().to_string()[..8]
            ),
            question: question.into(),
            tags,
            timestamp,
        }
    }
}

/// Persistence for question records. Writes are fire-and-forget from the
/// caller's point of view; the caller logs failures.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or replace a record by id.
    async fn put(&self, record: QuestionRecord) -> Result<(), RecordError>;

    /// Most recent records first.
    async fn list(&self, limit: usize) -> Result<Vec<QuestionRecord>, RecordError>;
}
