//! In-memory record store: useful for testing and ephemeral runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vaxchecker_core::error::RecordError;
use vaxchecker_core::record::{QuestionRecord, RecordStore};

/// Keeps question records in a Vec, newest last.
pub struct InMemoryRecordStore {
    records: Arc<RwLock<Vec<QuestionRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(&self, record: QuestionRecord) -> Result<(), RecordError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.question_id == record.question_id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<QuestionRecord>, RecordError> {
        let records = self.records.read().await;
        let mut out: Vec<QuestionRecord> = records.clone();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }
}
