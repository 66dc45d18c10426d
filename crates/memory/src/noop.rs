//! No-op record store: disables question persistence entirely.

use async_trait::async_trait;
use vaxchecker_core::error::RecordError;
use vaxchecker_core::record::{QuestionRecord, RecordStore};

/// Stores nothing.
pub struct NoopRecordStore;

#[async_trait]
impl RecordStore for NoopRecordStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn put(&self, _record: QuestionRecord) -> Result<(), RecordError> {
        Ok(())
    }

    async fn list(&self, _limit: usize) -> Result<Vec<QuestionRecord>, RecordError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaxchecker_core::classification::TagSet;

    #[tokio::test]
    async fn accepts_and_forgets() {
        let store = NoopRecordStore;
        store.put(QuestionRecord::new("q", TagSet::other())).await.unwrap();
        assert!(store.list(10).await.unwrap().is_empty());
    }
}
