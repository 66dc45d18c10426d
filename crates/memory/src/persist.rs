//! Durable conversation contexts.
//!
//! A [`ContextStore`] keeps each session's [`ConversationContext`] across
//! process restarts, so a session id given on one run picks up the history
//! left by an earlier one.

use async_trait::async_trait;
use vaxchecker_core::error::RecordError;

use crate::context::ConversationContext;

#[async_trait]
pub trait ContextStore: Send + Sync {
    fn name(&self) -> &str;

    /// The stored context of `session_id`, if any.
    async fn load(&self, session_id: &str) -> Result<Option<ConversationContext>, RecordError>;

    /// Replace the stored context of `session_id`.
    async fn save(&self, session_id: &str, context: &ConversationContext)
    -> Result<(), RecordError>;

    /// Forget `session_id`. Returns whether anything was stored.
    async fn delete(&self, session_id: &str) -> Result<bool, RecordError>;
}
