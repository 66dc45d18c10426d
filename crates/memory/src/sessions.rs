//! Session store: one `ConversationContext` per session id.
//!
//! Each context sits behind its own tokio mutex, so turns of one session are
//! serialized while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::ConversationContext;

pub type SharedContext = Arc<Mutex<ConversationContext>>;

pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedContext>>,
    max_turns: usize,
    max_idle: Duration,
}

impl SessionStore {
    /// New contexts are created with these limits.
    pub fn new(max_turns: usize, max_idle: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
            max_idle,
        }
    }

    /// Fetch the session's context, creating an empty one on first use.
    pub async fn get_or_create(&self, session_id: &str) -> SharedContext {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "Creating conversation context");
                Arc::new(Mutex::new(ConversationContext::new(self.max_turns, self.max_idle)))
            })
            .clone()
    }

    /// Install a restored context unless the session is already live.
    ///
    /// The context takes this store's limits, and history already past the
    /// idle window is dropped. When another caller got there first, the live
    /// context wins and `context` is discarded.
    pub async fn adopt(&self, session_id: &str, mut context: ConversationContext) -> SharedContext {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                context.apply_limits(self.max_turns, self.max_idle);
                if context.is_idle_at(Utc::now()) {
                    context.clear();
                }
                debug!(session_id, turns = context.len(), "Restored conversation context");
                Arc::new(Mutex::new(context))
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedContext> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Drop sessions that are empty or idle past their window at `now`.
    ///
    /// Sessions whose lock is currently held are in use and kept.
    /// Returns the number of sessions removed.
    pub async fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, ctx| match ctx.try_lock() {
            Ok(ctx) => !(ctx.is_empty() || ctx.is_idle_at(now)),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Pruned idle sessions");
        }
        removed
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        let ctx = ConversationContext::default();
        Self::new(ctx.max_turns(), ctx.max_idle())
    }
}
