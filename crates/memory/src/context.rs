//! Conversation context: bounded, idle-expiring memory of recent exchanges.
//!
//! Holds the last few question/answer pairs of one session so follow-up
//! questions can be answered in context. The context is:
//!
//! - **Bounded**: at most `max_turns` exchanges, oldest evicted first
//! - **Idle-expiring**: a gap longer than `max_idle` clears it before the
//!   next exchange is recorded
//! - **Renderable**: produces the `User:` / `Assistant:` block that prefixes
//!   the next retrieval request

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use vaxchecker_core::retrieval::CitationGroup;

pub const DEFAULT_MAX_TURNS: usize = 5;
pub const DEFAULT_MAX_IDLE_SECONDS: i64 = 300;

/// One question/answer exchange. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_query: String,
    pub bot_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<CitationGroup>>,
    pub timestamp: DateTime<Utc>,
}

/// Recent history of one conversation, newest last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    history: Vec<ConversationTurn>,
    max_turns: usize,
    max_idle_seconds: i64,
}

impl ConversationContext {
    /// Create an empty context. `max_turns` is clamped to at least 1.
    pub fn new(max_turns: usize, max_idle: Duration) -> Self {
        Self {
            history: Vec::new(),
            max_turns: max_turns.max(1),
            max_idle_seconds: max_idle.num_seconds().max(0),
        }
    }

    /// Record an exchange now.
    pub fn add_exchange(
        &mut self,
        user_query: impl Into<String>,
        bot_response: impl Into<String>,
        citations: Option<Vec<CitationGroup>>,
    ) {
        self.add_exchange_at(user_query, bot_response, citations, Utc::now());
    }

    /// Record an exchange at an explicit instant.
    ///
    /// Clears stale history first, then appends and trims to `max_turns`.
    pub fn add_exchange_at(
        &mut self,
        user_query: impl Into<String>,
        bot_response: impl Into<String>,
        citations: Option<Vec<CitationGroup>>,
        now: DateTime<Utc>,
    ) {
        if self.is_idle_at(now) {
            info!(
                max_idle_seconds = self.max_idle_seconds,
                "Clearing context due to inactivity"
            );
            self.clear();
        }

        self.history.push(ConversationTurn {
            user_query: user_query.into(),
            bot_response: bot_response.into(),
            citations,
            timestamp: now,
        });

        self.trim();
    }

    /// Replace the limits of a restored context, trimming to the new window.
    pub fn apply_limits(&mut self, max_turns: usize, max_idle: Duration) {
        self.max_turns = max_turns.max(1);
        self.max_idle_seconds = max_idle.num_seconds().max(0);
        self.trim();
    }

    fn trim(&mut self) {
        if self.history.len() > self.max_turns {
            info!(max_turns = self.max_turns, "Trimming context to most recent turns");
            let excess = self.history.len() - self.max_turns;
            self.history.drain(..excess);
        }
    }

    /// Render history oldest first; empty string when there is none.
    pub fn get_context_string(&self) -> String {
        if self.history.is_empty() {
            return String::new();
        }

        let mut out = String::from("Previous conversation:\n");
        for turn in &self.history {
            out.push_str(&format!("User: {}\n", turn.user_query));
            out.push_str(&format!("Assistant: {}\n", turn.bot_response));
        }
        out
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// True when there is history and its last turn is older than the idle window.
    pub fn is_idle_at(&self, now: DateTime<Utc>) -> bool {
        self.last_activity()
            .is_some_and(|last| now.signed_duration_since(last) > self.max_idle())
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|t| t.timestamp)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn max_idle(&self) -> Duration {
        Duration::seconds(self.max_idle_seconds)
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS, Duration::seconds(DEFAULT_MAX_IDLE_SECONDS))
    }
}
