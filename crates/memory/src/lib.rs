//! Conversation state and question persistence for VaxChecker.
//!
//! - [`ConversationContext`]: bounded, idle-expiring history of one session
//! - [`SessionStore`]: session id → shared context
//! - [`ContextStore`]: contexts kept across runs
//! - [`RecordStore`](vaxchecker_core::RecordStore) backends for classified questions

pub mod context;
pub mod in_memory;
pub mod noop;
pub mod persist;
pub mod sessions;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use context::{ConversationContext, ConversationTurn};
pub use in_memory::InMemoryRecordStore;
pub use noop::NoopRecordStore;
pub use persist::ContextStore;
pub use sessions::{SessionStore, SharedContext};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;
