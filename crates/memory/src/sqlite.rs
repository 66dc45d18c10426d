//! SQLite record store.
//!
//! `user_questions` is keyed by question id. Tags are stored as a JSON array
//! in a TEXT column, timestamps as fixed-width RFC 3339 strings so they sort
//! lexically. `conversation_sessions` holds one serialized
//! [`ConversationContext`] per session id.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use vaxchecker_core::classification::TagSet;
use vaxchecker_core::error::RecordError;
use vaxchecker_core::record::{QuestionRecord, RecordStore};

use crate::context::ConversationContext;
use crate::persist::ContextStore;

/// Question records and conversation contexts persisted in a SQLite file.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database.
    pub async fn new(path: &str) -> Result<Self, RecordError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| RecordError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to an in-memory database sees its own copy.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| RecordError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite record store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RecordError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), RecordError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_questions (
                id         TEXT PRIMARY KEY NOT NULL,
                question   TEXT NOT NULL,
                tags       TEXT NOT NULL DEFAULT '[]',
                timestamp  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::MigrationFailed(format!("user_questions table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_questions_timestamp ON user_questions(timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::MigrationFailed(format!("timestamp index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_sessions (
                id          TEXT PRIMARY KEY NOT NULL,
                context     TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::MigrationFailed(format!("conversation_sessions table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionRecord, RecordError> {
        let question_id: String = row
            .try_get("id")
            .map_err(|e| RecordError::QueryFailed(format!("id column: {e}")))?;
        let question: String = row
            .try_get("question")
            .map_err(|e| RecordError::QueryFailed(format!("question column: {e}")))?;
        let tags_json: String = row
            .try_get("tags")
            .map_err(|e| RecordError::QueryFailed(format!("tags column: {e}")))?;
        let timestamp_str: String = row
            .try_get("timestamp")
            .map_err(|e| RecordError::QueryFailed(format!("timestamp column: {e}")))?;

        let tags: TagSet = serde_json::from_str(&tags_json)
            .map_err(|e| RecordError::QueryFailed(format!("tags json: {e}")))?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RecordError::QueryFailed(format!("timestamp format: {e}")))?;

        Ok(QuestionRecord {
            question_id,
            question,
            tags,
            timestamp,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn put(&self, record: QuestionRecord) -> Result<(), RecordError> {
        let tags_json = serde_json::to_string(&record.tags)
            .map_err(|e| RecordError::Storage(format!("tags json: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO user_questions (id, question, tags, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                tags = excluded.tags,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&record.question_id)
        .bind(&record.question)
        .bind(&tags_json)
        .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(format!("insert question: {e}")))?;

        debug!(id = %record.question_id, "Stored question record");
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<QuestionRecord>, RecordError> {
        let rows = sqlx::query(
            "SELECT id, question, tags, timestamp FROM user_questions ORDER BY timestamp DESC LIMIT ?1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RecordError::QueryFailed(format!("list questions: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }
}

#[async_trait]
impl ContextStore for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self, session_id: &str) -> Result<Option<ConversationContext>, RecordError> {
        let row = sqlx::query("SELECT context FROM conversation_sessions WHERE id = ?1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordError::QueryFailed(format!("load session: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let json: String = row
            .try_get("context")
            .map_err(|e| RecordError::QueryFailed(format!("context column: {e}")))?;
        let context = serde_json::from_str(&json)
            .map_err(|e| RecordError::QueryFailed(format!("context json: {e}")))?;
        Ok(Some(context))
    }

    async fn save(
        &self,
        session_id: &str,
        context: &ConversationContext,
    ) -> Result<(), RecordError> {
        let json = serde_json::to_string(context)
            .map_err(|e| RecordError::Storage(format!("context json: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO conversation_sessions (id, context, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                context = excluded.context,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(&json)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        .execute(&self.pool)
        .await
        .map_err(|e| RecordError::Storage(format!("save session: {e}")))?;

        debug!(session_id, turns = context.len(), "Saved conversation context");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, RecordError> {
        let result = sqlx::query("DELETE FROM conversation_sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RecordError::Storage(format!("delete session: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
