//! Conversation record storage.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use chrono::{TimeZone, Utc};
use dashmap::DashMap;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::conversation::record::ConversationRecord;
use crate::core::errors::{AssistantError, AssistantResult};

/// Boxed future type for conversation store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key-value storage of one record per conversation.
pub trait ConversationStore: Send + Sync {
    /// Load the record for a conversation, or a fresh default record if none exists.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load<'a>(
        &'a self,
        conversation_id: &'a str,
    ) -> StoreFuture<'a, AssistantResult<ConversationRecord>>;

    /// Insert or overwrite the record for its conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn save(&self, record: ConversationRecord) -> StoreFuture<'_, AssistantResult<()>>;

    /// Delete the record for a conversation. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete<'a>(&'a self, conversation_id: &'a str) -> StoreFuture<'a, AssistantResult<bool>>;
}

/// `SQLite` implementation of the conversation store.
pub struct SqliteConversationStore {
    conn: Connection,
    table: String,
}

impl SqliteConversationStore {
    /// Table name for conversation records.
    pub const DEFAULT_TABLE: &'static str = "assistant_conversations";

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: impl AsRef<Path>) -> AssistantResult<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        Self::with_connection(conn).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub async fn open_in_memory() -> AssistantResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> AssistantResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    conversation_id TEXT PRIMARY KEY,
                    messages TEXT NOT NULL DEFAULT '',
                    last_modified INTEGER NOT NULL
                );"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl ConversationStore for SqliteConversationStore {
    fn load<'a>(
        &'a self,
        conversation_id: &'a str,
    ) -> StoreFuture<'a, AssistantResult<ConversationRecord>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id = conversation_id.to_string();
            let row = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!(
                                "SELECT messages, last_modified FROM {table}
                                 WHERE conversation_id = ?1"
                            ),
                            rusqlite::params![id],
                            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;

            let Some((messages, ts)) = row else {
                return Ok(ConversationRecord::new(conversation_id));
            };

            let last_modified = Utc.timestamp_millis_opt(ts).single().ok_or_else(|| {
                AssistantError::InvalidRecord(format!("invalid timestamp {ts}"))
            })?;

            Ok(ConversationRecord {
                conversation_id: conversation_id.to_string(),
                messages,
                last_modified,
            })
        })
    }

    fn save(&self, record: ConversationRecord) -> StoreFuture<'_, AssistantResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (conversation_id, messages, last_modified)
                             VALUES (?1, ?2, ?3)
                             ON CONFLICT(conversation_id) DO UPDATE SET
                                messages = excluded.messages,
                                last_modified = excluded.last_modified"
                        ),
                        rusqlite::params![
                            record.conversation_id,
                            record.messages,
                            record.last_modified.timestamp_millis()
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, conversation_id: &'a str) -> StoreFuture<'a, AssistantResult<bool>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id = conversation_id.to_string();
            let removed = self
                .conn
                .call(move |conn| {
                    let n = conn.execute(
                        &format!("DELETE FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![id],
                    )?;
                    Ok(n)
                })
                .await?;
            Ok(removed > 0)
        })
    }
}

/// In-process store, used by the terminal chat and tests.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    records: DashMap<String, ConversationRecord>,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn load<'a>(
        &'a self,
        conversation_id: &'a str,
    ) -> StoreFuture<'a, AssistantResult<ConversationRecord>> {
        Box::pin(async move {
            Ok(self
                .records
                .get(conversation_id)
                .map_or_else(|| ConversationRecord::new(conversation_id), |r| r.value().clone()))
        })
    }

    fn save(&self, record: ConversationRecord) -> StoreFuture<'_, AssistantResult<()>> {
        Box::pin(async move {
            self.records.insert(record.conversation_id.clone(), record);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, conversation_id: &'a str) -> StoreFuture<'a, AssistantResult<bool>> {
        Box::pin(async move { Ok(self.records.remove(conversation_id).is_some()) })
    }
}
