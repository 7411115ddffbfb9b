//! Chat persistence: sessions and their messages.
//!
//! Every operation reports a [`StoreOutcome`] instead of an error. A disabled
//! store answers `Unavailable`; a failing query answers `StoreError`. Callers that
//! only want the safe default use [`StoreOutcome::into_value_or_default`].

use std::fmt::Display;

use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::errors::AppError;
use crate::models::{format_timestamp, parse_timestamp, Chat, Message, NewMessage, Sender};

/// Result of a chat store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T> {
    Ok(T),
    /// The store is disabled for this runtime
    Unavailable,
    /// The underlying store failed
    StoreError(String),
}

impl<T> StoreOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, StoreOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            StoreOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            StoreOutcome::Ok(value) => Ok(value),
            StoreOutcome::Unavailable => Err(AppError::Unavailable(
                "Chat store is not available".to_string(),
            )),
            StoreOutcome::StoreError(msg) => Err(AppError::Database(msg)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StoreOutcome<U> {
        match self {
            StoreOutcome::Ok(value) => StoreOutcome::Ok(f(value)),
            StoreOutcome::Unavailable => StoreOutcome::Unavailable,
            StoreOutcome::StoreError(msg) => StoreOutcome::StoreError(msg),
        }
    }
}

impl<T: Default> StoreOutcome<T> {
    /// Value on success, otherwise the type's default. Logs the substitution.
    pub fn into_value_or_default(self) -> T {
        match self {
            StoreOutcome::Ok(value) => value,
            StoreOutcome::Unavailable => {
                warn!("Chat store unavailable, using default value");
                T::default()
            }
            StoreOutcome::StoreError(msg) => {
                warn!(error = %msg, "Chat store failed, using default value");
                T::default()
            }
        }
    }
}

#[derive(Debug)]
enum WriteError {
    Sqlx(sqlx::Error),
    MissingChat(String),
}

impl From<sqlx::Error> for WriteError {
    fn from(err: sqlx::Error) -> Self {
        WriteError::Sqlx(err)
    }
}

impl Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Sqlx(err) => write!(f, "{}", err),
            WriteError::MissingChat(id) => write!(f, "Chat {} does not exist", id),
        }
    }
}

fn settle<T, E: Display>(op: &'static str, result: Result<T, E>) -> StoreOutcome<T> {
    match result {
        Ok(value) => StoreOutcome::Ok(value),
        Err(err) => {
            warn!(op, error = %err, "Chat store operation failed");
            StoreOutcome::StoreError(err.to_string())
        }
    }
}

/// Chat repository over the embedded SQLite store.
#[derive(Clone)]
pub struct ChatStore {
    pool: Option<SqlitePool>,
}

impl ChatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    /// A store that answers `Unavailable` to everything.
    pub fn unavailable() -> Self {
        Self { pool: None }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self, op: &'static str) -> Option<&SqlitePool> {
        if self.pool.is_none() {
            warn!(op, "Chat store is not available on this runtime");
        }
        self.pool.as_ref()
    }

    // ==================== CHAT OPERATIONS ====================

    /// Insert a chat row.
    pub async fn create_chat(&self, chat: &Chat) -> StoreOutcome<()> {
        let Some(pool) = self.pool("create_chat") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query("INSERT INTO chats (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&chat.id)
            .bind(&chat.name)
            .bind(format_timestamp(&chat.created_at))
            .execute(pool)
            .await
            .map(|_| ());
        settle("create_chat", result)
    }

    /// All chats, newest first.
    pub async fn get_all_chats(&self) -> StoreOutcome<Vec<Chat>> {
        let Some(pool) = self.pool("get_all_chats") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query(
            "SELECT id, name, created_at FROM chats ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(pool)
        .await
        .and_then(|rows| rows.iter().map(chat_from_row).collect());
        settle("get_all_chats", result)
    }

    /// First chat with the given name.
    pub async fn get_chat_by_name(&self, name: &str) -> StoreOutcome<Option<Chat>> {
        let Some(pool) = self.pool("get_chat_by_name") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query(
            "SELECT id, name, created_at FROM chats WHERE name = ? ORDER BY created_at, rowid LIMIT 1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .and_then(|row| row.as_ref().map(chat_from_row).transpose());
        settle("get_chat_by_name", result)
    }

    pub async fn get_chat_by_id(&self, id: &str) -> StoreOutcome<Option<Chat>> {
        let Some(pool) = self.pool("get_chat_by_id") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query("SELECT id, name, created_at FROM chats WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .and_then(|row| row.as_ref().map(chat_from_row).transpose());
        settle("get_chat_by_id", result)
    }

    /// Delete the chat row only. Its messages stay until
    /// [`delete_messages_by_chat_id`](Self::delete_messages_by_chat_id) is called.
    pub async fn delete_chat_by_id(&self, id: &str) -> StoreOutcome<bool> {
        let Some(pool) = self.pool("delete_chat_by_id") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map(|r| r.rows_affected() > 0);
        settle("delete_chat_by_id", result)
    }

    /// Delete a chat and its messages in one transaction.
    pub async fn delete_chat_with_messages(&self, id: &str) -> StoreOutcome<bool> {
        let Some(pool) = self.pool("delete_chat_with_messages") else {
            return StoreOutcome::Unavailable;
        };

        let result: Result<bool, sqlx::Error> = async {
            let mut tx = pool.begin().await?;
            sqlx::query("DELETE FROM messages WHERE chat_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let deleted = sqlx::query("DELETE FROM chats WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tx.commit().await?;
            Ok::<_, sqlx::Error>(deleted > 0)
        }
        .await;
        settle("delete_chat_with_messages", result)
    }

    /// Chat with the given name, created with a fresh id if none exists.
    pub async fn find_or_create_chat(&self, name: &str) -> StoreOutcome<Chat> {
        match self.get_chat_by_name(name).await {
            StoreOutcome::Ok(Some(chat)) => StoreOutcome::Ok(chat),
            StoreOutcome::Ok(None) => {
                let chat = Chat::new(uuid::Uuid::new_v4().to_string(), name);
                self.create_chat(&chat).await.map(|_| chat)
            }
            StoreOutcome::Unavailable => StoreOutcome::Unavailable,
            StoreOutcome::StoreError(msg) => StoreOutcome::StoreError(msg),
        }
    }

    // ==================== MESSAGE OPERATIONS ====================

    /// Insert one message. Rejected when its chat does not exist.
    pub async fn save_message(&self, message: &NewMessage) -> StoreOutcome<Message> {
        let Some(pool) = self.pool("save_message") else {
            return StoreOutcome::Unavailable;
        };

        let result: Result<Message, WriteError> = async {
            let mut conn = pool.acquire().await?;
            insert_message(&mut *conn, message).await
        }
        .await;
        settle("save_message", result)
    }

    /// Insert several messages atomically; returns them with their assigned ids.
    pub async fn save_messages(&self, messages: &[NewMessage]) -> StoreOutcome<Vec<Message>> {
        let Some(pool) = self.pool("save_messages") else {
            return StoreOutcome::Unavailable;
        };

        let result: Result<Vec<Message>, WriteError> = async {
            let mut tx = pool.begin().await?;
            let mut saved = Vec::with_capacity(messages.len());
            for message in messages {
                saved.push(insert_message(&mut *tx, message).await?);
            }
            tx.commit().await?;
            Ok::<_, WriteError>(saved)
        }
        .await;
        settle("save_messages", result)
    }

    /// Messages of a chat in chronological order.
    pub async fn get_messages_by_chat_id(&self, chat_id: &str) -> StoreOutcome<Vec<Message>> {
        let Some(pool) = self.pool("get_messages_by_chat_id") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query(
            "SELECT id, text, sender, chat_id, created_at FROM messages WHERE chat_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await
        .and_then(|rows| rows.iter().map(message_from_row).collect());
        settle("get_messages_by_chat_id", result)
    }

    /// Delete every message of a chat; returns how many were removed.
    pub async fn delete_messages_by_chat_id(&self, chat_id: &str) -> StoreOutcome<u64> {
        let Some(pool) = self.pool("delete_messages_by_chat_id") else {
            return StoreOutcome::Unavailable;
        };

        let result = sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(chat_id)
            .execute(pool)
            .await
            .map(|r| r.rows_affected());
        settle("delete_messages_by_chat_id", result)
    }
}

async fn insert_message(
    conn: &mut sqlx::SqliteConnection,
    message: &NewMessage,
) -> Result<Message, WriteError> {
    let result = sqlx::query(
        r#"INSERT INTO messages (text, sender, chat_id, created_at)
           SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM chats WHERE id = ?)"#,
    )
    .bind(&message.text)
    .bind(message.sender.as_str())
    .bind(&message.chat_id)
    .bind(format_timestamp(&message.created_at))
    .bind(&message.chat_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(WriteError::MissingChat(message.chat_id.clone()));
    }

    Ok(Message {
        id: result.last_insert_rowid(),
        text: message.text.clone(),
        sender: message.sender,
        chat_id: message.chat_id.clone(),
        created_at: message.created_at,
    })
}

// Helper functions for row conversion

fn decode_error(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn timestamp_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    let raw: String = row.try_get("created_at")?;
    parse_timestamp(&raw).ok_or_else(|| decode_error(format!("Invalid timestamp: {}", raw)))
}

fn chat_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Chat, sqlx::Error> {
    Ok(Chat {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: timestamp_from_row(row)?,
    })
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Message, sqlx::Error> {
    let sender: String = row.try_get("sender")?;
    Ok(Message {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        sender: Sender::parse(&sender)
            .ok_or_else(|| decode_error(format!("Unknown sender: {}", sender)))?,
        chat_id: row.try_get("chat_id")?,
        created_at: timestamp_from_row(row)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn store() -> (TempDir, ChatStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("chat.db"))
            .await
            .expect("Failed to init DB");
        (temp_dir, ChatStore::new(pool))
    }

    fn chat_at(id: &str, name: &str, offset_secs: i64) -> Chat {
        Chat {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_chats_listed_newest_first() {
        let (_dir, store) = store().await;
        assert!(store.create_chat(&chat_at("c1", "Linsencurry", 0)).await.is_ok());
        assert!(store.create_chat(&chat_at("c2", "Pasta", 1)).await.is_ok());

        let chats = store.get_all_chats().await.ok().unwrap();
        let ids: Vec<_> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_same_timestamp_falls_back_to_insertion_order() {
        let (_dir, store) = store().await;
        let at = Utc::now();
        for id in ["c1", "c2"] {
            let chat = Chat {
                id: id.to_string(),
                name: id.to_string(),
                created_at: at,
            };
            assert!(store.create_chat(&chat).await.is_ok());
        }

        let chats = store.get_all_chats().await.into_value_or_default();
        assert_eq!(chats[0].id, "c2");
    }

    #[tokio::test]
    async fn test_get_chat_by_name_and_id() {
        let (_dir, store) = store().await;
        let chat = chat_at("c1", "Linsencurry", 0);
        store.create_chat(&chat).await;

        let by_name = store.get_chat_by_name("Linsencurry").await.ok().unwrap();
        assert_eq!(by_name.unwrap().id, "c1");

        let by_id = store.get_chat_by_id("c1").await.ok().unwrap().unwrap();
        assert_eq!(by_id.name, "Linsencurry");
        assert_eq!(
            format_timestamp(&by_id.created_at),
            format_timestamp(&chat.created_at)
        );

        assert_eq!(store.get_chat_by_id("nope").await, StoreOutcome::Ok(None));
    }

    #[tokio::test]
    async fn test_duplicate_chat_id_is_store_error() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "A", 0)).await;
        let outcome = store.create_chat(&chat_at("c1", "B", 0)).await;
        assert!(matches!(outcome, StoreOutcome::StoreError(_)));
    }

    #[tokio::test]
    async fn test_message_round_trip_in_chronological_order() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;

        let now = Utc::now();
        let later = NewMessage {
            text: "Hier ist ein Rezept".to_string(),
            sender: Sender::Bot,
            chat_id: "c1".to_string(),
            created_at: now + Duration::seconds(5),
        };
        let earlier = NewMessage {
            text: "Wie koche ich das?".to_string(),
            sender: Sender::User,
            chat_id: "c1".to_string(),
            created_at: now,
        };

        let saved_later = store.save_message(&later).await.ok().unwrap();
        let saved_earlier = store.save_message(&earlier).await.ok().unwrap();
        assert!(saved_earlier.id > saved_later.id);

        let messages = store.get_messages_by_chat_id("c1").await.ok().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Wie koche ich das?");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn test_save_messages_batch_assigns_sequential_ids() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;

        let batch = vec![
            NewMessage::new("c1", Sender::User, "eins"),
            NewMessage::new("c1", Sender::Bot, "zwei"),
            NewMessage::new("c1", Sender::User, "drei"),
        ];
        let saved = store.save_messages(&batch).await.ok().unwrap();
        assert_eq!(saved.len(), 3);
        assert!(saved[0].id < saved[1].id && saved[1].id < saved[2].id);
    }

    #[tokio::test]
    async fn test_message_for_missing_chat_is_rejected() {
        let (_dir, store) = store().await;
        let outcome = store
            .save_message(&NewMessage::new("ghost", Sender::User, "hallo"))
            .await;
        assert!(matches!(outcome, StoreOutcome::StoreError(msg) if msg.contains("ghost")));

        // A failing batch leaves nothing behind
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;
        let batch = vec![
            NewMessage::new("c1", Sender::User, "ok"),
            NewMessage::new("ghost", Sender::User, "not ok"),
        ];
        assert!(!store.save_messages(&batch).await.is_ok());
        assert!(store
            .get_messages_by_chat_id("c1")
            .await
            .into_value_or_default()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_chat_only_orphans_messages() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;
        store
            .save_message(&NewMessage::new("c1", Sender::User, "hallo"))
            .await;

        assert_eq!(store.delete_chat_by_id("c1").await, StoreOutcome::Ok(true));
        assert_eq!(store.get_chat_by_id("c1").await, StoreOutcome::Ok(None));

        let orphans = store.get_messages_by_chat_id("c1").await.ok().unwrap();
        assert_eq!(orphans.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_chat_and_messages() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;
        store
            .save_message(&NewMessage::new("c1", Sender::User, "hallo"))
            .await;

        assert_eq!(store.delete_chat_by_id("c1").await, StoreOutcome::Ok(true));
        assert_eq!(
            store.delete_messages_by_chat_id("c1").await,
            StoreOutcome::Ok(1)
        );
        assert!(store.get_messages_by_chat_id("c1").await.ok().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_chat_with_messages_in_one_step() {
        let (_dir, store) = store().await;
        store.create_chat(&chat_at("c1", "Pasta", 0)).await;
        store
            .save_message(&NewMessage::new("c1", Sender::Bot, "Rezept"))
            .await;

        assert_eq!(
            store.delete_chat_with_messages("c1").await,
            StoreOutcome::Ok(true)
        );
        assert!(store.get_messages_by_chat_id("c1").await.into_value_or_default().is_empty());
        assert!(store.get_all_chats().await.into_value_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_find_or_create_chat_reuses_existing() {
        let (_dir, store) = store().await;
        let first = store.find_or_create_chat("Linsencurry").await.ok().unwrap();
        let second = store.find_or_create_chat("Linsencurry").await.ok().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.get_all_chats().await.into_value_or_default().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_returns_safe_defaults() {
        let store = ChatStore::unavailable();
        assert!(!store.is_available());

        assert_eq!(
            store.create_chat(&chat_at("c1", "A", 0)).await,
            StoreOutcome::Unavailable
        );
        assert!(store.get_all_chats().await.into_value_or_default().is_empty());
        assert!(store.get_chat_by_id("c1").await.into_value_or_default().is_none());
        assert_eq!(store.delete_messages_by_chat_id("c1").await.into_value_or_default(), 0);

        let err = store.get_all_chats().await.into_result().unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[test]
    fn test_into_value_or_default_substitutes_on_failure() {
        assert_eq!(StoreOutcome::Ok(vec![1, 2]).into_value_or_default(), vec![1, 2]);
        assert_eq!(StoreOutcome::<Vec<i32>>::Unavailable.into_value_or_default(), Vec::<i32>::new());
        assert_eq!(
            StoreOutcome::<u64>::StoreError("disk I/O error".to_string()).into_value_or_default(),
            0
        );
    }
}
