//! Chat session and message models persisted in the local chat store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "bot" => Some(Sender::Bot),
            _ => None,
        }
    }
}

/// A recipe chat, usually named after the meal it was started from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Create a chat stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A stored chat message. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    pub chat_id: String,
    pub created_at: DateTime<Utc>,
}

/// A message that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub text: String,
    pub sender: Sender,
    pub chat_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(chat_id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            chat_id: chat_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Request body for creating a chat through the local adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Request body for posting one message through the local adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
    pub sender: Sender,
}

/// Request body for posting messages: either one message or a batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostMessagesRequest {
    Batch { messages: Vec<PostMessageRequest> },
    Single(PostMessageRequest),
}

/// Fixed-width timestamp format so stored values sort lexicographically.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
