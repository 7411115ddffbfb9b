//! Chat endpoints.
//!
//! Reads fall back to empty results when the store is unavailable or failing;
//! writes report the failure.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Chat, CreateChatRequest, Message, NewMessage, PostMessagesRequest};
use crate::AppState;

/// GET /api/chats - All chats, newest first.
pub async fn list_chats(State(state): State<AppState>) -> ApiResult<Vec<Chat>> {
    success(state.chats.get_all_chats().await.into_value_or_default())
}

/// POST /api/chats - Create a chat, or return the existing one for that name when no id is given.
pub async fn create_chat(
    State(state): State<AppState>,
    Json(request): Json<CreateChatRequest>,
) -> ApiResult<Chat> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Chat name is required".to_string()));
    }
    if request.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(AppError::Validation("Chat id must not be blank".to_string()));
    }

    let chat = match request.id {
        Some(id) => {
            let chat = Chat::new(id, request.name);
            state.chats.create_chat(&chat).await.into_result()?;
            chat
        }
        None => state
            .chats
            .find_or_create_chat(&request.name)
            .await
            .into_result()?,
    };
    success(chat)
}

/// GET /api/chats/:id
pub async fn get_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Chat> {
    match state.chats.get_chat_by_id(&id).await.into_value_or_default() {
        Some(chat) => success(chat),
        None => Err(AppError::NotFound(format!("Chat {} not found", id))),
    }
}

/// DELETE /api/chats/:id - Delete the chat row; messages are removed separately.
pub async fn delete_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    if state.chats.delete_chat_by_id(&id).await.into_result()? {
        success(())
    } else {
        Err(AppError::NotFound(format!("Chat {} not found", id)))
    }
}

/// GET /api/chats/:id/messages - Messages in chronological order.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Message>> {
    success(state.chats.get_messages_by_chat_id(&id).await.into_value_or_default())
}

/// POST /api/chats/:id/messages - Store one message or a batch.
pub async fn post_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PostMessagesRequest>,
) -> ApiResult<Vec<Message>> {
    if state.chats.get_chat_by_id(&id).await.into_result()?.is_none() {
        return Err(AppError::NotFound(format!("Chat {} not found", id)));
    }

    let saved = match request {
        PostMessagesRequest::Single(message) => {
            let message = NewMessage::new(id, message.sender, message.text);
            vec![state.chats.save_message(&message).await.into_result()?]
        }
        PostMessagesRequest::Batch { messages } => {
            if messages.is_empty() {
                return Err(AppError::Validation("No messages provided".to_string()));
            }
            let batch: Vec<NewMessage> = messages
                .into_iter()
                .map(|m| NewMessage::new(id.clone(), m.sender, m.text))
                .collect();
            state.chats.save_messages(&batch).await.into_result()?
        }
    };
    success(saved)
}

/// DELETE /api/chats/:id/messages - Delete all messages of a chat.
pub async fn delete_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<u64> {
    success(state.chats.delete_messages_by_chat_id(&id).await.into_result()?)
}
