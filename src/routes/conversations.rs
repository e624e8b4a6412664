//! Conversation and chat REST routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::services::conversation::{self, ChatReply, ConversationError, ConversationRow, MessageRow};
use crate::state::AppState;

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        let status = conversation_error_to_status(&err);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "conversation request failed");
        }
        Self { status, detail: err.to_string() }
    }
}

pub(crate) fn conversation_error_to_status(err: &ConversationError) -> StatusCode {
    match err {
        ConversationError::NotFound(_) => StatusCode::NOT_FOUND,
        ConversationError::EmptyMessage => StatusCode::BAD_REQUEST,
        ConversationError::LlmUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ConversationError::Llm(_) | ConversationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: i64,
}

/// `POST /api/conversations`: create a new conversation.
pub async fn create_conversation(State(state): State<AppState>) -> Result<Json<ConversationRow>, ApiError> {
    let row = conversation::create_conversation(&state.pool).await?;
    Ok(Json(row))
}

/// `GET /api/conversations/:id/messages`: list stored messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> Result<Json<Vec<MessageRow>>, ApiError> {
    let rows = conversation::list_messages(&state.pool, conversation_id).await?;
    Ok(Json(rows))
}

/// `POST /api/chat`: send a message and get the assistant reply.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Result<Json<ChatReply>, ApiError> {
    let reply = conversation::chat(&state, body.conversation_id, &body.message).await?;
    Ok(Json(reply))
}

/// `DELETE /api/conversations/:id`: delete a conversation and its messages.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    conversation::delete_conversation(&state.pool, conversation_id).await?;
    Ok(Json(json!({ "message": "Conversation deleted successfully" })))
}

#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;
