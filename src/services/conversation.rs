//! Conversation service: conversations, stored messages, assistant replies.
//!
//! ARCHITECTURE
//! ============
//! Every chat turn is persisted: the user message is stored before the LLM
//! is called, so a failed reply still leaves the question in history. The
//! model sees the full stored history in order, followed by the new message.
//!
//! Timestamps are rendered to RFC 3339 text in SQL so rows serialize
//! straight to the REST response.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::types::{LlmError, Message, Role};
use crate::state::AppState;

/// System instruction sent with every chat call.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Answer clearly and concisely. \
Use Markdown for code, lists, and emphasis when it helps readability.";

const CREATED_AT_RFC3339: &str =
    r#"to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"') AS created_at"#;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Conversation not found")]
    NotFound(i64),
    #[error("Message must not be empty")]
    EmptyMessage,
    #[error("AI assistant is not configured")]
    LlmUnavailable,
    #[error("Failed to get AI response: {0}")]
    Llm(#[source] LlmError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// ROWS
// =============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConversationRow {
    pub id: i64,
    pub session_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Result of a successful chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub message_id: i64,
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Generate a conversation session id: `session_` plus the first 16 hex
/// chars of a v4 UUID.
#[must_use]
pub fn generate_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("session_{}", &hex[..16])
}

/// Reject blank messages. Returns the message unchanged otherwise.
pub fn validate_message(message: &str) -> Result<&str, ConversationError> {
    if message.trim().is_empty() {
        return Err(ConversationError::EmptyMessage);
    }
    Ok(message)
}

/// Build the provider message list: stored history in order, then the new
/// user message.
#[must_use]
pub fn build_history(stored: &[MessageRow], current: &str) -> Vec<Message> {
    let mut out: Vec<Message> = stored
        .iter()
        .map(|row| Message { role: Role::from_stored(&row.role), content: row.content.clone() })
        .collect();
    out.push(Message::user(current));
    out
}

// =============================================================================
// QUERIES
// =============================================================================

/// Create a new conversation with a fresh session id.
pub async fn create_conversation(pool: &PgPool) -> Result<ConversationRow, ConversationError> {
    let session_id = generate_session_id();
    let row = sqlx::query_as::<_, ConversationRow>(&format!(
        "INSERT INTO conversations (session_id) VALUES ($1) RETURNING id, session_id, {CREATED_AT_RFC3339}"
    ))
    .bind(&session_id)
    .fetch_one(pool)
    .await?;

    info!(conversation_id = row.id, %session_id, "conversation created");
    Ok(row)
}

/// List all messages of a conversation, oldest first. An unknown
/// conversation yields an empty list.
pub async fn list_messages(pool: &PgPool, conversation_id: i64) -> Result<Vec<MessageRow>, ConversationError> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT id, conversation_id, role, content, {CREATED_AT_RFC3339}
           FROM messages
          WHERE conversation_id = $1
          ORDER BY created_at ASC, id ASC"
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn conversation_exists(pool: &PgPool, conversation_id: i64) -> Result<bool, ConversationError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

async fn insert_message(
    pool: &PgPool,
    conversation_id: i64,
    role: Role,
    content: &str,
) -> Result<i64, ConversationError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO messages (conversation_id, role, content) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Run one chat turn: store the user message, ask the LLM, store the reply.
pub async fn chat(state: &AppState, conversation_id: i64, message: &str) -> Result<ChatReply, ConversationError> {
    let message = validate_message(message)?;

    if !conversation_exists(&state.pool, conversation_id).await? {
        return Err(ConversationError::NotFound(conversation_id));
    }
    let llm = state.llm.as_ref().ok_or(ConversationError::LlmUnavailable)?;

    let stored = list_messages(&state.pool, conversation_id).await?;
    insert_message(&state.pool, conversation_id, Role::User, message).await?;

    let history = build_history(&stored, message);
    let reply = match llm.chat(state.max_tokens, SYSTEM_PROMPT, &history).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, conversation_id, "LLM chat failed");
            return Err(ConversationError::Llm(e));
        }
    };

    let message_id = insert_message(&state.pool, conversation_id, Role::Assistant, &reply.text).await?;
    info!(
        conversation_id,
        message_id,
        model = %reply.model,
        stop_reason = %reply.stop_reason,
        input_tokens = reply.input_tokens,
        output_tokens = reply.output_tokens,
        "assistant reply stored"
    );

    Ok(ChatReply { response: reply.text, message_id })
}

/// Delete a conversation; its messages are removed by cascade.
pub async fn delete_conversation(pool: &PgPool, conversation_id: i64) -> Result<(), ConversationError> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ConversationError::NotFound(conversation_id));
    }

    info!(conversation_id, "conversation deleted");
    Ok(())
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
