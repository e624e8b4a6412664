//! Chat session state.
//!
//! DESIGN
//! ======
//! The session owns the in-memory transcript and the current conversation
//! id. A send is split into `begin_send` / `finish_send` so the terminal can
//! draw the user's message and a thinking indicator while the request is in
//! flight; `send` chains the two for callers that don't need to draw.
//!
//! At most one request is in flight. While one is, or while there is no
//! conversation id, input is disabled and `begin_send` ignores sends; `send`
//! first retries starting a conversation.

use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::{error, info};

use crate::api::{ApiError, ChatApi, ChatReply};
use crate::prompts;

/// Assistant text shown in place of a reply when the request fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Confirmation question asked before clearing.
pub const CLEAR_CONFIRMATION: &str = "Clear this conversation? This cannot be undone.";

/// How long a message shows its copied marker.
pub const COPIED_MARKER_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Server message id; only assistant replies carry one.
    pub id: Option<i64>,
    /// Local creation time. `None` renders as an empty timestamp.
    pub timestamp: Option<OffsetDateTime>,
}

impl ChatMessage {
    fn now(role: Role, content: impl Into<String>, id: Option<i64>) -> Self {
        Self { role, content: content.into(), id, timestamp: Some(OffsetDateTime::now_utc()) }
    }
}

/// A send that has been accepted and is waiting on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub conversation_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, no conversation, or a request already in flight.
    Ignored,
    Replied,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    NoConversation,
    Declined,
    Cleared,
    Failed,
}

pub struct ChatSession<A> {
    api: A,
    conversation_id: Option<i64>,
    messages: Vec<ChatMessage>,
    in_flight: bool,
    copied: Option<(usize, Instant)>,
}

impl<A: ChatApi> ChatSession<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self { api, conversation_id: None, messages: Vec::new(), in_flight: false, copied: None }
    }

    /// Continue an existing backend conversation. The local transcript
    /// starts empty.
    #[must_use]
    pub fn resume(api: A, conversation_id: i64) -> Self {
        Self { conversation_id: Some(conversation_id), ..Self::new(api) }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Input is accepted only with a conversation and no request in flight.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.conversation_id.is_some() && !self.in_flight
    }

    /// Create a conversation on the backend. Failure is logged and leaves
    /// the session without an id.
    pub async fn initialize(&mut self) -> bool {
        match self.api.create_conversation().await {
            Ok(created) => {
                info!(conversation_id = created.id, session_id = created.session_id.as_deref(), "conversation started");
                self.conversation_id = Some(created.id);
                true
            }
            Err(e) => {
                error!(error = %e, "error creating conversation");
                self.conversation_id = None;
                false
            }
        }
    }

    /// Make sure there is a conversation to send to, creating one if an
    /// earlier attempt failed. Returns whether one is available.
    pub async fn ensure_conversation(&mut self) -> bool {
        if self.conversation_id.is_some() {
            return true;
        }
        self.initialize().await
    }

    /// Accept a message for sending: append the user entry and mark a
    /// request in flight. Returns `None` when the send is ignored.
    pub fn begin_send(&mut self, input: &str) -> Option<PendingSend> {
        let message = input.trim();
        if message.is_empty() || !self.input_enabled() {
            return None;
        }
        let conversation_id = self.conversation_id?;

        self.messages.push(ChatMessage::now(Role::User, message, None));
        self.in_flight = true;
        Some(PendingSend { conversation_id, message: message.to_owned() })
    }

    /// Record the backend result for the in-flight send: exactly one
    /// assistant entry, either the reply or [`ERROR_REPLY`].
    pub fn finish_send(&mut self, result: Result<ChatReply, ApiError>) -> SendOutcome {
        if !self.in_flight {
            return SendOutcome::Ignored;
        }
        self.in_flight = false;

        match result {
            Ok(reply) => {
                self.messages.push(ChatMessage::now(Role::Assistant, reply.response, Some(reply.message_id)));
                SendOutcome::Replied
            }
            Err(e) => {
                error!(error = %e, "error sending message");
                self.messages.push(ChatMessage::now(Role::Assistant, ERROR_REPLY, None));
                SendOutcome::Failed
            }
        }
    }

    /// Send a message and wait for the reply. Retries starting a
    /// conversation first if there is none yet.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        if input.trim().is_empty() || self.in_flight || !self.ensure_conversation().await {
            return SendOutcome::Ignored;
        }
        let Some(pending) = self.begin_send(input) else {
            return SendOutcome::Ignored;
        };
        let result = self.api.send_message(pending.conversation_id, &pending.message).await;
        self.finish_send(result)
    }

    /// Send one of the suggested prompts by its 1-based number.
    pub async fn send_suggested(&mut self, number: usize) -> SendOutcome {
        match prompts::by_number(number) {
            Some(prompt) => self.send(prompt.text).await,
            None => SendOutcome::Ignored,
        }
    }

    /// Clear the conversation once the user has answered the confirmation.
    /// On success the transcript is emptied and a new conversation started.
    pub async fn clear(&mut self, confirmed: bool) -> ClearOutcome {
        let Some(conversation_id) = self.conversation_id else {
            return ClearOutcome::NoConversation;
        };
        if !confirmed {
            return ClearOutcome::Declined;
        }

        if let Err(e) = self.api.delete_conversation(conversation_id).await {
            error!(error = %e, conversation_id, "error clearing chat");
            return ClearOutcome::Failed;
        }

        self.messages.clear();
        self.copied = None;
        self.initialize().await;
        ClearOutcome::Cleared
    }

    /// Resolve a `/copy` target: a 1-based message number, or the latest
    /// assistant message when `None`. Returns the 0-based index.
    #[must_use]
    pub fn copy_target(&self, number: Option<usize>) -> Option<usize> {
        match number {
            Some(n) => n.checked_sub(1).filter(|i| *i < self.messages.len()),
            None => self.messages.iter().rposition(|m| m.role == Role::Assistant),
        }
    }

    /// Mark a message as copied at `now`.
    pub fn mark_copied(&mut self, index: usize, now: Instant) {
        if index < self.messages.len() {
            self.copied = Some((index, now));
        }
    }

    /// Index of the message still showing its copied marker at `now`.
    #[must_use]
    pub fn copied_index(&self, now: Instant) -> Option<usize> {
        self.copied
            .filter(|(_, at)| now.saturating_duration_since(*at) < COPIED_MARKER_TTL)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
