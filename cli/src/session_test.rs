use super::*;
use crate::api::ConversationCreated;
use std::collections::VecDeque;
use std::sync::Mutex;

// =========================================================================
// MockApi
// =========================================================================

#[derive(Default)]
struct MockApi {
    next_ids: Mutex<VecDeque<Result<i64, u16>>>,
    replies: Mutex<VecDeque<Result<ChatReply, u16>>>,
    delete_fails: bool,
    sent: Mutex<Vec<(i64, String)>>,
    deleted: Mutex<Vec<i64>>,
}

impl MockApi {
    fn with_ids(ids: &[i64]) -> Self {
        let api = Self::default();
        api.next_ids.lock().unwrap().extend(ids.iter().copied().map(Ok));
        api
    }

    fn reply(self, response: &str, message_id: i64) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply { response: response.into(), message_id }));
        self
    }

    fn fail_next_reply(self) -> Self {
        self.replies.lock().unwrap().push_back(Err(500));
        self
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

fn status_error(status: u16) -> ApiError {
    ApiError::Status { status, detail: "mock".into() }
}

#[async_trait::async_trait]
impl ChatApi for MockApi {
    async fn create_conversation(&self) -> Result<ConversationCreated, ApiError> {
        match self.next_ids.lock().unwrap().pop_front() {
            Some(Ok(id)) => Ok(ConversationCreated { id, session_id: None }),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(503)),
        }
    }

    async fn send_message(&self, conversation_id: i64, message: &str) -> Result<ChatReply, ApiError> {
        self.sent.lock().unwrap().push((conversation_id, message.to_owned()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(500)),
        }
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), ApiError> {
        if self.delete_fails {
            return Err(status_error(500));
        }
        self.deleted.lock().unwrap().push(conversation_id);
        Ok(())
    }
}

async fn ready_session(api: MockApi) -> ChatSession<MockApi> {
    let mut session = ChatSession::new(api);
    assert!(session.initialize().await);
    session
}

// =========================================================================
// initialize
// =========================================================================

#[tokio::test]
async fn initialize_stores_conversation_id() {
    let session = ready_session(MockApi::with_ids(&[41])).await;
    assert_eq!(session.conversation_id(), Some(41));
    assert!(session.input_enabled());
}

#[tokio::test]
async fn initialize_failure_disables_input() {
    let mut session = ChatSession::new(MockApi::default());
    assert!(!session.initialize().await);
    assert_eq!(session.conversation_id(), None);
    assert!(!session.input_enabled());
}

// =========================================================================
// send
// =========================================================================

#[tokio::test]
async fn send_appends_user_then_assistant() {
    let mut session = ready_session(MockApi::with_ids(&[1]).reply("Hi there!", 10)).await;

    assert_eq!(session.send("  Hello  ").await, SendOutcome::Replied);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Hello");
    assert_eq!(messages[0].id, None);
    assert!(messages[0].timestamp.is_some());
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hi there!");
    assert_eq!(messages[1].id, Some(10));
    assert!(!session.is_loading());
    assert_eq!(*session.api().sent.lock().unwrap(), vec![(1, "Hello".to_owned())]);
}

#[tokio::test]
async fn send_failure_appends_static_error_reply() {
    let mut session = ready_session(MockApi::with_ids(&[1]).fail_next_reply()).await;

    assert_eq!(session.send("Hello").await, SendOutcome::Failed);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, ERROR_REPLY);
    assert_eq!(messages[1].id, None);
    assert!(session.input_enabled());
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let mut session = ready_session(MockApi::with_ids(&[1])).await;
    assert_eq!(session.send("   \n").await, SendOutcome::Ignored);
    assert!(session.messages().is_empty());
    assert_eq!(session.api().sent_count(), 0);
}

#[tokio::test]
async fn send_when_conversation_cannot_start_is_ignored() {
    let mut session = ChatSession::new(MockApi::default().reply("x", 1));
    assert_eq!(session.send("Hello").await, SendOutcome::Ignored);
    assert!(session.messages().is_empty());
    assert_eq!(session.api().sent_count(), 0);
}

#[tokio::test]
async fn send_retries_conversation_after_failed_start() {
    let api = MockApi::default().reply("Back online", 11);
    api.next_ids.lock().unwrap().extend([Err(503), Ok(5)]);
    let mut session = ChatSession::new(api);

    assert!(!session.initialize().await);
    assert!(!session.input_enabled());

    assert_eq!(session.send("hello").await, SendOutcome::Replied);
    assert_eq!(session.conversation_id(), Some(5));
    assert!(session.api().next_ids.lock().unwrap().is_empty());

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].content, "Back online");
    assert_eq!(*session.api().sent.lock().unwrap(), vec![(5, "hello".to_owned())]);
}

#[tokio::test]
async fn ensure_conversation_keeps_existing_id() {
    let mut session = ready_session(MockApi::with_ids(&[3, 4])).await;
    assert!(session.ensure_conversation().await);
    assert_eq!(session.conversation_id(), Some(3));
    assert_eq!(session.api().next_ids.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn second_send_while_in_flight_is_ignored() {
    let mut session = ready_session(MockApi::with_ids(&[1])).await;

    let pending = session.begin_send("first").expect("first send accepted");
    assert_eq!(pending, PendingSend { conversation_id: 1, message: "first".into() });
    assert!(session.is_loading());
    assert!(!session.input_enabled());

    assert!(session.begin_send("second").is_none());
    assert_eq!(session.messages().len(), 1);

    let outcome = session.finish_send(Ok(ChatReply { response: "ok".into(), message_id: 2 }));
    assert_eq!(outcome, SendOutcome::Replied);
    assert_eq!(session.messages().len(), 2);
    assert!(session.input_enabled());
}

#[tokio::test]
async fn finish_without_pending_send_is_ignored() {
    let mut session = ready_session(MockApi::with_ids(&[1])).await;
    let outcome = session.finish_send(Ok(ChatReply { response: "stray".into(), message_id: 9 }));
    assert_eq!(outcome, SendOutcome::Ignored);
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn send_suggested_uses_prompt_text() {
    let mut session = ready_session(MockApi::with_ids(&[1]).reply("Sure", 3)).await;

    assert_eq!(session.send_suggested(2).await, SendOutcome::Replied);
    assert_eq!(session.messages()[0].content, "Write a Python function to sort a list");
}

#[tokio::test]
async fn send_suggested_out_of_range_is_ignored() {
    let mut session = ready_session(MockApi::with_ids(&[1])).await;
    assert_eq!(session.send_suggested(9).await, SendOutcome::Ignored);
    assert_eq!(session.api().sent_count(), 0);
}

// =========================================================================
// clear
// =========================================================================

#[tokio::test]
async fn clear_confirmed_resets_and_reinitializes() {
    let mut session = ready_session(MockApi::with_ids(&[1, 2]).reply("a", 5)).await;
    session.send("q").await;

    assert_eq!(session.clear(true).await, ClearOutcome::Cleared);
    assert!(session.messages().is_empty());
    assert_eq!(session.conversation_id(), Some(2));
    assert_eq!(*session.api().deleted.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn clear_declined_changes_nothing() {
    let mut session = ready_session(MockApi::with_ids(&[1]).reply("a", 5)).await;
    session.send("q").await;

    assert_eq!(session.clear(false).await, ClearOutcome::Declined);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.conversation_id(), Some(1));
    assert!(session.api().deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn clear_without_conversation_does_nothing() {
    let mut session = ChatSession::new(MockApi::default());
    assert_eq!(session.clear(true).await, ClearOutcome::NoConversation);
}

#[tokio::test]
async fn clear_delete_failure_keeps_state() {
    let api = MockApi { delete_fails: true, ..MockApi::with_ids(&[1]) }.reply("a", 5);
    let mut session = ready_session(api).await;
    session.send("q").await;

    assert_eq!(session.clear(true).await, ClearOutcome::Failed);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.conversation_id(), Some(1));
}

// =========================================================================
// copy
// =========================================================================

#[tokio::test]
async fn copy_target_defaults_to_latest_assistant() {
    let mut session = ready_session(MockApi::with_ids(&[1]).reply("a1", 5).reply("a2", 6)).await;
    session.send("q1").await;
    session.send("q2").await;

    assert_eq!(session.copy_target(None), Some(3));
    assert_eq!(session.copy_target(Some(1)), Some(0));
    assert_eq!(session.copy_target(Some(0)), None);
    assert_eq!(session.copy_target(Some(5)), None);
}

#[tokio::test]
async fn copy_target_empty_transcript_is_none() {
    let session = ready_session(MockApi::with_ids(&[1])).await;
    assert_eq!(session.copy_target(None), None);
}

#[tokio::test]
async fn copied_marker_expires_after_ttl() {
    let mut session = ready_session(MockApi::with_ids(&[1]).reply("a", 5)).await;
    session.send("q").await;

    let start = Instant::now();
    session.mark_copied(1, start);
    assert_eq!(session.copied_index(start), Some(1));
    assert_eq!(session.copied_index(start + Duration::from_millis(1999)), Some(1));
    assert_eq!(session.copied_index(start + COPIED_MARKER_TTL), None);
}

#[tokio::test]
async fn mark_copied_ignores_out_of_range_index() {
    let mut session = ready_session(MockApi::with_ids(&[1])).await;
    let now = Instant::now();
    session.mark_copied(0, now);
    assert_eq!(session.copied_index(now), None);
}

#[tokio::test]
async fn resume_sends_to_existing_conversation() {
    let mut session = ChatSession::resume(MockApi::default().reply("again", 8), 77);
    assert!(session.input_enabled());
    assert_eq!(session.send("more").await, SendOutcome::Replied);
    assert_eq!(*session.api().sent.lock().unwrap(), vec![(77, "more".to_owned())]);
}
