//! HTTP client for the chatbot REST API.
//!
//! The session only depends on the [`ChatApi`] trait so it can run against a
//! mock in tests. [`HttpChatApi`] is the real `reqwest` implementation.

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `POST /api/conversations` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationCreated {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /api/chat` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub message_id: i64,
}

/// The three calls a chat session makes.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_conversation(&self) -> Result<ConversationCreated, ApiError>;
    async fn send_message(&self, conversation_id: i64, message: &str) -> Result<ChatReply, ApiError>;
    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), ApiError>;
}

pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, ApiError> {
        let request = self.http.request(method, self.url(path));
        let request = if let Some(json) = body { request.json(&json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), detail: error_detail(&text) });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/health", None).await
    }

    /// `GET /api/conversations/{id}/messages`, returned as raw JSON rows.
    pub async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Value>, ApiError> {
        self.request(Method::GET, &format!("/api/conversations/{conversation_id}/messages"), None)
            .await
    }
}

#[async_trait::async_trait]
impl ChatApi for HttpChatApi {
    async fn create_conversation(&self) -> Result<ConversationCreated, ApiError> {
        self.request(Method::POST, "/api/conversations", None).await
    }

    async fn send_message(&self, conversation_id: i64, message: &str) -> Result<ChatReply, ApiError> {
        let body = serde_json::json!({ "message": message, "conversation_id": conversation_id });
        self.request(Method::POST, "/api/chat", Some(body)).await
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .request(Method::DELETE, &format!("/api/conversations/{conversation_id}"), None)
            .await?;
        Ok(())
    }
}

/// Pull the `detail` field out of an error body, falling back to the raw text.
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(ToOwned::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
