//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Conversations live in Postgres, so the state is just the pool plus the
//! optional LLM client and the reply settings handlers need.

use std::sync::Arc;

use sqlx::PgPool;

use crate::llm::LlmChat;
use crate::llm::config::DEFAULT_LLM_MAX_TOKENS;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// Completion token cap passed on every chat call.
    pub max_tokens: u32,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self { pool, llm, max_tokens: DEFAULT_LLM_MAX_TOKENS }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
