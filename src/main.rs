mod db;
mod llm;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::llm::LlmChat;

#[tokio::main]
async fn main() {
    // Missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");
    tracing::info!("database tables ready");

    // Non-fatal: /api/chat answers 503 until the LLM is configured.
    let (llm, max_tokens) = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            let max_tokens = client.max_tokens();
            (Some(Arc::new(client) as Arc<dyn LlmChat>), max_tokens)
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; chat replies disabled");
            (None, llm::config::DEFAULT_LLM_MAX_TOKENS)
        }
    };

    let state = state::AppState::new(pool, llm).with_max_tokens(max_tokens);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chatbot API listening");
    axum::serve(listener, app).await.expect("server failed");
}
