use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ChatState};

pub fn routes(state: ChatState) -> Router {
    Router::new()
        .route("/api/assistant/chat", post(handlers::chat_stream))
        .route("/api/assistant/chat/sync", post(handlers::chat_sync))
        .route("/api/assistant/rate-limit", get(handlers::rate_limit_status))
        .with_state(state)
}
