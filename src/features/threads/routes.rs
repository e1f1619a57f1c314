use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::threads::{handlers, services::ThreadService};

/// Create routes for thread management
pub fn routes(service: Arc<ThreadService>) -> Router {
    Router::new()
        .route("/api/threads", post(handlers::create_thread))
        .route("/api/threads", get(handlers::list_threads))
        .route(
            "/api/threads/{id}",
            get(handlers::get_thread)
                .put(handlers::update_thread)
                .delete(handlers::delete_thread),
        )
        .with_state(service)
}
