use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{sse::Event, sse::KeepAlive, IntoResponse, Response, Sse},
    Json,
};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::assistant::dtos::{ChatRequestDto, ChatResponseDto};
use crate::features::assistant::services::{AssistantRuntimeService, ChatEvent, RateLimitService};
use crate::features::auth::model::UserContext;
use crate::features::threads::services::ThreadService;
use crate::shared::types::ApiResponse;

/// State for chat handlers
#[derive(Clone)]
pub struct ChatState {
    pub threads: Arc<ThreadService>,
    pub runtime: Arc<AssistantRuntimeService>,
    pub rate_limit: Arc<RateLimitService>,
}

fn to_sse_event(event: ChatEvent) -> Event {
    match event {
        ChatEvent::Delta { text } => Event::default()
            .event("message.delta")
            .data(json!({ "text": text }).to_string()),
        ChatEvent::Completed { thread_id } => Event::default()
            .event("message.completed")
            .data(json!({ "thread_id": thread_id }).to_string()),
    }
}

/// Send a message and receive a streaming SSE response
#[utoipa::path(
    post,
    path = "/api/assistant/chat",
    request_body = ChatRequestDto,
    responses(
        (status = 200, description = "SSE stream of chat events", content_type = "text/event-stream"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Thread not found"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Assistant runtime error")
    ),
    tag = "assistant",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn chat_stream(
    ctx: UserContext,
    State(state): State<ChatState>,
    AppJson(dto): AppJson<ChatRequestDto>,
) -> Result<Response> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let thread = state.threads.get_or_create(&ctx, dto.thread_id).await?;
    state.rate_limit.check_and_increment(&ctx.user_id)?;

    let rx = state.runtime.chat_stream(thread.id, &dto.message).await?;
    state.threads.touch(&ctx, thread.id).await?;

    let stream = ReceiverStream::new(rx)
        .map(|event| Ok::<_, std::convert::Infallible>(to_sse_event(event)));

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    );

    Ok(sse.into_response())
}

/// Send a message and receive a synchronous response (non-streaming fallback)
#[utoipa::path(
    post,
    path = "/api/assistant/chat/sync",
    request_body = ChatRequestDto,
    responses(
        (status = 200, description = "Chat response", body = ApiResponse<ChatResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Thread not found"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Assistant runtime error")
    ),
    tag = "assistant",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn chat_sync(
    ctx: UserContext,
    State(state): State<ChatState>,
    AppJson(dto): AppJson<ChatRequestDto>,
) -> Result<Json<ApiResponse<ChatResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let thread = state.threads.get_or_create(&ctx, dto.thread_id).await?;
    state.rate_limit.check_and_increment(&ctx.user_id)?;

    let reply = state.runtime.chat_sync(thread.id, &dto.message).await?;
    state.threads.touch(&ctx, thread.id).await?;

    Ok(Json(ApiResponse::success(
        Some(ChatResponseDto {
            thread_id: thread.id,
            reply,
        }),
        None,
        None,
    )))
}
