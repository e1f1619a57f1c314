use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::assistant::dtos::RateLimitStatusDto;
use crate::features::auth::model::UserContext;
use crate::shared::types::ApiResponse;

use super::ChatState;

/// Get the caller's rate limit usage for the current window
#[utoipa::path(
    get,
    path = "/api/assistant/rate-limit",
    responses(
        (status = 200, description = "Rate limit status", body = ApiResponse<RateLimitStatusDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "assistant",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rate_limit_status(
    ctx: UserContext,
    State(state): State<ChatState>,
) -> Result<Json<ApiResponse<RateLimitStatusDto>>> {
    let status = state.rate_limit.status(&ctx.user_id)?;

    Ok(Json(ApiResponse::success(
        Some(RateLimitStatusDto {
            used: status.used,
            remaining: status.remaining,
            max_requests: status.max_requests,
            window_secs: status.window_secs,
            resets_at: status.resets_at,
        }),
        None,
        None,
    )))
}
