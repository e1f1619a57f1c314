use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::model::UserContext;
use crate::features::threads::dtos::{
    CreateThreadDto, ListThreadsQuery, ThreadResponseDto, UpdateThreadDto,
};
use crate::features::threads::services::ThreadService;
use crate::shared::types::{ApiResponse, Meta};

/// Create a new thread in the caller's scope
#[utoipa::path(
    post,
    path = "/api/threads",
    request_body = CreateThreadDto,
    responses(
        (status = 200, description = "Thread created successfully", body = ApiResponse<ThreadResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "threads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_thread(
    ctx: UserContext,
    State(service): State<Arc<ThreadService>>,
    AppJson(dto): AppJson<CreateThreadDto>,
) -> Result<Json<ApiResponse<ThreadResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let thread = service.create(&ctx, dto).await?;
    Ok(Json(ApiResponse::success(Some(thread), None, None)))
}

/// List the caller's threads with pagination, sorting, and title search
#[utoipa::path(
    get,
    path = "/api/threads",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "Threads retrieved successfully", body = ApiResponse<Vec<ThreadResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "threads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_threads(
    ctx: UserContext,
    State(service): State<Arc<ThreadService>>,
    AppQuery(query): AppQuery<ListThreadsQuery>,
) -> Result<Json<ApiResponse<Vec<ThreadResponseDto>>>> {
    let (threads, total, has_more) = service.list(&ctx, &query).await?;
    Ok(Json(ApiResponse::success(
        Some(threads),
        None,
        Some(Meta::page(total, has_more)),
    )))
}

/// Get a thread by ID (404 when absent or out of scope)
#[utoipa::path(
    get,
    path = "/api/threads/{id}",
    params(
        ("id" = Uuid, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread retrieved successfully", body = ApiResponse<ThreadResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_thread(
    ctx: UserContext,
    State(service): State<Arc<ThreadService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ThreadResponseDto>>> {
    let thread = service.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(Some(thread), None, None)))
}

/// Update a thread. Absent fields stay unchanged; metadata is replaced wholesale.
#[utoipa::path(
    put,
    path = "/api/threads/{id}",
    params(
        ("id" = Uuid, Path, description = "Thread ID")
    ),
    request_body = UpdateThreadDto,
    responses(
        (status = 200, description = "Thread updated successfully", body = ApiResponse<ThreadResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_thread(
    ctx: UserContext,
    State(service): State<Arc<ThreadService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateThreadDto>,
) -> Result<Json<ApiResponse<ThreadResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let thread = service.update(&ctx, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(thread), None, None)))
}

/// Delete a thread (hard delete)
#[utoipa::path(
    delete,
    path = "/api/threads/{id}",
    params(
        ("id" = Uuid, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_thread(
    ctx: UserContext,
    State(service): State<Arc<ThreadService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}
