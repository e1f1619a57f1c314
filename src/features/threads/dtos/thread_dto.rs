use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::threads::models::Thread;
use crate::modules::storage::{SortOrder, ThreadListParams, ThreadOrderBy};
use crate::shared::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::shared::validation::validate_thread_metadata;

// Create request
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateThreadDto {
    #[validate(length(max = 255))]
    pub title: Option<String>,

    /// Free-form metadata; must be a JSON object, at most 16 KiB serialized
    #[validate(custom(function = "validate_thread_metadata"))]
    pub metadata: Option<serde_json::Value>,
}

/// Update request. Absent fields stay unchanged; an empty title clears it;
/// metadata replaces the stored object wholesale.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateThreadDto {
    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_thread_metadata"))]
    pub metadata: Option<serde_json::Value>,
}

/// Query parameters for listing threads
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListThreadsQuery {
    /// Maximum number of threads to return (default: 20, max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,

    /// Number of threads to skip (default: 0)
    #[param(minimum = 0)]
    pub offset: Option<i64>,

    /// Sort key (default: updated_at)
    #[serde(default)]
    pub order_by: ThreadOrderBy,

    /// Sort direction (default: desc)
    #[serde(default)]
    pub sort_order: SortOrder,

    /// Case-insensitive substring match on title
    pub search: Option<String>,
}

impl ListThreadsQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn to_params(&self) -> ThreadListParams {
        ThreadListParams {
            limit: self.limit(),
            offset: self.offset(),
            order_by: self.order_by,
            sort_order: self.sort_order,
            search: self.search.clone().filter(|s| !s.is_empty()),
        }
    }
}

// Response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponseDto {
    pub id: Uuid,
    pub title: Option<String>,
    pub user_id: String,
    pub organization_id: Option<String>,
    pub tenant_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Thread> for ThreadResponseDto {
    fn from(t: Thread) -> Self {
        Self {
            id: t.id,
            title: t.title,
            user_id: t.user_id,
            organization_id: t.organization_id,
            tenant_id: t.tenant_id,
            metadata: t.metadata,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
