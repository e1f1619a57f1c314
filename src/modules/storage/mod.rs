//! Storage adapters for thread records
//!
//! `ThreadStore` is the seam between the thread service and any relational
//! backing store. `PostgresThreadStore` implements it over sqlx with a
//! configurable table/column mapping; `MemoryThreadStore` backs the tests.

pub mod mapping;
#[cfg(test)]
pub mod memory;
mod postgres;

pub use mapping::{MetadataFormat, ThreadTableMapping};
#[cfg(test)]
pub use memory::MemoryThreadStore;
pub use postgres::PostgresThreadStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::model::UserContext;
use crate::features::threads::models::Thread;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid SQL identifier in thread table mapping: {0:?}")]
    InvalidIdentifier(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored metadata is not valid JSON: {0}")]
    CorruptMetadata(#[from] serde_json::Error),
}

/// Sort key for thread listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThreadOrderBy {
    CreatedAt,
    #[default]
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter/sort/page parameters for scoped thread listings
#[derive(Debug, Clone)]
pub struct ThreadListParams {
    pub limit: i64,
    pub offset: i64,
    pub order_by: ThreadOrderBy,
    pub sort_order: SortOrder,
    /// Case-insensitive substring match on title
    pub search: Option<String>,
}

/// Partial update of a thread. `None` leaves the field untouched;
/// `title: Some(None)` clears the title.
#[derive(Debug, Clone, Default)]
pub struct ThreadUpdate {
    pub title: Option<Option<String>>,
    pub metadata: Option<serde_json::Value>,
}

/// The seam between the thread service and a relational backing store.
/// Every method is scoped by the caller's full UserContext triple; a thread
/// outside that scope behaves exactly like a missing one.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Persist a fully-populated thread record (id and timestamps set by the caller)
    async fn insert(&self, thread: &Thread) -> Result<(), StorageError>;

    async fn find_by_id(&self, scope: &UserContext, id: Uuid)
        -> Result<Option<Thread>, StorageError>;

    /// Returns the requested page plus the total count ignoring limit/offset
    async fn list(
        &self,
        scope: &UserContext,
        params: &ThreadListParams,
    ) -> Result<(Vec<Thread>, i64), StorageError>;

    /// Apply a partial update; returns the updated record, or None when the
    /// thread is absent or out of scope
    async fn update(
        &self,
        scope: &UserContext,
        id: Uuid,
        update: ThreadUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Thread>, StorageError>;

    /// Hard delete; returns false when the thread is absent or out of scope
    async fn delete(&self, scope: &UserContext, id: Uuid) -> Result<bool, StorageError>;

    /// Bump updated_at without touching any other field
    async fn touch(
        &self,
        scope: &UserContext,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;
}
