use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::UserContext;
use crate::features::threads::dtos::{
    CreateThreadDto, ListThreadsQuery, ThreadResponseDto, UpdateThreadDto,
};
use crate::features::threads::models::Thread;
use crate::modules::storage::{StorageError, ThreadStore, ThreadUpdate};

/// Thread CRUD over a `ThreadStore`. Ids are UUID v7 (time-ordered) and
/// timestamps are set here, so every store backend behaves identically.
pub struct ThreadService {
    store: Arc<dyn ThreadStore>,
}

/// An empty title from the caller stores NULL; this is the documented way
/// to clear a title on update.
fn normalize_title(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.is_empty())
}

/// V7 ids make collisions all but impossible, but a mapped table may carry
/// pre-existing rows; surface that as 409 instead of a generic 500.
fn map_insert_error(e: StorageError) -> AppError {
    match &e {
        StorageError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            AppError::Conflict("Thread with this id already exists".to_string())
        }
        _ => AppError::from(e),
    }
}

impl ThreadService {
    pub fn new(store: Arc<dyn ThreadStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, ctx: &UserContext, dto: CreateThreadDto) -> Result<ThreadResponseDto> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::now_v7(),
            title: normalize_title(dto.title),
            user_id: ctx.user_id.clone(),
            organization_id: ctx.organization_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            metadata: dto.metadata,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&thread).await.map_err(map_insert_error)?;
        Ok(ThreadResponseDto::from(thread))
    }

    pub async fn get(&self, ctx: &UserContext, id: Uuid) -> Result<ThreadResponseDto> {
        let thread = self
            .store
            .find_by_id(ctx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Thread with id {} not found", id)))?;

        Ok(ThreadResponseDto::from(thread))
    }

    /// Returns the page, the total ignoring limit/offset, and whether more
    /// records exist beyond the returned page.
    pub async fn list(
        &self,
        ctx: &UserContext,
        query: &ListThreadsQuery,
    ) -> Result<(Vec<ThreadResponseDto>, i64, bool)> {
        let params = query.to_params();
        let (threads, total) = self.store.list(ctx, &params).await?;

        let has_more = params.offset + (threads.len() as i64) < total;
        let dtos = threads.into_iter().map(ThreadResponseDto::from).collect();

        Ok((dtos, total, has_more))
    }

    pub async fn update(
        &self,
        ctx: &UserContext,
        id: Uuid,
        dto: UpdateThreadDto,
    ) -> Result<ThreadResponseDto> {
        let update = ThreadUpdate {
            title: dto.title.map(|t| normalize_title(Some(t))),
            metadata: dto.metadata,
        };

        let thread = self
            .store
            .update(ctx, id, update, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Thread with id {} not found", id)))?;

        Ok(ThreadResponseDto::from(thread))
    }

    pub async fn delete(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let deleted = self.store.delete(ctx, id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!(
                "Thread with id {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Resolve the thread a chat message belongs to: absent id creates a
    /// fresh thread in the caller's scope, present id must be visible there.
    pub async fn get_or_create(&self, ctx: &UserContext, id: Option<Uuid>) -> Result<Thread> {
        match id {
            Some(id) => self
                .store
                .find_by_id(ctx, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Thread with id {} not found", id))),
            None => {
                let now = Utc::now();
                let thread = Thread {
                    id: Uuid::now_v7(),
                    title: None,
                    user_id: ctx.user_id.clone(),
                    organization_id: ctx.organization_id.clone(),
                    tenant_id: ctx.tenant_id.clone(),
                    metadata: None,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert(&thread).await.map_err(map_insert_error)?;
                Ok(thread)
            }
        }
    }

    pub async fn touch(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let touched = self.store.touch(ctx, id, Utc::now()).await?;
        if !touched {
            return Err(AppError::NotFound(format!(
                "Thread with id {} not found",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::{MemoryThreadStore, SortOrder, ThreadOrderBy};
    use crate::shared::test_helpers::test_user_context;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;
    use serde_json::json;
    use std::time::Duration;

    fn service() -> ThreadService {
        ThreadService::new(Arc::new(MemoryThreadStore::new()))
    }

    fn other_org_context() -> UserContext {
        UserContext {
            organization_id: Some("other-org".to_string()),
            ..test_user_context()
        }
    }

    fn create_dto(title: &str) -> CreateThreadDto {
        CreateThreadDto {
            title: Some(title.to_string()),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_read_returns_same_fields() {
        let service = service();
        let ctx = test_user_context();
        let title: String = Sentence(1..4).fake();

        let created = service
            .create(
                &ctx,
                CreateThreadDto {
                    title: Some(title.clone()),
                    metadata: Some(json!({"topic": "billing"})),
                },
            )
            .await
            .unwrap();

        let fetched = service.get(&ctx, created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title.as_deref(), Some(title.as_str()));
        assert_eq!(fetched.user_id, ctx.user_id);
        assert_eq!(fetched.organization_id, ctx.organization_id);
        assert_eq!(fetched.metadata, Some(json!({"topic": "billing"})));
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_mutates_only_specified_fields() {
        let service = service();
        let ctx = test_user_context();

        let created = service
            .create(
                &ctx,
                CreateThreadDto {
                    title: Some("original".to_string()),
                    metadata: Some(json!({"keep": true})),
                },
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        let updated = service
            .update(
                &ctx,
                created.id,
                UpdateThreadDto {
                    title: Some("renamed".to_string()),
                    metadata: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("renamed"));
        assert_eq!(updated.metadata, Some(json!({"keep": true})));
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_replaces_metadata_wholesale() {
        let service = service();
        let ctx = test_user_context();

        let created = service
            .create(
                &ctx,
                CreateThreadDto {
                    title: None,
                    metadata: Some(json!({"a": 1, "b": 2})),
                },
            )
            .await
            .unwrap();

        let updated = service
            .update(
                &ctx,
                created.id,
                UpdateThreadDto {
                    title: None,
                    metadata: Some(json!({"c": 3})),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.metadata, Some(json!({"c": 3})));
    }

    #[tokio::test]
    async fn test_empty_title_clears_it() {
        let service = service();
        let ctx = test_user_context();

        let created = service.create(&ctx, create_dto("has a title")).await.unwrap();
        let updated = service
            .update(
                &ctx,
                created.id,
                UpdateThreadDto {
                    title: Some(String::new()),
                    metadata: None,
                },
            )
            .await
            .unwrap();

        assert!(updated.title.is_none());
    }

    #[tokio::test]
    async fn test_delete_makes_reads_return_not_found() {
        let service = service();
        let ctx = test_user_context();

        let created = service.create(&ctx, create_dto("doomed")).await.unwrap();
        service.delete(&ctx, created.id).await.unwrap();

        assert!(matches!(
            service.get(&ctx, created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&ctx, created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let service = service();
        let owner = test_user_context();
        let intruder = other_org_context();

        let created = service.create(&owner, create_dto("private")).await.unwrap();

        // Same user id under a different org sees nothing
        assert!(matches!(
            service.get(&intruder, created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update(
                    &intruder,
                    created.id,
                    UpdateThreadDto {
                        title: Some("hijacked".to_string()),
                        metadata: None
                    }
                )
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&intruder, created.id).await,
            Err(AppError::NotFound(_))
        ));

        let (threads, total, _) = service
            .list(&intruder, &ListThreadsQuery::default())
            .await
            .unwrap();
        assert!(threads.is_empty());
        assert_eq!(total, 0);

        // The owner is unaffected
        let fetched = service.get(&owner, created.id).await.unwrap();
        assert_eq!(fetched.title.as_deref(), Some("private"));
    }

    #[tokio::test]
    async fn test_list_pagination_and_has_more() {
        let service = service();
        let ctx = test_user_context();

        for i in 0..5 {
            service
                .create(&ctx, create_dto(&format!("thread {}", i)))
                .await
                .unwrap();
        }

        let query = ListThreadsQuery {
            limit: Some(2),
            ..Default::default()
        };
        let (page, total, has_more) = service.list(&ctx, &query).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 5);
        assert!(has_more);

        // Total is independent of the page, has_more flips at the boundary
        let query = ListThreadsQuery {
            limit: Some(2),
            offset: Some(4),
            ..Default::default()
        };
        let (page, total, has_more) = service.list(&ctx, &query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(total, 5);
        assert!(!has_more);
    }

    #[tokio::test]
    async fn test_list_sort_orders() {
        let service = service();
        let ctx = test_user_context();

        for title in ["bravo", "alpha", "charlie"] {
            service.create(&ctx, create_dto(title)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let query = ListThreadsQuery {
            order_by: ThreadOrderBy::Title,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let (page, _, _) = service.list(&ctx, &query).await.unwrap();
        let titles: Vec<_> = page.iter().filter_map(|t| t.title.as_deref()).collect();
        assert_eq!(titles, vec!["alpha", "bravo", "charlie"]);

        let query = ListThreadsQuery {
            order_by: ThreadOrderBy::CreatedAt,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let (page, _, _) = service.list(&ctx, &query).await.unwrap();
        let titles: Vec<_> = page.iter().filter_map(|t| t.title.as_deref()).collect();
        assert_eq!(titles, vec!["charlie", "alpha", "bravo"]);
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive_substring() {
        let service = service();
        let ctx = test_user_context();

        service.create(&ctx, create_dto("Billing question")).await.unwrap();
        service.create(&ctx, create_dto("weekly sync")).await.unwrap();
        service
            .create(&ctx, CreateThreadDto { title: None, metadata: None })
            .await
            .unwrap();

        let query = ListThreadsQuery {
            search: Some("BILL".to_string()),
            ..Default::default()
        };
        let (page, total, _) = service.list(&ctx, &query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].title.as_deref(), Some("Billing question"));
    }

    #[tokio::test]
    async fn test_get_or_create_without_id_creates_scoped_thread() {
        let service = service();
        let ctx = test_user_context();

        let thread = service.get_or_create(&ctx, None).await.unwrap();
        assert_eq!(thread.user_id, ctx.user_id);
        assert!(thread.title.is_none());

        // And it shows up in the owner's listing
        let (page, total, _) = service
            .list(&ctx, &ListThreadsQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, thread.id);
    }

    #[tokio::test]
    async fn test_get_or_create_with_foreign_id_not_found() {
        let service = service();
        let owner = test_user_context();
        let intruder = other_org_context();

        let thread = service.get_or_create(&owner, None).await.unwrap();

        assert!(matches!(
            service.get_or_create(&intruder, Some(thread.id)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_touch_bumps_updated_at() {
        let service = service();
        let ctx = test_user_context();

        let created = service.create(&ctx, create_dto("active")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        service.touch(&ctx, created.id).await.unwrap();

        let fetched = service.get(&ctx, created.id).await.unwrap();
        assert!(fetched.updated_at > created.updated_at);
    }
}
