//! In-memory `ThreadStore` used by service/handler/client tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::auth::model::UserContext;
use crate::features::threads::models::Thread;
use crate::modules::storage::{
    SortOrder, StorageError, ThreadListParams, ThreadOrderBy, ThreadStore, ThreadUpdate,
};

#[derive(Default)]
pub struct MemoryThreadStore {
    threads: Mutex<HashMap<Uuid, Thread>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_scope(thread: &Thread, scope: &UserContext) -> bool {
    thread.user_id == scope.user_id
        && thread.organization_id == scope.organization_id
        && thread.tenant_id == scope.tenant_id
}

/// Postgres sorts NULL titles last ascending (first descending); Option's
/// derived ordering puts None first, so compare explicitly to match.
fn cmp_title(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn insert(&self, thread: &Thread) -> Result<(), StorageError> {
        self.threads
            .lock()
            .unwrap()
            .insert(thread.id, thread.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &UserContext,
        id: Uuid,
    ) -> Result<Option<Thread>, StorageError> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .get(&id)
            .filter(|t| in_scope(t, scope))
            .cloned())
    }

    async fn list(
        &self,
        scope: &UserContext,
        params: &ThreadListParams,
    ) -> Result<(Vec<Thread>, i64), StorageError> {
        let threads = self.threads.lock().unwrap();

        let needle = params.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<Thread> = threads
            .values()
            .filter(|t| in_scope(t, scope))
            .filter(|t| match &needle {
                Some(needle) => t
                    .title
                    .as_ref()
                    .is_some_and(|title| title.to_lowercase().contains(needle)),
                None => true,
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match params.order_by {
                ThreadOrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
                ThreadOrderBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                ThreadOrderBy::Title => cmp_title(&a.title, &b.title),
            };
            match params.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as i64;
        let page: Vec<Thread> = matching
            .into_iter()
            .skip(params.offset.max(0) as usize)
            .take(params.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn update(
        &self,
        scope: &UserContext,
        id: Uuid,
        update: ThreadUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Thread>, StorageError> {
        let mut threads = self.threads.lock().unwrap();

        let Some(thread) = threads.get_mut(&id).filter(|t| in_scope(t, scope)) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            thread.title = title;
        }
        if let Some(metadata) = update.metadata {
            thread.metadata = Some(metadata);
        }
        thread.updated_at = updated_at;

        Ok(Some(thread.clone()))
    }

    async fn delete(&self, scope: &UserContext, id: Uuid) -> Result<bool, StorageError> {
        let mut threads = self.threads.lock().unwrap();

        if threads.get(&id).is_some_and(|t| in_scope(t, scope)) {
            threads.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn touch(
        &self,
        scope: &UserContext,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut threads = self.threads.lock().unwrap();

        match threads.get_mut(&id).filter(|t| in_scope(t, scope)) {
            Some(thread) => {
                thread.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::test_user_context;

    fn thread(title: Option<&str>) -> Thread {
        let now = Utc::now();
        let ctx = test_user_context();
        Thread {
            id: Uuid::now_v7(),
            title: title.map(String::from),
            user_id: ctx.user_id,
            organization_id: ctx.organization_id,
            tenant_id: ctx.tenant_id,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_null_titles_sort_last_ascending_first_descending() {
        let store = MemoryThreadStore::new();
        for t in [thread(None), thread(Some("zulu")), thread(Some("alpha"))] {
            store.insert(&t).await.unwrap();
        }

        let params = ThreadListParams {
            limit: 10,
            offset: 0,
            order_by: ThreadOrderBy::Title,
            sort_order: SortOrder::Asc,
            search: None,
        };
        let (page, _) = store.list(&test_user_context(), &params).await.unwrap();
        let titles: Vec<_> = page.iter().map(|t| t.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("alpha"), Some("zulu"), None]);

        let params = ThreadListParams {
            sort_order: SortOrder::Desc,
            ..params
        };
        let (page, _) = store.list(&test_user_context(), &params).await.unwrap();
        let titles: Vec<_> = page.iter().map(|t| t.title.as_deref()).collect();
        assert_eq!(titles, vec![None, Some("zulu"), Some("alpha")]);
    }
}
