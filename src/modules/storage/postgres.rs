use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use crate::features::auth::model::UserContext;
use crate::features::threads::models::Thread;
use crate::modules::storage::mapping::{MetadataFormat, ThreadTableMapping};
use crate::modules::storage::{
    StorageError, ThreadListParams, ThreadOrderBy, ThreadStore, ThreadUpdate,
};

/// `ThreadStore` over Postgres with a configurable table/column mapping.
///
/// Queries are built at call time from the mapping (identifiers validated
/// at construction) and every value travels as a bound parameter.
pub struct PostgresThreadStore {
    pool: PgPool,
    mapping: ThreadTableMapping,
}

impl PostgresThreadStore {
    pub fn new(pool: PgPool, mapping: ThreadTableMapping) -> Result<Self, StorageError> {
        mapping.validate()?;
        Ok(Self { pool, mapping })
    }
}

/// Select list aliasing mapped columns back to canonical field names,
/// so row decoding is mapping-independent.
fn select_list(m: &ThreadTableMapping) -> String {
    format!(
        r#""{}" AS "id", "{}" AS "title", "{}" AS "user_id", "{}" AS "organization_id", "{}" AS "tenant_id", "{}" AS "metadata", "{}" AS "created_at", "{}" AS "updated_at""#,
        m.id,
        m.title,
        m.user_id,
        m.organization_id,
        m.tenant_id,
        m.metadata,
        m.created_at,
        m.updated_at,
    )
}

/// Tenant-isolation predicate. The optional scope columns use
/// IS NOT DISTINCT FROM so a NULL org/tenant only matches rows with a
/// NULL org/tenant.
fn scope_clause(m: &ThreadTableMapping, first_param: usize) -> String {
    format!(
        r#""{}" = ${} AND "{}" IS NOT DISTINCT FROM ${} AND "{}" IS NOT DISTINCT FROM ${}"#,
        m.user_id,
        first_param,
        m.organization_id,
        first_param + 1,
        m.tenant_id,
        first_param + 2,
    )
}

fn order_column<'a>(m: &'a ThreadTableMapping, order_by: ThreadOrderBy) -> &'a str {
    match order_by {
        ThreadOrderBy::CreatedAt => &m.created_at,
        ThreadOrderBy::UpdatedAt => &m.updated_at,
        ThreadOrderBy::Title => &m.title,
    }
}

fn insert_sql(m: &ThreadTableMapping) -> String {
    format!(
        r#"INSERT INTO "{}" ("{}", "{}", "{}", "{}", "{}", "{}", "{}", "{}") VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        m.table,
        m.id,
        m.title,
        m.user_id,
        m.organization_id,
        m.tenant_id,
        m.metadata,
        m.created_at,
        m.updated_at,
    )
}

fn find_sql(m: &ThreadTableMapping) -> String {
    format!(
        r#"SELECT {} FROM "{}" WHERE "{}" = $1 AND {}"#,
        select_list(m),
        m.table,
        m.id,
        scope_clause(m, 2),
    )
}

fn count_sql(m: &ThreadTableMapping, with_search: bool) -> String {
    let mut sql = format!(
        r#"SELECT COUNT(*) FROM "{}" WHERE {}"#,
        m.table,
        scope_clause(m, 1),
    );
    if with_search {
        sql.push_str(&format!(r#" AND "{}" ILIKE $4"#, m.title));
    }
    sql
}

fn list_sql(m: &ThreadTableMapping, params: &ThreadListParams) -> String {
    let mut sql = format!(
        r#"SELECT {} FROM "{}" WHERE {}"#,
        select_list(m),
        m.table,
        scope_clause(m, 1),
    );

    let mut next = 4;
    if params.search.is_some() {
        sql.push_str(&format!(r#" AND "{}" ILIKE ${}"#, m.title, next));
        next += 1;
    }

    sql.push_str(&format!(
        r#" ORDER BY "{}" {} LIMIT ${} OFFSET ${}"#,
        order_column(m, params.order_by),
        params.sort_order.as_sql(),
        next,
        next + 1,
    ));
    sql
}

fn update_sql(m: &ThreadTableMapping, set_title: bool, set_metadata: bool) -> String {
    let mut set_parts = vec![format!(r#""{}" = $1"#, m.updated_at)];
    let mut next = 2;

    if set_title {
        set_parts.push(format!(r#""{}" = ${}"#, m.title, next));
        next += 1;
    }
    if set_metadata {
        set_parts.push(format!(r#""{}" = ${}"#, m.metadata, next));
        next += 1;
    }

    format!(
        r#"UPDATE "{}" SET {} WHERE "{}" = ${} AND {} RETURNING {}"#,
        m.table,
        set_parts.join(", "),
        m.id,
        next,
        scope_clause(m, next + 1),
        select_list(m),
    )
}

fn delete_sql(m: &ThreadTableMapping) -> String {
    format!(
        r#"DELETE FROM "{}" WHERE "{}" = $1 AND {}"#,
        m.table,
        m.id,
        scope_clause(m, 2),
    )
}

fn touch_sql(m: &ThreadTableMapping) -> String {
    format!(
        r#"UPDATE "{}" SET "{}" = $1 WHERE "{}" = $2 AND {}"#,
        m.table,
        m.updated_at,
        m.id,
        scope_clause(m, 3),
    )
}

/// Serialize metadata for a TEXT column
fn metadata_to_text(value: Option<&serde_json::Value>) -> Result<Option<String>, StorageError> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

/// Parse metadata read back from a TEXT column
fn metadata_from_text(raw: Option<String>) -> Result<Option<serde_json::Value>, StorageError> {
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}

/// Bind the metadata value according to the configured storage format
/// (the "coerce types" half of the mapping).
fn bind_metadata<'q>(
    query: Query<'q, Postgres, PgArguments>,
    format: MetadataFormat,
    value: Option<&serde_json::Value>,
) -> Result<Query<'q, Postgres, PgArguments>, StorageError> {
    Ok(match format {
        MetadataFormat::Jsonb => query.bind(value.cloned()),
        MetadataFormat::Text => query.bind(metadata_to_text(value)?),
    })
}

fn row_to_thread(row: &PgRow, format: MetadataFormat) -> Result<Thread, StorageError> {
    let metadata = match format {
        MetadataFormat::Jsonb => row.try_get::<Option<serde_json::Value>, _>("metadata")?,
        MetadataFormat::Text => metadata_from_text(row.try_get::<Option<String>, _>("metadata")?)?,
    };

    Ok(Thread {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        user_id: row.try_get("user_id")?,
        organization_id: row.try_get("organization_id")?,
        tenant_id: row.try_get("tenant_id")?,
        metadata,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ThreadStore for PostgresThreadStore {
    async fn insert(&self, thread: &Thread) -> Result<(), StorageError> {
        let sql = insert_sql(&self.mapping);

        let mut query = sqlx::query(&sql)
            .bind(thread.id)
            .bind(thread.title.as_deref())
            .bind(&thread.user_id)
            .bind(thread.organization_id.as_deref())
            .bind(thread.tenant_id.as_deref());
        query = bind_metadata(
            query,
            self.mapping.metadata_format,
            thread.metadata.as_ref(),
        )?;

        query
            .bind(thread.created_at)
            .bind(thread.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &UserContext,
        id: Uuid,
    ) -> Result<Option<Thread>, StorageError> {
        let sql = find_sql(&self.mapping);

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_thread(&r, self.mapping.metadata_format))
            .transpose()
    }

    async fn list(
        &self,
        scope: &UserContext,
        params: &ThreadListParams,
    ) -> Result<(Vec<Thread>, i64), StorageError> {
        let search_pattern = params.search.as_ref().map(|s| format!("%{}%", s));

        let count_query = count_sql(&self.mapping, search_pattern.is_some());
        let mut count = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref());
        if let Some(ref pattern) = search_pattern {
            count = count.bind(pattern);
        }
        let total: i64 = count.fetch_one(&self.pool).await?;

        let page_query = list_sql(&self.mapping, params);
        let mut page = sqlx::query(&page_query)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref());
        if let Some(ref pattern) = search_pattern {
            page = page.bind(pattern);
        }
        let rows = page
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        let threads = rows
            .iter()
            .map(|r| row_to_thread(r, self.mapping.metadata_format))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((threads, total))
    }

    async fn update(
        &self,
        scope: &UserContext,
        id: Uuid,
        update: ThreadUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Thread>, StorageError> {
        let sql = update_sql(
            &self.mapping,
            update.title.is_some(),
            update.metadata.is_some(),
        );

        let mut query = sqlx::query(&sql).bind(updated_at);
        if let Some(title) = update.title {
            query = query.bind(title);
        }
        if let Some(ref metadata) = update.metadata {
            query = bind_metadata(query, self.mapping.metadata_format, Some(metadata))?;
        }

        let row = query
            .bind(id)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_thread(&r, self.mapping.metadata_format))
            .transpose()
    }

    async fn delete(&self, scope: &UserContext, id: Uuid) -> Result<bool, StorageError> {
        let sql = delete_sql(&self.mapping);

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch(
        &self,
        scope: &UserContext,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let sql = touch_sql(&self.mapping);

        let result = sqlx::query(&sql)
            .bind(at)
            .bind(id)
            .bind(&scope.user_id)
            .bind(scope.organization_id.as_deref())
            .bind(scope.tenant_id.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::SortOrder;

    /// A mapping with every name renamed, to verify the SQL reflects the
    /// configuration rather than the canonical layout.
    fn renamed() -> ThreadTableMapping {
        ThreadTableMapping {
            table: "conversations".to_string(),
            id: "conversation_id".to_string(),
            title: "subject".to_string(),
            user_id: "owner".to_string(),
            organization_id: "org".to_string(),
            tenant_id: "realm".to_string(),
            metadata: "extra".to_string(),
            created_at: "inserted_at".to_string(),
            updated_at: "touched_at".to_string(),
            metadata_format: MetadataFormat::Text,
        }
    }

    fn list_params(search: Option<&str>) -> ThreadListParams {
        ThreadListParams {
            limit: 20,
            offset: 0,
            order_by: ThreadOrderBy::UpdatedAt,
            sort_order: SortOrder::Desc,
            search: search.map(String::from),
        }
    }

    #[test]
    fn test_insert_sql_uses_mapped_names() {
        let sql = insert_sql(&renamed());
        assert!(sql.starts_with(r#"INSERT INTO "conversations""#));
        assert!(sql.contains(r#""conversation_id""#));
        assert!(sql.contains(r#""subject""#));
        assert!(sql.contains("$8"));
    }

    #[test]
    fn test_scope_uses_null_safe_comparison() {
        let sql = find_sql(&renamed());
        assert!(sql.contains(r#""owner" = $2"#));
        assert!(sql.contains(r#""org" IS NOT DISTINCT FROM $3"#));
        assert!(sql.contains(r#""realm" IS NOT DISTINCT FROM $4"#));
    }

    #[test]
    fn test_select_list_aliases_to_canonical_names() {
        let sql = find_sql(&renamed());
        assert!(sql.contains(r#""conversation_id" AS "id""#));
        assert!(sql.contains(r#""touched_at" AS "updated_at""#));
    }

    #[test]
    fn test_list_sql_without_search() {
        let sql = list_sql(&renamed(), &list_params(None));
        assert!(sql.contains(r#"ORDER BY "touched_at" DESC LIMIT $4 OFFSET $5"#));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn test_list_sql_with_search_shifts_placeholders() {
        let sql = list_sql(&renamed(), &list_params(Some("billing")));
        assert!(sql.contains(r#""subject" ILIKE $4"#));
        assert!(sql.contains("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn test_list_sql_orders_by_requested_column() {
        let mut params = list_params(None);
        params.order_by = ThreadOrderBy::Title;
        params.sort_order = SortOrder::Asc;

        let sql = list_sql(&renamed(), &params);
        assert!(sql.contains(r#"ORDER BY "subject" ASC"#));
    }

    #[test]
    fn test_count_sql_with_search() {
        let sql = count_sql(&renamed(), true);
        assert!(sql.starts_with(r#"SELECT COUNT(*) FROM "conversations""#));
        assert!(sql.contains(r#""subject" ILIKE $4"#));
    }

    #[test]
    fn test_update_sql_placeholder_numbering() {
        // Only updated_at: id lands at $2, scope at $3..$5
        let sql = update_sql(&renamed(), false, false);
        assert!(sql.contains(r#"SET "touched_at" = $1 WHERE "conversation_id" = $2"#));
        assert!(sql.contains(r#""owner" = $3"#));

        // Title and metadata shift everything after them
        let sql = update_sql(&renamed(), true, true);
        assert!(sql.contains(r#""subject" = $2"#));
        assert!(sql.contains(r#""extra" = $3"#));
        assert!(sql.contains(r#""conversation_id" = $4"#));
        assert!(sql.contains(r#""owner" = $5"#));
        assert!(sql.contains("RETURNING"));
    }

    #[test]
    fn test_text_format_metadata_round_trips() {
        let value = serde_json::json!({"topic": "billing", "tags": ["a", "b"], "pinned": true});

        let stored = metadata_to_text(Some(&value)).unwrap();
        assert!(stored.as_deref().is_some_and(|s| s.contains("billing")));

        let restored = metadata_from_text(stored).unwrap();
        assert_eq!(restored, Some(value));

        assert_eq!(metadata_to_text(None).unwrap(), None);
        assert_eq!(metadata_from_text(None).unwrap(), None);
    }

    #[test]
    fn test_text_format_rejects_corrupt_metadata() {
        let err = metadata_from_text(Some("{not json".to_string())).unwrap_err();
        assert!(matches!(err, StorageError::CorruptMetadata(_)));
    }

    #[test]
    fn test_delete_and_touch_sql() {
        let delete = delete_sql(&renamed());
        assert!(delete.starts_with(r#"DELETE FROM "conversations""#));
        assert!(delete.contains(r#""conversation_id" = $1"#));

        let touch = touch_sql(&renamed());
        assert!(touch.contains(r#"SET "touched_at" = $1"#));
        assert!(touch.contains(r#""conversation_id" = $2"#));
    }
}
