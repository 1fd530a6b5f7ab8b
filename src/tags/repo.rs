use async_trait::async_trait;

use super::repo_types::Tag;
use crate::db::PgStore;
use crate::store::StoreError;

#[async_trait]
pub trait TagRepo: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError>;
    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError>;
    /// Ids from `ids` that do not name a stored tag.
    async fn missing_tag_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError>;
}

#[async_trait]
impl TagRepo for PgStore {
    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn missing_tag_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT wanted.id
              FROM UNNEST($1::BIGINT[]) AS wanted(id)
             WHERE NOT EXISTS (SELECT 1 FROM tags t WHERE t.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
