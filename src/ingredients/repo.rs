use async_trait::async_trait;

use super::repo_types::Ingredient;
use crate::db::PgStore;
use crate::store::StoreError;

#[async_trait]
pub trait IngredientRepo: Send + Sync {
    /// All ingredients, or those whose name starts with `prefix`
    /// (case-insensitive), ordered by name.
    async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>, StoreError>;
    async fn find_ingredient(&self, id: i64) -> Result<Option<Ingredient>, StoreError>;
    /// Ids from `ids` that do not name a stored ingredient.
    async fn missing_ingredient_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError>;
}

/// Escapes LIKE wildcards so user input is matched literally.
fn like_prefix(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[async_trait]
impl IngredientRepo for PgStore {
    async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>, StoreError> {
        let rows = match prefix {
            Some(p) => {
                sqlx::query_as::<_, Ingredient>(
                    r#"
                    SELECT id, name, measurement_unit
                      FROM ingredients
                     WHERE name ILIKE $1
                     ORDER BY name, measurement_unit
                    "#,
                )
                .bind(like_prefix(p))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Ingredient>(
                    "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, measurement_unit",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn find_ingredient(&self, id: i64) -> Result<Option<Ingredient>, StoreError> {
        let row = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn missing_ingredient_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT wanted.id
              FROM UNNEST($1::BIGINT[]) AS wanted(id)
             WHERE NOT EXISTS (SELECT 1 FROM ingredients i WHERE i.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
