use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};

use super::repo_types::{
    Associations, Membership, Recipe, RecipeFields, RecipeFilter, RecipeIngredientRow,
    ShoppingListLine,
};
use crate::db::PgStore;
use crate::store::StoreError;
use crate::tags::repo_types::Tag;

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.text, r.image, r.cooking_time, r.pub_date";

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Inserts the recipe and both association sets atomically.
    async fn insert_recipe(
        &self,
        author_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError>;

    /// Overwrites the scalar fields and replaces both association sets
    /// atomically. `NotFound` if the recipe is gone.
    async fn replace_recipe(
        &self,
        recipe_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError>;

    /// Returns whether a row was removed.
    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, StoreError>;
    async fn find_recipe(&self, recipe_id: i64) -> Result<Option<Recipe>, StoreError>;
    /// Newest first, plus the total number of matches.
    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Recipe>, i64), StoreError>;
    /// Newest first, truncated to `limit` when given.
    async fn list_recipes_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, StoreError>;
    async fn count_recipes_by_author(&self, author_id: i64) -> Result<i64, StoreError>;

    async fn recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>, StoreError>;
    async fn recipe_ingredients(&self, recipe_id: i64)
        -> Result<Vec<RecipeIngredientRow>, StoreError>;

    async fn membership_exists(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError>;
    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError>;

    /// Ingredients of every recipe in the user's cart, summed per
    /// ingredient and ordered by name then unit.
    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListLine>, StoreError>;
}

/// Writes both association sets of `recipe_id` inside `tx`.
async fn insert_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    links: &Associations,
) -> Result<(), StoreError> {
    if !links.tag_ids.is_empty() {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        qb.push_values(links.tag_ids.iter(), |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        qb.build().execute(&mut **tx).await?;
    }

    if !links.ingredients.is_empty() {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        qb.push_values(links.ingredients.iter(), |mut row, item| {
            row.push_bind(recipe_id)
                .push_bind(item.ingredient_id)
                .push_bind(item.amount);
        });
        qb.build().execute(&mut **tx).await?;
    }
    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RecipeFilter) {
    qb.push(" WHERE TRUE");
    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        )
        .push_bind(filter.tags.clone())
        .push("))");
    }
    for (wanted, kind) in [
        (filter.is_favorited, Membership::Favorite),
        (filter.is_in_shopping_cart, Membership::ShoppingCart),
    ] {
        if !wanted {
            continue;
        }
        match filter.viewer {
            Some(viewer) => {
                qb.push(format!(
                    " AND EXISTS (SELECT 1 FROM {} m WHERE m.recipe_id = r.id AND m.user_id = ",
                    kind.table()
                ))
                .push_bind(viewer)
                .push(")");
            }
            None => {
                qb.push(" AND FALSE");
            }
        }
    }
}

#[async_trait]
impl RecipeRepo for PgStore {
    async fn insert_recipe(
        &self,
        author_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_id, name, text, image, cooking_time, pub_date
            "#,
        )
        .bind(author_id)
        .bind(&fields.name)
        .bind(&fields.text)
        .bind(&fields.image)
        .bind(fields.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        insert_links(&mut tx, recipe.id, &links).await?;
        tx.commit().await?;
        Ok(recipe)
    }

    async fn replace_recipe(
        &self,
        recipe_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET name = $2, text = $3, image = $4, cooking_time = $5
             WHERE id = $1
            RETURNING id, author_id, name, text, image, cooking_time, pub_date
            "#,
        )
        .bind(recipe_id)
        .bind(&fields.name)
        .bind(&fields.text)
        .bind(&fields.image)
        .bind(fields.cooking_time)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        insert_links(&mut tx, recipe_id, &links).await?;

        tx.commit().await?;
        Ok(recipe)
    }

    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn find_recipe(&self, recipe_id: i64) -> Result<Option<Recipe>, StoreError> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"
        ))
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Recipe>, i64), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<Recipe>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes r");
        push_filters(&mut count, filter);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn list_recipes_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, StoreError> {
        // LIMIT NULL means no limit in Postgres.
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
              FROM recipes r
             WHERE r.author_id = $1
             ORDER BY r.pub_date DESC, r.id DESC
             LIMIT $2
            "#
        ))
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_recipes_by_author(&self, author_id: i64) -> Result<i64, StoreError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.color, t.slug
              FROM tags t
              JOIN recipe_tags rt ON rt.tag_id = t.id
             WHERE rt.recipe_id = $1
             ORDER BY t.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn recipe_ingredients(
        &self,
        recipe_id: i64,
    ) -> Result<Vec<RecipeIngredientRow>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT i.id, i.name, i.measurement_unit, ri.amount
              FROM recipe_ingredients ri
              JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = $1
             ORDER BY i.name COLLATE "C", i.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn membership_exists(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2)",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError> {
        let done = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListLine>, StoreError> {
        let rows = sqlx::query_as::<_, ShoppingListLine>(
            r#"
            SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total_amount
              FROM shopping_cart sc
              JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
              JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE sc.user_id = $1
             GROUP BY i.id, i.name, i.measurement_unit
             ORDER BY i.name COLLATE "C", i.measurement_unit COLLATE "C"
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
