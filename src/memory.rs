//! In-memory `Store` for tests. Each operation runs under one lock, so
//! multi-row writes are all-or-nothing, and schema constraints are reported
//! with the same names Postgres uses.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::ingredients::repo::IngredientRepo;
use crate::ingredients::repo_types::Ingredient;
use crate::recipes::repo::RecipeRepo;
use crate::recipes::repo_types::{
    Associations, IngredientAmount, Membership, Recipe, RecipeFields, RecipeFilter,
    RecipeIngredientRow, ShoppingListLine,
};
use crate::store::{constraint, StoreError};
use crate::tags::repo::TagRepo;
use crate::tags::repo_types::Tag;
use crate::users::repo::UserRepo;
use crate::users::repo_types::{NewUser, User};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_tags: Vec<(i64, i64)>,
    recipe_ingredients: Vec<(i64, IngredientAmount)>,
    subscriptions: Vec<(i64, i64)>,
    favorites: Vec<(i64, i64)>,
    shopping_cart: Vec<(i64, i64)>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn memberships(&self, kind: Membership) -> &Vec<(i64, i64)> {
        match kind {
            Membership::Favorite => &self.favorites,
            Membership::ShoppingCart => &self.shopping_cart,
        }
    }

    fn memberships_mut(&mut self, kind: Membership) -> &mut Vec<(i64, i64)> {
        match kind {
            Membership::Favorite => &mut self.favorites,
            Membership::ShoppingCart => &mut self.shopping_cart,
        }
    }

    /// Checks `links` the way the schema would, without writing anything.
    fn check_links(&self, links: &Associations) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for tag_id in &links.tag_ids {
            if !self.tags.iter().any(|t| t.id == *tag_id) {
                return Err(StoreError::ForeignKeyViolation("recipe_tags_tag_id_fkey".into()));
            }
            if !seen.insert(*tag_id) {
                return Err(StoreError::UniqueViolation(constraint::TAG_PER_RECIPE.into()));
            }
        }
        let mut seen = HashSet::new();
        for item in &links.ingredients {
            if !self.ingredients.iter().any(|i| i.id == item.ingredient_id) {
                return Err(StoreError::ForeignKeyViolation(
                    "recipe_ingredients_ingredient_id_fkey".into(),
                ));
            }
            if item.amount < 1 {
                return Err(StoreError::CheckViolation(constraint::AMOUNT_POSITIVE.into()));
            }
            if !seen.insert(item.ingredient_id) {
                return Err(StoreError::UniqueViolation(
                    constraint::INGREDIENT_PER_RECIPE.into(),
                ));
            }
        }
        Ok(())
    }

    fn check_fields(fields: &RecipeFields) -> Result<(), StoreError> {
        if !(1..=2880).contains(&fields.cooking_time) {
            return Err(StoreError::CheckViolation(constraint::COOKING_TIME.into()));
        }
        Ok(())
    }

    fn write_links(&mut self, recipe_id: i64, links: Associations) {
        self.recipe_tags
            .extend(links.tag_ids.into_iter().map(|tag_id| (recipe_id, tag_id)));
        self.recipe_ingredients
            .extend(links.ingredients.into_iter().map(|item| (recipe_id, item)));
    }

    fn user_by_id(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn matches(&self, recipe: &Recipe, filter: &RecipeFilter) -> bool {
        if filter.author.is_some_and(|a| a != recipe.author_id) {
            return false;
        }
        if !filter.tags.is_empty() {
            let tagged = self.recipe_tags.iter().any(|(r, t)| {
                *r == recipe.id
                    && self
                        .tags
                        .iter()
                        .any(|tag| tag.id == *t && filter.tags.contains(&tag.slug))
            });
            if !tagged {
                return false;
            }
        }
        for (wanted, kind) in [
            (filter.is_favorited, Membership::Favorite),
            (filter.is_in_shopping_cart, Membership::ShoppingCart),
        ] {
            if !wanted {
                continue;
            }
            match filter.viewer {
                Some(viewer) if self.memberships(kind).contains(&(viewer, recipe.id)) => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn add_tag(&self, name: &str, color: &str, slug: &str) -> Tag {
        let mut t = self.tables.lock().unwrap();
        let tag = Tag {
            id: t.next_id(),
            name: name.into(),
            color: color.into(),
            slug: slug.into(),
        };
        t.tags.push(tag.clone());
        tag
    }

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> Ingredient {
        let mut t = self.tables.lock().unwrap();
        let ingredient = Ingredient {
            id: t.next_id(),
            name: name.into(),
            measurement_unit: measurement_unit.into(),
        };
        t.ingredients.push(ingredient.clone());
        ingredient
    }

    pub fn add_user(&self, username: &str) -> User {
        let mut t = self.tables.lock().unwrap();
        let user = User {
            id: t.next_id(),
            email: format!("{username}@example.com"),
            username: username.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        user
    }

    pub fn recipe_count(&self) -> usize {
        self.tables.lock().unwrap().recipes.len()
    }

    /// Raw association rows of a recipe: (tag ids, ingredient amounts).
    pub fn links_of(&self, recipe_id: i64) -> (Vec<i64>, Vec<IngredientAmount>) {
        let t = self.tables.lock().unwrap();
        let tags = t
            .recipe_tags
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .map(|(_, tag)| *tag)
            .collect();
        let ingredients = t
            .recipe_ingredients
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .map(|(_, item)| *item)
            .collect();
        (tags, ingredients)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation(constraint::USER_EMAIL.into()));
        }
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::UniqueViolation(constraint::USER_USERNAME.into()));
        }
        let user = User {
            id: t.next_id(),
            email: new.email,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().unwrap().user_by_id(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), StoreError> {
        let t = self.tables.lock().unwrap();
        let rows = page(t.users.iter().cloned(), limit, offset);
        Ok((rows, t.users.len() as i64))
    }

    async fn set_password_hash(&self, user_id: i64, hash: &str) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound)?;
        user.password_hash = hash.to_string();
        Ok(())
    }

    async fn subscription_exists(&self, subscriber: i64, author: i64) -> Result<bool, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.subscriptions.contains(&(subscriber, author)))
    }

    async fn insert_subscription(&self, subscriber: i64, author: i64) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        if subscriber == author {
            return Err(StoreError::CheckViolation(
                constraint::NOT_SELF_SUBSCRIPTION.into(),
            ));
        }
        if t.user_by_id(subscriber).is_none() || t.user_by_id(author).is_none() {
            return Err(StoreError::ForeignKeyViolation("subscriptions_author_id_fkey".into()));
        }
        if t.subscriptions.contains(&(subscriber, author)) {
            return Err(StoreError::UniqueViolation(constraint::SUBSCRIPTION.into()));
        }
        t.subscriptions.push((subscriber, author));
        Ok(())
    }

    async fn delete_subscription(&self, subscriber: i64, author: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.subscriptions.len();
        t.subscriptions.retain(|s| *s != (subscriber, author));
        Ok(t.subscriptions.len() < before)
    }

    async fn list_subscribed_authors(
        &self,
        subscriber: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let t = self.tables.lock().unwrap();
        let authors: Vec<User> = t
            .users
            .iter()
            .filter(|u| t.subscriptions.contains(&(subscriber, u.id)))
            .cloned()
            .collect();
        let total = authors.len() as i64;
        Ok((page(authors.into_iter(), limit, offset), total))
    }
}

#[async_trait]
impl TagRepo for MemoryStore {
    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.tables.lock().unwrap().tags.clone())
    }

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.tags.iter().find(|tag| tag.id == id).cloned())
    }

    async fn missing_tag_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !t.tags.iter().any(|tag| tag.id == *id))
            .collect())
    }
}

#[async_trait]
impl IngredientRepo for MemoryStore {
    async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>, StoreError> {
        let t = self.tables.lock().unwrap();
        let prefix = prefix.map(str::to_lowercase);
        let mut rows: Vec<Ingredient> = t
            .ingredients
            .iter()
            .filter(|i| {
                prefix
                    .as_deref()
                    .map_or(true, |p| i.name.to_lowercase().starts_with(p))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.name.as_str(), a.measurement_unit.as_str())
                .cmp(&(b.name.as_str(), b.measurement_unit.as_str()))
        });
        Ok(rows)
    }

    async fn find_ingredient(&self, id: i64) -> Result<Option<Ingredient>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn missing_ingredient_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !t.ingredients.iter().any(|i| i.id == *id))
            .collect())
    }
}

#[async_trait]
impl RecipeRepo for MemoryStore {
    async fn insert_recipe(
        &self,
        author_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.user_by_id(author_id).is_none() {
            return Err(StoreError::ForeignKeyViolation("recipes_author_id_fkey".into()));
        }
        Tables::check_fields(&fields)?;
        t.check_links(&links)?;

        let recipe = Recipe {
            id: t.next_id(),
            author_id,
            name: fields.name,
            text: fields.text,
            image: fields.image,
            cooking_time: fields.cooking_time,
            pub_date: OffsetDateTime::now_utc(),
        };
        t.recipes.push(recipe.clone());
        t.write_links(recipe.id, links);
        Ok(recipe)
    }

    async fn replace_recipe(
        &self,
        recipe_id: i64,
        fields: RecipeFields,
        links: Associations,
    ) -> Result<Recipe, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if !t.recipes.iter().any(|r| r.id == recipe_id) {
            return Err(StoreError::NotFound);
        }
        Tables::check_fields(&fields)?;
        t.check_links(&links)?;

        t.recipe_tags.retain(|(r, _)| *r != recipe_id);
        t.recipe_ingredients.retain(|(r, _)| *r != recipe_id);
        t.write_links(recipe_id, links);

        let recipe = t
            .recipes
            .iter_mut()
            .find(|r| r.id == recipe_id)
            .ok_or(StoreError::NotFound)?;
        recipe.name = fields.name;
        recipe.text = fields.text;
        recipe.image = fields.image;
        recipe.cooking_time = fields.cooking_time;
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, recipe_id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.recipes.len();
        t.recipes.retain(|r| r.id != recipe_id);
        if t.recipes.len() == before {
            return Ok(false);
        }
        t.recipe_tags.retain(|(r, _)| *r != recipe_id);
        t.recipe_ingredients.retain(|(r, _)| *r != recipe_id);
        t.favorites.retain(|(_, r)| *r != recipe_id);
        t.shopping_cart.retain(|(_, r)| *r != recipe_id);
        Ok(true)
    }

    async fn find_recipe(&self, recipe_id: i64) -> Result<Option<Recipe>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.recipes.iter().find(|r| r.id == recipe_id).cloned())
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Recipe>, i64), StoreError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Recipe> = t
            .recipes
            .iter()
            .filter(|r| t.matches(r, filter))
            .cloned()
            .collect();
        newest_first(&mut rows);
        let total = rows.len() as i64;
        Ok((page(rows.into_iter(), limit, offset), total))
    }

    async fn list_recipes_by_author(
        &self,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Recipe> = t
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        if let Some(limit) = limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn count_recipes_by_author(&self, author_id: i64) -> Result<i64, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.recipes.iter().filter(|r| r.author_id == author_id).count() as i64)
    }

    async fn recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut tags: Vec<Tag> = t
            .tags
            .iter()
            .filter(|tag| t.recipe_tags.contains(&(recipe_id, tag.id)))
            .cloned()
            .collect();
        tags.sort_by_key(|tag| tag.id);
        Ok(tags)
    }

    async fn recipe_ingredients(
        &self,
        recipe_id: i64,
    ) -> Result<Vec<RecipeIngredientRow>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<RecipeIngredientRow> = t
            .recipe_ingredients
            .iter()
            .filter(|(r, _)| *r == recipe_id)
            .filter_map(|(_, item)| {
                t.ingredients
                    .iter()
                    .find(|i| i.id == item.ingredient_id)
                    .map(|i| RecipeIngredientRow {
                        id: i.id,
                        name: i.name.clone(),
                        measurement_unit: i.measurement_unit.clone(),
                        amount: item.amount,
                    })
            })
            .collect();
        rows.sort_by(|a, b| (a.name.as_str(), a.id).cmp(&(b.name.as_str(), b.id)));
        Ok(rows)
    }

    async fn membership_exists(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.memberships(kind).contains(&(user_id, recipe_id)))
    }

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        if !t.recipes.iter().any(|r| r.id == recipe_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "{}_recipe_id_fkey",
                kind.table()
            )));
        }
        if t.memberships(kind).contains(&(user_id, recipe_id)) {
            let name = match kind {
                Membership::Favorite => constraint::FAVORITE,
                Membership::ShoppingCart => constraint::SHOPPING_CART,
            };
            return Err(StoreError::UniqueViolation(name.into()));
        }
        t.memberships_mut(kind).push((user_id, recipe_id));
        Ok(())
    }

    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let rows = t.memberships_mut(kind);
        let before = rows.len();
        rows.retain(|m| *m != (user_id, recipe_id));
        Ok(rows.len() < before)
    }

    async fn shopping_list(&self, user_id: i64) -> Result<Vec<ShoppingListLine>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut totals: HashMap<i64, i64> = HashMap::new();
        for (recipe_id, item) in &t.recipe_ingredients {
            if t.shopping_cart.contains(&(user_id, *recipe_id)) {
                *totals.entry(item.ingredient_id).or_default() += i64::from(item.amount);
            }
        }
        let mut lines: Vec<ShoppingListLine> = totals
            .into_iter()
            .filter_map(|(id, total_amount)| {
                t.ingredients.iter().find(|i| i.id == id).map(|i| ShoppingListLine {
                    name: i.name.clone(),
                    measurement_unit: i.measurement_unit.clone(),
                    total_amount,
                })
            })
            .collect();
        lines.sort_by(|a, b| {
            (a.name.as_str(), a.measurement_unit.as_str())
                .cmp(&(b.name.as_str(), b.measurement_unit.as_str()))
        });
        Ok(lines)
    }
}

fn page<T>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    rows.skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn newest_first(rows: &mut [Recipe]) {
    rows.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
}
