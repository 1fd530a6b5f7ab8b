use serde::Serialize;

use crate::error::AppError;
use crate::images::image_url;
use crate::recipes::repo::RecipeRepo;
use crate::recipes::repo_types::{Membership, Recipe, RecipeIngredientRow};
use crate::state::AppState;
use crate::store::Store;
use crate::tags::repo_types::Tag;
use crate::users::repo::UserRepo;
use crate::users::repo_types::User;

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Short form used in subscriptions and membership toggles.
#[derive(Debug, Serialize)]
pub struct RecipePreview {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipePreview>,
    pub recipes_count: i64,
}

/// Anonymous viewers get `false` without touching the store.
pub async fn is_member(
    store: &dyn Store,
    viewer: Option<i64>,
    kind: Membership,
    recipe_id: i64,
) -> Result<bool, AppError> {
    match viewer {
        Some(user_id) => Ok(store.membership_exists(kind, user_id, recipe_id).await?),
        None => Ok(false),
    }
}

pub async fn is_subscribed(
    store: &dyn Store,
    viewer: Option<i64>,
    author_id: i64,
) -> Result<bool, AppError> {
    match viewer {
        Some(user_id) => Ok(store.subscription_exists(user_id, author_id).await?),
        None => Ok(false),
    }
}

pub async fn user_view(
    state: &AppState,
    viewer: Option<i64>,
    user: User,
) -> Result<UserView, AppError> {
    let is_subscribed = is_subscribed(state.store.as_ref(), viewer, user.id).await?;
    Ok(UserView {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

pub async fn recipe_preview(state: &AppState, recipe: Recipe) -> Result<RecipePreview, AppError> {
    Ok(RecipePreview {
        image: image_url(state, &recipe.image).await?,
        id: recipe.id,
        name: recipe.name,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn recipe_details(
    state: &AppState,
    viewer: Option<i64>,
    recipe: Recipe,
) -> Result<RecipeDetails, AppError> {
    let store = state.store.as_ref();
    let author = store
        .find_user(recipe.author_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("author {} of recipe {} is missing", recipe.author_id, recipe.id))?;

    Ok(RecipeDetails {
        id: recipe.id,
        tags: store.recipe_tags(recipe.id).await?,
        author: user_view(state, viewer, author).await?,
        ingredients: store.recipe_ingredients(recipe.id).await?,
        is_favorited: is_member(store, viewer, Membership::Favorite, recipe.id).await?,
        is_in_shopping_cart: is_member(store, viewer, Membership::ShoppingCart, recipe.id).await?,
        image: image_url(state, &recipe.image).await?,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Author card with up to `recipes_limit` of their newest recipes.
pub async fn subscription_view(
    state: &AppState,
    viewer: Option<i64>,
    author: User,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionView, AppError> {
    let store = state.store.as_ref();
    let recipes_count = store.count_recipes_by_author(author.id).await?;
    let limit = recipes_limit.map(|n| n.max(0));

    let mut recipes = Vec::new();
    for recipe in store.list_recipes_by_author(author.id, limit).await? {
        recipes.push(recipe_preview(state, recipe).await?);
    }

    Ok(SubscriptionView {
        user: user_view(state, viewer, author).await?,
        recipes,
        recipes_count,
    })
}
