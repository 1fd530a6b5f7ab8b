use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateRecipeRequest, RecipeListQuery, UpdateRecipeRequest};
use super::repo::RecipeRepo;
use super::repo_types::Membership;
use super::services;
use super::shopping_list::{build_shopping_list, render_shopping_list};
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::AppError;
use crate::pagination::Page;
use crate::presenter::{recipe_details, recipe_preview, RecipeDetails, RecipePreview};
use crate::state::AppState;

/// Recipe payloads carry the image inline as base64.
const RECIPE_BODY_LIMIT: usize = 20 * 1024 * 1024;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list_recipes).post(create_recipe))
        .route("/recipes/download_shopping_cart/", get(download_shopping_cart))
        .route(
            "/recipes/:id/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:id/favorite/", post(favorite).delete(unfavorite))
        .route(
            "/recipes/:id/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
        .layer(DefaultBodyLimit::max(RECIPE_BODY_LIMIT))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Page<RecipeDetails>>, AppError> {
    let query = RecipeListQuery::from_pairs(pairs)?;
    let p = query.pagination();
    let (recipes, count) = state
        .store
        .list_recipes(&query.filter(viewer), p.limit(), p.offset())
        .await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        results.push(recipe_details(&state, viewer, recipe).await?);
    }
    Ok(Json(Page::new(results, count, &p)))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetails>), AppError> {
    let recipe = services::create_recipe(&state, user_id, payload).await?;
    let view = recipe_details(&state, Some(user_id), recipe).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetails>, AppError> {
    let recipe = state
        .store
        .find_recipe(id)
        .await?
        .ok_or(AppError::ResourceNotFound("recipe"))?;
    Ok(Json(recipe_details(&state, viewer, recipe).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeDetails>, AppError> {
    let recipe = services::update_recipe(&state, user_id, id, payload).await?;
    Ok(Json(recipe_details(&state, Some(user_id), recipe).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_recipe(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_member(
    state: &AppState,
    user_id: i64,
    recipe_id: i64,
    kind: Membership,
) -> Result<(StatusCode, Json<RecipePreview>), AppError> {
    let recipe = services::add_membership(state, user_id, recipe_id, kind).await?;
    Ok((StatusCode::CREATED, Json(recipe_preview(state, recipe).await?)))
}

#[instrument(skip(state))]
pub async fn favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipePreview>), AppError> {
    add_member(&state, user_id, id, Membership::Favorite).await
}

#[instrument(skip(state))]
pub async fn unfavorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::remove_membership(&state, user_id, id, Membership::Favorite).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipePreview>), AppError> {
    add_member(&state, user_id, id, Membership::ShoppingCart).await
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::remove_membership(&state, user_id, id, Membership::ShoppingCart).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let lines = build_shopping_list(state.store.as_ref(), user_id).await?;
    info!(user_id, lines = lines.len(), "shopping list downloaded");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        render_shopping_list(&lines),
    ))
}
