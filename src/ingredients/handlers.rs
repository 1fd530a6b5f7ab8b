use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::repo::IngredientRepo;
use super::repo_types::Ingredient;
use crate::error::AppError;
use crate::state::AppState;

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list_ingredients))
        .route("/ingredients/:id/", get(get_ingredient))
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearch {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    let prefix = search.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    Ok(Json(state.store.list_ingredients(prefix).await?))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Ingredient>, AppError> {
    state
        .store
        .find_ingredient(id)
        .await?
        .map(Json)
        .ok_or(AppError::ResourceNotFound("ingredient"))
}
