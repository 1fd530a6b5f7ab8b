use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::repo::TagRepo;
use super::repo_types::Tag;
use crate::error::AppError;
use crate::state::AppState;

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list_tags))
        .route("/tags/:id/", get(get_tag))
}

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.store.list_tags().await?))
}

#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, AppError> {
    state
        .store
        .find_tag(id)
        .await?
        .map(Json)
        .ok_or(AppError::ResourceNotFound("tag"))
}
