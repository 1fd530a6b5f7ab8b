mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
mod services;
pub mod shopping_list;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
