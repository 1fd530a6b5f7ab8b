use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    RecipesLimitQuery, RegisterRequest, SetPasswordRequest, SubscriptionsQuery, UserCreated,
};
use super::repo::UserRepo;
use super::services;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::AppError;
use crate::pagination::{Page, Pagination};
use crate::presenter::{subscription_view, user_view, SubscriptionView, UserView};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users).post(register))
        .route("/users/me/", get(me))
        .route("/users/set_password/", post(set_password))
        .route("/users/subscriptions/", get(subscriptions))
        .route("/users/:id/", get(get_user))
        .route("/users/:id/subscribe/", post(subscribe).delete(unsubscribe))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Page<UserView>>, AppError> {
    let (users, count) = state.store.list_users(p.limit(), p.offset()).await?;
    let mut results = Vec::with_capacity(users.len());
    for user in users {
        results.push(user_view(&state, viewer, user).await?);
    }
    Ok(Json(Page::new(results, count, &p)))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserCreated>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserView>, AppError> {
    let user = services::find_user(&state, user_id).await?;
    Ok(Json(user_view(&state, Some(user_id), user).await?))
}

#[instrument(skip(state, payload))]
pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    services::set_password(&state, user_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SubscriptionsQuery>,
) -> Result<Json<Page<SubscriptionView>>, AppError> {
    let p = q.pagination();
    let (authors, count) = state
        .store
        .list_subscribed_authors(user_id, p.limit(), p.offset())
        .await?;
    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(subscription_view(&state, Some(user_id), author, q.recipes_limit).await?);
    }
    Ok(Json(Page::new(results, count, &p)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    let user = services::find_user(&state, id).await?;
    Ok(Json(user_view(&state, viewer, user).await?))
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Query(q): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionView>), AppError> {
    let author = services::subscribe(&state, user_id, id).await?;
    let view = subscription_view(&state, Some(user_id), author, q.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::unsubscribe(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
