use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{LoginRequest, RefreshRequest, TokenResponse};
use super::jwt::JwtKeys;
use super::password::verify_password;
use crate::{error::AppError, state::AppState, users::repo::UserRepo};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token/login/", post(login))
        .route("/auth/token/refresh/", post(refresh))
}

fn issue_pair(keys: &JwtKeys, user_id: i64) -> Result<TokenResponse, AppError> {
    Ok(TokenResponse {
        access_token: keys.sign_access(user_id)?,
        refresh_token: keys.sign_refresh(user_id)?,
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let invalid = || AppError::Validation("unable to log in with provided credentials".into());

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    let tokens = issue_pair(&JwtKeys::from_ref(&state), user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    if state.store.find_user(claims.sub).await?.is_none() {
        return Err(AppError::Unauthorized("user not found".into()));
    }
    Ok(Json(issue_pair(&keys, claims.sub)?))
}
