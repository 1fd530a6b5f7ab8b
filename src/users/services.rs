use tracing::{debug, info};

use super::dto::{RegisterRequest, SetPasswordRequest};
use super::repo::UserRepo;
use super::repo_types::{NewUser, User};
use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{
    is_valid_email, validate_password, validate_person_name, validate_subscription,
    validate_username,
};

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("enter a valid email address".into()));
    }
    let username = req.username.trim().to_string();
    validate_username(&username)?;
    validate_person_name("first_name", &req.first_name)?;
    validate_person_name("last_name", &req.last_name)?;
    validate_password(&req.password)?;

    let user = state
        .store
        .create_user(NewUser {
            email,
            username,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password_hash: hash_password(&req.password)?,
        })
        .await?;
    info!(user_id = user.id, "user registered");
    Ok(user)
}

pub async fn set_password(
    state: &AppState,
    user_id: i64,
    req: SetPasswordRequest,
) -> Result<(), AppError> {
    let user = find_user(state, user_id).await?;
    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Validation("current password is incorrect".into()));
    }
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    state.store.set_password_hash(user_id, &hash).await?;
    info!(user_id, "password changed");
    Ok(())
}

pub async fn find_user(state: &AppState, user_id: i64) -> Result<User, AppError> {
    state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::ResourceNotFound("user"))
}

/// Returns the author that was subscribed to.
pub async fn subscribe(state: &AppState, subscriber: i64, author_id: i64) -> Result<User, AppError> {
    let author = find_user(state, author_id).await?;
    validate_subscription(state.store.as_ref(), subscriber, author_id, true).await?;
    // A concurrent duplicate still fails here, via the unique constraint.
    state.store.insert_subscription(subscriber, author_id).await?;
    debug!(subscriber, author_id, "subscribed");
    Ok(author)
}

pub async fn unsubscribe(state: &AppState, subscriber: i64, author_id: i64) -> Result<(), AppError> {
    find_user(state, author_id).await?;
    validate_subscription(state.store.as_ref(), subscriber, author_id, false).await?;
    if !state.store.delete_subscription(subscriber, author_id).await? {
        return Err(AppError::NotFound(
            "subscription does not exist or was already removed".into(),
        ));
    }
    debug!(subscriber, author_id, "unsubscribed");
    Ok(())
}
