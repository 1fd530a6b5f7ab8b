use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::store::{constraint, StoreError};

/// Coarse classification of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Reference,
    Duplicate,
    SelfReference,
    Authentication,
    Authorization,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("at least one {0} is required")]
    EmptyAssociation(&'static str),

    #[error("{0}")]
    UnknownReference(String),

    #[error("{0}")]
    DuplicateAssociation(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("you cannot subscribe to yourself")]
    SelfSubscription,

    /// A membership or subscription to remove does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("recipe {0} does not exist")]
    RecipeNotFound(i64),

    /// Addressed resource is missing (404).
    #[error("{0} not found")]
    ResourceNotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::EmptyAssociation(_) => ErrorKind::Validation,
            AppError::UnknownReference(_)
            | AppError::NotFound(_)
            | AppError::RecipeNotFound(_)
            | AppError::ResourceNotFound(_) => ErrorKind::Reference,
            AppError::DuplicateAssociation(_) | AppError::AlreadyExists(_) => ErrorKind::Duplicate,
            AppError::SelfSubscription => ErrorKind::SelfReference,
            AppError::Unauthorized(_) => ErrorKind::Authentication,
            AppError::Forbidden(_) => ErrorKind::Authorization,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::ResourceNotFound("object"),
            StoreError::UniqueViolation(name) => match name.as_str() {
                constraint::TAG_PER_RECIPE => {
                    AppError::DuplicateAssociation("tags must not repeat".into())
                }
                constraint::INGREDIENT_PER_RECIPE => {
                    AppError::DuplicateAssociation("ingredients must not repeat".into())
                }
                constraint::FAVORITE => {
                    AppError::AlreadyExists("recipe is already in favorites".into())
                }
                constraint::SHOPPING_CART => {
                    AppError::AlreadyExists("recipe is already in the shopping cart".into())
                }
                constraint::SUBSCRIPTION => {
                    AppError::AlreadyExists("you are already subscribed to this author".into())
                }
                constraint::USER_EMAIL => {
                    AppError::AlreadyExists("a user with this email already exists".into())
                }
                constraint::USER_USERNAME => {
                    AppError::AlreadyExists("a user with this username already exists".into())
                }
                other => AppError::AlreadyExists(format!("duplicate value violates {other}")),
            },
            StoreError::ForeignKeyViolation(_) => {
                AppError::UnknownReference("referenced object does not exist".into())
            }
            StoreError::CheckViolation(name) => match name.as_str() {
                constraint::NOT_SELF_SUBSCRIPTION => AppError::SelfSubscription,
                constraint::COOKING_TIME => {
                    AppError::Validation("cooking time is out of range".into())
                }
                constraint::AMOUNT_POSITIVE => {
                    AppError::Validation("ingredient amount must be at least 1".into())
                }
                other => AppError::Validation(format!("value violates {other}")),
            },
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => error!(error = ?e, "request failed"),
            other => debug!(kind = ?other.kind(), %status, error = %other, "request rejected"),
        }
        let message = match &self {
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
