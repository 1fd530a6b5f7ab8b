use thiserror::Error;

use crate::ingredients::repo::IngredientRepo;
use crate::recipes::repo::RecipeRepo;
use crate::tags::repo::TagRepo;
use crate::users::repo::UserRepo;

/// Everything the request handlers need from persistence.
pub trait Store: UserRepo + TagRepo + IngredientRepo + RecipeRepo {}

impl<T> Store for T where T: UserRepo + TagRepo + IngredientRepo + RecipeRepo {}

/// Names of the schema constraints (see `migrations/`). The in-memory store
/// reports violations under the same names.
pub mod constraint {
    pub const USER_EMAIL: &str = "unique_user_email";
    pub const USER_USERNAME: &str = "unique_user_username";
    pub const TAG_PER_RECIPE: &str = "unique_tag_per_recipe";
    pub const INGREDIENT_PER_RECIPE: &str = "unique_ingredient_per_recipe";
    pub const SUBSCRIPTION: &str = "unique_subscription";
    pub const NOT_SELF_SUBSCRIPTION: &str = "check_not_self_subscription";
    pub const FAVORITE: &str = "unique_favorite";
    pub const SHOPPING_CART: &str = "unique_shopping_cart";
    pub const COOKING_TIME: &str = "check_cooking_time";
    pub const AMOUNT_POSITIVE: &str = "check_amount_positive";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("unique constraint `{0}` violated")]
    UniqueViolation(String),

    #[error("foreign key constraint `{0}` violated")]
    ForeignKeyViolation(String),

    #[error("check constraint `{0}` violated")]
    CheckViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        let classified = match &err {
            sqlx::Error::RowNotFound => Some(StoreError::NotFound),
            sqlx::Error::Database(db) => {
                let name = db.constraint().unwrap_or_default().to_string();
                match db.kind() {
                    ErrorKind::UniqueViolation => Some(StoreError::UniqueViolation(name)),
                    ErrorKind::ForeignKeyViolation => Some(StoreError::ForeignKeyViolation(name)),
                    ErrorKind::CheckViolation => Some(StoreError::CheckViolation(name)),
                    _ => None,
                }
            }
            _ => None,
        };
        classified.unwrap_or(StoreError::Database(err))
    }
}
