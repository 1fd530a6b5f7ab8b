use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;
use crate::ingredients::repo::IngredientRepo;
use crate::recipes::repo::RecipeRepo;
use crate::recipes::repo_types::{IngredientAmount, Membership};
use crate::store::Store;
use crate::tags::repo::TagRepo;
use crate::users::repo::UserRepo;

pub const MIN_COOKING_TIME: i32 = 1;
/// Two days, in minutes.
pub const MAX_COOKING_TIME: i32 = 2880;
pub const MIN_AMOUNT: i32 = 1;
pub const RECIPE_NAME_MAX_LEN: usize = 200;
pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

const RESERVED_USERNAMES: &[&str] = &["me"];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && EMAIL_RE.is_match(email)
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() || username.chars().count() > USERNAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "username must be 1 to {USERNAME_MAX_LEN} characters long"
        )));
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(AppError::Validation(format!("username `{username}` is reserved")));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "username may contain only letters, digits and . @ + - _".into(),
        ));
    }
    Ok(())
}

pub fn validate_person_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() || value.chars().count() > NAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be 1 to {NAME_MAX_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), AppError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(AppError::Validation(format!(
            "cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"
        )));
    }
    Ok(())
}

pub fn validate_recipe_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("recipe name must not be blank".into()));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "recipe name must be at most {RECIPE_NAME_MAX_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn validate_recipe_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("recipe text must not be blank".into()));
    }
    Ok(())
}

/// Scalar recipe fields, checked before anything touches the store.
pub fn validate_recipe_fields(name: &str, text: &str, cooking_time: i32) -> Result<(), AppError> {
    validate_recipe_name(name)?;
    validate_recipe_text(text)?;
    validate_cooking_time(cooking_time)
}

/// Checks the association sets of a recipe against the current store.
/// Nothing is written; the storage constraints back this up at write time.
pub async fn validate_recipe_associations(
    store: &dyn Store,
    tag_ids: &[i64],
    ingredients: &[IngredientAmount],
) -> Result<(), AppError> {
    if tag_ids.is_empty() {
        return Err(AppError::EmptyAssociation("tag"));
    }
    if ingredients.is_empty() {
        return Err(AppError::EmptyAssociation("ingredient"));
    }

    if let Some(bad) = ingredients.iter().find(|i| i.amount < MIN_AMOUNT) {
        return Err(AppError::Validation(format!(
            "amount of ingredient {} must be at least {MIN_AMOUNT}",
            bad.ingredient_id
        )));
    }

    if let Some(dup) = first_duplicate(tag_ids.iter().copied()) {
        return Err(AppError::DuplicateAssociation(format!(
            "tag {dup} is listed more than once"
        )));
    }
    let ingredient_ids: Vec<i64> = ingredients.iter().map(|i| i.ingredient_id).collect();
    if let Some(dup) = first_duplicate(ingredient_ids.iter().copied()) {
        return Err(AppError::DuplicateAssociation(format!(
            "ingredient {dup} is listed more than once"
        )));
    }

    if let Some(missing) = store.missing_tag_ids(tag_ids).await?.first() {
        return Err(AppError::UnknownReference(format!("tag {missing} does not exist")));
    }
    if let Some(missing) = store.missing_ingredient_ids(&ingredient_ids).await?.first() {
        return Err(AppError::UnknownReference(format!(
            "ingredient {missing} does not exist"
        )));
    }
    Ok(())
}

/// `is_create` selects between the subscribe and unsubscribe checks.
pub async fn validate_subscription(
    store: &dyn Store,
    subscriber: i64,
    author: i64,
    is_create: bool,
) -> Result<(), AppError> {
    if is_create {
        if subscriber == author {
            return Err(AppError::SelfSubscription);
        }
        if store.subscription_exists(subscriber, author).await? {
            return Err(AppError::AlreadyExists(
                "you are already subscribed to this author".into(),
            ));
        }
    } else if !store.subscription_exists(subscriber, author).await? {
        return Err(AppError::NotFound(
            "subscription does not exist or was already removed".into(),
        ));
    }
    Ok(())
}

/// Shared check for favorite and shopping-cart toggles.
pub async fn validate_membership_toggle(
    store: &dyn Store,
    user_id: i64,
    recipe_id: i64,
    kind: Membership,
    is_create: bool,
) -> Result<(), AppError> {
    if store.find_recipe(recipe_id).await?.is_none() {
        return Err(AppError::RecipeNotFound(recipe_id));
    }
    let exists = store.membership_exists(kind, user_id, recipe_id).await?;
    match (is_create, exists) {
        (true, true) => Err(AppError::AlreadyExists(format!(
            "recipe is already in {}",
            kind.label()
        ))),
        (false, false) => Err(AppError::NotFound(format!(
            "recipe is not in {} or was already removed",
            kind.label()
        ))),
        _ => Ok(()),
    }
}

fn first_duplicate(ids: impl Iterator<Item = i64>) -> Option<i64> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::recipes::repo_types::{Associations, RecipeFields};

    fn amount(ingredient_id: i64, amount: i32) -> IngredientAmount {
        IngredientAmount {
            ingredient_id,
            amount,
        }
    }

    #[test]
    fn usernames() {
        assert!(validate_username("chef.anna+1@home-cook_").is_ok());
        assert!(validate_username("me").is_err());
        assert!(validate_username("with space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(USERNAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("cook@example.com"));
        assert!(!is_valid_email("cook@example"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[test]
    fn cooking_time_bounds() {
        assert!(validate_cooking_time(MIN_COOKING_TIME).is_ok());
        assert!(validate_cooking_time(MAX_COOKING_TIME).is_ok());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(MAX_COOKING_TIME + 1).is_err());
    }

    #[test]
    fn recipe_name_and_text() {
        assert!(validate_recipe_name("Omelette").is_ok());
        assert!(validate_recipe_name("   ").is_err());
        assert!(validate_recipe_name(&"x".repeat(RECIPE_NAME_MAX_LEN + 1)).is_err());
        assert!(validate_recipe_text("").is_err());
        assert!(validate_recipe_fields("Omelette", "Beat eggs", 10).is_ok());
        assert!(validate_recipe_fields("Omelette", "Beat eggs", 0).is_err());
    }

    #[tokio::test]
    async fn empty_lists_are_rejected_first() {
        let store = MemoryStore::default();
        let err = validate_recipe_associations(&store, &[], &[amount(1, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyAssociation("tag")));
        let err = validate_recipe_associations(&store, &[1], &[]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyAssociation("ingredient")));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn duplicates_and_unknown_ids() {
        let store = MemoryStore::default();
        let tag = store.add_tag("Breakfast", "#E26C2D", "breakfast");
        let egg = store.add_ingredient("egg", "pcs");

        let err = validate_recipe_associations(&store, &[tag.id, tag.id], &[amount(egg.id, 2)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        let err = validate_recipe_associations(
            &store,
            &[tag.id],
            &[amount(egg.id, 2), amount(egg.id, 3)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::DuplicateAssociation(_)));

        let err = validate_recipe_associations(&store, &[tag.id, 999], &[amount(egg.id, 2)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);

        let err = validate_recipe_associations(&store, &[tag.id], &[amount(999, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownReference(_)));

        let err = validate_recipe_associations(&store, &[tag.id], &[amount(egg.id, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        validate_recipe_associations(&store, &[tag.id], &[amount(egg.id, 2)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn self_subscription_always_fails() {
        let store = MemoryStore::default();
        let anna = store.add_user("anna");
        let bob = store.add_user("bob");

        let err = validate_subscription(&store, anna.id, anna.id, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SelfReference);

        store.insert_subscription(anna.id, bob.id).await.unwrap();
        let err = validate_subscription(&store, anna.id, anna.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SelfSubscription));

        let err = validate_subscription(&store, anna.id, bob.id, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        validate_subscription(&store, anna.id, bob.id, false).await.unwrap();
        let err = validate_subscription(&store, bob.id, anna.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn membership_toggle_checks() {
        let store = MemoryStore::default();
        let anna = store.add_user("anna");
        let tag = store.add_tag("Lunch", "#49B64E", "lunch");
        let salt = store.add_ingredient("salt", "g");
        let recipe = store
            .insert_recipe(
                anna.id,
                RecipeFields {
                    name: "Soup".into(),
                    text: "Boil".into(),
                    image: "img".into(),
                    cooking_time: 30,
                },
                Associations {
                    tag_ids: vec![tag.id],
                    ingredients: vec![amount(salt.id, 5)],
                },
            )
            .await
            .unwrap();

        let err = validate_membership_toggle(&store, anna.id, 4242, Membership::Favorite, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecipeNotFound(4242)));

        validate_membership_toggle(&store, anna.id, recipe.id, Membership::Favorite, true)
            .await
            .unwrap();
        let err =
            validate_membership_toggle(&store, anna.id, recipe.id, Membership::Favorite, false)
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        store
            .insert_membership(Membership::ShoppingCart, anna.id, recipe.id)
            .await
            .unwrap();
        let err =
            validate_membership_toggle(&store, anna.id, recipe.id, Membership::ShoppingCart, true)
                .await
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        // The favorite relation is independent of the cart.
        validate_membership_toggle(&store, anna.id, recipe.id, Membership::Favorite, true)
            .await
            .unwrap();
    }
}
