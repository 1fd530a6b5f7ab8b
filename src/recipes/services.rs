use tracing::{debug, info};

use super::dto::{associations, CreateRecipeRequest, UpdateRecipeRequest};
use super::repo::RecipeRepo;
use super::repo_types::{Membership, Recipe, RecipeFields};
use crate::error::AppError;
use crate::images::{decode_data_uri, discard_image, store_recipe_image};
use crate::state::AppState;
use crate::validation::{
    validate_membership_toggle, validate_recipe_associations, validate_recipe_fields,
};

async fn owned_recipe(state: &AppState, editor: i64, recipe_id: i64) -> Result<Recipe, AppError> {
    let recipe = state
        .store
        .find_recipe(recipe_id)
        .await?
        .ok_or(AppError::ResourceNotFound("recipe"))?;
    if recipe.author_id != editor {
        return Err(AppError::Forbidden(
            "only the author may change this recipe".into(),
        ));
    }
    Ok(recipe)
}

/// Validates everything, uploads the image, then writes the recipe and its
/// links in one transaction. The image is removed again if the write fails.
pub async fn create_recipe(
    state: &AppState,
    author_id: i64,
    req: CreateRecipeRequest,
) -> Result<Recipe, AppError> {
    validate_recipe_fields(&req.name, &req.text, req.cooking_time)?;
    let links = associations(&req.tags, &req.ingredients);
    validate_recipe_associations(state.store.as_ref(), &links.tag_ids, &links.ingredients).await?;
    let image = decode_data_uri(&req.image)?;

    let key = store_recipe_image(state, author_id, image).await?;
    let fields = RecipeFields {
        name: req.name,
        text: req.text,
        image: key.clone(),
        cooking_time: req.cooking_time,
    };
    match state.store.insert_recipe(author_id, fields, links).await {
        Ok(recipe) => {
            info!(recipe_id = recipe.id, author_id, "recipe created");
            Ok(recipe)
        }
        Err(e) => {
            discard_image(state, &key).await;
            Err(e.into())
        }
    }
}

/// Author-only. Both association sets are replaced wholesale.
pub async fn update_recipe(
    state: &AppState,
    editor: i64,
    recipe_id: i64,
    req: UpdateRecipeRequest,
) -> Result<Recipe, AppError> {
    let existing = owned_recipe(state, editor, recipe_id).await?;

    let name = req.name.unwrap_or(existing.name);
    let text = req.text.unwrap_or(existing.text);
    let cooking_time = req.cooking_time.unwrap_or(existing.cooking_time);
    validate_recipe_fields(&name, &text, cooking_time)?;
    let links = associations(&req.tags, &req.ingredients);
    validate_recipe_associations(state.store.as_ref(), &links.tag_ids, &links.ingredients).await?;
    let new_image = req.image.as_deref().map(decode_data_uri).transpose()?;

    let uploaded = match new_image {
        Some(image) => Some(store_recipe_image(state, editor, image).await?),
        None => None,
    };
    let fields = RecipeFields {
        name,
        text,
        image: uploaded.clone().unwrap_or_else(|| existing.image.clone()),
        cooking_time,
    };

    match state.store.replace_recipe(recipe_id, fields, links).await {
        Ok(recipe) => {
            if uploaded.is_some() {
                discard_image(state, &existing.image).await;
            }
            info!(recipe_id, "recipe updated");
            Ok(recipe)
        }
        Err(e) => {
            if let Some(key) = &uploaded {
                discard_image(state, key).await;
            }
            Err(e.into())
        }
    }
}

pub async fn delete_recipe(state: &AppState, editor: i64, recipe_id: i64) -> Result<(), AppError> {
    let recipe = owned_recipe(state, editor, recipe_id).await?;
    if !state.store.delete_recipe(recipe_id).await? {
        return Err(AppError::ResourceNotFound("recipe"));
    }
    discard_image(state, &recipe.image).await;
    info!(recipe_id, "recipe deleted");
    Ok(())
}

/// Adds the recipe to the user's favorites or cart and returns it.
pub async fn add_membership(
    state: &AppState,
    user_id: i64,
    recipe_id: i64,
    kind: Membership,
) -> Result<Recipe, AppError> {
    validate_membership_toggle(state.store.as_ref(), user_id, recipe_id, kind, true).await?;
    state.store.insert_membership(kind, user_id, recipe_id).await?;
    debug!(user_id, recipe_id, ?kind, "membership added");
    state
        .store
        .find_recipe(recipe_id)
        .await?
        .ok_or(AppError::RecipeNotFound(recipe_id))
}

pub async fn remove_membership(
    state: &AppState,
    user_id: i64,
    recipe_id: i64,
    kind: Membership,
) -> Result<(), AppError> {
    validate_membership_toggle(state.store.as_ref(), user_id, recipe_id, kind, false).await?;
    if !state.store.delete_membership(kind, user_id, recipe_id).await? {
        return Err(AppError::NotFound(format!(
            "recipe is not in {} or was already removed",
            kind.label()
        )));
    }
    debug!(user_id, recipe_id, ?kind, "membership removed");
    Ok(())
}
