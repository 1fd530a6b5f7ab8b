use serde::Deserialize;

use crate::error::AppError;
use crate::pagination::Pagination;
use crate::recipes::repo_types::{Associations, IngredientAmount, RecipeFilter};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientAmountInput {
    pub id: i64,
    pub amount: i32,
}

#[derive(Deserialize)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmountInput>,
    pub tags: Vec<i64>,
    /// `data:image/...;base64,...`
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Scalars left out keep their current value. The association lists are
/// always replaced, so leaving one out is the same as sending it empty.
#[derive(Default, Deserialize)]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<IngredientAmountInput>,
    #[serde(default)]
    pub tags: Vec<i64>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

pub fn associations(tags: &[i64], ingredients: &[IngredientAmountInput]) -> Associations {
    Associations {
        tag_ids: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|i| IngredientAmount {
                ingredient_id: i.id,
                amount: i.amount,
            })
            .collect(),
    }
}

/// Recipe list query. Parsed from raw pairs because `tags` may repeat.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeListQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut q = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => q.page = Some(parse_int(&key, &value)?),
                "limit" => q.limit = Some(parse_int(&key, &value)?),
                "author" => q.author = Some(parse_int(&key, &value)?),
                "tags" => {
                    if !value.is_empty() {
                        q.tags.push(value);
                    }
                }
                "is_favorited" => q.is_favorited = parse_flag(&key, &value)?,
                "is_in_shopping_cart" => q.is_in_shopping_cart = parse_flag(&key, &value)?,
                _ => {}
            }
        }
        Ok(q)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn filter(&self, viewer: Option<i64>) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            is_favorited: self.is_favorited,
            is_in_shopping_cart: self.is_in_shopping_cart,
            viewer,
        }
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("`{key}` must be an integer")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, AppError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(AppError::Validation(format!("`{key}` must be 0 or 1"))),
    }
}
