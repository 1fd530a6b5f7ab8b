use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub text: String,
    /// Object storage key of the recipe image.
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: OffsetDateTime,
}

/// Scalar columns written on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i64,
    pub amount: i32,
}

/// Full association sets of a recipe. Always written as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Associations {
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Ingredient of a recipe joined with its reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RecipeIngredientRow {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One line of the aggregated shopping list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// User-to-recipe flag relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    pub fn table(self) -> &'static str {
        match self {
            Membership::Favorite => "favorites",
            Membership::ShoppingCart => "shopping_cart",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Membership::Favorite => "favorites",
            Membership::ShoppingCart => "the shopping cart",
        }
    }
}

/// Recipe list filters. `tags` matches recipes carrying any of the slugs.
/// Membership filters apply to `viewer`; with no viewer they match nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub viewer: Option<i64>,
}
