use super::repo::RecipeRepo;
use super::repo_types::ShoppingListLine;
use crate::error::AppError;
use crate::store::Store;

pub const SHOPPING_LIST_HEADER: &str = "Список покупок:";

/// One line per ingredient across every recipe in the user's cart,
/// ordered by ingredient name then unit, compared bytewise.
pub async fn build_shopping_list(
    store: &dyn Store,
    user_id: i64,
) -> Result<Vec<ShoppingListLine>, AppError> {
    Ok(store.shopping_list(user_id).await?)
}

pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    let mut out = String::from(SHOPPING_LIST_HEADER);
    out.push('\n');
    for line in lines {
        out.push_str(&format!(
            "{} - {} {}.\n",
            line.name, line.total_amount, line.measurement_unit
        ));
    }
    out
}
