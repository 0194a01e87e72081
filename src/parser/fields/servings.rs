use serde_json::Value;

use super::text::clean;

/// Display string for `recipeYield`. Lists contribute their first entry only.
pub fn servings(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => clean(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => servings(items.first()),
        _ => None,
    }
}
