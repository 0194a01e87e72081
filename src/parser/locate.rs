use serde_json::Value;

const RECIPE_TYPE: &str = "Recipe";

/// First Recipe-typed node across all blocks, depth-first in document order.
pub fn find_recipe(blocks: &[Value]) -> Option<&Value> {
    blocks.iter().find_map(find_in)
}

fn find_in(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_in),
        Value::Object(obj) => {
            if obj.get("@type").is_some_and(is_recipe_type) {
                return Some(value);
            }
            match obj.get("@graph") {
                Some(graph @ Value::Array(_)) => find_in(graph),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `"Recipe"` or a list containing it. Exact match only.
pub fn is_recipe_type(tag: &Value) -> bool {
    has_type(tag, RECIPE_TYPE)
}

pub(crate) fn has_type(tag: &Value, wanted: &str) -> bool {
    match tag {
        Value::String(s) => s == wanted,
        Value::Array(items) => items.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}
