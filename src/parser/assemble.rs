use serde_json::Value;

use super::fields::duration::parse_iso_duration;
use super::fields::image::resolve_image;
use super::fields::text::clean;
use super::fields::{decode_entities, first_image, normalize_instructions, servings};
use crate::model::ParsedRecipe;

/// Build the normalized record from a Recipe node. Never fails: every field
/// degrades on its own.
pub fn build(node: &Value, url: &str) -> ParsedRecipe {
    let field = |key: &str| node.get(key).filter(|v| !v.is_null());

    let title = decode_entities(field("name").and_then(Value::as_str))
        .trim()
        .to_string();

    ParsedRecipe {
        title,
        ingredients: ingredients(field("recipeIngredient").or_else(|| field("ingredients"))),
        instructions: normalize_instructions(field("recipeInstructions")),
        prep_time: time(field("prepTime")),
        cook_time: time(field("cookTime")),
        servings: servings(field("recipeYield").or_else(|| field("yield"))),
        image: first_image(field("image"))
            .or_else(|| first_image(field("thumbnailUrl")))
            .map(|img| resolve_image(img, url)),
        source_url: url.to_string(),
    }
}

fn ingredients(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(clean)
            .collect(),
        Some(Value::String(s)) => s.lines().filter_map(clean).collect(),
        _ => Vec::new(),
    }
}

/// Humanized duration; a non-duration string is kept as written.
fn time(value: Option<&Value>) -> Option<String> {
    let raw = value?.as_str()?;
    match parse_iso_duration(raw) {
        Some(d) => d.humanize(),
        None => clean(raw),
    }
}
