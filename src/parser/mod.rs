pub mod assemble;
pub mod fields;
pub mod locate;
pub mod scripts;

use tracing::debug;

use crate::error::ExtractError;
use crate::model::ParsedRecipe;

/// Three-step pipeline: HTML → JSON-LD blocks → Recipe node → normalized record.
///
/// Pure and synchronous; fetching `html` is the caller's job.
pub fn parse_recipe(url: &str, html: &str) -> Result<ParsedRecipe, ExtractError> {
    let blocks = scripts::extract_json_ld(html);
    if blocks.is_empty() {
        return Err(ExtractError::NoStructuredData);
    }
    debug!("{}: {} JSON-LD block(s)", url, blocks.len());

    let node = locate::find_recipe(&blocks).ok_or(ExtractError::RecipeNotFound)?;
    Ok(assemble::build(node, url))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn yoast_graph_page() {
        let url = "https://www.example-kitchen.com/lemon-bars/";
        let r = parse_recipe(url, &fixture("yoast_graph")).unwrap();
        assert_eq!(r.title, "Classic Lemon Bars");
        assert_eq!(r.ingredients.len(), 6);
        assert_eq!(r.ingredients[0], "1 cup (2 sticks) butter, softened");
        assert_eq!(
            r.instructions,
            vec![
                "Preheat the oven to 350°F and line a 9x13 pan.",
                "Beat the butter, sugar and flour until crumbly.",
                "Press into the pan and bake for 20 minutes.",
                "Whisk the eggs, sugar, lemon juice and zest.",
                "Pour over the crust and bake 25 minutes more.",
                "Cool completely, then dust with powdered sugar.",
            ]
        );
        assert_eq!(r.prep_time.as_deref(), Some("15 min"));
        assert_eq!(r.cook_time.as_deref(), Some("45 min"));
        assert_eq!(r.servings.as_deref(), Some("24"));
        assert_eq!(
            r.image.as_deref(),
            Some("https://www.example-kitchen.com/wp-content/uploads/lemon-bars.jpg")
        );
        assert_eq!(r.source_url, url);
    }

    #[test]
    fn top_level_array_page() {
        let url = "https://recipes.example.org/pasta";
        let r = parse_recipe(url, &fixture("array_blocks")).unwrap();
        assert_eq!(r.title, "Weeknight Garlic Pasta");
        assert_eq!(r.ingredients, vec!["8 oz spaghetti", "4 cloves garlic, sliced", "¼ cup olive oil", "Salt & pepper"]);
        assert_eq!(r.instructions.len(), 3);
        assert_eq!(r.instructions[0], "Boil the pasta in salted water.");
        assert_eq!(r.prep_time.as_deref(), Some("5 min"));
        assert_eq!(r.cook_time.as_deref(), Some("15 min"));
        assert_eq!(r.servings.as_deref(), Some("4"));
        assert_eq!(r.image.as_deref(), Some("https://recipes.example.org/img/pasta-1x1.jpg"));
    }

    #[test]
    fn malformed_block_before_recipe() {
        let r = parse_recipe("https://x.test/soup", &fixture("broken_then_recipe")).unwrap();
        assert_eq!(r.title, "Tomato Soup");
        assert_eq!(r.instructions, vec!["Roast the tomatoes.", "Blend with stock."]);
    }

    #[test]
    fn no_structured_data() {
        let err = parse_recipe("https://x.test/plain", &fixture("no_jsonld")).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredData));
    }

    #[test]
    fn only_invalid_blocks_is_no_structured_data() {
        let html = r#"<script type="application/ld+json">{ nope </script>"#;
        let err = parse_recipe("https://x.test/", html).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredData));
    }

    #[test]
    fn article_only() {
        let err = parse_recipe("https://x.test/news", &fixture("article_only")).unwrap_err();
        assert!(matches!(err, ExtractError::RecipeNotFound));
    }

    #[test]
    fn single_recipe_matches_node() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Recipe","name":"Toast",
             "recipeIngredient":["1 slice bread","Butter"],
             "recipeInstructions":["Toast the bread.","Butter it."]}
            </script></head><body></body></html>"#;
        let r = parse_recipe("https://x.test/toast", html).unwrap();
        assert_eq!(r.title, "Toast");
        assert_eq!(r.ingredients, vec!["1 slice bread", "Butter"]);
        assert_eq!(r.instructions, vec!["Toast the bread.", "Butter it."]);
    }

    #[test]
    fn lists_always_serialize_as_arrays() {
        let html = r#"<script type="application/ld+json">{"@type":"Recipe","name":"Air"}</script>"#;
        let r = parse_recipe("https://x.test/air", html).unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert!(v["ingredients"].is_array());
        assert!(v["instructions"].is_array());
    }
}
