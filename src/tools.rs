use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::ExtractError;
use crate::fetch::{self, PageFetcher};

// ── Tool definitions ──

/// Name, description and JSON input schema for every tool the server exposes.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "list_collections",
            "description": "Get all available curated recipe collections. Returns metadata about the recipe database and a list of collections with their names, descriptions, and recipe counts.",
            "inputSchema": { "type": "object", "properties": {} }
        }),
        json!({
            "name": "get_collection",
            "description": "Get all recipes in a specific collection by its slug. Returns the collection metadata along with full details for all recipes in that collection.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "slug": {
                        "type": "string",
                        "description": "The collection slug (e.g., \"quick-weeknight-dinners\", \"baking-basics\")"
                    }
                },
                "required": ["slug"]
            }
        }),
        json!({
            "name": "get_recipe",
            "description": "Get a specific curated recipe by its slug. Returns the full recipe object including title, ingredients, instructions, prep/cook time, servings, and source information.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "slug": {
                        "type": "string",
                        "description": "The recipe slug (e.g., \"chicken-stir-fry\")"
                    }
                },
                "required": ["slug"]
            }
        }),
        json!({
            "name": "simplify_recipe",
            "description": "Extract a clean, simplified recipe from any URL that has Schema.org recipe markup. Returns just the essential recipe information: title, ingredients, instructions, prep/cook time, servings, and image.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL of the recipe page to extract from"
                    }
                },
                "required": ["url"]
            }
        }),
    ]
}

// ── Results ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult {
            content: vec![ToolContent {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        ToolResult {
            is_error: true,
            ..Self::text(text)
        }
    }

    fn json<T: Serialize>(value: &T, failure: &str) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("{}: {}", failure, e)),
        }
    }
}

// ── Dispatch ──

/// Routes tool calls to the catalog and the extraction engine. The catalog
/// file is read on first use and cached once it loads.
pub struct Toolbox<F> {
    data_path: PathBuf,
    catalog: OnceLock<Catalog>,
    fetcher: F,
}

impl<F: PageFetcher> Toolbox<F> {
    pub fn new(data_path: impl Into<PathBuf>, fetcher: F) -> Self {
        Toolbox {
            data_path: data_path.into(),
            catalog: OnceLock::new(),
            fetcher,
        }
    }

    pub fn with_catalog(catalog: Catalog, fetcher: F) -> Self {
        let toolbox = Self::new(PathBuf::new(), fetcher);
        let _ = toolbox.catalog.set(catalog);
        toolbox
    }

    pub async fn call(&self, name: &str, args: &Value) -> ToolResult {
        info!("tools/call {}", name);
        let result = match name {
            "list_collections" => self.list_collections(),
            "get_collection" => self.get_collection(args),
            "get_recipe" => self.get_recipe(args),
            "simplify_recipe" => self.simplify_recipe(args).await,
            _ => ToolResult::error(format!("Unknown tool: {}", name)),
        };
        if result.is_error {
            warn!("{} failed: {}", name, first_text(&result));
        }
        result
    }

    fn catalog(&self) -> Result<&Catalog> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }
        let loaded = Catalog::load(&self.data_path)?;
        Ok(self.catalog.get_or_init(|| loaded))
    }

    fn list_collections(&self) -> ToolResult {
        match self.catalog() {
            Ok(catalog) => ToolResult::json(&catalog.collections(), "Failed to list collections"),
            Err(e) => ToolResult::error(format!("Failed to list collections: {:#}", e)),
        }
    }

    fn get_collection(&self, args: &Value) -> ToolResult {
        let Some(slug) = string_arg(args, "slug") else {
            return missing("slug");
        };
        let catalog = match self.catalog() {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Failed to get collection: {:#}", e)),
        };
        match catalog.collection(slug) {
            Some(collection) => ToolResult::json(&collection, "Failed to get collection"),
            None => ToolResult::error(format!(
                "Collection not found: \"{}\". Use list_collections to see available collections.",
                slug
            )),
        }
    }

    fn get_recipe(&self, args: &Value) -> ToolResult {
        let Some(slug) = string_arg(args, "slug") else {
            return missing("slug");
        };
        let catalog = match self.catalog() {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Failed to get recipe: {:#}", e)),
        };
        match catalog.recipe(slug) {
            Some(recipe) => ToolResult::json(recipe, "Failed to get recipe"),
            None => ToolResult::error(format!(
                "Recipe not found: \"{}\". Use list_collections to see available recipes.",
                slug
            )),
        }
    }

    async fn simplify_recipe(&self, args: &Value) -> ToolResult {
        let Some(url) = string_arg(args, "url") else {
            return missing("url");
        };
        if fetch::validate_url(url).is_err() {
            return ToolResult::error(format!("Error: Invalid URL format: \"{}\"", url));
        }
        match fetch::simplify_recipe(&self.fetcher, url).await {
            Ok(recipe) => ToolResult::json(&recipe, "Failed to extract recipe"),
            Err(e) => ToolResult::from(&e),
        }
    }
}

fn string_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn missing(param: &str) -> ToolResult {
    ToolResult::error(format!("Error: {} parameter is required", param))
}

fn first_text(result: &ToolResult) -> &str {
    result.content.first().map(|c| c.text.as_str()).unwrap_or("")
}

impl From<&ExtractError> for ToolResult {
    fn from(e: &ExtractError) -> Self {
        ToolResult::error(format!("Failed to extract recipe: {}", e))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use reqwest::Url;

    use super::*;
    use crate::fetch::FetchedPage;

    struct OnePage;

    impl PageFetcher for OnePage {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, ExtractError> {
            let html = match url.path() {
                "/toast" => r#"<script type="application/ld+json">{"@type":"Recipe","name":"Toast","recipeIngredient":["Bread"]}</script>"#,
                _ => "<p>nothing here</p>",
            };
            Ok(FetchedPage {
                status: 200,
                html: html.to_string(),
            })
        }
    }

    fn toolbox() -> Toolbox<OnePage> {
        Toolbox::new("tests/fixtures/all-recipes.json", OnePage)
    }

    fn text(result: &ToolResult) -> &str {
        &result.content[0].text
    }

    #[test]
    fn definitions_cover_every_tool() {
        let names: Vec<String> = tool_definitions()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["list_collections", "get_collection", "get_recipe", "simplify_recipe"]
        );
        for def in tool_definitions() {
            assert_eq!(def["inputSchema"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn list_collections_returns_overview() {
        let r = toolbox().call("list_collections", &json!({})).await;
        assert!(!r.is_error);
        let v: Value = serde_json::from_str(text(&r)).unwrap();
        assert_eq!(v["metadata"]["totalRecipes"], 4);
        assert_eq!(v["collections"][0]["slug"], "weeknight-dinners");
    }

    #[tokio::test]
    async fn get_recipe_found_and_missing() {
        let tb = toolbox();
        let ok = tb.call("get_recipe", &json!({"slug": "lemon-bars"})).await;
        assert!(!ok.is_error);
        assert!(text(&ok).contains("\"title\": \"Classic Lemon Bars\""));

        let missing = tb.call("get_recipe", &json!({"slug": "nope"})).await;
        assert!(missing.is_error);
        assert_eq!(
            text(&missing),
            "Recipe not found: \"nope\". Use list_collections to see available recipes."
        );
    }

    #[tokio::test]
    async fn get_collection_found_and_missing() {
        let tb = toolbox();
        let ok = tb.call("get_collection", &json!({"slug": "baking"})).await;
        let v: Value = serde_json::from_str(text(&ok)).unwrap();
        assert_eq!(v["recipes"][0]["slug"], "lemon-bars");

        let missing = tb.call("get_collection", &json!({"slug": "x"})).await;
        assert_eq!(
            text(&missing),
            "Collection not found: \"x\". Use list_collections to see available collections."
        );
    }

    #[tokio::test]
    async fn required_parameters() {
        let tb = toolbox();
        for (tool, param) in [("get_recipe", "slug"), ("get_collection", "slug"), ("simplify_recipe", "url")] {
            let r = tb.call(tool, &json!({})).await;
            assert!(r.is_error);
            assert_eq!(text(&r), format!("Error: {} parameter is required", param));
        }
        let blank = tb.call("get_recipe", &json!({"slug": ""})).await;
        assert_eq!(text(&blank), "Error: slug parameter is required");
    }

    #[tokio::test]
    async fn simplify_paths() {
        let tb = toolbox();
        let ok = tb.call("simplify_recipe", &json!({"url": "https://x.test/toast"})).await;
        assert!(!ok.is_error);
        let v: Value = serde_json::from_str(text(&ok)).unwrap();
        assert_eq!(v["title"], "Toast");
        assert_eq!(v["sourceUrl"], "https://x.test/toast");

        let bad = tb.call("simplify_recipe", &json!({"url": "not a url"})).await;
        assert_eq!(text(&bad), "Error: Invalid URL format: \"not a url\"");

        let none = tb.call("simplify_recipe", &json!({"url": "https://x.test/blog"})).await;
        assert!(none.is_error);
        assert_eq!(
            text(&none),
            "Failed to extract recipe: No structured data found on this page"
        );
    }

    #[tokio::test]
    async fn unknown_tool() {
        let r = toolbox().call("delete_everything", &json!({})).await;
        assert!(r.is_error);
        assert_eq!(text(&r), "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn catalog_failure_is_reported() {
        let tb = Toolbox::new("tests/fixtures/does-not-exist.json", OnePage);
        let r = tb.call("list_collections", &json!({})).await;
        assert!(r.is_error);
        assert!(text(&r).starts_with("Failed to list collections: Failed to read recipe data"));
    }

    #[test]
    fn result_wire_shape() {
        let v = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(v, json!({"content": [{"type": "text", "text": "boom"}], "isError": true}));
    }
}
