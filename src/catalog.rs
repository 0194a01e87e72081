use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// ── Data types ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A hand-curated recipe as stored in the catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipe {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub image: String,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub servings: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub tags: Vec<String>,
    pub source: RecipeSource,
    pub theme: String,
    pub difficulty: String,
    pub added_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionSummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub recipe_count: usize,
    /// Recipe slugs, in display order.
    pub recipes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub total_recipes: usize,
    pub collection_count: usize,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeData {
    pub metadata: Metadata,
    pub collections: Vec<CollectionSummary>,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionWithRecipes {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub recipe_count: usize,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionsOverview {
    pub metadata: Metadata,
    pub collections: Vec<CollectionSummary>,
}

// ── Catalog ──

/// Read-only view over the curated recipe file, indexed by slug.
pub struct Catalog {
    data: RecipeData,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recipe data from {}", path.display()))?;
        let data: RecipeData = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid recipe data in {}", path.display()))?;
        info!(
            "Loaded {} recipes in {} collections from {}",
            data.recipes.len(),
            data.collections.len(),
            path.display()
        );
        Ok(Self::from_data(data))
    }

    pub fn from_data(data: RecipeData) -> Self {
        let mut by_slug = HashMap::with_capacity(data.recipes.len());
        for (i, recipe) in data.recipes.iter().enumerate() {
            // First entry wins on duplicate slugs.
            by_slug.entry(recipe.slug.clone()).or_insert(i);
        }
        Catalog { data, by_slug }
    }

    pub fn recipe(&self, slug: &str) -> Option<&Recipe> {
        self.by_slug.get(slug).map(|&i| &self.data.recipes[i])
    }

    pub fn collection(&self, slug: &str) -> Option<CollectionWithRecipes> {
        let summary = self.data.collections.iter().find(|c| c.slug == slug)?;
        let recipes = summary
            .recipes
            .iter()
            .filter_map(|s| self.recipe(s))
            .cloned()
            .collect();

        Some(CollectionWithRecipes {
            slug: summary.slug.clone(),
            name: summary.name.clone(),
            description: summary.description.clone(),
            recipe_count: summary.recipe_count,
            recipes,
        })
    }

    pub fn collections(&self) -> CollectionsOverview {
        CollectionsOverview {
            metadata: self.data.metadata.clone(),
            collections: self.data.collections.clone(),
        }
    }

    /// Case-insensitive substring match over title, ingredients, tags and theme.
    pub fn search(&self, query: &str) -> Vec<&Recipe> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.data
            .recipes
            .iter()
            .filter(|r| {
                std::iter::once(&r.title)
                    .chain(&r.ingredients)
                    .chain(&r.tags)
                    .chain(std::iter::once(&r.theme))
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

// ── Tests ──
