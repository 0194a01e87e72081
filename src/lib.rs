//! Recipe extraction from Schema.org JSON-LD, plus the curated catalog, share
//! links and the stdio tool server built on top of it.

pub mod batch;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod server;
pub mod settings;
pub mod share;
pub mod sitemap;
pub mod tools;

pub use error::{ExtractError, FailureKind};
pub use fetch::{simplify_recipe, HttpFetcher, PageFetcher};
pub use model::ParsedRecipe;
pub use parser::parse_recipe;
pub use settings::Settings;
