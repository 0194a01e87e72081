use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SimplerRecipes/1.0)";
const CONFIG_FILE: &str = "simpler-recipes";
const ENV_PREFIX: &str = "RECIPES";

/// Runtime settings: defaults, then `simpler-recipes.toml`, then `RECIPES_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Curated catalog JSON.
    pub data_path: PathBuf,
    /// SQLite file backing shared links.
    pub share_db_path: PathBuf,
    pub share_ttl_secs: u64,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub batch_concurrency: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::builder()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("data_path", "recipe-data/all-recipes.json")?
            .set_default("share_db_path", "data/shares.sqlite")?
            .set_default("share_ttl_secs", 7 * 24 * 60 * 60_i64)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("fetch_timeout_secs", 30_i64)?
            .set_default("batch_concurrency", 8_i64)?)
    }

    pub fn share_ttl(&self) -> Duration {
        Duration::from_secs(self.share_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: PathBuf::from("recipe-data/all-recipes.json"),
            share_db_path: PathBuf::from("data/shares.sqlite"),
            share_ttl_secs: 7 * 24 * 60 * 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: 30,
            batch_concurrency: 8,
        }
    }
}
