use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use regex::Regex;

use simpler_recipes::batch;
use simpler_recipes::catalog::Catalog;
use simpler_recipes::server;
use simpler_recipes::share::ShareStore;
use simpler_recipes::sitemap;
use simpler_recipes::tools::Toolbox;
use simpler_recipes::{parse_recipe, ExtractError, HttpFetcher, ParsedRecipe, Settings};

#[derive(Parser)]
#[command(name = "simpler-recipes", about = "Extract clean recipes from Schema.org JSON-LD")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a recipe page and print the simplified recipe
    Simplify {
        url: String,
    },
    /// Extract a recipe from a saved HTML file
    Parse {
        file: PathBuf,
        /// Page URL the HTML came from (used for sourceUrl and relative images)
        #[arg(long)]
        url: String,
    },
    /// Extract every *.html file in a directory (JSON lines on stdout)
    ParseDir {
        dir: PathBuf,
    },
    /// Simplify every URL in a file, one per line (JSON lines on stdout)
    Batch {
        file: PathBuf,
        /// Max requests in flight (default: from settings)
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,
    },
    /// List recipe URLs from a sitemap
    Discover {
        sitemap_url: String,
        /// Regex page URLs must match
        #[arg(short, long, default_value = sitemap::DEFAULT_PATTERN)]
        pattern: String,
    },
    /// Show a curated recipe
    Recipe {
        slug: String,
    },
    /// Show a curated collection with its recipes
    Collection {
        slug: String,
    },
    /// Curated collections table
    Collections,
    /// Search curated recipes by title, ingredient, tag or theme
    Search {
        query: String,
    },
    /// Store a recipe JSON file and print its share id
    Share {
        file: PathBuf,
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Print a shared recipe by id
    Shared {
        id: String,
    },
    /// Delete expired share links
    PurgeShares,
    /// Run the tool server on stdin/stdout
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Simplify { url } => {
            let fetcher = HttpFetcher::new(&settings)?;
            match simpler_recipes::simplify_recipe(&fetcher, &url).await {
                Ok(recipe) => print_json(&recipe),
                Err(e) => Err(extraction_failed(e)),
            }
        }
        Commands::Parse { file, url } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            match parse_recipe(&url, &html) {
                Ok(recipe) => print_json(&recipe),
                Err(e) => Err(extraction_failed(e)),
            }
        }
        Commands::ParseDir { dir } => {
            let files = html_files(&dir)?;
            if files.is_empty() {
                println!("No .html files in {}", dir.display());
                return Ok(());
            }
            eprintln!("Parsing {} files...", files.len());
            let counts = parse_files(&files)?;
            counts.print();
            Ok(())
        }
        Commands::Batch { file, concurrency } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let urls = batch::read_url_list(&text);
            if urls.is_empty() {
                println!("No URLs in {}", file.display());
                return Ok(());
            }
            let fetcher = Arc::new(HttpFetcher::new(&settings)?);
            let concurrency = concurrency.unwrap_or(settings.batch_concurrency);
            eprintln!("Simplifying {} URLs ({} at a time)...", urls.len(), concurrency);
            let stats = batch::simplify_all(fetcher, urls, concurrency, true, |item| {
                println!("{}", serde_json::to_string(&item)?);
                Ok(())
            })
            .await?;
            eprintln!(
                "Done: {} simplified ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Discover { sitemap_url, pattern } => {
            let re = Regex::new(&pattern).with_context(|| format!("Invalid pattern {:?}", pattern))?;
            let fetcher = HttpFetcher::new(&settings)?;
            let urls = sitemap::discover_urls(fetcher.client(), &sitemap_url, &re).await?;
            for url in &urls {
                println!("{}", url);
            }
            eprintln!("{} matching URLs", urls.len());
            Ok(())
        }
        Commands::Recipe { slug } => {
            let catalog = Catalog::load(&settings.data_path)?;
            match catalog.recipe(&slug) {
                Some(recipe) => print_json(recipe),
                None => bail!("Recipe not found: \"{}\"", slug),
            }
        }
        Commands::Collection { slug } => {
            let catalog = Catalog::load(&settings.data_path)?;
            match catalog.collection(&slug) {
                Some(collection) => print_json(&collection),
                None => bail!("Collection not found: \"{}\"", slug),
            }
        }
        Commands::Collections => {
            let overview = Catalog::load(&settings.data_path)?.collections();
            println!(
                "{:>3} | {:<28} | {:<40} | {:>7}",
                "#", "Collection", "Description", "Recipes"
            );
            println!("{}", "-".repeat(88));
            for (i, c) in overview.collections.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<40} | {:>7}",
                    i + 1,
                    truncate(&c.name, 28),
                    truncate(&c.description, 40),
                    c.recipe_count
                );
            }
            println!(
                "\n{} collections | {} recipes | updated {}",
                overview.metadata.collection_count,
                overview.metadata.total_recipes,
                overview.metadata.last_updated
            );
            Ok(())
        }
        Commands::Search { query } => {
            let catalog = Catalog::load(&settings.data_path)?;
            let hits = catalog.search(&query);
            if hits.is_empty() {
                println!("No recipes match {:?}.", query);
                return Ok(());
            }
            println!("{:>3} | {:<32} | {:<14} | {:<32}", "#", "Recipe", "Theme", "Slug");
            println!("{}", "-".repeat(90));
            for (i, r) in hits.iter().enumerate() {
                println!(
                    "{:>3} | {:<32} | {:<14} | {:<32}",
                    i + 1,
                    truncate(&r.title, 32),
                    truncate(&r.theme, 14),
                    truncate(&r.slug, 32)
                );
            }
            println!("\n{} matches", hits.len());
            Ok(())
        }
        Commands::Share { file, source_url } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let recipe: ParsedRecipe = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a recipe JSON file", file.display()))?;
            let store = ShareStore::open(&settings.share_db_path, settings.share_ttl())?;
            let id = store.share(&recipe, source_url.as_deref())?;
            println!("{}", id);
            Ok(())
        }
        Commands::Shared { id } => {
            let store = ShareStore::open(&settings.share_db_path, settings.share_ttl())?;
            match store.get(&id)? {
                Some(shared) => print_json(&shared),
                None => bail!("Shared recipe not found or expired: {}", id),
            }
        }
        Commands::PurgeShares => {
            let store = ShareStore::open(&settings.share_db_path, settings.share_ttl())?;
            let removed = store.purge_expired()?;
            println!("Removed {} expired shares.", removed);
            Ok(())
        }
        Commands::Serve => {
            let toolbox = Toolbox::new(settings.data_path.clone(), HttpFetcher::new(&settings)?);
            server::serve_stdio(toolbox).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn extraction_failed(e: ExtractError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", e.kind().user_message(), e)
}

fn html_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Default)]
struct ParseCounts {
    ok: usize,
    no_structured_data: usize,
    recipe_not_found: usize,
    unreadable: usize,
}

impl ParseCounts {
    fn print(&self) {
        eprintln!(
            "Parsed {} recipes, {} without structured data, {} without a recipe, {} unreadable.",
            self.ok, self.no_structured_data, self.recipe_not_found, self.unreadable,
        );
    }
}

/// Offline extraction. Files without a known page URL get a `file://` source.
fn parse_files(files: &[PathBuf]) -> anyhow::Result<ParseCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ParseCounts::default();

    for chunk in files.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let url = file_url(path);
                let parsed = std::fs::read_to_string(path)
                    .map(|html| parse_recipe(&url, &html));
                (url, parsed)
            })
            .collect();

        for (url, parsed) in results {
            let line = match parsed {
                Ok(Ok(recipe)) => {
                    counts.ok += 1;
                    serde_json::to_value(&recipe)?
                }
                Ok(Err(e)) => {
                    match e {
                        ExtractError::NoStructuredData => counts.no_structured_data += 1,
                        _ => counts.recipe_not_found += 1,
                    }
                    serde_json::json!({ "sourceUrl": url, "error": e.to_string() })
                }
                Err(e) => {
                    counts.unreadable += 1;
                    serde_json::json!({ "sourceUrl": url, "error": e.to_string() })
                }
            };
            pb.suspend(|| println!("{}", line));
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn file_url(path: &Path) -> String {
    let abs = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    reqwest::Url::from_file_path(&abs)
        .map(String::from)
        .unwrap_or_else(|_| abs.display().to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
