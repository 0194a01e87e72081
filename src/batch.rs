use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::fetch::{self, PageFetcher};
use crate::model::ParsedRecipe;

/// Batch stats returned after completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Outcome for one URL, emitted as a JSON line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<ParsedRecipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

/// Read a URL list: one per line, blank lines and `#` comments skipped.
pub fn read_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Simplify every URL with at most `concurrency` requests in flight. Each
/// result is handed to `on_item` as soon as it arrives, in completion order.
/// No retries: a failed URL is reported once.
pub async fn simplify_all<F>(
    fetcher: Arc<F>,
    urls: Vec<String>,
    concurrency: usize,
    show_progress: bool,
    mut on_item: impl FnMut(BatchItem) -> Result<()>,
) -> Result<BatchStats>
where
    F: PageFetcher + Send + Sync + 'static,
{
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = urls.len();

    let pb = if show_progress {
        ProgressBar::new(total as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Workers send results, the loop below hands them out.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<BatchItem>(concurrency * 2);

    for url in urls {
        let fetcher = Arc::clone(&fetcher);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let start = Instant::now();
            let outcome = fetch::simplify_recipe(fetcher.as_ref(), &url).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            let item = match outcome {
                Ok(recipe) => BatchItem {
                    url,
                    recipe: Some(recipe),
                    error: None,
                    latency_ms,
                },
                Err(e) => {
                    warn!("{}: {}", url, e);
                    BatchItem {
                        url,
                        recipe: None,
                        error: Some(e.to_string()),
                        latency_ms,
                    }
                }
            };
            let _ = tx.send(item).await;
        });
    }

    // rx closes once every worker has dropped its sender.
    drop(tx);

    let mut stats = BatchStats {
        total,
        ..Default::default()
    };
    while let Some(item) = rx.recv().await {
        if item.error.is_some() {
            stats.errors += 1;
        } else {
            stats.ok += 1;
        }
        pb.suspend(|| on_item(item))?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Simplified {} pages ({} ok, {} errors)", total, stats.ok, stats.errors);
    Ok(stats)
}

// ── Tests ──
