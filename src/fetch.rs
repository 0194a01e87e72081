use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use tracing::{info, warn};

use crate::error::ExtractError;
use crate::model::ParsedRecipe;
use crate::parser;
use crate::settings::Settings;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Raw page as returned by the transport.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub html: String,
}

/// Supplies raw HTML for a URL. Transport failures map to `ExtractError::Fetch`.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, ExtractError>> + Send;
}

/// reqwest-backed fetcher. Timeout comes from settings; no retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.fetch_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ExtractError> {
        let fetch_err = |e: reqwest::Error| ExtractError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(fetch_err)?;
        let status = response.status().as_u16();
        let html = response.text().await.map_err(fetch_err)?;
        Ok(FetchedPage { status, html })
    }
}

/// The URL must be absolute and use http(s).
pub fn validate_url(url: &str) -> Result<Url, ExtractError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ExtractError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ExtractError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}', only HTTP and HTTPS are supported", other),
        }),
    }
}

/// Fetch `url` once and extract its recipe.
pub async fn simplify_recipe<F: PageFetcher>(
    fetcher: &F,
    url: &str,
) -> Result<ParsedRecipe, ExtractError> {
    let parsed = validate_url(url)?;

    let start = Instant::now();
    let page = fetcher.fetch(&parsed).await.inspect_err(|e| warn!("{}", e))?;
    let elapsed = start.elapsed().as_millis();

    if !(200..300).contains(&page.status) {
        let reason = match StatusCode::from_u16(page.status)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            Some(text) => format!("HTTP {} {}", page.status, text),
            None => format!("HTTP {}", page.status),
        };
        warn!("Fetch of {} failed after {}ms: {}", url, elapsed, reason);
        return Err(ExtractError::Fetch {
            url: url.to_string(),
            reason,
        });
    }

    info!("Fetched {} ({} bytes) in {}ms", url, page.html.len(), elapsed);
    parser::parse_recipe(url, &page.html)
}
