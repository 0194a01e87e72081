use std::collections::HashSet;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use regex::Regex;
use tracing::{info, warn};

pub const DEFAULT_PATTERN: &str = r"/recipes?/";

/// Nested sitemap indexes are followed this many levels deep.
const MAX_DEPTH: usize = 2;

#[derive(Debug, PartialEq, Eq)]
pub enum Sitemap {
    /// `<urlset>`: page URLs.
    Pages(Vec<String>),
    /// `<sitemapindex>`: child sitemap URLs.
    Index(Vec<String>),
}

/// Fetch a sitemap (following index files) and return page URLs matching
/// `pattern`, deduplicated in document order.
pub async fn discover_urls(
    client: &reqwest::Client,
    sitemap_url: &str,
    pattern: &Regex,
) -> Result<Vec<String>> {
    let mut queue = vec![(sitemap_url.to_string(), 0usize)];
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    while let Some((url, depth)) = queue.pop() {
        info!("Fetching sitemap: {}", url);
        let xml = client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch sitemap {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read sitemap {}", url))?;

        match parse_sitemap(&xml).with_context(|| format!("Invalid sitemap XML at {}", url))? {
            Sitemap::Pages(locs) => {
                info!("{} URLs in {}", locs.len(), url);
                for loc in locs {
                    if pattern.is_match(&loc) && seen.insert(loc.clone()) {
                        found.push(loc);
                    }
                }
            }
            Sitemap::Index(children) if depth < MAX_DEPTH => {
                info!("{} child sitemaps in {}", children.len(), url);
                // Reverse so children are visited in listed order.
                queue.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
            }
            Sitemap::Index(children) => {
                warn!("Skipping {} nested sitemaps under {}: too deep", children.len(), url);
            }
        }
    }

    info!("Matching pages: {}", found.len());
    Ok(found)
}

/// Parse a `urlset` or `sitemapindex` document and return its `<loc>` values.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut locs = Vec::new();
    let mut is_index = false;
    let mut in_entry = false;
    let mut in_loc = false;
    let mut current = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemapindex" => is_index = true,
                b"url" | b"sitemap" => in_entry = true,
                b"loc" if in_entry => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Event::Text(e) if in_loc => current.push_str(&e.unescape()?),
            Event::CData(e) if in_loc => current.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                b"url" | b"sitemap" => in_entry = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(if is_index {
        Sitemap::Index(locs)
    } else {
        Sitemap::Pages(locs)
    })
}

// ── Tests ──
