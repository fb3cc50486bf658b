//! Discovery phase: turn configured targets into a seed queue.
//!
//! List mode takes targets verbatim, crawl mode seeds with the targets and
//! lets live discovery do the rest, and sitemap mode expands sitemaps with a
//! static crawl fallback when none exist.

pub mod crawl;
pub mod sitemap;

use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

use crate::config::{ScanConfig, ScanMode};
use crate::url_policy::normalize_url;

pub use crawl::{extract_links, fetch_root_links};
pub use sitemap::{MAX_CHILD_SITEMAPS, MAX_SITEMAP_DEPTH, fetch_sitemap};

/// Outcome of the discovery phase.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Seed queue, deduplicated, in discovery order.
    pub queue: Vec<String>,
    /// True when sitemap mode found no sitemap and fell back to crawling;
    /// this is what permits live link discovery during the scan.
    pub fallback_engaged: bool,
}

/// Shared HTTP client for raw (non-browser) fetches.
///
/// Carries the run's user agent and a bounded request timeout so a hung
/// sitemap or root fetch cannot stall discovery indefinitely.
pub fn http_client(config: &ScanConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent().to_string())
        .timeout(config.fetch_timeout())
        .build()
        .context("failed to build HTTP client")
}

/// Build the seed queue for a run.
///
/// A target that fails to normalize is logged and skipped; it never aborts
/// discovery for the remaining targets.
pub async fn discover(client: &Client, config: &ScanConfig) -> Discovery {
    let mut raw_targets: Vec<String> = Vec::new();
    if config.mode() != ScanMode::List
        && let Some(base) = config.base_url()
    {
        raw_targets.push(base.to_string());
    }
    raw_targets.extend(config.urls().iter().cloned());

    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();
    let mut push = |queue: &mut Vec<String>, url: String| {
        if seen.insert(url.clone()) {
            queue.push(url);
        }
    };

    for raw in raw_targets {
        let Some(target) = normalize_url(&raw) else {
            warn!("Skipping invalid target URL: {raw}");
            continue;
        };

        match config.mode() {
            ScanMode::List | ScanMode::Crawl => push(&mut discovery.queue, target),
            ScanMode::Sitemap => {
                let Ok(target_url) = Url::parse(&target) else {
                    warn!("Skipping invalid target URL: {raw}");
                    continue;
                };
                let sample_config = config.sample_config(Some(&target_url));

                if target_url.path().to_ascii_lowercase().ends_with(".xml") {
                    info!("Processing sitemap: {target}");
                    let urls =
                        fetch_sitemap(client, &target, &sample_config, config.skip_extensions())
                            .await;
                    if urls.is_empty() {
                        info!("No URLs found in sitemap: {target}");
                    } else {
                        info!("Found {} URLs in sitemap", urls.len());
                        for url in urls {
                            push(&mut discovery.queue, url);
                        }
                    }
                    continue;
                }

                // Probe the conventional location for this origin.
                let sitemap_url = match target_url.join("/sitemap.xml") {
                    Ok(url) => url.to_string(),
                    Err(e) => {
                        warn!("Cannot derive sitemap URL for {target}: {e}");
                        push(&mut discovery.queue, target);
                        continue;
                    }
                };

                info!("Checking for default sitemap at {sitemap_url}");
                let urls =
                    fetch_sitemap(client, &sitemap_url, &sample_config, config.skip_extensions())
                        .await;
                if urls.is_empty() {
                    info!("No sitemap found for {target}");
                    if config.sitemap_fallback_to_crawl() {
                        discovery.fallback_engaged = true;
                        let links = fetch_root_links(
                            client,
                            &target,
                            config.skip_extensions(),
                            config.max_pages(),
                        )
                        .await;
                        info!("Fallback crawl of {target} found {} links", links.len());
                        for link in links {
                            push(&mut discovery.queue, link);
                        }
                    }
                    push(&mut discovery.queue, target);
                } else {
                    info!("Found {} URLs in sitemap", urls.len());
                    for url in urls {
                        push(&mut discovery.queue, url);
                    }
                }
            }
        }
    }

    discovery
}
