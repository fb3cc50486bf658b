//! Sitemap and sitemap-index expansion.
//!
//! A sitemap index can reference thousands of child sitemaps; expanding all of
//! them to find a handful of pages would be unbounded network work. Instead
//! the child list itself is sampled with the run's strategy and seed before
//! recursing, and recursion carries an explicit depth cap.

use log::{debug, info, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

use crate::sampler::{SampleConfig, sample};
use crate::url_policy::is_likely_html_url;

/// Per-level cap on child sitemaps fetched from an index.
pub const MAX_CHILD_SITEMAPS: usize = 10;

/// Index-of-index chains deeper than this contribute nothing.
pub const MAX_SITEMAP_DEPTH: usize = 3;

/// Consecutive PDF-like entries before the rest of a urlset is abandoned.
/// Sitemaps are often partitioned by content type; a long PDF run signals a
/// document archive not worth continuing into.
const PDF_RUN_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct ParsedSitemap {
    pages: Vec<String>,
    children: Vec<String>,
}

/// Expand a sitemap URL into a filtered, sampled candidate list.
///
/// Every failure mode (network error, non-2xx, unparsable XML) yields an
/// empty list: "no sitemap" is a normal outcome that triggers fallback
/// discovery, never a run failure.
pub async fn fetch_sitemap(
    client: &Client,
    url: &str,
    sample_config: &SampleConfig,
    skip_extensions: &[String],
) -> Vec<String> {
    let raw = expand(client, url, sample_config, 0).await;

    let mut seen = HashSet::new();
    let candidates: Vec<String> = raw
        .into_iter()
        .filter(|u| is_likely_html_url(u, skip_extensions))
        .filter(|u| seen.insert(u.clone()))
        .collect();

    debug!(
        "Sitemap {url}: {} HTML-like candidates before sampling",
        candidates.len()
    );
    sample(&candidates, sample_config)
}

/// Recursive worker: returns raw page locations, unfiltered and unsampled.
async fn expand(
    client: &Client,
    url: &str,
    sample_config: &SampleConfig,
    depth: usize,
) -> Vec<String> {
    if depth >= MAX_SITEMAP_DEPTH {
        warn!("Sitemap recursion depth cap reached at {url}, not descending");
        return Vec::new();
    }

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Sitemap fetch failed for {url}: {e}");
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        warn!("Sitemap fetch for {url} returned {}", response.status());
        return Vec::new();
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Sitemap body read failed for {url}: {e}");
            return Vec::new();
        }
    };

    let parsed = parse_sitemap(&body);
    let mut pages = parsed.pages;

    if !parsed.children.is_empty() {
        // Two-level sampling: pick which children to fetch with the same
        // strategy/seed as the run, capped well below the page budget.
        let child_config = SampleConfig {
            max_pages: MAX_CHILD_SITEMAPS,
            strategy: sample_config.strategy,
            seed: sample_config.seed.clone(),
        };
        let sampled = sample(&parsed.children, &child_config);
        info!(
            "Sitemap index {url}: {} children, fetching {}",
            parsed.children.len(),
            sampled.len()
        );

        for child in sampled {
            let nested = Box::pin(expand(client, &child, sample_config, depth + 1)).await;
            pages.extend(nested);
        }
    }

    pages
}

/// Pull `<loc>` entries out of a sitemap document, classifying them as page
/// locations (`<url>` parents) or child sitemaps (`<sitemap>` parents).
fn parse_sitemap(xml: &[u8]) -> ParsedSitemap {
    #[derive(Clone, Copy, PartialEq)]
    enum Parent {
        None,
        Page,
        Child,
    }

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut parsed = ParsedSitemap::default();
    let mut parent = Parent::None;
    let mut in_loc = false;
    let mut pdf_run = 0usize;
    let mut urlset_aborted = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.ends_with(b"sitemap") {
                    parent = Parent::Child;
                } else if name.ends_with(b"url") {
                    parent = Parent::Page;
                } else if name.ends_with(b"loc") {
                    in_loc = true;
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name.ends_with(b"loc") {
                    in_loc = false;
                } else if name.ends_with(b"sitemap") || name.ends_with(b"url") {
                    parent = Parent::None;
                }
            }
            Ok(Event::Text(t)) => {
                if !in_loc {
                    buf.clear();
                    continue;
                }
                let Ok(text) = t.unescape() else {
                    buf.clear();
                    continue;
                };
                let loc = text.trim().to_string();
                if loc.is_empty() {
                    buf.clear();
                    continue;
                }

                match parent {
                    Parent::Child => parsed.children.push(loc),
                    Parent::Page if !urlset_aborted => {
                        if is_pdf_like(&loc) {
                            pdf_run += 1;
                            if pdf_run >= PDF_RUN_LIMIT {
                                debug!(
                                    "{PDF_RUN_LIMIT} consecutive PDF-like entries, abandoning rest of urlset"
                                );
                                urlset_aborted = true;
                            }
                        } else {
                            pdf_run = 0;
                        }
                        parsed.pages.push(loc);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Sitemap XML parse error: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    parsed
}

fn is_pdf_like(url: &str) -> bool {
    // Judge only the path's last segment; the hostname's dots and any query
    // string must not defeat the check.
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    let path = path.trim_end_matches('/');
    let Some(segment) = path.rsplit('/').next() else {
        return false;
    };
    match segment.rsplit_once('.') {
        Some((_, extension)) => extension == "pdf",
        None => segment.ends_with("pdf"),
    }
}
