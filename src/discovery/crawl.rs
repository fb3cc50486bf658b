//! Crawl fallback: static link discovery when no sitemap exists.
//!
//! A plain HTTP fetch of the target page, no browser involved. Live-DOM
//! discovery during the scanning phase catches what this static pass misses.

use log::{debug, warn};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::scan::gate::should_analyze;
use crate::url_policy::{is_likely_html_url, same_origin};

/// Extract same-origin, HTML-like anchor targets from an HTML document.
///
/// Relative hrefs resolve against `base_url`; cross-origin links and
/// fragments are dropped; the result is deduplicated and truncated to
/// `limit`.
#[must_use]
pub fn extract_links(
    base_url: &str,
    html: &str,
    skip_extensions: &[String],
    limit: usize,
) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        warn!("Cannot extract links relative to unparsable base {base_url}");
        return Vec::new();
    };
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        resolved.set_fragment(None);
        if !same_origin(&base, &resolved) {
            continue;
        }
        let normalized = resolved.to_string();
        if !is_likely_html_url(&normalized, skip_extensions) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}

/// Fetch a page without a browser and extract its same-origin links.
///
/// The response must pass the gate with an explicit `text/html` content type;
/// anything else yields an empty list. Links resolve against the response's
/// final URL so a redirected root still produces correctly-scoped results.
pub async fn fetch_root_links(
    client: &Client,
    url: &str,
    skip_extensions: &[String],
    limit: usize,
) -> Vec<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Fallback fetch failed for {url}: {e}");
            return Vec::new();
        }
    };

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let gate = should_analyze(Some(status), content_type.as_deref());
    let is_html = content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    if !gate.ok || !is_html {
        debug!(
            "Fallback fetch of {url} not usable (status {status}, content-type {:?})",
            content_type
        );
        return Vec::new();
    }

    let final_url = response.url().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Fallback body read failed for {url}: {e}");
            return Vec::new();
        }
    };

    extract_links(&final_url, &body, skip_extensions, limit)
}
