//! Bounded-concurrency scan orchestration.
//!
//! Drains the discovered queue in strictly sequential batches of up to
//! `concurrency` pages, dedupes by final URL, enforces the page cap, and
//! absorbs links discovered live during scanning.
//!
//! Concurrency model: visited-checks, cap claims, and queue mutation all
//! happen in this (sequential) drain loop, at batch formation and merge time.
//! The concurrent tasks only perform I/O and return their discoveries as
//! values, so no shared container is ever mutated from two tasks at once.
//! Links found mid-batch become visible to the *next* batch formation, never
//! to the batch that found them.

use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet, VecDeque};
use url::Url;

use super::auditor::{PageAuditor, PageSession};
use super::gate::should_analyze;
use super::types::{PageOutcome, PageResult};
use crate::config::ScanConfig;
use crate::url_policy::{is_likely_html_url, same_origin, strip_fragment};

/// What one scan task hands back to the drain loop.
struct TaskOutput {
    original_url: String,
    final_url: String,
    outcome: PageOutcome,
    discovered: Vec<String>,
}

/// Drain `seed_urls` through the auditor, returning results keyed by final URL.
///
/// Guarantees: the result map never exceeds `max_pages` entries regardless of
/// how many links discovery injects; batch *k*+1 never starts before batch
/// *k* fully settles; no single page failure aborts the run.
pub async fn run_scan<A: PageAuditor>(
    auditor: &A,
    config: &ScanConfig,
    seed_urls: Vec<String>,
    allow_discovery: bool,
) -> BTreeMap<String, PageResult> {
    let max_pages = config.max_pages();
    let concurrency = config.concurrency();

    let mut queue: VecDeque<String> = seed_urls.into_iter().collect();
    let mut visited: HashSet<String> = HashSet::new();
    let mut results: BTreeMap<String, PageResult> = BTreeMap::new();
    let mut processed = 0usize;

    while !queue.is_empty() && processed < max_pages {
        // Batch formation: claim a cap slot and mark visited before anything
        // runs, so a URL enters Visited at most once.
        let mut batch = Vec::with_capacity(concurrency);
        while batch.len() < concurrency && processed < max_pages {
            let Some(url) = queue.pop_front() else { break };
            if visited.contains(&url) {
                continue;
            }
            visited.insert(url.clone());
            processed += 1;
            info!("Scanning [{processed}/{max_pages}] {url}");
            batch.push(url);
        }

        if batch.is_empty() {
            continue;
        }

        let outputs = join_all(
            batch
                .into_iter()
                .map(|url| scan_one(auditor, config, url, allow_discovery)),
        )
        .await;

        // Sequential merge: redirect dedup and live-discovery absorption.
        for output in outputs {
            if output.final_url != output.original_url {
                visited.insert(output.final_url.clone());
            }

            match results.get_mut(&output.final_url) {
                Some(existing) => {
                    // A second input URL redirected onto an already-scanned
                    // page; record the provenance, keep the first scan.
                    debug!(
                        "{} already scanned (via {}), merging source",
                        output.final_url, output.original_url
                    );
                    if existing.original_url != output.original_url
                        && !existing.sources.contains(&output.original_url)
                    {
                        existing.sources.push(output.original_url);
                    }
                }
                None => {
                    let sources = if output.final_url == output.original_url {
                        Vec::new()
                    } else {
                        vec![output.original_url.clone()]
                    };
                    results.insert(
                        output.final_url.clone(),
                        PageResult {
                            url: output.final_url,
                            original_url: output.original_url,
                            sources,
                            outcome: output.outcome,
                        },
                    );
                }
            }

            for link in output.discovered {
                if !visited.contains(&link) && !queue.contains(&link) {
                    queue.push_back(link);
                }
            }
        }
    }

    results
}

/// Scan a single URL: navigate, gate, audit, harvest links. Never propagates
/// an error; every path yields a `TaskOutput`.
async fn scan_one<A: PageAuditor>(
    auditor: &A,
    config: &ScanConfig,
    url: String,
    allow_discovery: bool,
) -> TaskOutput {
    let session = match auditor.navigate(&url, config.page_timeout()).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Navigation failed for {url}: {e}");
            return TaskOutput {
                final_url: url.clone(),
                original_url: url,
                outcome: PageOutcome::Failed {
                    error: e.to_string(),
                },
                discovered: Vec::new(),
            };
        }
    };

    let final_url = strip_fragment(session.final_url());
    let status = session.status();
    let content_type = session.content_type().map(str::to_string);

    let gate = should_analyze(status, content_type.as_deref());
    if !gate.ok {
        let reason = gate.reason.unwrap_or_else(|| "rejected".to_string());
        debug!("Gate rejected {final_url}: {reason}");
        session.close().await;
        return TaskOutput {
            original_url: url,
            final_url,
            outcome: PageOutcome::Skipped {
                reason,
                status,
                content_type,
            },
            discovered: Vec::new(),
        };
    }

    let title = match session.title().await {
        Ok(title) => title,
        Err(e) => {
            warn!("Failed to read title of {final_url}: {e}");
            String::new()
        }
    };

    let outcome = match session.run_audit().await {
        Ok(report) => PageOutcome::Audited {
            title,
            status,
            content_type,
            violations: report.violations,
            passes: report.passes,
            incomplete: report.incomplete,
        },
        Err(e) => {
            warn!("Audit failed for {final_url}: {e}");
            PageOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    let discovered = if allow_discovery {
        match session.page_links().await {
            Ok(links) => filter_discovered_links(&final_url, links, config.skip_extensions()),
            Err(e) => {
                warn!("Link discovery failed on {final_url}: {e}");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    session.close().await;

    TaskOutput {
        original_url: url,
        final_url,
        outcome,
        discovered,
    }
}

/// Keep only same-origin, HTML-like links, fragment-stripped and deduped.
fn filter_discovered_links(
    page_url: &str,
    links: Vec<String>,
    skip_extensions: &[String],
) -> Vec<String> {
    let Ok(origin) = Url::parse(page_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for link in links {
        let Ok(mut resolved) = origin.join(link.trim()) else {
            continue;
        };
        resolved.set_fragment(None);
        if !same_origin(&origin, &resolved) {
            continue;
        }
        let normalized = resolved.to_string();
        if !is_likely_html_url(&normalized, skip_extensions) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}
