//! Environment-driven scan binary.
//!
//! Configuration arrives as `INPUT_*` environment variables (the CI
//! contract), with a `targets.txt` fallback for manual runs. The process
//! writes one run directory (results + summary JSON) and exits; scheduling
//! across sites lives outside this binary.

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use a11y_scan::config::{BrowserEngine, ColorScheme, ScanConfig, ScanMode, ViewportProfile};
use a11y_scan::report::{RunReport, build_run_id, format_timestamp, write_run};
use a11y_scan::sampler::SampleStrategy;
use a11y_scan::url_policy::parse_skip_extensions;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_string(key).as_deref().map(str::trim) {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

/// Manual-run fallback: one URL per line, `#` starts a comment.
fn read_targets_file() -> Vec<String> {
    match std::fs::read_to_string("targets.txt") {
        Ok(contents) => {
            info!("Reading URLs from targets.txt");
            contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect()
        }
        Err(_) => Vec::new(),
    }
}

fn config_from_env() -> Result<Option<ScanConfig>> {
    let mut urls: Vec<String> = env_string("INPUT_URLS")
        .map(|raw| {
            raw.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let base_url = env_string("INPUT_BASE_URL");

    if urls.is_empty() && base_url.is_none() {
        urls = read_targets_file();
    }
    if urls.is_empty()
        && base_url.is_none()
        && let Some(arg) = std::env::args().nth(1)
    {
        urls.push(arg);
    }
    if urls.is_empty() && base_url.is_none() {
        return Ok(None);
    }

    let mut builder = ScanConfig::builder()
        .mode(ScanMode::parse(
            &env_string("INPUT_MODE").unwrap_or_default(),
        ))
        .urls(urls)
        .max_pages(env_parse("INPUT_MAX_PAGES", 50usize))
        .timeout_ms(env_parse("INPUT_TIMEOUT_MS", 30_000u64))
        .concurrency(env_parse("INPUT_CONCURRENCY", 2usize))
        .viewport_profile(ViewportProfile::parse(
            &env_string("INPUT_VIEWPORT").unwrap_or_default(),
        ))
        .color_scheme(ColorScheme::parse(
            &env_string("INPUT_COLOR_SCHEME").unwrap_or_default(),
        ))
        .browser_engine(BrowserEngine::parse(
            &env_string("INPUT_BROWSER").unwrap_or_default(),
        ))
        .sample_strategy(SampleStrategy::parse(
            &env_string("INPUT_SITEMAP_SAMPLE_STRATEGY").unwrap_or_default(),
        ))
        .sitemap_fallback_to_crawl(env_bool("INPUT_SITEMAP_FALLBACK_TO_CRAWL", true));

    if let Some(base) = base_url {
        builder = builder.base_url(base);
    }
    if let Some(label) = env_string("INPUT_LABEL") {
        builder = builder.label(label);
    }
    if let Some(agent) = env_string("INPUT_USER_AGENT") {
        builder = builder.user_agent(agent);
    }
    if let Some(seed) = env_string("INPUT_SITEMAP_SAMPLE_SEED") {
        builder = builder.sample_seed(seed);
    }
    if let Some(extensions) = env_string("INPUT_SKIP_EXTENSIONS") {
        builder = builder.skip_extensions(parse_skip_extensions(&extensions));
    }
    if let Some(script) = env_string("INPUT_AUDIT_SCRIPT") {
        builder = builder.audit_script(script);
    }
    if let Some(dir) = env_string("INPUT_OUTPUT_DIR") {
        builder = builder.output_dir(dir);
    }

    builder.build().map(Some)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Some(config) = config_from_env()? else {
        eprintln!(
            "No URLs provided. Set INPUT_URLS or INPUT_BASE_URL, add targets.txt, or pass a URL argument."
        );
        return Ok(());
    };

    info!(
        "Starting scan: mode={:?}, max_pages={}, concurrency={}, label={}",
        config.mode(),
        config.max_pages(),
        config.concurrency(),
        config.label().unwrap_or("none")
    );

    let started_at = Utc::now();
    let run_id = build_run_id(config.label(), started_at);

    let mut targets: Vec<String> = Vec::new();
    if let Some(base) = config.base_url() {
        targets.push(base.to_string());
    }
    targets.extend(config.urls().iter().cloned());

    let results = a11y_scan::run(config.clone()).await?;
    let finished_at = Utc::now();

    let report = RunReport {
        run_id: run_id.clone(),
        label: config.label().map(str::to_string),
        started_at: format_timestamp(started_at),
        finished_at: format_timestamp(finished_at),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        config: config.clone(),
        targets,
        results_by_url: results,
    };

    let run_dir = write_run(config.output_dir(), &report)
        .await
        .context("failed to persist run results")?;

    println!(
        "Run {run_id} complete: {} pages scanned, results in {}",
        report.results_by_url.len(),
        run_dir.display()
    );
    Ok(())
}
