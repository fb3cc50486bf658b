//! Accessibility site scanner.
//!
//! Discovers a bounded, reproducible set of pages for a site (sitemap
//! expansion with deterministic sampling, or crawl fallback), then drains
//! them through a capped-concurrency pipeline that drives a browser-based
//! accessibility rule engine against each page.

pub mod browser;
pub mod config;
pub mod discovery;
pub mod report;
pub mod sampler;
pub mod scan;
pub mod url_policy;

use anyhow::Result;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use browser::{ChromiumAuditor, launch_browser, shutdown_browser};
pub use config::{BrowserEngine, ColorScheme, ScanConfig, ScanMode, ViewportProfile};
pub use discovery::{Discovery, discover, http_client};
pub use report::{RunReport, RunSummary, build_run_id, write_run};
pub use sampler::{SampleConfig, SampleStrategy, sample};
pub use scan::{
    AuditReport, PageAuditor, PageOutcome, PageResult, PageSession, ScanError, run_scan,
    should_allow_discovery, should_analyze,
};

/// Run a complete scan: discovery, browser launch, queue drain, shutdown.
///
/// Returns the per-page results keyed by final URL. Only browser launch and
/// audit-script loading can fail here; per-page problems are recorded in the
/// results and never abort the run.
pub async fn run(config: ScanConfig) -> Result<BTreeMap<String, PageResult>> {
    let client = discovery::http_client(&config)?;
    let discovered = discovery::discover(&client, &config).await;

    if discovered.queue.is_empty() {
        warn!("Discovery produced no scannable URLs");
        return Ok(BTreeMap::new());
    }
    info!(
        "Discovery complete: {} seed URLs (fallback engaged: {})",
        discovered.queue.len(),
        discovered.fallback_engaged
    );

    let allow_discovery = should_allow_discovery(config.mode(), discovered.fallback_engaged);

    let (launched, handler_task) = browser::launch_browser(&config).await?;
    let shared = Arc::new(launched);
    let auditor = ChromiumAuditor::new(Arc::clone(&shared), config.clone()).await?;

    let results = run_scan(&auditor, &config, discovered.queue, allow_discovery).await;

    drop(auditor);
    match Arc::try_unwrap(shared) {
        Ok(owned) => shutdown_browser(owned, handler_task).await,
        Err(_) => {
            warn!("Browser still referenced at shutdown; aborting handler task only");
            handler_task.abort();
        }
    }

    Ok(results)
}
