//! Chromium-backed page auditor.
//!
//! Finds or downloads a Chromium build, drives it over CDP, and implements
//! the `PageAuditor` seam: navigation with response observation, viewport and
//! color-scheme emulation, rule-engine injection, and live-DOM link
//! harvesting. The accessibility rules themselves come from a user-supplied
//! script (axe-core compatible); this module transports its verdicts without
//! interpreting them.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventResponseReceived,
};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::config::{BrowserEngine, ScanConfig};
use crate::scan::auditor::{PageAuditor, PageSession};
use crate::scan::types::{AuditReport, ScanError};

/// Collect anchor hrefs from the live DOM, already absolutized by the
/// browser. Catches script-generated links a static fetch never sees.
const LINKS_SCRIPT: &str =
    "Array.from(document.querySelectorAll('a[href]')).map(a => a.href)";

/// Run the injected rule engine and strip its verdicts down to the three
/// result buckets the scanner transports.
const AUDIT_RUNNER_SCRIPT: &str = r"
(() => new Promise((resolve, reject) => {
    if (!window.axe || typeof window.axe.run !== 'function') {
        reject(new Error('audit engine not present on page'));
        return;
    }
    window.axe.run(document, (err, results) => {
        if (err) { reject(err); return; }
        resolve({
            violations: results.violations,
            passes: results.passes,
            incomplete: results.incomplete,
        });
    });
}))()
";

/// How long to keep draining response events after navigation settles.
const RESPONSE_EVENT_GRACE: Duration = Duration::from_millis(250);

/// Locate a Chromium executable: `CHROMIUM_PATH` override first, then common
/// install locations, then `which` on Unix.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser via 'which': {found}");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium build into the user cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("a11y-scan")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir).context("failed to create browser cache directory")?;

    info!("Downloading managed Chromium to {}", cache_dir.display());
    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("failed to fetch browser")?;

    Ok(revision.executable_path)
}

/// Launch the scan browser and spawn the task that drives its CDP connection.
///
/// The handler task must outlive the browser; shut down with
/// `shutdown_browser` so the close handshake happens before the connection
/// drops.
pub async fn launch_browser(config: &ScanConfig) -> Result<(Browser, JoinHandle<()>)> {
    if config.browser_engine() != BrowserEngine::Chromium {
        warn!(
            "Browser engine {:?} is not supported by the CDP backend; using chromium",
            config.browser_engine()
        );
    }

    let executable = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let user_data_dir =
        std::env::temp_dir().join(format!("a11y_scan_chrome_{}", std::process::id()));
    std::fs::create_dir_all(&user_data_dir).context("failed to create user data directory")?;

    let (width, height, _) = config.viewport_profile().dimensions();
    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(width, height)
        .user_data_dir(user_data_dir)
        .chrome_executable(executable)
        .arg(format!("--user-agent={}", config.user_agent()))
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-background-networking")
        .arg("--disable-extensions")
        .arg("--disable-notifications")
        .arg("--hide-scrollbars")
        .arg("--mute-audio");

    builder = if config.headless() {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(e) = result {
                let msg = e.to_string();
                // Chrome emits CDP events chromiumoxide doesn't model; those
                // deserialization misses are noise, not faults.
                let benign = msg.contains("data did not match any variant of untagged enum Message")
                    || msg.contains("Failed to deserialize WS response");
                if benign {
                    trace!("Suppressed benign CDP deserialization error: {msg}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        debug!("Browser handler task completed");
    });

    Ok((browser, handler_task))
}

/// Close the browser, then stop the handler task.
///
/// Order matters: the close handshake needs the CDP connection the handler
/// task is driving, so the task is aborted only after the browser is down.
pub async fn shutdown_browser(mut browser: Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!("Browser close failed: {e}");
    }
    if let Err(e) = browser.wait().await {
        warn!("Browser wait failed: {e}");
    }
    handler_task.abort();
    if let Err(e) = handler_task.await
        && !e.is_cancelled()
    {
        warn!("Handler task failed during abort: {e}");
    }
}

/// `PageAuditor` backed by a shared Chromium instance.
///
/// All concurrently-scanning tasks in a batch share the one browser; each
/// navigation opens its own page.
pub struct ChromiumAuditor {
    browser: Arc<Browser>,
    config: ScanConfig,
    audit_source: Arc<str>,
}

impl ChromiumAuditor {
    /// Wrap a launched browser, loading the audit rule script from the
    /// configured path.
    pub async fn new(browser: Arc<Browser>, config: ScanConfig) -> Result<Self, ScanError> {
        let audit_source = tokio::fs::read_to_string(config.audit_script())
            .await
            .map_err(|e| {
                ScanError::Config(format!(
                    "cannot read audit script {}: {e}",
                    config.audit_script().display()
                ))
            })?;

        Ok(Self {
            browser,
            config,
            audit_source: Arc::from(audit_source),
        })
    }

    async fn apply_emulation(&self, page: &Page) -> Result<(), ScanError> {
        let (width, height, mobile) = self.config.viewport_profile().dimensions();
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(mobile)
            .build()
            .map_err(ScanError::Browser)?;
        page.execute(metrics)
            .await
            .map_err(|e| ScanError::Browser(format!("viewport emulation failed: {e}")))?;

        let media = SetEmulatedMediaParams::builder()
            .feature(MediaFeature {
                name: "prefers-color-scheme".to_string(),
                value: self.config.color_scheme().media_feature_value().to_string(),
            })
            .build();
        page.execute(media)
            .await
            .map_err(|e| ScanError::Browser(format!("color-scheme emulation failed: {e}")))?;

        Ok(())
    }
}

impl PageAuditor for ChromiumAuditor {
    type Session = ChromiumSession;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<Self::Session, ScanError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScanError::Browser(format!("failed to create page: {e}")))?;

        if let Err(e) = self.apply_emulation(&page).await {
            page.close().await.ok();
            return Err(e);
        }

        if let Err(e) = page.execute(NetworkEnableParams::default()).await {
            page.close().await.ok();
            return Err(ScanError::Browser(format!(
                "failed to enable network events: {e}"
            )));
        }

        let mut responses = match page.event_listener::<EventResponseReceived>().await {
            Ok(stream) => stream,
            Err(e) => {
                page.close().await.ok();
                return Err(ScanError::Browser(format!(
                    "failed to listen for responses: {e}"
                )));
            }
        };

        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| ScanError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| ScanError::Navigation(e.to_string()))?;
            Ok::<(), ScanError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                page.close().await.ok();
                return Err(e);
            }
            Err(_) => {
                page.close().await.ok();
                return Err(ScanError::Navigation(format!(
                    "navigation timeout after {}ms",
                    timeout.as_millis()
                )));
            }
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        // Drain whatever response events arrived during navigation and keep
        // the one for the document itself; redirect hops answer for other
        // URLs and get discarded by the match below.
        let mut status = None;
        let mut content_type = None;
        while let Ok(Some(event)) =
            tokio::time::timeout(RESPONSE_EVENT_GRACE, responses.next()).await
        {
            let response = &event.response;
            if response.url == final_url || response.url == url {
                status = u16::try_from(response.status).ok();
                let headers = serde_json::to_value(&response.headers)
                    .unwrap_or(serde_json::Value::Null);
                content_type = header_value(&headers, "content-type")
                    .or_else(|| (!response.mime_type.is_empty()).then(|| response.mime_type.clone()));
            }
        }

        Ok(ChromiumSession {
            page,
            final_url,
            status,
            content_type,
            audit_source: Arc::clone(&self.audit_source),
        })
    }
}

/// Case-insensitive header lookup in a CDP header map.
fn header_value(headers: &serde_json::Value, name: &str) -> Option<String> {
    let map = headers.as_object()?;
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.as_str())
        .map(str::to_string)
}

/// One navigated browser page.
pub struct ChromiumSession {
    page: Page,
    final_url: String,
    status: Option<u16>,
    content_type: Option<String>,
    audit_source: Arc<str>,
}

impl PageSession for ChromiumSession {
    fn final_url(&self) -> &str {
        &self.final_url
    }

    fn status(&self) -> Option<u16> {
        self.status
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn title(&self) -> Result<String, ScanError> {
        self.page
            .get_title()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| ScanError::Browser(format!("failed to read title: {e}")))
    }

    async fn run_audit(&self) -> Result<AuditReport, ScanError> {
        self.page
            .evaluate(self.audit_source.as_ref())
            .await
            .map_err(|e| ScanError::Browser(format!("audit script injection failed: {e}")))?;

        let result = self
            .page
            .evaluate(AUDIT_RUNNER_SCRIPT)
            .await
            .map_err(|e| ScanError::Browser(format!("audit execution failed: {e}")))?;

        let value: serde_json::Value = result
            .into_value()
            .map_err(|e| ScanError::Browser(format!("audit returned no value: {e}")))?;
        serde_json::from_value(value)
            .map_err(|e| ScanError::Browser(format!("failed to parse audit results: {e}")))
    }

    async fn page_links(&self) -> Result<Vec<String>, ScanError> {
        let result = self
            .page
            .evaluate(LINKS_SCRIPT)
            .await
            .map_err(|e| ScanError::Browser(format!("link extraction failed: {e}")))?;

        let value: serde_json::Value = result
            .into_value()
            .map_err(|e| ScanError::Browser(format!("link extraction returned no value: {e}")))?;
        serde_json::from_value(value)
            .map_err(|e| ScanError::Browser(format!("failed to parse links: {e}")))
    }

    async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Page close failed for {}: {e}", self.final_url);
        }
    }
}
