//! Accessor methods for `ScanConfig`.

use std::path::Path;
use std::time::Duration;

use super::types::{BrowserEngine, ColorScheme, ScanConfig, ScanMode, ViewportProfile};
use crate::sampler::{SampleConfig, SampleStrategy, resolve_sample_seed};

impl ScanConfig {
    #[must_use]
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn viewport_profile(&self) -> ViewportProfile {
        self.viewport_profile
    }

    #[must_use]
    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme
    }

    #[must_use]
    pub fn browser_engine(&self) -> BrowserEngine {
        self.browser_engine
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn sample_strategy(&self) -> SampleStrategy {
        self.sample_strategy
    }

    #[must_use]
    pub fn sample_seed(&self) -> Option<&str> {
        self.sample_seed.as_deref()
    }

    #[must_use]
    pub fn skip_extensions(&self) -> &[String] {
        &self.skip_extensions
    }

    #[must_use]
    pub fn sitemap_fallback_to_crawl(&self) -> bool {
        self.sitemap_fallback_to_crawl
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn audit_script(&self) -> &Path {
        &self.audit_script
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Sampling parameters for a specific discovery target.
    ///
    /// The seed chain is explicit seed, then label, then base URL, then the
    /// target's hostname, so repeat scans of one site stay comparable.
    #[must_use]
    pub fn sample_config(&self, target: Option<&url::Url>) -> SampleConfig {
        SampleConfig {
            max_pages: self.max_pages,
            strategy: self.sample_strategy,
            seed: resolve_sample_seed(
                self.sample_seed.as_deref(),
                self.label.as_deref(),
                self.base_url.as_deref(),
                target,
            ),
        }
    }
}
