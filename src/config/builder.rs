//! Fluent builder for `ScanConfig`.
//!
//! Validation happens in `build()`: a run needs at least one target (a base
//! URL or a non-empty URL list), the page budget is clamped to its supported
//! range, and zero concurrency is bumped to one.

use anyhow::{Result, anyhow};
use std::path::PathBuf;

use super::types::{BrowserEngine, ColorScheme, ScanConfig, ScanMode, ViewportProfile};
use crate::sampler::SampleStrategy;

/// Page budgets outside this range are clamped, not rejected.
pub const MAX_PAGES_CEILING: usize = 200;

#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfig {
    /// Create a builder with defaults matching a plain sitemap scan.
    #[must_use]
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }
}

impl ScanConfigBuilder {
    #[must_use]
    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use]
    pub fn urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.config.base_url = (!base_url.trim().is_empty()).then_some(base_url);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.config.label = (!label.trim().is_empty()).then_some(label);
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn viewport_profile(mut self, profile: ViewportProfile) -> Self {
        self.config.viewport_profile = profile;
        self
    }

    #[must_use]
    pub fn color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.config.color_scheme = scheme;
        self
    }

    #[must_use]
    pub fn browser_engine(mut self, engine: BrowserEngine) -> Self {
        self.config.browser_engine = engine;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn sample_strategy(mut self, strategy: SampleStrategy) -> Self {
        self.config.sample_strategy = strategy;
        self
    }

    #[must_use]
    pub fn sample_seed(mut self, seed: impl Into<String>) -> Self {
        let seed = seed.into();
        self.config.sample_seed = (!seed.trim().is_empty()).then_some(seed);
        self
    }

    #[must_use]
    pub fn skip_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.skip_extensions = extensions;
        self
    }

    #[must_use]
    pub fn sitemap_fallback_to_crawl(mut self, enabled: bool) -> Self {
        self.config.sitemap_fallback_to_crawl = enabled;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn audit_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.audit_script = path.into();
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Validate and produce the final `ScanConfig`.
    ///
    /// # Errors
    ///
    /// Fails when no target is configured (no base URL and an empty URL list).
    pub fn build(mut self) -> Result<ScanConfig> {
        self.config.urls.retain(|u| !u.trim().is_empty());

        if self.config.base_url.is_none() && self.config.urls.is_empty() {
            return Err(anyhow!(
                "scan needs a target: set a base URL or provide a URL list"
            ));
        }

        self.config.max_pages = self.config.max_pages.clamp(1, MAX_PAGES_CEILING);
        self.config.concurrency = self.config.concurrency.max(1);
        if self.config.skip_extensions.is_empty() {
            self.config.skip_extensions = crate::url_policy::DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect();
        }

        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_a_target() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(
            ScanConfig::builder()
                .base_url("https://example.com")
                .build()
                .is_ok()
        );
        assert!(
            ScanConfig::builder()
                .urls(["https://example.com/a"])
                .build()
                .is_ok()
        );
    }

    #[test]
    fn max_pages_is_clamped_to_supported_range() {
        let low = ScanConfig::builder()
            .base_url("https://example.com")
            .max_pages(0)
            .build()
            .unwrap();
        assert_eq!(low.max_pages(), 1);

        let high = ScanConfig::builder()
            .base_url("https://example.com")
            .max_pages(10_000)
            .build()
            .unwrap();
        assert_eq!(high.max_pages(), MAX_PAGES_CEILING);
    }

    #[test]
    fn whitespace_only_urls_are_dropped() {
        let config = ScanConfig::builder()
            .urls(["https://example.com/a", "  ", ""])
            .build()
            .unwrap();
        assert_eq!(config.urls(), &["https://example.com/a".to_string()]);
    }

    #[test]
    fn zero_concurrency_is_bumped_to_one() {
        let config = ScanConfig::builder()
            .base_url("https://example.com")
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(config.concurrency(), 1);
    }
}
