//! Core configuration types for accessibility scanning.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sampler::SampleStrategy;

/// How the scan queue gets seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Expand a sitemap (or probe `<origin>/sitemap.xml`), with optional
    /// crawl fallback when no sitemap exists.
    Sitemap,
    /// Seed with the targets themselves and follow same-origin links live.
    Crawl,
    /// Scan exactly the configured URLs.
    List,
}

impl ScanMode {
    /// Parse a mode name, defaulting to sitemap for unknown input.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "crawl" => Self::Crawl,
            "list" => Self::List,
            _ => Self::Sitemap,
        }
    }
}

/// Viewport emulation profile applied to every scanned page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportProfile {
    Desktop,
    Mobile,
}

impl ViewportProfile {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mobile" => Self::Mobile,
            _ => Self::Desktop,
        }
    }

    /// Emulated (width, height, is_mobile) for this profile.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32, bool) {
        match self {
            Self::Desktop => (1280, 720, false),
            Self::Mobile => (375, 667, true),
        }
    }
}

/// `prefers-color-scheme` emulation applied to every scanned page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }

    #[must_use]
    pub const fn media_feature_value(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Requested browser engine.
///
/// The bundled backend drives Chromium over CDP; firefox/webkit are accepted
/// for configuration compatibility and logged as unsupported at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firefox" => Self::Firefox,
            "webkit" => Self::Webkit,
            _ => Self::Chromium,
        }
    }
}

/// Main configuration for a scan run. Built once, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub(crate) mode: ScanMode,
    pub(crate) urls: Vec<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) label: Option<String>,

    /// Hard page budget for the run.
    ///
    /// **INVARIANT:** clamped to `1..=200` by the builder; the orchestrator
    /// relies on this being at least 1.
    pub(crate) max_pages: usize,
    pub(crate) timeout_ms: u64,
    pub(crate) concurrency: usize,

    pub(crate) user_agent: String,
    pub(crate) viewport_profile: ViewportProfile,
    pub(crate) color_scheme: ColorScheme,
    pub(crate) browser_engine: BrowserEngine,
    pub(crate) headless: bool,

    pub(crate) sample_strategy: SampleStrategy,
    pub(crate) sample_seed: Option<String>,
    pub(crate) skip_extensions: Vec<String>,
    pub(crate) sitemap_fallback_to_crawl: bool,

    /// Timeout for raw sitemap/HTML fetches (the browser has its own
    /// per-page timeout).
    pub(crate) fetch_timeout_secs: u64,

    /// Accessibility rule script injected into every audited page.
    pub(crate) audit_script: PathBuf,
    pub(crate) output_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Sitemap,
            urls: Vec::new(),
            base_url: None,
            label: None,
            max_pages: 50,
            timeout_ms: 30_000,
            concurrency: 2,
            user_agent: concat!("a11y-scan/", env!("CARGO_PKG_VERSION")).to_string(),
            viewport_profile: ViewportProfile::Desktop,
            color_scheme: ColorScheme::Light,
            browser_engine: BrowserEngine::Chromium,
            headless: true,
            sample_strategy: SampleStrategy::Shuffle,
            sample_seed: None,
            skip_extensions: crate::url_policy::DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            sitemap_fallback_to_crawl: true,
            fetch_timeout_secs: 15,
            audit_script: PathBuf::from("assets/axe.min.js"),
            output_dir: PathBuf::from("site"),
        }
    }
}
