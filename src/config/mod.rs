//! Scan configuration.
//!
//! `ScanConfig` aggregates everything a run needs: target mode and URLs, the
//! page budget, concurrency and timeouts, the browser profile, and the
//! sampling strategy. It is read at process start and never mutated.

mod builder;
mod getters;
mod types;

pub use builder::ScanConfigBuilder;
pub use types::{BrowserEngine, ColorScheme, ScanConfig, ScanMode, ViewportProfile};
