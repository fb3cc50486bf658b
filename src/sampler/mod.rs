//! Deterministic candidate sampling.
//!
//! Repeat scans of a site must audit a comparable page set, so the shuffle is
//! driven by a seed derived from the site's stable identity rather than the
//! wall clock. The generator is a 32-bit add-xorshift-multiply design with
//! full avalanche, seeded from the seed string via a polynomial rolling hash.

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the candidate list is reduced to the page budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStrategy {
    /// Seeded Fisher-Yates shuffle, then take the first N.
    #[default]
    Shuffle,
    /// First N in sitemap order, favoring declared priority.
    Sequential,
}

impl SampleStrategy {
    /// Lenient parse; anything unrecognized falls back to shuffle.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sequential" => Self::Sequential,
            _ => Self::Shuffle,
        }
    }
}

/// Sampling parameters, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub max_pages: usize,
    pub strategy: SampleStrategy,
    pub seed: String,
}

/// Reduce `urls` to at most `max_pages` entries per the configured strategy.
///
/// Pure: identical `(urls, strategy, seed)` always yields identical output.
#[must_use]
pub fn sample(urls: &[String], config: &SampleConfig) -> Vec<String> {
    let take = config.max_pages.min(urls.len());
    match config.strategy {
        SampleStrategy::Sequential => urls[..take].to_vec(),
        SampleStrategy::Shuffle => {
            let mut shuffled = urls.to_vec();
            let mut rng = SeededRng::new(hash_seed(&config.seed));
            // Fisher-Yates, back to front.
            for i in (1..shuffled.len()).rev() {
                let j = rng.next_below(i + 1);
                shuffled.swap(i, j);
            }
            debug!(
                "Sampled {take} of {} URLs (seed {:?})",
                urls.len(),
                config.seed
            );
            shuffled.truncate(take);
            shuffled
        }
    }
}

/// Pick the effective sample seed: explicit seed, then run label, then base
/// URL, then the target's hostname, with a fixed fallback so sampling is
/// deterministic even for anonymous runs.
#[must_use]
pub fn resolve_sample_seed(
    provided: Option<&str>,
    label: Option<&str>,
    base_url: Option<&str>,
    target: Option<&Url>,
) -> String {
    if let Some(seed) = provided
        && !seed.trim().is_empty()
    {
        return seed.trim().to_string();
    }
    if let Some(label) = label
        && !label.trim().is_empty()
    {
        return label.trim().to_string();
    }
    if let Some(base) = base_url
        && !base.trim().is_empty()
    {
        return base.trim().to_string();
    }
    if let Some(host) = target.and_then(Url::host_str) {
        return host.to_string();
    }
    "sitemap".to_string()
}

/// Polynomial rolling hash of the seed string, multiplier 31, wrapping.
#[must_use]
pub fn hash_seed(seed: &str) -> u32 {
    let mut hash = 0u32;
    for byte in seed.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
    }
    hash
}

/// 32-bit add-xorshift-multiply generator (mulberry32).
struct SeededRng {
    state: u32,
}

impl SeededRng {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        z ^ (z >> 14)
    }

    /// Uniform-enough index in `0..bound`; bound is always small here.
    fn next_below(&mut self, bound: usize) -> usize {
        (self.next_u32() as usize) % bound
    }
}
