//! Response gate: decides whether a navigated page is worth auditing and
//! whether a run may discover new links at all.

use crate::config::ScanMode;

/// Verdict on a navigated response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub ok: bool,
    pub reason: Option<String>,
}

impl GateDecision {
    fn allow() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

/// Gate a navigated response on status and content type.
///
/// Error statuses and non-HTML content types are rejected with a reason
/// string. A missing or empty content type is allowed (fail-open): pages that
/// decline to report a type are still audited.
#[must_use]
pub fn should_analyze(status: Option<u16>, content_type: Option<&str>) -> GateDecision {
    if let Some(status) = status
        && status >= 400
    {
        return GateDecision::reject(format!("HTTP {status}"));
    }

    if let Some(content_type) = content_type
        && !content_type.trim().is_empty()
        && !content_type.to_ascii_lowercase().contains("text/html")
    {
        return GateDecision::reject(format!("skipped non-html content ({content_type})"));
    }

    GateDecision::allow()
}

/// Whether rendered pages may feed newly discovered links back into the
/// queue: always in crawl mode, in sitemap mode only once the crawl fallback
/// has engaged, never in list mode.
#[must_use]
pub fn should_allow_discovery(mode: ScanMode, fallback_engaged: bool) -> bool {
    match mode {
        ScanMode::Crawl => true,
        ScanMode::Sitemap => fallback_engaged,
        ScanMode::List => false,
    }
}
