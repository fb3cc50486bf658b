//! URL normalization and classification shared by discovery and scanning.
//!
//! Every URL that enters the scan queue passes through here: normalization
//! makes bare hostnames usable, the HTML-likeness check keeps binary assets
//! out of the browser, and the origin check fences discovery to one site.

use url::Url;

/// Path extensions that are never worth rendering in a browser.
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "gz", "tar", "rar", "7z", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "jpg",
    "jpeg", "png", "gif", "webp", "svg", "ico", "mp3", "mp4", "avi", "mov", "wmv", "webm", "css",
    "js", "json", "xml", "rss", "atom", "txt", "csv", "woff", "woff2", "ttf", "eot", "exe", "dmg",
    "apk",
];

/// Parse a comma-separated extension list, lowercased, with dots and blanks
/// dropped.
#[must_use]
pub fn parse_skip_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Normalize a raw target into an absolute URL string.
///
/// Bare hostnames get an `https://` scheme; whitespace is trimmed; anything
/// that still fails to parse yields `None` so callers can skip it with a
/// warning instead of scanning garbage.
#[must_use]
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    Url::parse(&candidate).ok().map(|url| url.to_string())
}

/// Decide whether a URL plausibly serves an HTML document.
///
/// Extension-free paths pass. A known skip extension rejects, as does a path
/// whose last segment merely *ends* in `pdf` without a dot, which catches
/// rewritten document links like `/annual-report-pdf`.
#[must_use]
pub fn is_likely_html_url(url: &str, skip_extensions: &[String]) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    let path = path.trim_end_matches('/');

    let Some(segment) = path.rsplit('/').next() else {
        return true;
    };

    if let Some((_, extension)) = segment.rsplit_once('.') {
        let extension = extension.to_ascii_lowercase();
        if extension == "html" || extension == "htm" {
            return true;
        }
        // PDFs are documents regardless of what the skip list says.
        if extension == "pdf" {
            return false;
        }
        return !skip_extensions.iter().any(|skip| *skip == extension);
    }

    // No extension at all, but a bare "pdf" suffix is still a document link.
    !segment.ends_with("pdf")
}

/// Drop the fragment from a URL string, leaving everything else untouched.
#[must_use]
pub fn strip_fragment(url: &str) -> String {
    match url.split_once('#') {
        Some((before, _)) => before.to_string(),
        None => url.to_string(),
    }
}

/// Same scheme, host, and effective port.
#[must_use]
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
