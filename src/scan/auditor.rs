//! The seam between the orchestrator and the browser collaborator.
//!
//! The orchestrator is generic over `PageAuditor`, so tests drive it with an
//! in-memory implementation while production uses the chromiumoxide backend.

use std::time::Duration;

use super::types::{AuditReport, ScanError};

/// Opens pages. One auditor is shared by every task in a batch; each
/// navigation gets its own session (its own browser page).
pub trait PageAuditor: Send + Sync {
    type Session: PageSession;

    /// Navigate to `url`, resolving redirects, within `timeout`.
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Session, ScanError>> + Send;
}

/// A navigated page, ready for gating, auditing, and link harvesting.
pub trait PageSession: Send {
    /// URL after redirects; results are keyed by this.
    fn final_url(&self) -> &str;

    /// HTTP status of the document response, when observed.
    fn status(&self) -> Option<u16>;

    /// Content type of the document response, when observed.
    fn content_type(&self) -> Option<&str>;

    fn title(&self) -> impl Future<Output = Result<String, ScanError>> + Send;

    /// Run the accessibility rule engine against the rendered page.
    fn run_audit(&self) -> impl Future<Output = Result<AuditReport, ScanError>> + Send;

    /// Anchor hrefs read from the live DOM, catching script-generated links a
    /// static fetch would miss. Unfiltered; the caller applies origin and
    /// HTML-likeness policy.
    fn page_links(&self) -> impl Future<Output = Result<Vec<String>, ScanError>> + Send;

    /// Release the underlying page. Errors here are not actionable.
    fn close(self) -> impl Future<Output = ()> + Send;
}
