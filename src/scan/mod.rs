//! Scanning phase: response gating, the auditor seam, and the
//! bounded-concurrency orchestrator.

pub mod auditor;
pub mod gate;
pub mod orchestrator;
pub mod types;

pub use auditor::{PageAuditor, PageSession};
pub use gate::{GateDecision, should_allow_discovery, should_analyze};
pub use orchestrator::run_scan;
pub use types::{AuditReport, PageOutcome, PageResult, RuleNode, RuleResult, ScanError};
