//! Result and error types for the scanning phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for a scan run.
///
/// Only `Browser` is fatal to a run; the rest are recorded per URL or per
/// target and the run continues.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("discovery failed: {0}")]
    Discovery(String),
}

impl From<anyhow::Error> for ScanError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} preserves the full context chain.
        Self::Browser(format!("{err:#}"))
    }
}

/// One node flagged by an accessibility rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleNode {
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default)]
    pub html: String,
}

/// Verdict of a single accessibility rule, in axe-core's JSON shape.
///
/// The scanner transports these verbatim; interpreting them is the report
/// renderer's business.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "helpUrl")]
    pub help_url: String,
    #[serde(default)]
    pub nodes: Vec<RuleNode>,
}

/// Everything the rule engine reported for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(default)]
    pub violations: Vec<RuleResult>,
    #[serde(default)]
    pub passes: Vec<RuleResult>,
    #[serde(default)]
    pub incomplete: Vec<RuleResult>,
}

/// What happened to a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PageOutcome {
    /// Page rendered and the rule engine ran.
    Audited {
        title: String,
        status: Option<u16>,
        #[serde(rename = "contentType")]
        content_type: Option<String>,
        violations: Vec<RuleResult>,
        passes: Vec<RuleResult>,
        incomplete: Vec<RuleResult>,
    },
    /// Response gate rejected the page; not a failure.
    Skipped {
        reason: String,
        status: Option<u16>,
        #[serde(rename = "contentType")]
        content_type: Option<String>,
    },
    /// Navigation or audit failed; the run continues.
    Failed { error: String },
}

impl PageOutcome {
    /// Violation count weighted by flagged nodes, matching how the run
    /// summary tallies totals.
    #[must_use]
    pub fn violation_node_count(&self) -> usize {
        match self {
            Self::Audited { violations, .. } => violations.iter().map(|v| v.nodes.len()).sum(),
            Self::Skipped { .. } | Self::Failed { .. } => 0,
        }
    }

    #[must_use]
    pub fn has_violations(&self) -> bool {
        matches!(self, Self::Audited { violations, .. } if !violations.is_empty())
    }
}

/// Per-page scan record, keyed in the run's result map by the final URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Final URL after redirects.
    pub url: String,
    /// URL as it was dequeued, before any redirect.
    #[serde(rename = "originalUrl")]
    pub original_url: String,
    /// Additional input URLs that resolved to this same final URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}
