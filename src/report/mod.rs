//! Run persistence: results.json and summary.json per run.
//!
//! The scanner's only output contract. Report rendering consumes these files
//! out of process.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ScanConfig;
use crate::scan::types::PageResult;

/// Full record of one scan run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
    pub config: ScanConfig,
    /// Targets as configured, before discovery.
    pub targets: Vec<String>,
    #[serde(rename = "resultsByUrl")]
    pub results_by_url: BTreeMap<String, PageResult>,
}

/// Headline numbers for one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "pagesScanned")]
    pub pages_scanned: usize,
    #[serde(rename = "pagesWithViolations")]
    pub pages_with_violations: usize,
    /// Total flagged nodes across all violations, not rule count.
    #[serde(rename = "totalViolations")]
    pub total_violations: usize,
}

impl RunSummary {
    #[must_use]
    pub fn from_results(
        run_id: &str,
        started_at: &str,
        results: &BTreeMap<String, PageResult>,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            started_at: started_at.to_string(),
            pages_scanned: results.len(),
            pages_with_violations: results
                .values()
                .filter(|r| r.outcome.has_violations())
                .count(),
            total_violations: results
                .values()
                .map(|r| r.outcome.violation_node_count())
                .sum(),
        }
    }
}

/// Lowercase a label to alphanumerics and dashes so it is safe in paths.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().to_ascii_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if (c == '-' || c == '_' || c.is_whitespace()) && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Run id: sanitized label (when present) plus a UTC second timestamp.
#[must_use]
pub fn build_run_id(label: Option<&str>, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp.format("%Y%m%d-%H%M%S");
    match label.map(sanitize_label).filter(|l| !l.is_empty()) {
        Some(label) => format!("{label}-{stamp}"),
        None => format!("run-{stamp}"),
    }
}

/// RFC 3339 with second precision, the timestamp format reports carry.
#[must_use]
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write `results.json` and `summary.json` under `<output_dir>/runs/<run_id>/`.
///
/// Returns the run directory. An unwritable output target is one of the few
/// fatal conditions of a run.
pub async fn write_run(output_dir: &Path, report: &RunReport) -> Result<PathBuf> {
    let run_dir = output_dir.join("runs").join(&report.run_id);
    tokio::fs::create_dir_all(&run_dir)
        .await
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

    let results_json =
        serde_json::to_vec_pretty(report).context("failed to serialize run report")?;
    tokio::fs::write(run_dir.join("results.json"), results_json)
        .await
        .context("failed to write results.json")?;

    let summary =
        RunSummary::from_results(&report.run_id, &report.started_at, &report.results_by_url);
    let summary_json =
        serde_json::to_vec_pretty(&summary).context("failed to serialize run summary")?;
    tokio::fs::write(run_dir.join("summary.json"), summary_json)
        .await
        .context("failed to write summary.json")?;

    debug!("Run {} written to {}", report.run_id, run_dir.display());
    Ok(run_dir)
}
