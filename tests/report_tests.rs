//! Run persistence on a real filesystem.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use a11y_scan::config::ScanConfig;
use a11y_scan::report::{RunReport, build_run_id, format_timestamp, write_run};
use a11y_scan::scan::{PageOutcome, PageResult, RuleNode, RuleResult};

fn audited(url: &str, violation_nodes: usize) -> PageResult {
    PageResult {
        url: url.to_string(),
        original_url: url.to_string(),
        sources: vec![],
        outcome: PageOutcome::Audited {
            title: "Home".to_string(),
            status: Some(200),
            content_type: Some("text/html".to_string()),
            violations: if violation_nodes == 0 {
                vec![]
            } else {
                vec![RuleResult {
                    id: "image-alt".to_string(),
                    nodes: vec![RuleNode::default(); violation_nodes],
                    ..RuleResult::default()
                }]
            },
            passes: vec![],
            incomplete: vec![],
        },
    }
}

#[tokio::test]
async fn run_files_land_under_the_run_directory() {
    let output = tempfile::tempdir().unwrap();
    let started = DateTime::parse_from_rfc3339("2026-08-30T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let mut results = BTreeMap::new();
    results.insert("https://example.com/".to_string(), audited("https://example.com/", 3));
    results.insert(
        "https://example.com/clean".to_string(),
        audited("https://example.com/clean", 0),
    );

    let report = RunReport {
        run_id: build_run_id(Some("Example Site"), started),
        label: Some("Example Site".to_string()),
        started_at: format_timestamp(started),
        finished_at: format_timestamp(started),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        config: ScanConfig::builder()
            .base_url("https://example.com")
            .build()
            .unwrap(),
        targets: vec!["https://example.com".to_string()],
        results_by_url: results,
    };

    let run_dir = write_run(output.path(), &report).await.unwrap();
    assert_eq!(
        run_dir,
        output.path().join("runs").join("example-site-20260830-120000")
    );

    let results_json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(run_dir.join("results.json")).unwrap()).unwrap();
    assert_eq!(results_json["runId"], "example-site-20260830-120000");
    assert_eq!(
        results_json["resultsByUrl"]["https://example.com/"]["outcome"],
        "audited"
    );

    let summary_json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(run_dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary_json["pagesScanned"], 2);
    assert_eq!(summary_json["pagesWithViolations"], 1);
    assert_eq!(summary_json["totalViolations"], 3);
}

#[tokio::test]
async fn rewriting_a_run_directory_is_idempotent() {
    let output = tempfile::tempdir().unwrap();
    let started = Utc::now();

    let report = RunReport {
        run_id: build_run_id(None, started),
        label: None,
        started_at: format_timestamp(started),
        finished_at: format_timestamp(started),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        config: ScanConfig::builder()
            .base_url("https://example.com")
            .build()
            .unwrap(),
        targets: vec![],
        results_by_url: BTreeMap::new(),
    };

    let first = write_run(output.path(), &report).await.unwrap();
    let second = write_run(output.path(), &report).await.unwrap();
    assert_eq!(first, second);
    assert!(first.join("results.json").exists());
}
