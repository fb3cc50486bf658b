//! Orchestrator behavior against an in-memory page auditor: cap enforcement,
//! redirect deduplication, gating, and live link discovery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use a11y_scan::config::ScanConfig;
use a11y_scan::scan::{
    AuditReport, PageAuditor, PageOutcome, PageSession, RuleNode, RuleResult, ScanError, run_scan,
};

#[derive(Debug, Clone, Default)]
struct MockPage {
    final_url: Option<String>,
    status: u16,
    content_type: Option<String>,
    title: String,
    links: Vec<String>,
    fail_navigation: bool,
    violations: usize,
}

impl MockPage {
    fn ok() -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            title: "page".to_string(),
            ..Self::default()
        }
    }

    fn with_links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| (*l).to_string()).collect();
        self
    }

    fn redirecting_to(mut self, target: &str) -> Self {
        self.final_url = Some(target.to_string());
        self
    }
}

#[derive(Clone)]
struct MockAuditor {
    pages: Arc<HashMap<String, MockPage>>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl MockAuditor {
    fn new(pages: HashMap<String, MockPage>) -> Self {
        Self {
            pages: Arc::new(pages),
            visits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

struct MockSession {
    url: String,
    page: MockPage,
}

impl PageAuditor for MockAuditor {
    type Session = MockSession;

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<MockSession, ScanError> {
        self.visits.lock().unwrap().push(url.to_string());
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::Navigation(format!("no route to {url}")))?;
        if page.fail_navigation {
            return Err(ScanError::Navigation("connection reset".to_string()));
        }
        let url = page.final_url.clone().unwrap_or_else(|| url.to_string());
        Ok(MockSession { url, page })
    }
}

impl PageSession for MockSession {
    fn final_url(&self) -> &str {
        &self.url
    }

    fn status(&self) -> Option<u16> {
        Some(self.page.status)
    }

    fn content_type(&self) -> Option<&str> {
        self.page.content_type.as_deref()
    }

    async fn title(&self) -> Result<String, ScanError> {
        Ok(self.page.title.clone())
    }

    async fn run_audit(&self) -> Result<AuditReport, ScanError> {
        let violations = (0..self.page.violations)
            .map(|i| RuleResult {
                id: format!("rule-{i}"),
                nodes: vec![RuleNode::default()],
                ..RuleResult::default()
            })
            .collect();
        Ok(AuditReport {
            violations,
            ..AuditReport::default()
        })
    }

    async fn page_links(&self) -> Result<Vec<String>, ScanError> {
        Ok(self.page.links.clone())
    }

    async fn close(self) {}
}

fn config(max_pages: usize, concurrency: usize) -> ScanConfig {
    ScanConfig::builder()
        .base_url("https://site.test")
        .max_pages(max_pages)
        .concurrency(concurrency)
        .build()
        .unwrap()
}

#[tokio::test]
async fn page_cap_holds_against_live_discovery() {
    let mut pages = HashMap::new();
    let hub_links: Vec<String> = (0..10).map(|i| format!("https://site.test/p{i}")).collect();
    let hub_refs: Vec<&str> = hub_links.iter().map(String::as_str).collect();
    pages.insert(
        "https://site.test/".to_string(),
        MockPage::ok().with_links(&hub_refs),
    );
    for link in &hub_links {
        pages.insert(link.clone(), MockPage::ok().with_links(&hub_refs));
    }

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(3, 2),
        vec!["https://site.test/".to_string()],
        true,
    )
    .await;

    assert!(results.len() <= 3);
    assert!(auditor.visits().len() <= 3);
}

#[tokio::test]
async fn discovered_links_are_scanned_without_revisits() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/".to_string(),
        MockPage::ok().with_links(&["https://site.test/a", "https://site.test/"]),
    );
    pages.insert(
        "https://site.test/a".to_string(),
        MockPage::ok().with_links(&["https://site.test/", "https://site.test/a"]),
    );

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 1),
        vec!["https://site.test/".to_string()],
        true,
    )
    .await;

    assert_eq!(results.len(), 2);
    let mut visits = auditor.visits();
    visits.sort();
    visits.dedup();
    assert_eq!(visits.len(), auditor.visits().len(), "a URL was re-scanned");
}

#[tokio::test]
async fn discovery_is_ignored_when_not_allowed() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/".to_string(),
        MockPage::ok().with_links(&["https://site.test/a"]),
    );
    pages.insert("https://site.test/a".to_string(), MockPage::ok());

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 2),
        vec!["https://site.test/".to_string()],
        false,
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(auditor.visits(), vec!["https://site.test/".to_string()]);
}

#[tokio::test]
async fn redirecting_inputs_collapse_into_one_result() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/old-a".to_string(),
        MockPage::ok().redirecting_to("https://site.test/dest"),
    );
    pages.insert(
        "https://site.test/old-b".to_string(),
        MockPage::ok().redirecting_to("https://site.test/dest"),
    );

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 2),
        vec![
            "https://site.test/old-a".to_string(),
            "https://site.test/old-b".to_string(),
        ],
        false,
    )
    .await;

    assert_eq!(results.len(), 1);
    let result = &results["https://site.test/dest"];
    assert_eq!(result.url, "https://site.test/dest");
    // Both inputs are recorded; the non-primary one only appears in sources.
    assert!(result.sources.iter().any(|s| s.ends_with("/old-a")));
    assert!(result.sources.iter().any(|s| s.ends_with("/old-b")));
}

#[tokio::test]
async fn redirect_to_already_scanned_page_is_not_rescanned() {
    let mut pages = HashMap::new();
    pages.insert("https://site.test/dest".to_string(), MockPage::ok());
    pages.insert(
        "https://site.test/alias".to_string(),
        MockPage::ok().redirecting_to("https://site.test/dest"),
    );

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 1),
        vec![
            "https://site.test/dest".to_string(),
            "https://site.test/alias".to_string(),
        ],
        false,
    )
    .await;

    assert_eq!(results.len(), 1);
    let result = &results["https://site.test/dest"];
    assert_eq!(result.original_url, "https://site.test/dest");
    assert_eq!(result.sources, vec!["https://site.test/alias".to_string()]);
}

#[tokio::test]
async fn gate_rejections_and_failures_are_recorded_not_fatal() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/missing".to_string(),
        MockPage {
            status: 404,
            content_type: Some("text/html".to_string()),
            ..MockPage::default()
        },
    );
    pages.insert(
        "https://site.test/archive".to_string(),
        MockPage {
            status: 200,
            content_type: Some("application/zip".to_string()),
            ..MockPage::default()
        },
    );
    pages.insert(
        "https://site.test/down".to_string(),
        MockPage {
            fail_navigation: true,
            ..MockPage::ok()
        },
    );
    pages.insert("https://site.test/fine".to_string(), MockPage::ok());

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 2),
        vec![
            "https://site.test/missing".to_string(),
            "https://site.test/archive".to_string(),
            "https://site.test/down".to_string(),
            "https://site.test/fine".to_string(),
        ],
        false,
    )
    .await;

    assert_eq!(results.len(), 4);
    match &results["https://site.test/missing"].outcome {
        PageOutcome::Skipped { reason, .. } => assert!(reason.contains("404")),
        other => panic!("expected skip, got {other:?}"),
    }
    match &results["https://site.test/archive"].outcome {
        PageOutcome::Skipped { reason, .. } => assert!(reason.contains("non-html")),
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(matches!(
        results["https://site.test/down"].outcome,
        PageOutcome::Failed { .. }
    ));
    assert!(matches!(
        results["https://site.test/fine"].outcome,
        PageOutcome::Audited { .. }
    ));
}

#[tokio::test]
async fn audited_pages_carry_rule_results() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/bad".to_string(),
        MockPage {
            violations: 2,
            ..MockPage::ok()
        },
    );

    let auditor = MockAuditor::new(pages);
    let results = run_scan(
        &auditor,
        &config(10, 1),
        vec!["https://site.test/bad".to_string()],
        false,
    )
    .await;

    match &results["https://site.test/bad"].outcome {
        PageOutcome::Audited {
            violations, title, ..
        } => {
            assert_eq!(violations.len(), 2);
            assert_eq!(title, "page");
        }
        other => panic!("expected audited outcome, got {other:?}"),
    }
}
