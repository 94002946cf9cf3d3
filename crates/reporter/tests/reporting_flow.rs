//! Reporting run tests against an in-memory tracker

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use qabridge_common::TrackerConfig;
use qabridge_reporter::{
    BugReporter, CaseOutcome, DuplicateCheck, ReportError, ReportResult, ReporterState,
    TicketDraft, TicketOutcome, Tracker,
};
use tempfile::TempDir;

#[derive(Default)]
struct Calls {
    logins: usize,
    searches: Vec<String>,
    submissions: Vec<TicketDraft>,
}

struct FakeTracker {
    existing: Vec<String>,
    fail_login: bool,
    fail_search: bool,
    /// Titles whose submission errors out
    reject: Vec<String>,
    landing_url: String,
    calls: Mutex<Calls>,
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self {
            existing: Vec::new(),
            fail_login: false,
            fail_search: false,
            reject: Vec::new(),
            landing_url: "http://tracker/zentao/bug-view-1.html".to_string(),
            calls: Mutex::new(Calls::default()),
        }
    }
}

impl FakeTracker {
    fn logins(&self) -> usize {
        self.calls.lock().unwrap().logins
    }

    fn searches(&self) -> Vec<String> {
        self.calls.lock().unwrap().searches.clone()
    }

    fn submitted_titles(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .submissions
            .iter()
            .map(|d| d.title.clone())
            .collect()
    }
}

#[async_trait]
impl Tracker for FakeTracker {
    async fn login(&mut self) -> ReportResult<()> {
        self.calls.get_mut().unwrap().logins += 1;
        if self.fail_login {
            return Err(ReportError::Login("HTTP 403 Forbidden".to_string()));
        }
        Ok(())
    }

    async fn search_active(&self, title: &str) -> ReportResult<String> {
        self.calls.lock().unwrap().searches.push(title.to_string());
        if self.fail_search {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "search timed out",
            )));
        }
        let rows: Vec<String> = self
            .existing
            .iter()
            .map(|t| format!("<a href='/zentao/bug-view-9.html'>{}</a>", t))
            .collect();
        Ok(format!("<html><body>{}</body></html>", rows.join("\n")))
    }

    async fn submit_bug(&self, draft: &TicketDraft) -> ReportResult<String> {
        self.calls.lock().unwrap().submissions.push(draft.clone());
        if self.reject.contains(&draft.title) {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }
        Ok(self.landing_url.clone())
    }
}

fn config() -> TrackerConfig {
    TrackerConfig {
        tracker_url: "http://tracker/zentao".to_string(),
        account: "auto".to_string(),
        password: "secret".to_string(),
        product_id: 4,
        module_id: 159,
        ..Default::default()
    }
}

fn write_result(dir: &Path, file: &str, status: &str, name: &str) {
    let json = serde_json::json!({
        "status": status,
        "name": name,
        "fullName": format!("suite.{}", name),
        "failure": { "message": "assertion failed", "stackTrace": "at line 1" },
        "steps": [{ "name": "open", "status": status }],
        "parameters": []
    });
    std::fs::write(dir.join(file), serde_json::to_string_pretty(&json).unwrap()).unwrap();
}

#[tokio::test]
async fn two_failures_of_one_case_file_two_tickets() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");
    write_result(dir.path(), "b-result.json", "failed", "login_test");

    let mut reporter = BugReporter::new(FakeTracker::default(), config());
    let report = reporter.run(dir.path()).await.unwrap();

    let tracker = reporter.tracker();
    assert_eq!(tracker.logins(), 1);
    assert_eq!(tracker.searches(), vec!["[UI自动化失败] login_test"]);
    assert_eq!(
        tracker.submitted_titles(),
        vec!["[UI自动化失败] login_test", "[UI自动化失败] login_test"]
    );
    assert_eq!(report.created(), 2);
    assert_eq!(report.cases.len(), 1);
    assert_eq!(report.cases[0].failures, 2);
    assert!(reporter.cache().contains("[UI自动化失败] login_test"));
    assert_eq!(reporter.state(), ReporterState::Done);
}

#[tokio::test]
async fn existing_ticket_skips_case() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");
    write_result(dir.path(), "b-result.json", "broken", "search_test");

    let tracker = FakeTracker {
        existing: vec!["[UI自动化失败] login_test".to_string()],
        ..Default::default()
    };
    let mut reporter = BugReporter::new(tracker, config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(
        reporter.tracker().submitted_titles(),
        vec!["[UI自动化失败] search_test"]
    );
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.created(), 1);

    let login = report
        .cases
        .iter()
        .find(|c| c.case_name == "login_test")
        .unwrap();
    assert_eq!(
        login.outcome,
        CaseOutcome::Skipped {
            check: DuplicateCheck::Found
        }
    );
}

#[tokio::test]
async fn passing_results_file_nothing() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "passed", "login_test");
    write_result(dir.path(), "b-result.json", "skipped", "other_test");

    let mut reporter = BugReporter::new(FakeTracker::default(), config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(report.files_parsed, 2);
    assert!(report.cases.is_empty());
    assert!(reporter.tracker().searches().is_empty());
    assert!(reporter.tracker().submitted_titles().is_empty());
}

#[tokio::test]
async fn corrupted_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "1-result.json", "failed", "one");
    write_result(dir.path(), "2-result.json", "failed", "two");
    write_result(dir.path(), "3-result.json", "failed", "three");
    std::fs::write(dir.path().join("4-result.json"), "{\"status\": ").unwrap();

    let mut reporter = BugReporter::new(FakeTracker::default(), config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(report.cases.len(), 3);
    assert_eq!(report.malformed_files.len(), 1);
    assert_eq!(report.created(), 3);
}

#[tokio::test]
async fn missing_directory_aborts_before_ticket_work() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("allure-results");

    let mut reporter = BugReporter::new(FakeTracker::default(), config());
    let err = reporter.run(&missing).await.unwrap_err();

    assert!(matches!(err, ReportError::NotFound(_)));
    assert_eq!(reporter.tracker().logins(), 1);
    assert!(reporter.tracker().searches().is_empty());
    assert!(reporter.tracker().submitted_titles().is_empty());
    assert_eq!(reporter.state(), ReporterState::Done);
}

#[tokio::test]
async fn login_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");

    let tracker = FakeTracker {
        fail_login: true,
        ..Default::default()
    };
    let mut reporter = BugReporter::new(tracker, config());
    let err = reporter.run(dir.path()).await.unwrap_err();

    assert!(matches!(err, ReportError::Login(_)));
    assert!(reporter.tracker().searches().is_empty());
    assert_eq!(reporter.state(), ReporterState::Done);
}

#[tokio::test]
async fn search_failure_fails_open() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");

    let tracker = FakeTracker {
        fail_search: true,
        ..Default::default()
    };
    let mut reporter = BugReporter::new(tracker, config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(report.query_failures(), 1);
    assert_eq!(report.created(), 1);
    match &report.cases[0].outcome {
        CaseOutcome::Filed { check, .. } => {
            assert!(matches!(check, DuplicateCheck::QueryFailed(_)));
        }
        other => panic!("expected a filed case, got {:?}", other),
    }
}

#[tokio::test]
async fn rejected_submission_does_not_stop_other_cases() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "alpha");
    write_result(dir.path(), "b-result.json", "failed", "beta");

    let tracker = FakeTracker {
        reject: vec!["[UI自动化失败] alpha".to_string()],
        ..Default::default()
    };
    let mut reporter = BugReporter::new(tracker, config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(reporter.tracker().submitted_titles().len(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.created(), 1);
    assert!(!reporter.cache().contains("[UI自动化失败] alpha"));
    assert!(reporter.cache().contains("[UI自动化失败] beta"));
}

#[tokio::test]
async fn non_view_landing_is_unconfirmed() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");

    let tracker = FakeTracker {
        landing_url: "http://tracker/zentao/bug-create-4-159.html".to_string(),
        ..Default::default()
    };
    let mut reporter = BugReporter::new(tracker, config());
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(report.unconfirmed(), 1);
    assert_eq!(report.created(), 0);
    assert!(reporter.cache().is_empty());
}

#[tokio::test]
async fn dry_run_submits_nothing() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "a-result.json", "failed", "login_test");

    let mut reporter = BugReporter::new(FakeTracker::default(), config()).dry_run(true);
    let report = reporter.run(dir.path()).await.unwrap();

    assert_eq!(reporter.tracker().searches().len(), 1);
    assert!(reporter.tracker().submitted_titles().is_empty());
    match &report.cases[0].outcome {
        CaseOutcome::Filed { tickets, .. } => match &tickets[0] {
            TicketOutcome::DryRun { title, body } => {
                assert_eq!(title, "[UI自动化失败] login_test");
                assert!(body.contains("suite.login_test"));
            }
            other => panic!("expected dry run outcome, got {:?}", other),
        },
        other => panic!("expected a filed case, got {:?}", other),
    }
}
