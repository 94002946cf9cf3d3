//! Runs search cases and records their result artifacts

use std::path::{Path, PathBuf};
use std::time::Instant;

use qabridge_common::artifact::{ArtifactAttachment, ArtifactParameter, ArtifactStatus, ResultArtifact};
use qabridge_common::DriverConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{title_accepted, DriverReport, DriverStep, PlaywrightDriver};
use crate::spec::SearchCase;

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub keyword: String,
    pub success: bool,
    pub duration_ms: u64,
    pub final_title: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub screenshot_sha256: Option<String>,
    pub error_screenshot: Option<PathBuf>,
    pub error: Option<String>,
    #[serde(default)]
    pub steps: Vec<DriverStep>,
    pub artifact: Option<PathBuf>,
}

/// Result of running all cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<CheckResult>,
}

/// Main UI check runner
pub struct SearchCheckRunner {
    driver: PlaywrightDriver,
    config: DriverConfig,
}

impl SearchCheckRunner {
    /// Create a runner; fails when Playwright is unavailable
    pub async fn new(config: DriverConfig) -> E2eResult<Self> {
        let driver = PlaywrightDriver::new(config.clone()).await?;
        Ok(Self { driver, config })
    }

    pub fn results_dir(&self) -> &Path {
        &self.config.results_dir
    }

    /// Run a list of cases in order
    pub async fn run_cases(&self, cases: &[SearchCase]) -> E2eResult<CheckSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(cases.len());

        info!("Running {} case(s)...", cases.len());

        for case in cases {
            let result = self.run_case(case).await?;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = summarize(results, start.elapsed().as_millis() as u64);
        info!(
            "Check results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        Ok(suite)
    }

    /// Run one case. Check failures are reported in the result; only a
    /// browser that cannot be started is an error.
    pub async fn run_case(&self, case: &SearchCase) -> E2eResult<CheckResult> {
        debug!("Running case: {} ({})", case.name, case.keyword);
        let started_at = chrono::Utc::now().timestamp_millis();
        let start = Instant::now();

        let outcome = match self.driver.run_case(case).await {
            Ok(report) => Ok(report),
            Err(e @ (E2eError::BrowserLaunch(_) | E2eError::PlaywrightNotFound)) => return Err(e),
            Err(e) => Err(e.to_string()),
        };

        let mut result = match outcome {
            Ok(report) => self.judge(case, report),
            Err(reason) => CheckResult {
                name: case.name.clone(),
                keyword: case.keyword.clone(),
                success: false,
                duration_ms: 0,
                final_title: None,
                screenshot: None,
                screenshot_sha256: None,
                error_screenshot: None,
                error: Some(reason),
                steps: Vec::new(),
                artifact: None,
            },
        };
        result.duration_ms = start.elapsed().as_millis() as u64;

        let artifact = build_artifact(case, &result, started_at, chrono::Utc::now().timestamp_millis());
        match artifact.write_to_dir(&self.config.results_dir) {
            Ok(path) => result.artifact = Some(path),
            Err(e) => warn!("Could not write result artifact for {}: {}", case.name, e),
        }

        Ok(result)
    }

    /// Turn the driver report into a verdict, re-checking the final title
    fn judge(&self, case: &SearchCase, report: DriverReport) -> CheckResult {
        for step in &report.steps {
            debug!("[{}] {}: {}", case.name, step.name, step.status);
        }

        let mut error = report.error.clone();
        let mut success = report.success;

        if success {
            if let Err(e) = verify_title(
                report.final_title.as_deref(),
                &case.keyword,
                &self.config.interstitial_marker,
            ) {
                success = false;
                error = Some(e.to_string());
            }
        }

        let screenshot_sha256 = report
            .screenshot
            .as_deref()
            .filter(|_| success)
            .and_then(|p| match hash_file(p) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!("Could not hash screenshot {}: {}", p.display(), e);
                    None
                }
            });

        CheckResult {
            name: case.name.clone(),
            keyword: case.keyword.clone(),
            success,
            duration_ms: 0,
            final_title: report.final_title,
            screenshot: report.screenshot.filter(|_| success),
            screenshot_sha256,
            error_screenshot: report.error_screenshot,
            error: error.map(|e| match &report.stack {
                Some(stack) if !stack.is_empty() => format!("{}\n{}", e, stack),
                _ => e,
            }),
            steps: report.steps,
            artifact: None,
        }
    }

    /// Write the suite summary next to the result artifacts
    pub fn write_results(&self, suite: &CheckSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.results_dir)?;

        let path = self.config.results_dir.join("check-results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Fail unless the final title shows the keyword or the interstitial marker
pub fn verify_title(
    final_title: Option<&str>,
    keyword: &str,
    interstitial_marker: &str,
) -> E2eResult<()> {
    match final_title {
        Some(title) if title_accepted(title, keyword, interstitial_marker) => Ok(()),
        Some(title) => Err(E2eError::AssertionFailed(format!(
            "title {:?} contains neither {:?} nor {:?}",
            title, keyword, interstitial_marker
        ))),
        None => Err(E2eError::AssertionFailed("no result page title recorded".to_string())),
    }
}

pub fn summarize(results: Vec<CheckResult>, duration_ms: u64) -> CheckSuiteResult {
    let passed = results.iter().filter(|r| r.success).count();
    CheckSuiteResult {
        total: results.len(),
        passed,
        failed: results.len() - passed,
        duration_ms,
        results,
    }
}

/// Result artifact for one case, in the shape the defect reporter reads
pub fn build_artifact(case: &SearchCase, result: &CheckResult, start: i64, stop: i64) -> ResultArtifact {
    let status = if result.success {
        ArtifactStatus::Passed
    } else {
        ArtifactStatus::Failed
    };

    let mut artifact = ResultArtifact::new(case.name.clone(), status).with_full_name(case.full_name());
    artifact.parameters.push(ArtifactParameter::new("keyword", case.keyword.clone()));
    for step in &result.steps {
        artifact.push_step(step.name.clone(), ArtifactStatus::from(step.status.clone()));
    }
    artifact.start = Some(start);
    artifact.stop = Some(stop);

    if let Some(error) = &result.error {
        let (message, stack) = match error.split_once('\n') {
            Some((message, stack)) => (message.to_string(), Some(stack.to_string())),
            None => (error.clone(), None),
        };
        artifact = artifact.with_failure(message, stack);
    }

    let attachments = [
        (format!("{}_result", case.name), &result.screenshot),
        (format!("error_{}", case.name), &result.error_screenshot),
    ];
    for (name, path) in attachments {
        if let Some(path) = path {
            artifact.attachments.push(ArtifactAttachment {
                name,
                source: path.to_string_lossy().to_string(),
                mime_type: "image/png".to_string(),
            });
        }
    }

    artifact
}

/// SHA-256 of a file, hex encoded
pub fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool, error: Option<&str>) -> CheckResult {
        CheckResult {
            name: "test_webui_1".to_string(),
            keyword: "今日头条".to_string(),
            success,
            duration_ms: 10,
            final_title: Some("今日头条_百度搜索".to_string()),
            screenshot: success.then(|| PathBuf::from("/s/test_webui_1_result.png")),
            screenshot_sha256: None,
            error_screenshot: (!success).then(|| PathBuf::from("/s/error_test_webui_1.png")),
            error: error.map(String::from),
            steps: vec![DriverStep {
                name: "open homepage".to_string(),
                status: "passed".to_string(),
            }],
            artifact: None,
        }
    }

    #[test]
    fn test_verify_title() {
        assert!(verify_title(Some("今日头条_百度搜索"), "今日头条", "安全验证").is_ok());
        assert!(verify_title(Some("百度安全验证"), "今日头条", "安全验证").is_ok());
        assert!(matches!(
            verify_title(Some("百度一下"), "今日头条", "安全验证"),
            Err(E2eError::AssertionFailed(_))
        ));
        assert!(verify_title(None, "今日头条", "安全验证").is_err());
    }

    #[test]
    fn test_passing_artifact() {
        let case = SearchCase::builtin().remove(0);
        let artifact = build_artifact(&case, &result(true, None), 1, 2);

        assert_eq!(artifact.status, ArtifactStatus::Passed);
        assert_eq!(artifact.full_name.as_deref(), Some("search.test_webui_1"));
        assert_eq!(artifact.parameters[0].display_value(), "今日头条");
        assert_eq!(artifact.attachments.len(), 1);
        assert_eq!(artifact.attachments[0].name, "test_webui_1_result");
        assert_eq!(artifact.steps[0].name.as_deref(), Some("open homepage"));
        assert_eq!(artifact.steps[0].status.as_deref(), Some("passed"));
        assert!(artifact.failure.is_none());
    }

    #[test]
    fn test_failing_artifact_splits_message_and_stack() {
        let case = SearchCase::builtin().remove(0);
        let artifact = build_artifact(
            &case,
            &result(false, Some("test_webui_1 check failed\nError: at page.title")),
            1,
            2,
        );

        assert_eq!(artifact.status, ArtifactStatus::Failed);
        let failure = artifact.failure.unwrap();
        assert_eq!(failure.message.as_deref(), Some("test_webui_1 check failed"));
        assert_eq!(failure.stack_trace.as_deref(), Some("Error: at page.title"));
        assert_eq!(artifact.attachments[0].name, "error_test_webui_1");
    }

    #[test]
    fn test_summarize() {
        let suite = summarize(vec![result(true, None), result(false, Some("x"))], 50);
        assert_eq!(suite.total, 2);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 1);
    }

    #[test]
    fn test_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
