//! Failure detail extraction

use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::TestResultRecord;

pub const NO_MESSAGE: &str = "No failure message";
pub const NO_STACK_TRACE: &str = "No stack trace";
pub const NO_PARAMETERS: &str = "none";

/// Everything a ticket body needs from one failing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetails {
    pub full_name: String,
    pub message: String,
    pub stack_trace: String,
    /// `name: status` per step
    pub steps: Vec<String>,
    /// `name: value` per parameter
    pub parameters: Vec<String>,
    pub source: PathBuf,
}

impl FailureDetails {
    pub fn step_log(&self) -> String {
        self.steps.join("\n")
    }

    pub fn parameter_log(&self) -> String {
        if self.parameters.is_empty() {
            NO_PARAMETERS.to_string()
        } else {
            self.parameters.join("\n")
        }
    }
}

impl From<&TestResultRecord> for FailureDetails {
    fn from(record: &TestResultRecord) -> Self {
        Self {
            full_name: record.full_name.clone(),
            message: record
                .message
                .clone()
                .unwrap_or_else(|| NO_MESSAGE.to_string()),
            stack_trace: record
                .stack_trace
                .clone()
                .unwrap_or_else(|| NO_STACK_TRACE.to_string()),
            steps: record
                .steps
                .iter()
                .map(|s| format!("{}: {}", s.name, s.status))
                .collect(),
            parameters: record
                .parameters
                .iter()
                .map(|p| format!("{}: {}", p.name, p.value))
                .collect(),
            source: record.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabridge_common::artifact::ResultArtifact;

    fn record(json: &str) -> TestResultRecord {
        let artifact = ResultArtifact::from_json(json).unwrap();
        TestResultRecord::from_artifact(artifact, PathBuf::from("/results/1-result.json"))
    }

    #[test]
    fn test_fallbacks_when_fields_missing() {
        let details = FailureDetails::from(&record(r#"{"status": "broken", "name": "x"}"#));
        assert_eq!(details.message, NO_MESSAGE);
        assert_eq!(details.stack_trace, NO_STACK_TRACE);
        assert_eq!(details.parameter_log(), "none");
        assert_eq!(details.step_log(), "");
        assert_eq!(details.full_name, "x");
    }

    #[test]
    fn test_flattens_steps_and_parameters() {
        let details = FailureDetails::from(&record(
            r#"{
                "status": "failed",
                "name": "search",
                "failure": {"message": "title mismatch", "stackTrace": "trace"},
                "steps": [{"name": "open", "status": "passed"}, {"name": "submit", "status": "failed"}],
                "parameters": [{"name": "keyword", "value": "rust"}, {"name": "page", "value": 2}]
            }"#,
        ));

        assert_eq!(details.message, "title mismatch");
        assert_eq!(details.stack_trace, "trace");
        assert_eq!(details.steps, vec!["open: passed", "submit: failed"]);
        assert_eq!(details.step_log(), "open: passed\nsubmit: failed");
        assert_eq!(details.parameter_log(), "keyword: rust\npage: 2");
        assert_eq!(details.source, PathBuf::from("/results/1-result.json"));
    }
}
