//! Result Artifact Model
//!
//! One `*-result.json` file describes the outcome of a single test case.
//! The UI check runner writes these files and the defect reporter reads them.
//!
//! Shape on disk:
//!
//! ```json
//! {
//!   "status": "failed",
//!   "name": "test_webui_1",
//!   "fullName": "search.test_webui_1",
//!   "failure": { "message": "...", "stackTrace": "..." },
//!   "steps": [{ "name": "open homepage", "status": "passed" }],
//!   "parameters": [{ "name": "keyword", "value": "..." }]
//! }
//! ```
//!
//! Only `status` is required.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// File name suffix identifying a result artifact
pub const RESULT_SUFFIX: &str = "-result.json";

/// Shown for a parameter name or value the runner left out
pub const MISSING_VALUE: &str = "None";

/// Outcome recorded in a result artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
    Unknown,
}

impl ArtifactStatus {
    /// Failed and broken results are the ones worth a defect ticket
    pub fn is_failure(&self) -> bool {
        matches!(self, ArtifactStatus::Failed | ArtifactStatus::Broken)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::Passed => "passed",
            ArtifactStatus::Failed => "failed",
            ArtifactStatus::Broken => "broken",
            ArtifactStatus::Skipped => "skipped",
            ArtifactStatus::Unknown => "unknown",
        }
    }
}

impl From<String> for ArtifactStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "passed" => ArtifactStatus::Passed,
            "failed" => ArtifactStatus::Failed,
            "broken" => ArtifactStatus::Broken,
            "skipped" => ArtifactStatus::Skipped,
            _ => ArtifactStatus::Unknown,
        }
    }
}

impl From<ArtifactStatus> for String {
    fn from(status: ArtifactStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Parameter value is kept as raw JSON; runners emit strings, numbers and booleans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ArtifactParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(serde_json::Value::String(value.into())),
        }
    }

    /// Value rendered for humans: strings unquoted, anything else as JSON
    pub fn display_value(&self) -> String {
        match &self.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => MISSING_VALUE.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Evidence file attached to a result (screenshots)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactAttachment {
    pub name: String,
    pub source: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// One test case outcome as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    pub status: ArtifactStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ArtifactFailure>,

    #[serde(default)]
    pub steps: Vec<ArtifactStep>,

    #[serde(default)]
    pub parameters: Vec<ArtifactParameter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<ArtifactAttachment>,

    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

impl ResultArtifact {
    /// Start a fresh artifact with a new uuid
    pub fn new(name: impl Into<String>, status: ArtifactStatus) -> Self {
        Self {
            uuid: Some(uuid::Uuid::new_v4().to_string()),
            status,
            name: Some(name.into()),
            full_name: None,
            failure: None,
            steps: Vec::new(),
            parameters: Vec::new(),
            attachments: Vec::new(),
            start: None,
            stop: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>, stack_trace: Option<String>) -> Self {
        self.failure = Some(ArtifactFailure {
            message: Some(message.into()),
            stack_trace,
        });
        self
    }

    pub fn push_step(&mut self, name: impl Into<String>, status: ArtifactStatus) {
        self.steps.push(ArtifactStep {
            name: Some(name.into()),
            status: Some(status.to_string()),
        });
    }

    /// Parse an artifact from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an artifact file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Write the artifact into `dir` as `<uuid>-result.json`
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let stem = match &self.uuid {
            Some(uuid) => uuid.clone(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let path = dir.join(format!("{}{}", stem, RESULT_SUFFIX));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;

        debug!("Wrote result artifact {}", path.display());
        Ok(path)
    }
}

/// Whether a path names a result artifact (suffix match on the file name)
pub fn is_result_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(RESULT_SUFFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_status_is_required() {
        let artifact = ResultArtifact::from_json(r#"{"status": "broken"}"#).unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Broken);
        assert!(artifact.name.is_none());
        assert!(artifact.steps.is_empty());

        assert!(ResultArtifact::from_json(r#"{"name": "no_status"}"#).is_err());
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let artifact = ResultArtifact::from_json(r#"{"status": "flaky"}"#).unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Unknown);
        assert!(!artifact.status.is_failure());
    }

    #[test]
    fn test_null_failure_is_accepted() {
        let artifact = ResultArtifact::from_json(r#"{"status": "failed", "failure": null}"#).unwrap();
        assert!(artifact.failure.is_none());
        assert!(artifact.status.is_failure());
    }

    #[test]
    fn test_parse_full_artifact() {
        let json = r#"{
            "status": "failed",
            "name": "login_test",
            "fullName": "suite.login_test",
            "failure": {"message": "boom", "stackTrace": "at line 3"},
            "steps": [{"name": "open", "status": "passed"}, {"status": "failed"}],
            "parameters": [{"name": "retries", "value": 3}, {"name": "user", "value": "bob"}]
        }"#;
        let artifact = ResultArtifact::from_json(json).unwrap();
        assert_eq!(artifact.full_name.as_deref(), Some("suite.login_test"));
        let failure = artifact.failure.unwrap();
        assert_eq!(failure.stack_trace.as_deref(), Some("at line 3"));
        assert_eq!(artifact.steps[1].name, None);
        assert_eq!(artifact.parameters[0].display_value(), "3");
        assert_eq!(artifact.parameters[1].display_value(), "bob");
    }

    #[test]
    fn test_missing_parameter_value_renders_none() {
        let artifact = ResultArtifact::from_json(
            r#"{"status": "failed", "parameters": [{"name": "a"}, {"name": "b", "value": null}]}"#,
        )
        .unwrap();
        assert_eq!(artifact.parameters[0].display_value(), "None");
        assert_eq!(artifact.parameters[1].display_value(), "None");
    }

    #[test]
    fn test_write_to_dir_uses_result_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = ResultArtifact::new("test_webui_1", ArtifactStatus::Passed);
        artifact.push_step("open homepage", ArtifactStatus::Passed);

        let path = artifact.write_to_dir(dir.path()).unwrap();
        assert!(is_result_file(&path));

        let back = ResultArtifact::from_file(&path).unwrap();
        assert_eq!(back.name.as_deref(), Some("test_webui_1"));
        assert_eq!(back.steps[0].status.as_deref(), Some("passed"));
    }

    #[test]
    fn test_is_result_file() {
        assert!(is_result_file(Path::new("/tmp/abc-result.json")));
        assert!(!is_result_file(Path::new("/tmp/abc-container.json")));
        assert!(!is_result_file(Path::new("/tmp/result.json")));
    }
}
