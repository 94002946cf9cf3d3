//! Result directory scanning
//!
//! Walks one directory level, parses every `*-result.json` file and groups the
//! failed and broken ones by case name. A file that cannot be read or parsed is
//! logged and skipped; only a missing directory stops the scan.
//!
//! Files are visited in the order the filesystem lists them. Ticket titles only
//! depend on the case name, so that order never changes what gets filed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use qabridge_common::artifact::{is_result_file, ArtifactStatus, ResultArtifact, MISSING_VALUE};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ReportError, ReportResult};

const UNNAMED_TEST: &str = "Unnamed Test";
const UNNAMED_STEP: &str = "Unnamed step";
const UNKNOWN_STEP_STATUS: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    pub value: String,
}

/// One parsed result file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResultRecord {
    pub case_name: String,
    pub full_name: String,
    pub status: ArtifactStatus,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
    pub steps: Vec<StepDescriptor>,
    pub parameters: Vec<ParameterEntry>,
    pub source: PathBuf,
}

impl TestResultRecord {
    pub fn from_artifact(artifact: ResultArtifact, source: PathBuf) -> Self {
        let case_name = artifact.name.unwrap_or_else(|| UNNAMED_TEST.to_string());
        let full_name = artifact.full_name.unwrap_or_else(|| case_name.clone());
        let (message, stack_trace) = match artifact.failure {
            Some(failure) => (failure.message, failure.stack_trace),
            None => (None, None),
        };

        let steps = artifact
            .steps
            .into_iter()
            .map(|step| StepDescriptor {
                name: step.name.unwrap_or_else(|| UNNAMED_STEP.to_string()),
                status: step.status.unwrap_or_else(|| UNKNOWN_STEP_STATUS.to_string()),
            })
            .collect();

        let parameters = artifact
            .parameters
            .iter()
            .map(|param| ParameterEntry {
                name: param.name.clone().unwrap_or_else(|| MISSING_VALUE.to_string()),
                value: param.display_value(),
            })
            .collect();

        Self {
            case_name,
            full_name,
            status: artifact.status,
            message,
            stack_trace,
            steps,
            parameters,
            source,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// All records sharing one case name, in scan order
#[derive(Debug, Clone, Serialize)]
pub struct FailureCase {
    pub name: String,
    pub records: Vec<TestResultRecord>,
}

/// Failing records grouped by case name, keeping first-seen case order
#[derive(Debug, Default, Clone, Serialize)]
pub struct FailureIndex {
    cases: Vec<FailureCase>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
    files_parsed: usize,
    malformed: Vec<PathBuf>,
}

impl FailureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; records that are not failed or broken are ignored
    pub fn insert(&mut self, record: TestResultRecord) -> bool {
        if !record.is_failure() {
            return false;
        }

        match self.positions.get(&record.case_name) {
            Some(&pos) => self.cases[pos].records.push(record),
            None => {
                self.positions.insert(record.case_name.clone(), self.cases.len());
                self.cases.push(FailureCase {
                    name: record.case_name.clone(),
                    records: vec![record],
                });
            }
        }
        true
    }

    pub fn get(&self, case_name: &str) -> Option<&[TestResultRecord]> {
        self.positions
            .get(case_name)
            .map(|&pos| self.cases[pos].records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureCase> {
        self.cases.iter()
    }

    /// Number of distinct failing cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Number of failing records across all cases
    pub fn total_records(&self) -> usize {
        self.cases.iter().map(|c| c.records.len()).sum()
    }

    /// Result files that parsed successfully, failing or not
    pub fn files_parsed(&self) -> usize {
        self.files_parsed
    }

    /// Result files that were skipped because they could not be parsed
    pub fn malformed(&self) -> &[PathBuf] {
        &self.malformed
    }
}

/// Scan `dir` for result artifacts and index the failing ones
pub fn scan_results(dir: &Path) -> ReportResult<FailureIndex> {
    if !dir.is_dir() {
        return Err(ReportError::NotFound(dir.to_path_buf()));
    }

    let mut index = FailureIndex::new();

    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_result_file(path) {
            continue;
        }

        match ResultArtifact::from_file(path) {
            Ok(artifact) => {
                index.files_parsed += 1;
                let record = TestResultRecord::from_artifact(artifact, path.to_path_buf());
                debug!("{} -> {} ({})", path.display(), record.case_name, record.status);
                index.insert(record);
            }
            Err(e) => {
                warn!("Failed to parse result file {}: {}", path.display(), e);
                index.malformed.push(path.to_path_buf());
            }
        }
    }

    info!(
        "Scanned {}: {} result file(s), {} failing case(s), {} malformed",
        dir.display(),
        index.files_parsed,
        index.len(),
        index.malformed.len()
    );

    Ok(index)
}
