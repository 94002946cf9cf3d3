//! Reporting run: login, scan, then check and file per failing case

use std::path::{Path, PathBuf};

use qabridge_common::TrackerConfig;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::aggregate::FailureDetails;
use crate::dedup::{check_duplicate, DedupCache, DuplicateCheck};
use crate::error::ReportResult;
use crate::scanner::scan_results;
use crate::ticket::{file_ticket, TicketDraft, TicketOutcome};
use crate::tracker::Tracker;

/// Where a reporting run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterState {
    Init,
    LoggedIn,
    Scanned,
    Checking,
    Skipping,
    Creating,
    Done,
}

/// What happened to one failing case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CaseOutcome {
    Skipped { check: DuplicateCheck },
    Filed {
        check: DuplicateCheck,
        tickets: Vec<TicketOutcome>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub case_name: String,
    pub failures: usize,
    pub outcome: CaseOutcome,
}

/// Summary of a reporting run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results_dir: PathBuf,
    pub files_parsed: usize,
    pub malformed_files: Vec<PathBuf>,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    fn tickets(&self) -> impl Iterator<Item = &TicketOutcome> {
        self.cases.iter().flat_map(|c| match &c.outcome {
            CaseOutcome::Filed { tickets, .. } => tickets.as_slice(),
            CaseOutcome::Skipped { .. } => &[][..],
        })
    }

    pub fn created(&self) -> usize {
        self.tickets()
            .filter(|t| matches!(t, TicketOutcome::Created { .. }))
            .count()
    }

    pub fn unconfirmed(&self) -> usize {
        self.tickets()
            .filter(|t| matches!(t, TicketOutcome::Unconfirmed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.tickets()
            .filter(|t| matches!(t, TicketOutcome::Failed { .. }))
            .count()
    }

    pub fn submissions(&self) -> usize {
        self.tickets().count()
    }

    pub fn skipped(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, CaseOutcome::Skipped { .. }))
            .count()
    }

    /// Cases filed because the duplicate query errored
    pub fn query_failures(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| {
                matches!(
                    c.outcome,
                    CaseOutcome::Filed {
                        check: DuplicateCheck::QueryFailed(_),
                        ..
                    }
                )
            })
            .count()
    }
}

/// Drives one reporting run against a tracker
pub struct BugReporter<T: Tracker> {
    tracker: T,
    config: TrackerConfig,
    cache: DedupCache,
    state: ReporterState,
    dry_run: bool,
}

impl<T: Tracker> BugReporter<T> {
    pub fn new(tracker: T, config: TrackerConfig) -> Self {
        Self {
            tracker,
            config,
            cache: DedupCache::new(),
            state: ReporterState::Init,
            dry_run: false,
        }
    }

    /// Check duplicates but render tickets instead of submitting them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Run the whole flow. Login failure and a missing directory abort the
    /// run; per-case problems are recorded in the report.
    pub async fn run(&mut self, results_dir: &Path) -> ReportResult<RunReport> {
        let result = self.run_inner(results_dir).await;
        if let Err(e) = &result {
            error!("Reporting aborted: {}", e);
        }
        self.transition(ReporterState::Done);
        info!("Processing complete");
        result
    }

    async fn run_inner(&mut self, results_dir: &Path) -> ReportResult<RunReport> {
        self.tracker.login().await?;
        self.transition(ReporterState::LoggedIn);

        info!("Parsing test results in {}", results_dir.display());
        let index = scan_results(results_dir)?;
        self.transition(ReporterState::Scanned);

        let mut report = RunReport {
            results_dir: results_dir.to_path_buf(),
            files_parsed: index.files_parsed(),
            malformed_files: index.malformed().to_vec(),
            cases: Vec::new(),
        };

        if index.is_empty() {
            info!("No failed test cases found");
            return Ok(report);
        }
        info!("Found {} failed test case(s)", index.len());

        for case in index.iter() {
            self.transition(ReporterState::Checking);
            let check = check_duplicate(
                &self.tracker,
                &mut self.cache,
                self.config.match_strategy,
                &case.name,
            )
            .await?;

            if check.is_duplicate() {
                self.transition(ReporterState::Skipping);
                info!("Existing bug found, skipping: {}", case.name);
                report.cases.push(CaseReport {
                    case_name: case.name.clone(),
                    failures: case.records.len(),
                    outcome: CaseOutcome::Skipped { check },
                });
                continue;
            }

            self.transition(ReporterState::Creating);
            let mut tickets = Vec::with_capacity(case.records.len());
            for record in &case.records {
                let details = FailureDetails::from(record);
                let draft = TicketDraft::new(&case.name, &details, &self.config);

                let outcome = if self.dry_run {
                    info!("[dry run] Would create bug: {}", draft.title);
                    TicketOutcome::DryRun {
                        title: draft.title,
                        body: draft.body,
                    }
                } else {
                    file_ticket(&self.tracker, &mut self.cache, &draft).await?
                };
                tickets.push(outcome);
            }

            report.cases.push(CaseReport {
                case_name: case.name.clone(),
                failures: case.records.len(),
                outcome: CaseOutcome::Filed { check, tickets },
            });
        }

        Ok(report)
    }

    fn transition(&mut self, next: ReporterState) {
        debug!("Reporter state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
