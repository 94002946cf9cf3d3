//! QaBridge Defect Reporter
//!
//! Turns failed test result artifacts into ZenTao bugs:
//!
//! ```text
//! results dir ──► scan_results() ──► FailureIndex
//!                                        │ per case, first-seen order
//!                                        ▼
//!                 check_duplicate() ── duplicate ──► skip
//!                                        │ not found / query failed
//!                                        ▼
//!                 file_ticket() once per failing record
//! ```
//!
//! [`BugReporter`] owns the tracker session and the dedup cache for one run.

pub mod aggregate;
pub mod dedup;
pub mod error;
pub mod reporter;
pub mod scanner;
pub mod ticket;
pub mod tracker;

pub use aggregate::FailureDetails;
pub use dedup::{DedupCache, DuplicateCheck};
pub use error::{ReportError, ReportResult};
pub use reporter::{BugReporter, CaseOutcome, CaseReport, ReporterState, RunReport};
pub use scanner::{scan_results, FailureIndex, TestResultRecord};
pub use ticket::{ticket_title, TicketDraft, TicketOutcome, TITLE_PREFIX};
pub use tracker::{Tracker, ZentaoSession};
