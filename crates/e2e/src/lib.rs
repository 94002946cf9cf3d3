//! QaBridge UI check
//!
//! Drives a real browser through Playwright to check that a keyword search
//! on the homepage lands on a results page. Each case leaves:
//! - a screenshot (`<case>_result.png` or `error_<case>.png`)
//! - a `<uuid>-result.json` artifact that the defect reporter scans
//!
//! ```text
//! SearchCase ──▶ PlaywrightDriver ──▶ DriverReport
//!                                         │
//!                      SearchCheckRunner ◀┘
//!                        ├── verify_title()
//!                        ├── build_artifact() ──▶ results_dir/<uuid>-result.json
//!                        └── write_results()  ──▶ results_dir/check-results.json
//! ```

pub mod error;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use playwright::{Browser, DriverReport, PlaywrightDriver};
pub use runner::{CheckResult, CheckSuiteResult, SearchCheckRunner};
pub use spec::SearchCase;
