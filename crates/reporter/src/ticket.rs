//! Bug ticket construction and submission

use qabridge_common::TrackerConfig;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::aggregate::FailureDetails;
use crate::dedup::DedupCache;
use crate::error::ReportResult;
use crate::tracker::Tracker;

/// Prefix shared by every automatically filed bug
pub const TITLE_PREFIX: &str = "[UI自动化失败] ";

/// Marker in the post-submit URL showing the tracker opened the new bug
const VIEW_MARKER: &str = "bug-view";

/// Ticket title for a case; also the dedup key
pub fn ticket_title(case_name: &str) -> String {
    format!("{}{}", TITLE_PREFIX, case_name)
}

/// Bug body in the tracker's markdown-ish steps field
pub fn render_body(details: &FailureDetails) -> String {
    format!(
        "\n**Failed case**: {full_name}\n\
         **Parameters**:\n{parameters}\n\n\
         **Error message**:\n{message}\n\n\
         **Stack trace**:\n{stack_trace}\n\n\
         **Steps**:\n{steps}\n\n\
         **Result file**: {source}\n",
        full_name = details.full_name,
        parameters = details.parameter_log(),
        message = details.message,
        stack_trace = details.stack_trace,
        steps = details.step_log(),
        source = details.source.display(),
    )
}

/// A bug ready to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDraft {
    pub title: String,
    pub body: String,
    pub product_id: u32,
    pub module_id: u32,
    pub opened_build: String,
    pub severity: u8,
    pub priority: u8,
    pub bug_type: String,
}

impl TicketDraft {
    pub fn new(case_name: &str, details: &FailureDetails, config: &TrackerConfig) -> Self {
        Self {
            title: ticket_title(case_name),
            body: render_body(details),
            product_id: config.product_id,
            module_id: config.module_id,
            opened_build: config.opened_build.clone(),
            severity: config.severity,
            priority: config.priority,
            bug_type: config.bug_type.clone(),
        }
    }

    /// Fields of the bug-create form
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("product", self.product_id.to_string()),
            ("module", self.module_id.to_string()),
            ("title", self.title.clone()),
            ("steps", self.body.clone()),
            ("openedBuild[]", self.opened_build.clone()),
            ("severity", self.severity.to_string()),
            ("type", self.bug_type.clone()),
            ("pri", self.priority.to_string()),
        ]
    }
}

/// What happened to one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TicketOutcome {
    /// Tracker redirected to the new bug's view page
    Created { title: String, url: String },
    /// Request went through but landed somewhere else; check the tracker by hand
    Unconfirmed { title: String, url: String },
    Failed { title: String, reason: String },
    /// Nothing submitted
    DryRun { title: String, body: String },
}

impl TicketOutcome {
    pub fn title(&self) -> &str {
        match self {
            TicketOutcome::Created { title, .. }
            | TicketOutcome::Unconfirmed { title, .. }
            | TicketOutcome::Failed { title, .. }
            | TicketOutcome::DryRun { title, .. } => title,
        }
    }
}

/// Submit `draft`; only a fatal session error is returned as `Err`
pub async fn file_ticket<T: Tracker + ?Sized>(
    tracker: &T,
    cache: &mut DedupCache,
    draft: &TicketDraft,
) -> ReportResult<TicketOutcome> {
    match tracker.submit_bug(draft).await {
        Ok(url) if url.contains(VIEW_MARKER) => {
            info!("Created bug: {}", draft.title);
            cache.insert(&draft.title);
            Ok(TicketOutcome::Created {
                title: draft.title.clone(),
                url,
            })
        }
        Ok(url) => {
            warn!("Bug creation may have failed, check the tracker: {} (landed on {})", draft.title, url);
            Ok(TicketOutcome::Unconfirmed {
                title: draft.title.clone(),
                url,
            })
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            error!("Failed to create bug {}: {}", draft.title, e);
            Ok(TicketOutcome::Failed {
                title: draft.title.clone(),
                reason: e.to_string(),
            })
        }
    }
}
