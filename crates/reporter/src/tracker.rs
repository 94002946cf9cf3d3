//! ZenTao session over its HTML form endpoints
//!
//! The tracker is driven the way a browser would drive it: a cookie-keeping
//! client logs in once, then issues search and bug-create form requests. There
//! is no re-login; if the session dies mid-run the remaining calls fail.

use std::time::Duration;

use async_trait::async_trait;
use qabridge_common::TrackerConfig;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};
use crate::ticket::TicketDraft;

/// Transport for tracker queries and submissions
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Establish the authenticated session
    async fn login(&mut self) -> ReportResult<()>;

    /// Fetch the active-bug search page for `title`, returning the raw body
    async fn search_active(&self, title: &str) -> ReportResult<String>;

    /// Submit a new bug, returning the URL the tracker finally landed on
    async fn submit_bug(&self, draft: &TicketDraft) -> ReportResult<String>;
}

/// Authenticated ZenTao session
pub struct ZentaoSession {
    config: TrackerConfig,
    client: Option<reqwest::Client>,
}

impl ZentaoSession {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_some()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn client(&self) -> ReportResult<&reqwest::Client> {
        self.client.as_ref().ok_or(ReportError::NotLoggedIn)
    }
}

#[async_trait]
impl Tracker for ZentaoSession {
    async fn login(&mut self) -> ReportResult<()> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()?;

        let url = self.config.page_url("user-login.html");
        let form = [
            ("account", self.config.account.as_str()),
            ("password", self.config.password.as_str()),
            ("keepLogin", "on"),
        ];

        let response = client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ReportError::Login(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Login(format!("HTTP {} from {}", status, url)));
        }

        info!("Logged in to tracker at {} as {}", self.config.tracker_url, self.config.account);
        self.client = Some(client);
        Ok(())
    }

    async fn search_active(&self, title: &str) -> ReportResult<String> {
        let client = self.client()?;
        let product_id = self.config.product_id.to_string();
        let url = self
            .config
            .page_url(&format!("bug-search-{}.html", self.config.product_id));

        debug!("Searching tracker for {:?}", title);
        let body = client
            .get(&url)
            .query(&[
                ("productID", product_id.as_str()),
                ("searchTitle", title),
                ("status", "active"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(body)
    }

    async fn submit_bug(&self, draft: &TicketDraft) -> ReportResult<String> {
        let client = self.client()?;
        let url = self.config.page_url(&format!(
            "bug-create-{}-{}.html",
            draft.product_id, draft.module_id
        ));

        let response = client
            .post(&url)
            .form(&draft.form_fields())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.url().to_string())
    }
}
