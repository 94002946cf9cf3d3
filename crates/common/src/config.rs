//! Layered configuration
//!
//! Configuration is read from TOML files merged key by key. Files later in the
//! list win, so the default search order (home file, then project file) lets a
//! project override individual keys of a user's global settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the per-user config file in `$HOME`
pub const HOME_CONFIG_FILE: &str = ".qabridge.toml";

/// Name of the project-local config file
pub const PROJECT_CONFIG_FILE: &str = "qabridge.toml";

/// Environment variable toggling headless browser runs
pub const HEADLESS_ENV: &str = "USING_HEADLESS";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QaBridgeConfig {
    /// Issue tracker connection and ticket metadata
    pub tracker: TrackerConfig,

    /// Browser driver settings for the UI check
    pub driver: DriverConfig,
}

/// How search results are matched against a ticket title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Title appears anywhere in the response body
    #[default]
    Substring,
    /// Title equals the text of a bug link in the result list
    Exact,
}

/// Tracker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the ZenTao instance, without a trailing page name
    pub tracker_url: String,

    pub account: String,

    pub password: String,

    pub product_id: u32,

    pub module_id: u32,

    /// Value sent as `openedBuild[]`
    pub opened_build: String,

    pub severity: u8,

    pub priority: u8,

    /// ZenTao bug type, e.g. `codeerror`
    pub bug_type: String,

    pub match_strategy: MatchStrategy,

    pub request_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker_url: "http://127.0.0.1:8081/zentao".to_string(),
            account: String::new(),
            password: String::new(),
            product_id: 0,
            module_id: 0,
            opened_build: "trunk".to_string(),
            severity: 3,
            priority: 3,
            bug_type: "codeerror".to_string(),
            match_strategy: MatchStrategy::Substring,
            request_timeout_secs: 30,
        }
    }
}

impl TrackerConfig {
    /// Check that the settings are usable for a login
    pub fn validate(&self) -> Result<()> {
        if self.tracker_url.trim().is_empty() {
            return Err(Error::InvalidConfig("tracker_url is empty".to_string()));
        }
        if !self.tracker_url.starts_with("http://") && !self.tracker_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "tracker_url must be an http(s) URL: {}",
                self.tracker_url
            )));
        }
        if self.account.is_empty() {
            return Err(Error::InvalidConfig("tracker account is empty".to_string()));
        }
        if self.product_id == 0 {
            return Err(Error::InvalidConfig("product_id must be set".to_string()));
        }
        Ok(())
    }

    /// Absolute URL of a tracker page such as `user-login.html`
    pub fn page_url(&self, page: &str) -> String {
        format!("{}/{}", self.tracker_url.trim_end_matches('/'), page)
    }
}

/// Browser driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Playwright browser: chromium, firefox or webkit
    pub browser: String,

    pub headless: bool,

    /// Homepage under test
    pub base_url: String,

    /// `name` attribute of the search input
    pub search_input: String,

    /// Text the homepage title must contain
    pub identity_marker: String,

    /// Title text shown when the engine interposes a captcha page
    pub interstitial_marker: String,

    /// Pause after navigation and after submitting a query
    pub settle_ms: u64,

    pub screenshot_dir: PathBuf,

    /// Where result artifacts are written
    pub results_dir: PathBuf,

    pub node_binary: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: "chromium".to_string(),
            headless: false,
            base_url: "https://www.baidu.com".to_string(),
            search_input: "wd".to_string(),
            identity_marker: "百度".to_string(),
            interstitial_marker: "安全验证".to_string(),
            settle_ms: 2000,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            results_dir: PathBuf::from("allure-results"),
            node_binary: "node".to_string(),
        }
    }
}

impl DriverConfig {
    /// Apply `USING_HEADLESS` from the process environment
    pub fn apply_env(&mut self) {
        if let Some(headless) = parse_headless(std::env::var(HEADLESS_ENV).ok().as_deref()) {
            self.headless = headless;
        }
    }
}

/// Interpret a `USING_HEADLESS` value; anything but `true` (any case) means false
pub fn parse_headless(value: Option<&str>) -> Option<bool> {
    value.map(|v| v.trim().eq_ignore_ascii_case("true"))
}

impl QaBridgeConfig {
    /// Load and merge config files in order; missing files are skipped
    pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut merged = toml::Table::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                debug!("Config file {} not present, skipping", path.display());
                continue;
            }

            let content = std::fs::read_to_string(path)?;
            let table: toml::Table = content.parse().map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

            debug!("Merging config from {}", path.display());
            merge_tables(&mut merged, table);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| Error::InvalidConfig(e.to_string()))
    }

    /// Load from the default search path: `$HOME/.qabridge.toml`, then `./qabridge.toml`
    pub fn load_default() -> Result<Self> {
        Self::load_layered(&default_search_paths())
    }

    /// Copy with the tracker password masked
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.tracker.password.is_empty() {
            shown.tracker.password = "********".to_string();
        }
        shown
    }

    /// Render as TOML with the password masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Config files consulted by default, lowest precedence first
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(HOME_CONFIG_FILE));
    }
    paths.push(PathBuf::from(PROJECT_CONFIG_FILE));
    paths
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
