//! Playwright browser automation
//!
//! Each case gets a fresh browser: a generated Node script launches it, runs
//! the search steps, captures screenshots and closes the browser in a
//! `finally` block. The script reports back one JSON line on stdout. The Node
//! process is killed if the Rust side drops it early.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use qabridge_common::DriverConfig;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::spec::SearchCase;

/// Chromium flags for CI containers
const BROWSER_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];

pub const STEP_OPEN: &str = "open homepage";
pub const STEP_SEARCH: &str = "submit search";
pub const STEP_VERIFY: &str = "verify result title";
pub const STEP_SCREENSHOT: &str = "capture evidence";

const SCRIPT_TEMPLATE: &str = r#"
const { chromium, firefox, webkit } = require('playwright');

(async () => {
  const browser = await __BROWSER__.launch({ headless: __HEADLESS__, args: __ARGS__ });
  const page = await browser.newPage({ viewport: { width: 1280, height: 720 } });
  const steps = [];
  const report = { success: false, homeTitle: null, finalTitle: null, screenshot: null, errorScreenshot: null, steps };

  const step = async (name, body) => {
    try {
      await body();
      steps.push({ name, status: 'passed' });
    } catch (error) {
      steps.push({ name, status: 'failed' });
      throw error;
    }
  };

  try {
    await step(__STEP_OPEN__, async () => {
      await page.goto(__BASE_URL__);
      await page.waitForTimeout(__SETTLE_MS__);
      report.homeTitle = await page.title();
      if (!report.homeTitle.includes(__IDENTITY__)) {
        throw new Error('homepage title check failed, actual title: ' + report.homeTitle);
      }
    });

    await step(__STEP_SEARCH__, async () => {
      const input = page.locator(__INPUT_SELECTOR__);
      await input.fill('');
      await input.fill(__KEYWORD__);
      await input.press('Enter');
      await page.waitForTimeout(__SETTLE_MS__);
    });

    await step(__STEP_VERIFY__, async () => {
      report.finalTitle = await page.title();
      const interstitial = __INTERSTITIAL__;
      const accepted = report.finalTitle.includes(__KEYWORD__)
        || (interstitial !== '' && report.finalTitle.includes(interstitial));
      if (!accepted) {
        throw new Error(__CASE__ + ' check failed, actual title: ' + report.finalTitle);
      }
    });

    await step(__STEP_SCREENSHOT__, async () => {
      await page.screenshot({ path: __SCREENSHOT__ });
      report.screenshot = __SCREENSHOT__;
    });

    report.success = true;
  } catch (error) {
    report.error = error.message;
    report.stack = error.stack;
    try {
      await page.screenshot({ path: __ERROR_SCREENSHOT__ });
      report.errorScreenshot = __ERROR_SCREENSHOT__;
    } catch (_) {}
  } finally {
    await browser.close();
  }

  console.log(JSON.stringify(report));
  process.exit(report.success ? 0 : 1);
})().catch((error) => {
  console.log(JSON.stringify({ stage: 'launch', success: false, error: error.message, stack: error.stack, steps: [] }));
  process.exit(2);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStep {
    pub name: String,
    pub status: String,
}

/// What the driver script printed for one case
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverReport {
    /// `launch` when the browser never started
    pub stage: Option<String>,
    pub success: bool,
    pub home_title: Option<String>,
    pub final_title: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub error_screenshot: Option<PathBuf>,
    pub error: Option<String>,
    pub stack: Option<String>,
    pub steps: Vec<DriverStep>,
}

impl DriverReport {
    /// Pick the report line out of the script's stdout
    pub fn from_stdout(stdout: &str) -> Option<Self> {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .find_map(|line| serde_json::from_str(line).ok())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"__[A-Z_]+__").expect("placeholder pattern is valid"))
}

fn js_string(value: &str) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

fn js_path(path: &Path) -> serde_json::Result<String> {
    serde_json::to_string(&path.to_string_lossy())
}

/// Whether the post-search title shows the query ran
pub fn title_accepted(title: &str, keyword: &str, interstitial_marker: &str) -> bool {
    title.contains(keyword) || (!interstitial_marker.is_empty() && title.contains(interstitial_marker))
}

/// Runs search cases in a Playwright-controlled browser
pub struct PlaywrightDriver {
    config: DriverConfig,
    browser: Browser,
    screenshot_dir: PathBuf,
}

impl PlaywrightDriver {
    /// Create a driver; fails when Node cannot load Playwright
    pub async fn new(config: DriverConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_binary).await?;
        Self::without_check(config)
    }

    /// Create a driver without probing Node, e.g. to render scripts
    pub fn without_check(config: DriverConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;
        let screenshot_dir = std::fs::canonicalize(&config.screenshot_dir)?;

        if config.headless {
            info!("Running browser headless");
        } else {
            info!("Running browser with a visible window");
        }

        Ok(Self {
            browser: Browser::parse(&config.browser),
            config,
            screenshot_dir,
        })
    }

    /// Check that `require('playwright')` resolves from the working directory
    async fn check_playwright_installed(node_binary: &str) -> E2eResult<()> {
        let status = Command::new(node_binary)
            .args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn screenshot_dir(&self) -> &Path {
        &self.screenshot_dir
    }

    /// Evidence screenshot written when a case passes
    pub fn result_screenshot(&self, case: &SearchCase) -> PathBuf {
        self.screenshot_dir.join(format!("{}_result.png", case.name))
    }

    /// Screenshot written when a case fails
    pub fn error_screenshot(&self, case: &SearchCase) -> PathBuf {
        self.screenshot_dir.join(format!("error_{}.png", case.name))
    }

    /// Build the Node script for one case
    pub fn build_script(&self, case: &SearchCase) -> E2eResult<String> {
        let selector = format!("[name=\"{}\"]", self.config.search_input);
        let values: HashMap<&str, String> = HashMap::from([
            ("__BROWSER__", self.browser.as_str().to_string()),
            ("__HEADLESS__", self.config.headless.to_string()),
            ("__ARGS__", serde_json::to_string(BROWSER_ARGS)?),
            ("__STEP_OPEN__", js_string(STEP_OPEN)?),
            ("__STEP_SEARCH__", js_string(STEP_SEARCH)?),
            ("__STEP_VERIFY__", js_string(STEP_VERIFY)?),
            ("__STEP_SCREENSHOT__", js_string(STEP_SCREENSHOT)?),
            ("__BASE_URL__", js_string(&self.config.base_url)?),
            ("__SETTLE_MS__", self.config.settle_ms.to_string()),
            ("__IDENTITY__", js_string(&self.config.identity_marker)?),
            ("__INPUT_SELECTOR__", js_string(&selector)?),
            ("__KEYWORD__", js_string(&case.keyword)?),
            ("__INTERSTITIAL__", js_string(&self.config.interstitial_marker)?),
            ("__CASE__", js_string(&case.name)?),
            ("__SCREENSHOT__", js_path(&self.result_screenshot(case))?),
            ("__ERROR_SCREENSHOT__", js_path(&self.error_screenshot(case))?),
        ]);

        // Single pass over the template so inserted values are never rescanned
        let script = placeholder_pattern().replace_all(SCRIPT_TEMPLATE, |caps: &Captures| {
            values
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });

        Ok(script.into_owned())
    }

    /// Run one case in a fresh browser
    pub async fn run_case(&self, case: &SearchCase) -> E2eResult<DriverReport> {
        let script = self.build_script(case)?;
        debug!("Running Playwright script for {}", case.name);

        let mut child = Command::new(&self.config.node_binary)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let report = DriverReport::from_stdout(&stdout).ok_or_else(|| {
            E2eError::Playwright(format!(
                "Script produced no report (exit {:?}):\nstdout: {}\nstderr: {}",
                output.status.code(),
                stdout,
                stderr
            ))
        })?;

        if report.stage.as_deref() == Some("launch") {
            return Err(E2eError::BrowserLaunch(
                report.error.unwrap_or_else(|| stderr.to_string()),
            ));
        }

        Ok(report)
    }
}
