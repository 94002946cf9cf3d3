//! Search check cases
//!
//! A case is one keyword submitted on the homepage. Two cases are built in;
//! more can be declared as YAML files:
//!
//! ```yaml
//! name: test_webui_3
//! description: Search for a game title
//! keyword: 原神
//! tags: [smoke]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// One search check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCase {
    /// Unique case name; also names the evidence screenshots
    pub name: String,

    /// Query typed into the search box
    pub keyword: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering cases
    #[serde(default)]
    pub tags: Vec<String>,

    /// Qualified name recorded in the result artifact
    #[serde(default)]
    pub full_name: Option<String>,
}

impl SearchCase {
    pub fn new(name: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.into(),
            description: String::new(),
            tags: Vec::new(),
            full_name: None,
        }
    }

    /// The stock homepage cases
    pub fn builtin() -> Vec<Self> {
        vec![
            Self {
                description: "Search results for 今日头条".to_string(),
                tags: vec!["smoke".to_string()],
                ..Self::new("test_webui_1", "今日头条")
            },
            Self {
                description: "Search results for 王者荣耀".to_string(),
                tags: vec!["smoke".to_string()],
                ..Self::new("test_webui_2", "王者荣耀")
            },
        ]
    }

    pub fn full_name(&self) -> String {
        self.full_name
            .clone()
            .unwrap_or_else(|| format!("search.{}", self.name))
    }

    /// Parse a case from YAML
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let case: Self = serde_yaml::from_str(yaml)?;
        case.validate()?;
        Ok(case)
    }

    /// Parse a case from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all cases from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut cases = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            cases.push(Self::from_file(entry.path())?);
        }

        Ok(cases)
    }

    /// Filter cases by tag
    pub fn filter_by_tag<'a>(cases: &'a [Self], tag: &str) -> Vec<&'a Self> {
        cases.iter().filter(|c| c.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("case name is empty".to_string()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(E2eError::SpecParse(format!(
                "case name {:?} cannot contain path separators",
                self.name
            )));
        }
        if self.keyword.is_empty() {
            return Err(E2eError::SpecParse(format!("case {} has no keyword", self.name)));
        }
        Ok(())
    }
}
