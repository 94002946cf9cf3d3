//! Error types for defect reporting

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Result directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Tracker login failed: {0}")]
    Login(String),

    #[error("Tracker session used before login")]
    NotLoggedIn,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Errors that must stop the run rather than be logged per item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReportError::NotFound(_) | ReportError::Login(_) | ReportError::NotLoggedIn
        )
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
