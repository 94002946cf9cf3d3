//! QaBridge Common Library
//!
//! Shared configuration and the result-artifact model used by both the UI
//! check runner and the defect reporter.

pub mod artifact;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use artifact::{
    ArtifactAttachment, ArtifactFailure, ArtifactParameter, ArtifactStatus, ArtifactStep,
    ResultArtifact, MISSING_VALUE, RESULT_SUFFIX,
};
pub use config::{DriverConfig, MatchStrategy, QaBridgeConfig, TrackerConfig};
pub use error::{Error, Result};

/// QaBridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
