//! Error types for geostack-check.
//!
//! Uses thiserror for structured errors with context. Every condition is
//! fatal to a run, so errors are designed to:
//! - Name the condition that stopped the pipeline
//! - Carry the original diagnostic detail (paths, URLs, captured stderr)
//! - Render as a single line for the operator

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a validation run.
///
/// One variant per failure condition a stage can raise, plus
/// [`HarnessError::InvalidSettings`] for problems found while assembling
/// settings before any stage runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("configuration file {} is missing", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("configuration file {} is malformed: {detail}", path.display())]
    ConfigMalformed { path: PathBuf, detail: String },

    #[error("configuration is missing sections: {}", missing.join(", "))]
    ConfigIncomplete { missing: Vec<String> },

    #[error("configuration value {field} must be {expected:?}, found {}", display_actual(actual))]
    ConfigValueMismatch {
        field: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("command `{command}` failed: {detail}")]
    ExternalCommandFailed { command: String, detail: String },

    #[error("request to {url} failed: {detail}")]
    Network { url: String, detail: String },

    #[error("response from {source_name} is not valid JSON: {detail}")]
    ResponseParse { source_name: String, detail: String },

    #[error("search response did not populate {path}")]
    ParsedFieldMissing { path: String },

    #[error("no search result name contains {expected:?}")]
    CustomRecordNotFound { expected: String },

    #[error("expected more than {threshold} documents, found {count}")]
    InsufficientDocumentCount { count: u64, threshold: u64 },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

fn display_actual(actual: &Option<String>) -> String {
    match actual {
        Some(value) => format!("{value:?}"),
        None => "nothing".to_string(),
    }
}

impl HarnessError {
    /// Name of the failure condition, stable across message wording changes.
    pub fn condition(&self) -> &'static str {
        match self {
            HarnessError::ConfigMissing { .. } => "ConfigMissing",
            HarnessError::ConfigMalformed { .. } => "ConfigMalformed",
            HarnessError::ConfigIncomplete { .. } => "ConfigIncomplete",
            HarnessError::ConfigValueMismatch { .. } => "ConfigValueMismatch",
            HarnessError::ExternalCommandFailed { .. } => "ExternalCommandFailed",
            HarnessError::Network { .. } => "NetworkError",
            HarnessError::ResponseParse { .. } => "ResponseParseError",
            HarnessError::ParsedFieldMissing { .. } => "ParsedFieldMissing",
            HarnessError::CustomRecordNotFound { .. } => "CustomRecordNotFound",
            HarnessError::InsufficientDocumentCount { .. } => "InsufficientDocumentCount",
            HarnessError::InvalidSettings(_) => "InvalidSettings",
        }
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            HarnessError::ConfigMissing { path } => {
                Some(format!("Create {} or point GEOSTACK_CONFIG at it", path.display()))
            }
            HarnessError::ConfigIncomplete { missing } => {
                Some(format!("Add the {} section(s) to pelias.json", missing.join(", ")))
            }
            HarnessError::Network { .. } => {
                Some("Check that the API container is up and PELIAS_URL is correct".to_string())
            }
            HarnessError::InsufficientDocumentCount { .. } => {
                Some("Re-run the import profile and wait for indexing to finish".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
