// ABOUTME: Error types for Daybook operations
// ABOUTME: Defines DaybookError enum covering all failure modes

use thiserror::Error;

/// Errors that can occur during Daybook operations
#[derive(Error, Debug)]
pub enum DaybookError {
    /// I/O error reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Extraction oracle output could not be understood
    #[error("Extract error: {0}")]
    Extract(String),

    /// Extract payload did not match the expected shape
    #[error("Schema error: {0}")]
    Schema(String),

    /// Git or GitHub CLI operation failed
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration or argument could not be resolved
    #[error("Config error: {0}")]
    Config(String),

    /// A requested project or pull request does not exist
    #[error("{0}")]
    NotFound(String),

    /// Lint found records that the parser would drop
    #[error("{0} lint warning(s) found")]
    Lint(usize),

    /// Clipboard copy failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}
