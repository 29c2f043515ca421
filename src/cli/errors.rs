//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code. Messages
//! start with the bracketed error code, matching `DbfError`.

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::DbfError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Table operation failed
    #[error("{0}")]
    Table(#[from] DbfError),

    /// Could not read or write a file
    #[error("[DBF_CLI_FILE_ERROR] {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// stdout write failed
    #[error("[DBF_CLI_OUTPUT_ERROR] {0}")]
    Output(#[from] std::io::Error),

    /// Malformed JSON input
    #[error("[DBF_CLI_JSON_ERROR] {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration or definition rejected
    #[error("[DBF_CLI_CONFIG_ERROR] {0}")]
    Config(String),
}

impl CliError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::File {
            path: path.into(),
            source,
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Table(err) => err.code().code(),
            CliError::File { .. } => "DBF_CLI_FILE_ERROR",
            CliError::Output(_) => "DBF_CLI_OUTPUT_ERROR",
            CliError::Json(_) => "DBF_CLI_JSON_ERROR",
            CliError::Config(_) => "DBF_CLI_CONFIG_ERROR",
        }
    }
}
