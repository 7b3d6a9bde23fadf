//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::errors::GcdsError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Gcds(#[from] GcdsError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Empty input")]
    EmptyInput,
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Gcds(e) => e.code(),
            CliError::Json(_) => "GCDS_CLI_INVALID_JSON",
            CliError::Io(_) => "GCDS_CLI_IO_ERROR",
            CliError::EmptyInput => "GCDS_CLI_EMPTY_INPUT",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
