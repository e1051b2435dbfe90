// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line error type.

use flowdeck_store::{ConfigError, FlowFormatError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by `flowdeck` commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Store configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Flow document is invalid
    #[error(transparent)]
    Flow(#[from] FlowFormatError),

    /// Simulation script is invalid
    #[error("Invalid simulation script: {0}")]
    Script(#[source] serde_json::Error),

    /// Output could not be serialized
    #[error("Failed to serialize output: {0}")]
    Output(#[source] serde_json::Error),

    /// Async runtime could not be started
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;

/// Read a whole file, tagging errors with the path
pub fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
