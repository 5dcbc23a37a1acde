//! Error handling for jlcprep
//!
//! This module provides unified error handling using anyhow for propagation
//! and a typed taxonomy for the failures each conversion step can report.

use anyhow::Context;
use std::path::Path;

pub type Result<T> = anyhow::Result<T>;

/// Extension trait for Results to add context with file paths
pub trait ResultExt<T> {
    /// Add context with file path information
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error> + Send + Sync + 'static,
{
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Failed to {} file: {}", operation, path.as_ref().display()))
    }
}

/// Specific error types for jlcprep conversion steps
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The step has nothing to convert; reported as a warning, not a failure.
    #[error("No {kind} CSV found in {folder}")]
    MissingInput { kind: String, folder: String },

    #[error("Required columns {missing:?} not found in {file}; header seen: {header:?}")]
    MissingColumns {
        file: String,
        missing: Vec<String>,
        header: Vec<String>,
    },

    #[error("No valid header line found in {file}")]
    NoValidHeader { file: String },

    #[error("Input file is empty: {file}")]
    EmptyInput { file: String },
}

impl ConvertError {
    /// Whether this error means the step should be skipped rather than failed
    pub fn is_skip(&self) -> bool {
        matches!(self, ConvertError::MissingInput { .. })
    }
}
