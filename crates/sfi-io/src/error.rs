//! Error types for sfi-io

use std::path::PathBuf;

use sfi_inp::{DeckError, ParseError};
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, IoError>;

/// Inconsistent part, node or instance data in the assembly.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct AssemblyError {
    pub line: usize,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Deck error: {0}")]
    Deck(#[from] DeckError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Rule script {path}: {message}")]
    Rules { path: PathBuf, message: String },

    /// A stage before deck generation failed; nothing was written.
    #[error("No mesh data: {0}")]
    NoMeshData(String),

    #[error("Python error: {0}")]
    Python(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for IoError {
    fn from(err: pyo3::PyErr) -> Self {
        IoError::Python(format!("{}", err))
    }
}
