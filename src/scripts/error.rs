//! Error types for the script subsystem.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Script '{0}' not found")]
    NotFound(String),

    #[error("Invalid script identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Failed to read script '{id}': {source}")]
    Read {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    #[error("Script '{id}' failed: {source:#}")]
    Execution {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type ScriptResult<T> = Result<T, ScriptError>;
