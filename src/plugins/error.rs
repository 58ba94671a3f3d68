//! Error types for the plugin system.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering or loading plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to scan plugin directory {path}: {message}")]
    Scan { path: PathBuf, message: String },

    #[error("Failed to open module '{module}': {source}")]
    Library {
        module: String,
        #[source]
        source: libloading::Error,
    },

    #[error("Module '{0}' exposes no plugin entry point")]
    NoEntryPoint(String),

    #[error("Module '{module}' exposes {count} plugin entry points; exactly one is required")]
    MultipleEntryPoints { module: String, count: usize },

    #[error("Plugin '{module}' targets API level {declared}, host supports {supported}")]
    IncompatibleApiLevel {
        module: String,
        declared: u32,
        supported: u32,
    },

    #[error("Plugin '{0}' is already loaded")]
    DuplicateIdentity(String),

    #[error("Plugin '{module}' panicked while being created: {message}")]
    Construction { module: String, message: String },
}

impl PluginError {
    /// Module the error refers to, when there is one.
    pub fn module(&self) -> Option<&str> {
        match self {
            PluginError::Library { module, .. }
            | PluginError::MultipleEntryPoints { module, .. }
            | PluginError::IncompatibleApiLevel { module, .. }
            | PluginError::Construction { module, .. } => Some(module),
            PluginError::NoEntryPoint(module) | PluginError::DuplicateIdentity(module) => {
                Some(module)
            }
            PluginError::DirectoryNotFound(_) | PluginError::Scan { .. } => None,
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
