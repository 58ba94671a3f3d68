//! Error types for Spectrum
//!
//! Each subsystem owns its error enum; this one is what the manager surfaces
//! to the host. Settings and plugin failures are logged during startup and
//! never returned, and hotkey calls return [`HotkeyError`](crate::HotkeyError)
//! directly.

use thiserror::Error;

use crate::manager::ManagerState;
use crate::scripts::ScriptError;

/// Errors the manager reports to its caller
#[derive(Debug, Error)]
pub enum ManagerError {
    /// `update` was called outside the `Running` state
    #[error("Manager is not running (state: {0:?})")]
    NotRunning(ManagerState),

    /// The scripts subsystem was never started
    #[error("Scripts are not loaded")]
    ScriptsDisabled,

    /// Script loading or execution errors
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

/// Result type alias for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;
