//! Per-entry failure isolation and tick results.
//!
//! Every script run, hotkey action and plugin call goes through [`isolate`],
//! which turns both `Err` returns and panics into an `anyhow::Error` so one
//! misbehaving extension cannot take down the tick.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::hotkeys::Hotkey;
use crate::logging::sanitize_message;

/// Run one extension callback, converting a panic into an error.
pub fn isolate<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    sanitize_message(&message)
}

/// What failed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSource {
    /// Script bound to a hotkey
    Script { hotkey: Hotkey, script: String },
    /// Action bound to a hotkey
    Action { hotkey: Hotkey, owner: String },
    /// Plugin update
    Plugin(String),
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSource::Script { hotkey, script } => {
                write!(f, "script '{script}' (hotkey {hotkey})")
            }
            FailureSource::Action { hotkey, owner } => {
                write!(f, "action of '{owner}' (hotkey {hotkey})")
            }
            FailureSource::Plugin(id) => write!(f, "plugin '{id}'"),
        }
    }
}

/// One isolated failure.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub source: FailureSource,
    pub message: String,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.source, self.message)
    }
}

/// Summary of one `update` call.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub scripts_executed: usize,
    pub actions_invoked: usize,
    pub plugins_updated: usize,
    pub failures: Vec<DispatchFailure>,
}

impl TickReport {
    /// Nothing ran and nothing failed.
    pub fn is_idle(&self) -> bool {
        self.scripts_executed == 0
            && self.actions_invoked == 0
            && self.plugins_updated == 0
            && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_passes_through_results() {
        assert!(isolate(|| Ok(())).is_ok());
        let err = isolate(|| Err(anyhow::anyhow!("nope"))).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_isolate_catches_panics() {
        let err = isolate(|| panic!("plugin exploded")).unwrap_err();
        assert_eq!(err.to_string(), "panicked: plugin exploded");

        let owned = String::from("formatted 42");
        let err = isolate(move || panic!("{owned}")).unwrap_err();
        assert!(err.to_string().contains("formatted 42"));
    }

    #[test]
    fn test_default_report_is_idle() {
        assert!(TickReport::default().is_idle());
    }
}
