//! Hotkeys: values, host input, and the combined registry.

mod input;
mod key;
mod registry;

use std::fmt;
use thiserror::Error;

pub use input::{InputSource, PressedKeys};
pub use key::{Hotkey, Key, Modifiers, NamedKey};
pub use registry::{BoundAction, HotkeyAction, HotkeyRegistry};

/// Current holder of a hotkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyOwner {
    /// Bound to a script identifier
    Script(String),
    /// Bound to an action registered by `owner`
    Action { owner: String },
}

impl fmt::Display for HotkeyOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyOwner::Script(id) => write!(f, "script '{id}'"),
            HotkeyOwner::Action { owner } => write!(f, "an action registered by '{owner}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyError {
    #[error("Invalid hotkey '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Hotkey '{hotkey}' is already assigned to {owner}")]
    Conflict { hotkey: Hotkey, owner: HotkeyOwner },
}
