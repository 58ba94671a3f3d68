//! Spectrum - in-process extension manager for a host game.
//!
//! Spectrum discovers two kinds of extensions, scripts and compiled plugins,
//! starts them once per session and routes hotkeys to them on every host
//! update tick.
//!
//! # Architecture
//!
//! - [`hotkeys`] - Hotkey values, host input, and the combined hotkey registry
//! - [`plugins`] - Plugin contract, descriptors, container, discovery and loading
//! - [`scripts`] - Script discovery, loading and execution
//! - [`settings`] - Flat key/value settings files
//! - [`logging`] - Subsystem log file and `tracing` bootstrap
//! - [`config`] - Directory configuration
//! - [`dispatch`] - Failure isolation and per-tick reports
//! - [`manager`] - The orchestrator the host drives
//!
//! # Example
//!
//! ```ignore
//! use spectrum::{Manager, ManagerConfig, PressedKeys};
//!
//! let mut manager = Manager::launch(ManagerConfig::default());
//!
//! // Every host frame:
//! let input = PressedKeys::new();
//! let report = manager.update(&input)?;
//! ```

pub mod config;
pub mod dispatch;
pub mod hotkeys;
pub mod logging;
pub mod manager;
pub mod plugins;
pub mod scripts;
pub mod settings;

mod error;

pub use config::{ManagerConfig, API_LEVEL};
pub use dispatch::{DispatchFailure, FailureSource, TickReport};
pub use error::{ManagerError, ManagerResult};
pub use hotkeys::{
    Hotkey, HotkeyAction, HotkeyError, HotkeyOwner, HotkeyRegistry, InputSource, PressedKeys,
};
pub use logging::SubsystemLog;
pub use manager::{Manager, ManagerBuilder, ManagerState};
pub use plugins::{Plugin, PluginContainer, PluginDescriptor, PluginError, PluginHost, Updatable};
pub use scripts::{ScriptError, ScriptExecutor, ScriptHandle, ScriptLoader, ScriptRuntime};
pub use settings::Settings;
