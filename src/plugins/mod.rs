//! Compiled plugin extensions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  scan   ┌──────────────┐ validate ┌─────────────────┐
//! │ModuleScanner │ ──────► │ PluginModule │ ───────► │ PluginContainer │
//! │ Dylib/Static │         │ EntryPoints  │  Loader  │  Descriptors    │
//! └──────────────┘         └──────────────┘          └─────────────────┘
//! ```
//!
//! A plugin library exports its entry points with [`declare_plugin!`]:
//!
//! ```ignore
//! use spectrum::plugins::{Plugin, PluginHost};
//!
//! #[derive(Default)]
//! struct Camera;
//!
//! impl Plugin for Camera {
//!     fn friendly_name(&self) -> &str { "Camera" }
//!     fn author(&self) -> &str { "someone" }
//!     fn compatible_api_level(&self) -> u32 { 1 }
//!     fn initialize(&mut self, host: &mut dyn PluginHost) -> anyhow::Result<()> {
//!         host.log().info("Camera ready");
//!         Ok(())
//!     }
//! }
//!
//! spectrum::declare_plugin!(Camera);
//! ```

mod container;
mod descriptor;
mod error;
mod loader;
mod module;

pub use container::PluginContainer;
pub use descriptor::PluginDescriptor;
pub use error::{PluginError, PluginResult};
pub use loader::{LoadReport, PluginLoader};
pub use module::{
    DylibScanner, EntryPoints, ModuleScanner, PluginFactory, PluginModule, RegisterFn,
    StaticModules, ENTRY_POINTS_SYMBOL,
};

use crate::hotkeys::{Hotkey, HotkeyAction, HotkeyError};
use crate::logging::SubsystemLog;

/// Contact shown for plugins that do not provide one.
pub const NO_CONTACT: &str = "No contact provided.";

/// The contract every plugin entry point implements.
pub trait Plugin {
    fn friendly_name(&self) -> &str;

    fn author(&self) -> &str;

    fn contact(&self) -> &str {
        NO_CONTACT
    }

    /// Must equal the host's API level for the plugin to load.
    fn compatible_api_level(&self) -> u32;

    /// Called once after every plugin has been loaded.
    fn initialize(&mut self, host: &mut dyn PluginHost) -> anyhow::Result<()>;

    /// Called once at teardown.
    fn shutdown(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The optional per-tick capability. Return `Some(self)` to receive updates.
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        None
    }
}

/// Per-tick behaviour of a plugin.
pub trait Updatable {
    fn update(&mut self) -> anyhow::Result<()>;
}

/// The manager handle passed to [`Plugin::initialize`].
pub trait PluginHost {
    /// Bind `action` to `hotkey`. Refused if any script or action already holds it.
    fn add_hotkey(&mut self, hotkey: Hotkey, action: HotkeyAction) -> Result<(), HotkeyError>;

    fn api_level(&self) -> u32;

    fn log(&self) -> &SubsystemLog;
}

/// Export the `spectrum_entry_points` function for a plugin library.
///
/// The plugin type must implement [`Plugin`] and [`Default`]. The export uses
/// the Rust ABI, so the library must be built with the same compiler and
/// `spectrum` version as the host.
#[macro_export]
macro_rules! declare_plugin {
    ($plugin:ty) => {
        #[no_mangle]
        pub fn spectrum_entry_points(entries: &mut $crate::plugins::EntryPoints) {
            entries.register(|| -> ::std::boxed::Box<dyn $crate::plugins::Plugin> {
                ::std::boxed::Box::new(<$plugin as ::std::default::Default>::default())
            });
        }
    };
}
