use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;

use super::Plugin;

/// The manager's record of one loaded plugin.
pub struct PluginDescriptor {
    id: String,
    path: Option<PathBuf>,
    enabled: bool,
    updatable: bool,
    plugin: Box<dyn Plugin>,
    // Declared after `plugin`: the instance must be dropped before its code is unmapped.
    _library: Option<Arc<Library>>,
}

impl PluginDescriptor {
    pub(crate) fn new(
        id: String,
        path: Option<PathBuf>,
        mut plugin: Box<dyn Plugin>,
        library: Option<Arc<Library>>,
    ) -> Self {
        let updatable = plugin.as_updatable().is_some();
        Self {
            id,
            path,
            enabled: true,
            updatable,
            plugin,
            _library: library,
        }
    }

    /// Identity derived from the source module's name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// File the plugin was loaded from; `None` for statically linked modules.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the instance exposes an update operation.
    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    pub(crate) fn plugin_mut(&mut self) -> &mut dyn Plugin {
        self.plugin.as_mut()
    }

    pub(crate) fn update(&mut self) -> anyhow::Result<()> {
        match self.plugin.as_updatable() {
            Some(updatable) => updatable.update(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("name", &self.plugin.friendly_name())
            .field("path", &self.path)
            .field("enabled", &self.enabled)
            .field("updatable", &self.updatable)
            .field("dynamic", &self._library.is_some())
            .finish()
    }
}
