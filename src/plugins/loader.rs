use std::path::{Path, PathBuf};

use super::container::PluginContainer;
use super::descriptor::PluginDescriptor;
use super::error::{PluginError, PluginResult};
use super::module::{ModuleScanner, PluginModule};

/// Outcome of one loading pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Identities added to the container, in load order.
    pub loaded: Vec<String>,
    /// Modules that were skipped, one error each.
    pub failures: Vec<PluginError>,
}

/// Validates discovered modules and fills a [`PluginContainer`].
#[derive(Debug, Clone)]
pub struct PluginLoader {
    directory: PathBuf,
    api_level: u32,
}

impl PluginLoader {
    pub fn new(directory: impl Into<PathBuf>, api_level: u32) -> Self {
        Self {
            directory: directory.into(),
            api_level,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    pub fn can_load(&self) -> bool {
        self.directory.is_dir()
    }

    /// Load every module `scanner` finds in the plugin directory.
    ///
    /// A module that fails validation is recorded in the report and skipped;
    /// the others still load. Does nothing if the directory does not exist.
    pub fn load_plugins(
        &self,
        scanner: &mut dyn ModuleScanner,
        container: &mut PluginContainer,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        if !self.can_load() {
            tracing::warn!(
                "Plugin directory {} does not exist, no plugins loaded",
                self.directory.display()
            );
            return report;
        }

        for candidate in scanner.scan(&self.directory) {
            let outcome = candidate.and_then(|module| {
                if container.contains(module.name()) {
                    return Err(PluginError::DuplicateIdentity(module.name().to_string()));
                }
                let descriptor = self.instantiate(module)?;
                let id = descriptor.id().to_string();
                container.push(descriptor)?;
                Ok(id)
            });

            match outcome {
                Ok(id) => {
                    tracing::info!("Loaded plugin '{}'", id);
                    report.loaded.push(id);
                }
                Err(e) => {
                    tracing::warn!("Skipping plugin module: {}", e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    fn instantiate(&self, module: PluginModule) -> PluginResult<PluginDescriptor> {
        // Bound first so it is dropped last: nothing from the module may outlive its code.
        let library = module.library;
        let name = module.name;
        let path = module.path;

        let mut factories = module.entry_points.into_factories();
        let factory = match factories.len() {
            0 => return Err(PluginError::NoEntryPoint(name)),
            1 => factories.remove(0),
            count => return Err(PluginError::MultipleEntryPoints { module: name, count }),
        };

        let mut created = None;
        crate::dispatch::isolate(|| {
            created = Some(factory());
            Ok(())
        })
        .map_err(|e| PluginError::Construction {
            module: name.clone(),
            message: e.to_string(),
        })?;
        drop(factory);

        let plugin = created.ok_or_else(|| PluginError::Construction {
            module: name.clone(),
            message: "factory produced no instance".to_string(),
        })?;

        let declared = plugin.compatible_api_level();
        if declared != self.api_level {
            return Err(PluginError::IncompatibleApiLevel {
                module: name,
                declared,
                supported: self.api_level,
            });
        }

        Ok(PluginDescriptor::new(name, path, plugin, library))
    }
}
