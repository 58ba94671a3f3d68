//! Plugin modules and how they are discovered.
//!
//! A module is one unit of plugin code: a dynamic library in the plugin
//! directory, or a registration function linked into the host. Either way it
//! exposes its entry points by filling an [`EntryPoints`] collector; the
//! loader then decides whether the module is usable.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use walkdir::WalkDir;

use super::error::{PluginError, PluginResult};
use super::Plugin;

/// Name of the function every plugin library exports.
///
/// See [`declare_plugin!`](crate::declare_plugin).
pub const ENTRY_POINTS_SYMBOL: &[u8] = b"spectrum_entry_points";

/// Signature of the exported registration function.
pub type RegisterFn = fn(&mut EntryPoints);

/// Creates one plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin>>;

/// Entry points a module offers.
#[derive(Default)]
pub struct EntryPoints {
    factories: Vec<PluginFactory>,
}

impl EntryPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub(crate) fn into_factories(self) -> Vec<PluginFactory> {
        self.factories
    }
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("count", &self.factories.len())
            .finish()
    }
}

/// One discovered module, ready for validation.
#[derive(Debug)]
pub struct PluginModule {
    pub(crate) name: String,
    pub(crate) path: Option<PathBuf>,
    pub(crate) entry_points: EntryPoints,
    pub(crate) library: Option<Arc<Library>>,
}

impl PluginModule {
    /// A module whose code is linked into the host.
    pub fn linked(name: impl Into<String>, entry_points: EntryPoints) -> Self {
        Self {
            name: name.into(),
            path: None,
            entry_points,
            library: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }
}

/// Enumerates candidate modules for a plugin directory.
pub trait ModuleScanner {
    /// One result per candidate. A failed candidate must not hide the others.
    fn scan(&mut self, dir: &Path) -> Vec<PluginResult<PluginModule>>;
}

/// Finds dynamic libraries in the plugin directory and asks each for its entry points.
#[derive(Debug, Clone)]
pub struct DylibScanner {
    max_depth: usize,
}

impl Default for DylibScanner {
    fn default() -> Self {
        // Plugins may sit directly in the directory or in one folder per plugin.
        Self { max_depth: 2 }
    }
}

impl DylibScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    fn is_library(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
    }

    fn open(path: &Path) -> PluginResult<PluginModule> {
        let name = module_name(path);
        tracing::debug!("Opening plugin module {}", path.display());

        // SAFETY: plugin libraries run with full host trust; their
        // initialisers are allowed to run.
        let library = unsafe { Library::new(path) }.map_err(|source| PluginError::Library {
            module: name.clone(),
            source,
        })?;

        // SAFETY: the symbol is generated by `declare_plugin!` with the
        // `RegisterFn` signature.
        let register: RegisterFn = unsafe {
            let symbol = library
                .get::<RegisterFn>(ENTRY_POINTS_SYMBOL)
                .map_err(|_| PluginError::NoEntryPoint(name.clone()))?;
            *symbol
        };

        let entry_points = collect_entry_points(&name, |entries| register(entries))?;

        Ok(PluginModule {
            name,
            path: Some(path.to_path_buf()),
            entry_points,
            library: Some(Arc::new(library)),
        })
    }
}

impl ModuleScanner for DylibScanner {
    fn scan(&mut self, dir: &Path) -> Vec<PluginResult<PluginModule>> {
        let mut modules = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    modules.push(Err(PluginError::Scan {
                        path: dir.to_path_buf(),
                        message: e.to_string(),
                    }));
                    continue;
                }
            };

            if entry.file_type().is_file() && Self::is_library(entry.path()) {
                modules.push(Self::open(entry.path()));
            }
        }

        modules
    }
}

/// Modules linked into the host, registered in code.
#[derive(Default)]
pub struct StaticModules {
    modules: Vec<(String, Box<dyn Fn(&mut EntryPoints)>)>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module named `name` whose entry points are produced by `register`.
    pub fn with_module<F>(mut self, name: impl Into<String>, register: F) -> Self
    where
        F: Fn(&mut EntryPoints) + 'static,
    {
        self.modules.push((name.into(), Box::new(register)));
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for StaticModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|(name, _)| name))
            .finish()
    }
}

impl ModuleScanner for StaticModules {
    fn scan(&mut self, _dir: &Path) -> Vec<PluginResult<PluginModule>> {
        self.modules
            .iter()
            .map(|(name, register)| {
                collect_entry_points(name, |entries| register(entries))
                    .map(|entry_points| PluginModule::linked(name.clone(), entry_points))
            })
            .collect()
    }
}

fn collect_entry_points<F>(module: &str, register: F) -> PluginResult<EntryPoints>
where
    F: FnOnce(&mut EntryPoints),
{
    let mut entries = EntryPoints::new();
    crate::dispatch::isolate(|| {
        register(&mut entries);
        Ok(())
    })
    .map_err(|e| PluginError::Construction {
        module: module.to_string(),
        message: e.to_string(),
    })?;
    Ok(entries)
}

/// Module identity: the file name without the platform library prefix and extension.
fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = std::env::consts::DLL_PREFIX;
    match stem.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}
