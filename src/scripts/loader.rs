//! Script discovery and loading.
//!
//! Scripts in the startup directory are read into memory by
//! [`ScriptLoader::load_all`]. Scripts in the on-demand directory are only
//! listed; each one is read the first time it is requested and kept.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::error::{ScriptError, ScriptResult};

/// Where a script was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOrigin {
    Startup,
    OnDemand,
}

/// A loaded script: identifier, location and source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHandle {
    id: String,
    path: PathBuf,
    source: String,
    origin: ScriptOrigin,
}

impl ScriptHandle {
    /// Directory-relative identifier, `/`-separated (e.g. `tools/fly.lua`).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> ScriptOrigin {
        self.origin
    }
}

#[derive(Debug)]
pub struct ScriptLoader {
    script_dir: PathBuf,
    on_demand_dir: PathBuf,
    extension: String,
    scripts: Vec<ScriptHandle>,
    on_demand: BTreeMap<String, ScriptHandle>,
}

impl ScriptLoader {
    pub fn new(
        script_dir: impl Into<PathBuf>,
        on_demand_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            script_dir: script_dir.into(),
            on_demand_dir: on_demand_dir.into(),
            extension: extension.into(),
            scripts: Vec::new(),
            on_demand: BTreeMap::new(),
        }
    }

    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    pub fn on_demand_dir(&self) -> &Path {
        &self.on_demand_dir
    }

    /// Read every startup script, replacing anything loaded before.
    ///
    /// Unreadable files and directory entries are skipped and returned in
    /// the error list rather than aborting the load.
    pub fn load_all(&mut self) -> ScriptResult<Vec<ScriptError>> {
        if !self.script_dir.is_dir() {
            return Err(ScriptError::DirectoryNotFound(self.script_dir.clone()));
        }

        self.scripts.clear();
        self.on_demand.clear();

        let (found, mut failures) = self.discover(&self.script_dir, Some(&self.on_demand_dir));
        for (id, path) in found {
            match fs::read_to_string(&path) {
                Ok(source) => self.scripts.push(ScriptHandle {
                    id,
                    path,
                    source,
                    origin: ScriptOrigin::Startup,
                }),
                Err(source) => failures.push(ScriptError::Read { id, source }),
            }
        }

        tracing::debug!(
            "Loaded {} scripts from {}",
            self.scripts.len(),
            self.script_dir.display()
        );
        Ok(failures)
    }

    /// Scripts loaded at startup, in load order.
    pub fn scripts(&self) -> &[ScriptHandle] {
        &self.scripts
    }

    pub fn get(&self, id: &str) -> Option<&ScriptHandle> {
        self.scripts.iter().find(|s| s.id == id)
    }

    /// A script already in memory: a startup script or an on-demand script read earlier.
    pub fn cached(&self, id: &str) -> Option<&ScriptHandle> {
        self.get(id).or_else(|| self.on_demand.get(id))
    }

    /// Identifiers available from the on-demand directory.
    pub fn on_demand_ids(&self) -> Vec<String> {
        if !self.on_demand_dir.is_dir() {
            return Vec::new();
        }
        let (found, _) = self.discover(&self.on_demand_dir, None);
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// Read an on-demand script the first time it is requested.
    ///
    /// Later requests return the same handle without touching the disk.
    pub fn load_on_demand(&mut self, id: &str) -> ScriptResult<&ScriptHandle> {
        if !self.on_demand.contains_key(id) {
            let handle = self.read_on_demand(id)?;
            self.on_demand.insert(id.to_string(), handle);
        }
        self.on_demand
            .get(id)
            .ok_or_else(|| ScriptError::NotFound(id.to_string()))
    }

    /// Resolve an identifier: startup scripts first, then the on-demand directory.
    pub fn resolve(&mut self, id: &str) -> ScriptResult<ScriptHandle> {
        match self.get(id) {
            Some(handle) => Ok(handle.clone()),
            None => self.load_on_demand(id).cloned(),
        }
    }

    fn read_on_demand(&self, id: &str) -> ScriptResult<ScriptHandle> {
        let relative = validate_id(id)?;
        let path = self.on_demand_dir.join(relative);

        if !path.is_file() || !self.has_script_extension(&path) {
            return Err(ScriptError::NotFound(id.to_string()));
        }

        let source = fs::read_to_string(&path).map_err(|source| ScriptError::Read {
            id: id.to_string(),
            source,
        })?;

        Ok(ScriptHandle {
            id: id.to_string(),
            path,
            source,
            origin: ScriptOrigin::OnDemand,
        })
    }

    fn has_script_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// List `(id, path)` for every script under `root`, sorted by path.
    ///
    /// Entries the walk cannot read are returned as errors next to the scripts found.
    fn discover(
        &self,
        root: &Path,
        exclude: Option<&Path>,
    ) -> (Vec<(String, PathBuf)>, Vec<ScriptError>) {
        let mut found = Vec::new();
        let mut failures = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| exclude.map_or(true, |ex| entry.path() != ex));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable entry under {}: {}",
                        root.display(),
                        e
                    );
                    failures.push(ScriptError::Scan {
                        path: e.path().unwrap_or(root).to_path_buf(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.has_script_extension(path) {
                continue;
            }

            if let Some(id) = relative_id(root, path) {
                found.push((id, path.to_path_buf()));
            }
        }

        (found, failures)
    }
}

fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// Reject identifiers that would escape the script directories.
fn validate_id(id: &str) -> ScriptResult<PathBuf> {
    let relative = PathBuf::from(id);
    let safe = !id.trim().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if safe {
        Ok(relative)
    } else {
        Err(ScriptError::InvalidIdentifier(id.to_string()))
    }
}
