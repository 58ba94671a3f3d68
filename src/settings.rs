//! Flat key/value settings files.
//!
//! One file per owner (and optional section): `<dir>/<owner>.toml` or
//! `<dir>/<owner>.<section>.toml`. Values are kept as strings; typed access
//! parses on read.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

const FIRST_RUN_KEY: &str = "FirstRun";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write settings file {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Setting '{0}' is not set")]
    Missing(String),

    #[error("Setting '{key}' has value '{value}' which cannot be parsed")]
    InvalidValue { key: String, value: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl Settings {
    /// Open the settings owned by `owner`, optionally scoped to `section`.
    ///
    /// A missing file yields an empty set of settings.
    pub fn open(dir: impl AsRef<Path>, owner: &str, section: Option<&str>) -> SettingsResult<Self> {
        let file_name = match section {
            Some(section) => format!("{owner}.{section}.toml"),
            None => format!("{owner}.toml"),
        };
        let path = dir.as_ref().join(file_name);

        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })?;
            parse_entries(&path, &content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Read a setting and parse it.
    ///
    /// Booleans accept any letter case (`True`, `false`).
    pub fn get_as<T: FromStr>(&self, key: &str) -> SettingsResult<T> {
        let value = self
            .get(key)
            .ok_or_else(|| SettingsError::Missing(key.to_string()))?;

        let trimmed = value.trim();
        let is_bool = trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false");
        let normalized = if is_bool {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        };

        normalized.parse().map_err(|_| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// True when the owner has never completed a first run.
    pub fn is_first_run(&self) -> bool {
        match self.get(FIRST_RUN_KEY) {
            None => true,
            Some(value) if value.trim().is_empty() => true,
            Some(_) => self.get_as::<bool>(FIRST_RUN_KEY).unwrap_or(false),
        }
    }

    /// Write all entries back to disk, creating the directory if needed.
    pub fn save(&self) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        }

        let content = toml::to_string_pretty(&self.entries).map_err(|e| SettingsError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&self.path, content).map_err(|e| SettingsError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entries(path: &Path, content: &str) -> SettingsResult<BTreeMap<String, String>> {
    let table: toml::Table = toml::from_str(content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut entries = BTreeMap::new();
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Datetime(d) => d.to_string(),
            toml::Value::Array(_) | toml::Value::Table(_) => {
                return Err(SettingsError::Parse {
                    path: path.to_path_buf(),
                    message: format!("value of '{key}' must be a scalar"),
                });
            }
        };
        entries.insert(key, value);
    }
    Ok(entries)
}
