use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension API level this host supports. Plugins declaring any other level are skipped.
pub const API_LEVEL: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub settings_dir: PathBuf,
    pub script_dir: PathBuf,
    pub on_demand_script_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_to_console: bool,
    /// File extension (without the dot) that marks a file as a script
    pub script_extension: String,
    pub api_level: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::with_root(default_root())
    }
}

fn default_root() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("spectrum"))
        .unwrap_or_else(|| {
            // Fallback: ~ is not expanded by PathBuf, so use dirs::home_dir
            dirs::home_dir()
                .map(|h| h.join(".spectrum"))
                .unwrap_or_else(|| PathBuf::from(".spectrum"))
        })
}

impl ManagerConfig {
    /// Derive every directory from a single root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            settings_dir: root.join("Settings"),
            script_dir: root.join("Scripts"),
            on_demand_script_dir: root.join("Scripts").join("OnDemand"),
            plugin_dir: root.join("Plugins"),
            log_file: Some(root.join("spectrum.log")),
            log_to_console: false,
            script_extension: "lua".to_string(),
            api_level: API_LEVEL,
        }
    }

    /// Load config from a TOML file, or return defaults if missing or broken
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<Self>(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.expanded()
    }

    /// Expand a leading `~` in every configured path
    fn expanded(mut self) -> Self {
        self.settings_dir = expand(&self.settings_dir);
        self.script_dir = expand(&self.script_dir);
        self.on_demand_script_dir = expand(&self.on_demand_script_dir);
        self.plugin_dir = expand(&self.plugin_dir);
        self.log_file = self.log_file.as_deref().map(expand);
        self
    }
}

fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_with_root_layout() {
        let config = ManagerConfig::with_root("/games/host");

        assert_eq!(config.script_dir, PathBuf::from("/games/host/Scripts"));
        assert_eq!(
            config.on_demand_script_dir,
            PathBuf::from("/games/host/Scripts/OnDemand")
        );
        assert_eq!(config.plugin_dir, PathBuf::from("/games/host/Plugins"));
        assert_eq!(config.api_level, API_LEVEL);
        assert_eq!(config.script_extension, "lua");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spectrum.toml");
        fs::write(
            &path,
            r#"
plugin_dir = "/opt/plugins"
log_to_console = true
"#,
        )
        .unwrap();

        let config = ManagerConfig::load(&path);
        assert_eq!(config.plugin_dir, PathBuf::from("/opt/plugins"));
        assert!(config.log_to_console);
        assert_eq!(config.script_extension, "lua");
    }

    #[test]
    fn test_load_broken_file_falls_back() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spectrum.toml");
        fs::write(&path, "plugin_dir = [").unwrap();

        let config = ManagerConfig::load(&path);
        assert_eq!(config.api_level, API_LEVEL);
    }

    #[test]
    fn test_tilde_is_expanded() {
        let mut config = ManagerConfig::with_root("/tmp/x");
        config.plugin_dir = PathBuf::from("~/plugins");

        let expanded = config.expanded();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded.plugin_dir, home.join("plugins"));
        }
    }
}
