//! Configuration loading and management
//!
//! Handles parsing of `.taskapp.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Configuration file name, looked up in the data directory
pub const CONFIG_FILE: &str = ".taskapp.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store file locations
    #[serde(default)]
    pub stores: StoreConfig,

    /// Interactive session policy
    #[serde(default)]
    pub ui: UiConfig,
}

/// Store file locations. Relative paths resolve against the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_users")]
    pub users: PathBuf,

    #[serde(default = "default_tasks")]
    pub tasks: PathBuf,

    #[serde(default = "default_logs")]
    pub logs: PathBuf,
}

fn default_users() -> PathBuf {
    PathBuf::from("users.csv")
}

fn default_tasks() -> PathBuf {
    PathBuf::from("tasks.csv")
}

fn default_logs() -> PathBuf {
    PathBuf::from("logs.csv")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            tasks: default_tasks(),
            logs: default_logs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Longest task name accepted on creation
    #[serde(default = "default_max_task_name_len")]
    pub max_task_name_len: usize,

    /// Prompts answered wrongly this many times give up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_max_task_name_len() -> usize {
    10
}

fn default_max_attempts() -> usize {
    3
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_task_name_len: default_max_task_name_len(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Absolute locations of the three stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub users: PathBuf,
    pub tasks: PathBuf,
    pub logs: PathBuf,
}

impl StoreConfig {
    pub fn resolve(&self, data_dir: &Path) -> StorePaths {
        StorePaths {
            users: data_dir.join(&self.users),
            tasks: data_dir.join(&self.tasks),
            logs: data_dir.join(&self.logs),
        }
    }

    fn validate(&self) -> Result<()> {
        let entries = [
            ("stores.users", &self.users),
            ("stores.tasks", &self.tasks),
            ("stores.logs", &self.logs),
        ];
        for (field, path) in entries {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
        }
        let normalized = entries.map(|(field, path)| (field, normalize(path)));
        for (idx, (field, path)) in normalized.iter().enumerate() {
            if let Some((other, _)) = normalized[idx + 1..].iter().find(|(_, p)| p == path) {
                return Err(Error::InvalidConfig(format!(
                    "{field} and {other} point at the same file '{}'",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Lexical form of a relative store path: `.` dropped, `..` folded where it can be.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl UiConfig {
    fn validate(&self) -> Result<()> {
        if self.max_task_name_len == 0 {
            return Err(Error::InvalidConfig(
                "ui.max_task_name_len must be >= 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "ui.max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.taskapp.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults when
    /// there is no config file
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn store_paths(&self, data_dir: &Path) -> StorePaths {
        self.stores.resolve(data_dir)
    }

    fn validate(&self) -> Result<()> {
        self.stores.validate()?;
        self.ui.validate()?;
        Ok(())
    }
}
