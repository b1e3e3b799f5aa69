use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::session::DEFAULT_TASK_NAME;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How often the live timer is redrawn while a session is active
    pub refresh_interval_ms: u64,
    /// Ask before deleting a history entry
    pub confirm_delete: bool,
    /// Label given to sessions stopped without a task name
    pub default_task_name: String,
    /// `tracing` filter directive used when `WORKTALLY_LOG` is unset
    pub log_filter: String,
    /// Override for the history database location
    pub history_db: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            confirm_delete: true,
            default_task_name: DEFAULT_TASK_NAME.to_string(),
            log_filter: "info".to_string(),
            history_db: None,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "invalid config, using defaults");
                Config::default()
            }
        }
    }
}
