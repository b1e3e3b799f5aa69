use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "worktally";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/worktally`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn history_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir()
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("worktally_config.json")
        }
    }
}
