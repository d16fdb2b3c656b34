use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("mathdrill"),
            )
        } else {
            ProjectDirs::from("", "", "mathdrill")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path(state_dir: &Path) -> PathBuf {
        state_dir.join("mathdrill.db")
    }

    pub fn results_path(state_dir: &Path) -> PathBuf {
        state_dir.join("results.csv")
    }

    pub fn log_path(state_dir: &Path) -> PathBuf {
        state_dir.join("mathdrill.log")
    }
}
