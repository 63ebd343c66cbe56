use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where the diagnostic log goes. The terminal belongs to the game, so
    /// logs never go to stdout.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("reflex.log"))
    }

    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("reflex"))
        } else {
            ProjectDirs::from("", "", "reflex").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }
}
