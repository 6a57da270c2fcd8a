//! Path management for Trackboard
//!
//! This module manages all filesystem paths used by the application.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PATHS: OnceCell<Arc<Paths>> = OnceCell::new();

/// Manages all filesystem paths for the application
#[derive(Debug, Clone)]
pub struct Paths {
    /// Parent directory of config folder
    config_parent: PathBuf,
    /// Config directory path
    config_dir: PathBuf,
}

impl Paths {
    /// Initialize the paths singleton
    pub fn init(config: Option<PathBuf>) -> Result<Arc<Paths>> {
        let paths = PATHS.get_or_try_init(|| {
            let paths = Self::new(config)?;
            Ok::<_, anyhow::Error>(Arc::new(paths))
        })?;
        Ok(Arc::clone(paths))
    }

    /// Get the global paths instance
    pub fn get() -> Result<Arc<Paths>> {
        PATHS.get().map(Arc::clone).context("Paths not initialized")
    }

    fn new(config_override: Option<PathBuf>) -> Result<Self> {
        // Determine config parent directory
        let config_parent = if let Some(ref path) = config_override {
            path.clone()
        } else if let Ok(exe) = std::env::current_exe() {
            exe.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            directories::ProjectDirs::from("", "", "trackboard")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        };

        // Determine config directory name
        let config_dir_name = if is_home_dir(&config_parent) {
            ".trackboard"
        } else {
            "trackboard"
        };

        let config_dir = config_parent.join(config_dir_name);

        let paths = Self {
            config_parent,
            config_dir,
        };

        std::fs::create_dir_all(&paths.config_dir)?;

        Ok(paths)
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the config parent directory
    pub fn config_parent(&self) -> &Path {
        &self.config_parent
    }

    /// Get the main database path
    pub fn app_db_path(&self) -> PathBuf {
        self.config_dir.join("trackboard.db")
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Check if a path is in the user's home directory
fn is_home_dir(path: &Path) -> bool {
    directories::UserDirs::new()
        .map(|dirs| path.starts_with(dirs.home_dir()))
        .unwrap_or(false)
}
