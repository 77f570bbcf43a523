//! Unified path management for keel configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/keel/              # Config directory
//! ├── config.toml              # User configuration
//! ├── projects.json            # Permanent projects and their sessions
//! └── logs/                    # Application logs
//!     └── keel.log.YYYY-MM-DD
//! ```
//!
//! The data directory (projects and logs) defaults to the config directory
//! and can be moved with `data_dir` in `config.toml` or `--data-dir`.

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct KeelPaths;

impl KeelPaths {
    const APP_DIR: &'static str = "keel";
    const PROJECTS_FILE: &'static str = "projects.json";

    /// Returns the keel configuration directory (e.g., `~/.config/keel/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default data directory.
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        Self::config_dir()
    }

    /// Returns the project document inside `data_dir`.
    pub fn projects_file(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::PROJECTS_FILE)
    }

    /// Returns the log directory inside `data_dir`.
    pub fn logs_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("logs")
    }
}
