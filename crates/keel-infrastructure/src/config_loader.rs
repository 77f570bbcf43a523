//! Loads `KeelConfig` from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use keel_core::config::KeelConfig;
use keel_core::error::{KeelError, Result};

use crate::paths::KeelPaths;

/// Reads the user configuration file.
///
/// A missing or empty file yields the default configuration; a file that
/// exists but does not parse is an error, so typos are not silently ignored.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loader for `~/.config/keel/config.toml`.
    pub fn default_location() -> Result<Self> {
        let path = KeelPaths::config_file().map_err(|e| KeelError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<KeelConfig> {
        if !self.path.exists() {
            tracing::debug!("No config file at {}, using defaults", self.path.display());
            return Ok(KeelConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(KeelConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            KeelError::config(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::query::PermissionMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::new(dir.path().join("config.toml")).load().unwrap();
        assert_eq!(config, KeelConfig::default());
    }

    #[test]
    fn test_reads_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
data_dir = "/srv/keel"
claude_path = "/opt/bin/claude"
model = "sonnet"
permission_mode = "acceptEdits"
"#,
        )
        .unwrap();

        let config = ConfigLoader::new(&path).load().unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/keel")));
        assert_eq!(config.claude_path, Some(PathBuf::from("/opt/bin/claude")));
        assert_eq!(config.model.as_deref(), Some("sonnet"));
        assert_eq!(config.permission_mode, Some(PermissionMode::AcceptEdits));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "permission_mode = \"sometimes\"").unwrap();

        let err = ConfigLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, KeelError::Config(_)));
    }
}
