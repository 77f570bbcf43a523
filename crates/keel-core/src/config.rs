use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::query::PermissionMode;

/// User configuration read from `config.toml`.
///
/// Every field is optional; command-line flags take precedence over these
/// values and these take precedence over built-in defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct KeelConfig {
    /// Directory holding `projects.json` and `logs/`
    pub data_dir: Option<PathBuf>,
    /// Path to the `claude` executable; searched in PATH when unset
    pub claude_path: Option<PathBuf>,
    /// Default model passed to the query collaborator
    pub model: Option<String>,
    /// Default permission mode
    pub permission_mode: Option<PermissionMode>,
}
