//! Command-line arguments and their merge with the config file.

use clap::Parser;
use std::path::PathBuf;

use keel_core::config::KeelConfig;
use keel_core::query::{PermissionMode, QueryOptions};

#[derive(Parser, Debug)]
#[command(name = "keel", version)]
#[command(about = "Claude with projects - keep conversations per project", long_about = None)]
pub struct Cli {
    /// Directory holding projects.json and logs
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.config/keel/config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model passed to claude
    #[arg(long)]
    pub model: Option<String>,

    /// Permission mode (default, acceptEdits, bypassPermissions, plan)
    #[arg(long, value_name = "MODE")]
    pub permission: Option<PermissionMode>,

    /// Working directory for queries, overriding the project path
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Project to select at startup
    #[arg(long, short)]
    pub project: Option<String>,

    /// Save the one-shot conversation to the selected project
    #[arg(long, requires = "prompt")]
    pub save: bool,

    /// Run a single prompt and exit instead of starting the REPL
    pub prompt: Option<String>,
}

/// Settings after applying flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub claude_path: Option<PathBuf>,
    pub model: Option<String>,
    pub permission_mode: PermissionMode,
}

impl Settings {
    /// Flags win over the config file, which wins over `default_data_dir`.
    pub fn resolve(cli: &Cli, config: KeelConfig, default_data_dir: PathBuf) -> Self {
        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or(config.data_dir)
                .unwrap_or(default_data_dir),
            claude_path: config.claude_path,
            model: cli.model.clone().or(config.model),
            permission_mode: cli
                .permission
                .or(config.permission_mode)
                .unwrap_or_default(),
        }
    }

    /// Initial query options; the cwd is replaced when a project is selected.
    pub fn query_options(&self, cwd: PathBuf) -> QueryOptions {
        let mut options = QueryOptions::new(cwd);
        options.permission_mode = self.permission_mode;
        options.model = self.model.clone();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "keel",
            "--model",
            "opus",
            "--permission",
            "plan",
            "--data-dir",
            "/flag",
        ]);
        let config = KeelConfig {
            data_dir: Some("/config".into()),
            claude_path: Some("/opt/claude".into()),
            model: Some("sonnet".into()),
            permission_mode: Some(PermissionMode::AcceptEdits),
        };

        let settings = Settings::resolve(&cli, config, "/default".into());
        assert_eq!(settings.data_dir, PathBuf::from("/flag"));
        assert_eq!(settings.model.as_deref(), Some("opus"));
        assert_eq!(settings.permission_mode, PermissionMode::Plan);
        assert_eq!(settings.claude_path, Some(PathBuf::from("/opt/claude")));
    }

    #[test]
    fn test_defaults_without_flags_or_config() {
        let cli = Cli::parse_from(["keel"]);
        let settings = Settings::resolve(&cli, KeelConfig::default(), "/default".into());
        assert_eq!(settings.data_dir, PathBuf::from("/default"));
        assert_eq!(settings.permission_mode, PermissionMode::Default);
        assert_eq!(settings.model, None);
    }

    #[test]
    fn test_prompt_and_project() {
        let cli = Cli::parse_from(["keel", "-p", "site", "--save", "fix the build"]);
        assert_eq!(cli.project.as_deref(), Some("site"));
        assert_eq!(cli.prompt.as_deref(), Some("fix the build"));
        assert!(cli.save);

        assert!(Cli::try_parse_from(["keel", "--permission", "yolo"]).is_err());
        assert!(Cli::try_parse_from(["keel", "--save"]).is_err());
    }
}
