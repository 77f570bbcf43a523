use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use keel_application::ProjectRegistry;
use keel_core::command::Command;
use keel_core::query::QueryService;
use keel_infrastructure::{ConfigLoader, JsonProjectRepository, KeelPaths};
use keel_interaction::ClaudeCodeService;

mod app;
mod cli;
mod helper;
mod logging;
mod repl;
mod theme;

use app::App;
use cli::{Cli, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration =====
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new(path),
        None => ConfigLoader::default_location()?,
    };
    let config = loader.load()?;
    let default_data_dir =
        KeelPaths::default_data_dir().context("Failed to resolve the data directory")?;
    let settings = Settings::resolve(&cli, config, default_data_dir);

    let _log_guard = logging::init(&KeelPaths::logs_dir(&settings.data_dir))?;
    tracing::info!("Starting keel with data in {}", settings.data_dir.display());
    tracing::debug!("Configuration from {}", loader.path().display());

    // ===== Backend Initialization =====
    let repository = Arc::new(JsonProjectRepository::in_data_dir(&settings.data_dir));
    let registry = ProjectRegistry::load(repository);

    let service: Arc<dyn QueryService> = Arc::new(match &settings.claude_path {
        Some(path) => ClaudeCodeService::with_path(path),
        None => ClaudeCodeService::new(),
    });
    if settings.claude_path.is_none() && !ClaudeCodeService::is_available() {
        tracing::warn!("claude CLI not found in PATH");
    }

    let options = settings.query_options(std::env::current_dir()?);
    let mut app = App::new(registry, service, options, std::io::stdout());
    app.start(cli.project.as_deref())?;
    if let Some(cwd) = &cli.cwd {
        app.set_query_cwd(cwd)?;
    }

    match &cli.prompt {
        Some(prompt) => {
            app.ask(prompt).await?;
            if cli.save {
                app.execute(Command::SessionSave)?;
            }
        }
        None => repl::run(&mut app).await?,
    }

    Ok(())
}
