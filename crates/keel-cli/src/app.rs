//! The interactive session: registry, current transcript and query options.

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_application::{ConversationRecorder, ProjectRegistry};
use keel_core::command::{self, Command, builtin_commands};
use keel_core::query::{QueryEvent, QueryOptions, QueryService};

use crate::theme::{self, Status};

/// What the REPL should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Owns everything one interactive session works with.
///
/// All output goes to `out` so the whole command surface can be driven
/// from tests.
pub struct App<W: Write> {
    registry: ProjectRegistry,
    recorder: ConversationRecorder,
    options: QueryOptions,
    service: Arc<dyn QueryService>,
    out: W,
}

impl<W: Write> App<W> {
    pub fn new(
        registry: ProjectRegistry,
        service: Arc<dyn QueryService>,
        options: QueryOptions,
        out: W,
    ) -> Self {
        Self {
            registry,
            recorder: ConversationRecorder::new(),
            options,
            service,
            out,
        }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn recorder(&self) -> &ConversationRecorder {
        &self.recorder
    }

    #[cfg(test)]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    // ============================================================================
    // Startup
    // ============================================================================

    /// Reports load problems and selects the starting project.
    ///
    /// `project` wins when given. Otherwise the most recently used permanent
    /// project is selected, or a fresh temporary project if there is none.
    pub fn start(&mut self, project: Option<&str>) -> Result<()> {
        if let Some(warning) = self.registry.load_warning() {
            let message = warning.to_string();
            self.status(Status::Warning, &message)?;
        }

        let saved = self
            .registry
            .list_by_recency()
            .into_iter()
            .find(|p| !p.is_temp)
            .map(|p| p.name.clone());

        let name = match (project, saved) {
            (Some(name), _) => name.to_string(),
            (None, Some(name)) => name,
            (None, None) => self.registry.create_temporary(None)?.name.clone(),
        };

        self.select(&name)?;
        Ok(())
    }

    /// Points queries at `path` instead of the project directory.
    pub fn set_query_cwd(&mut self, path: &Path) -> Result<()> {
        let path = absolute(path)?;
        if !path.is_dir() {
            anyhow::bail!("Not a directory: {}", path.display());
        }
        self.options.cwd = path;
        Ok(())
    }

    fn select(&mut self, name: &str) -> keel_core::Result<()> {
        let project = self.registry.select(name)?;
        self.options.cwd = project.path.clone();
        Ok(())
    }

    pub fn welcome(&mut self) -> Result<()> {
        writeln!(self.out, "{}", theme::header("Keel - Claude with projects", 60))?;
        let storage = format!("Projects stored in {}", self.registry.storage_location());
        writeln!(self.out, "{}", theme::muted(&storage))?;

        let current = self
            .registry
            .current()
            .map(|p| (p.name.clone(), p.is_temp));
        match current {
            Some((name, is_temp)) => {
                let mut status = format!("Current Project: {}", name);
                if is_temp {
                    status.push_str(" (Temporary)");
                }
                self.status(Status::Info, &status)?;
            }
            None => {
                self.status(Status::Warning, "No project selected")?;
                self.list_projects()?;
            }
        }

        writeln!(
            self.out,
            "\n{}\n",
            theme::muted("Type 'exit' to end • '/help' for commands")
        )?;
        Ok(())
    }

    pub fn prompt(&self) -> String {
        let time = chrono::Local::now().format("%H:%M").to_string();
        theme::prompt(
            self.registry.current_name(),
            self.options.permission_mode,
            &time,
        )
    }

    /// Names offered for completion.
    pub fn project_names(&self) -> Vec<String> {
        self.registry.list().iter().map(|p| p.name.clone()).collect()
    }

    // ============================================================================
    // Input dispatch
    // ============================================================================

    /// Handles one line of user input.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if command::is_exit(line) {
            return Ok(Flow::Exit);
        }

        if command::is_command(line) {
            match command::parse(line) {
                Ok(command) => self.execute(command)?,
                Err(e) => self.status(Status::Error, &e.to_string())?,
            }
        } else {
            self.ask(line).await?;
        }
        Ok(Flow::Continue)
    }

    /// Whether leaving now would drop a transcript the user may want to keep.
    pub fn should_offer_save(&self) -> bool {
        self.recorder.has_unsaved_changes()
            && self.registry.current().is_some_and(|p| !p.is_temp)
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        tracing::debug!("Executing {:?}", command);

        match command {
            Command::Help => self.show_help(),
            Command::Clear => {
                write!(self.out, "\x1B[2J\x1B[1;1H")?;
                self.welcome()
            }
            Command::ProjectList => self.list_projects(),
            Command::ProjectNew { name, path } => self.create_project(&name, path.as_deref()),
            Command::ProjectTemp { name } => self.create_temporary(name.as_deref()),
            Command::ProjectSelect { name } => self.select_project(&name),
            Command::ProjectConvert {
                temp_name,
                new_name,
            } => self.convert_project(&temp_name, new_name.as_deref()),
            Command::ProjectSessions => self.list_sessions(),
            Command::SessionSave => self.save_session(),
            Command::SessionLoad { index } => self.load_session(index),
            Command::Model { name } => self.set_model(name),
            Command::Permission { mode } => self.set_permission(mode),
            Command::Cwd { path } => self.set_cwd(path.as_deref()),
        }
    }

    // ============================================================================
    // Commands
    // ============================================================================

    fn show_help(&mut self) -> Result<()> {
        let mut rows = vec![("exit, quit".to_string(), "End the conversation")];
        rows.extend(
            builtin_commands()
                .iter()
                .map(|spec| (spec.usage.to_string(), spec.description)),
        );
        write!(self.out, "{}", theme::help_section("Commands", &rows))?;
        Ok(())
    }

    fn list_projects(&mut self) -> Result<()> {
        let lines: Vec<String> = self
            .registry
            .list()
            .iter()
            .map(|project| {
                let mut line = format!("  • {}", project.name);
                if project.is_temp {
                    line.push_str(&format!(" {}", theme::muted("(temp)")));
                }
                line.push_str(&format!(" - {} sessions", project.session_count()));
                let cost = project.total_cost();
                if cost > 0.0 {
                    line.push_str(&format!(" - ${:.4}", cost));
                }
                if self.registry.current_name() == Some(project.name.as_str()) {
                    line.push_str(&format!(" {}", theme::muted("(current)")));
                }
                line
            })
            .collect();

        if lines.is_empty() {
            writeln!(
                self.out,
                "{}",
                theme::muted("No projects found. Use '/project new <name>' to create one.")
            )?;
            return Ok(());
        }

        writeln!(self.out, "\n{}", theme::accent("Available Projects:"))?;
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(
            self.out,
            "\n{}",
            theme::muted("Use '/project select <name>' to choose a project")
        )?;
        Ok(())
    }

    fn create_project(&mut self, name: &str, path: Option<&str>) -> Result<()> {
        let path = match path {
            Some(path) => Some(absolute(Path::new(path))?),
            None => None,
        };

        let created = self
            .registry
            .create(name, path, false)
            .map(|p| p.name.clone())
            .and_then(|name| self.select(&name).map(|_| name));
        match created {
            Ok(name) => self.status(Status::Success, &format!("Created project '{}'", name)),
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn create_temporary(&mut self, name: Option<&str>) -> Result<()> {
        let created = self
            .registry
            .create_temporary(name)
            .map(|p| p.name.clone())
            .and_then(|name| self.select(&name).map(|_| name));
        match created {
            Ok(name) => self.status(
                Status::Success,
                &format!("Created temporary project '{}'", name),
            ),
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn select_project(&mut self, name: &str) -> Result<()> {
        match self.select(name) {
            Ok(()) => {
                self.status(Status::Success, &format!("Selected project '{}'", name))?;
                let cwd = format!("  {}", self.options.cwd.display());
                writeln!(self.out, "{}", theme::muted(&cwd))?;
                Ok(())
            }
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn convert_project(&mut self, temp_name: &str, new_name: Option<&str>) -> Result<()> {
        match self.registry.convert_temp_to_full(temp_name, new_name) {
            Ok(project) => {
                let message = format!("Converted temporary project to '{}'", project.name);
                self.status(Status::Success, &message)
            }
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn list_sessions(&mut self) -> Result<()> {
        let Some(project) = self.registry.current() else {
            return self.status(Status::Error, "No project selected");
        };

        if project.sessions.is_empty() {
            writeln!(
                self.out,
                "{}",
                theme::muted("No sessions found for this project")
            )?;
            return Ok(());
        }

        let title = format!("Sessions for {}:", project.name);
        let lines: Vec<String> = project
            .sessions
            .iter()
            .enumerate()
            .map(|(i, session)| {
                format!(
                    "  [{}] {} - {} messages - ${:.4}",
                    i,
                    session.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    session.message_count(),
                    session.cost
                )
            })
            .collect();

        writeln!(self.out, "\n{}", theme::accent(&title))?;
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn save_session(&mut self) -> Result<()> {
        let Some(name) = self.registry.current_name().map(String::from) else {
            return self.status(Status::Error, "No project selected");
        };
        if self.recorder.is_empty() {
            return self.status(Status::Warning, "No messages to save");
        }

        let record = self.recorder.to_session_record();
        match self.registry.append_session(&name, record) {
            Ok(index) => {
                self.recorder.mark_saved();
                tracing::info!(
                    "Saved session {} of '{}' (claude session {})",
                    index,
                    name,
                    self.recorder.session_id().unwrap_or("none")
                );
                let message = format!(
                    "Session saved as [{}] (${:.4})",
                    index,
                    self.recorder.cost()
                );
                self.status(Status::Success, &message)?;
                if self.registry.current().is_some_and(|p| p.is_temp) {
                    let hint = format!(
                        "'{}' is temporary; use '/project convert {}' to keep its sessions",
                        name, name
                    );
                    writeln!(self.out, "{}", theme::muted(&hint))?;
                }
                Ok(())
            }
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn load_session(&mut self, index: i64) -> Result<()> {
        let Some(name) = self.registry.current_name().map(String::from) else {
            return self.status(Status::Error, "No project selected");
        };

        match self.registry.session(&name, index) {
            Ok(record) => {
                self.recorder.load_from(record);
                let message = format!(
                    "Loaded session {} with {} messages",
                    index,
                    record.message_count()
                );
                self.status(Status::Success, &message)
            }
            Err(e) => self.status(Status::Error, &e.to_string()),
        }
    }

    fn set_model(&mut self, name: Option<String>) -> Result<()> {
        match name {
            None => {
                let model = self.options.model.as_deref().unwrap_or("default");
                let message = format!("Model: {}", model);
                self.status(Status::Info, &message)
            }
            Some(name) => {
                self.options.model = (name != "default").then_some(name);
                let model = self.options.model.as_deref().unwrap_or("default");
                let message = format!("Model set to {}", model);
                self.status(Status::Success, &message)
            }
        }
    }

    fn set_permission(&mut self, mode: Option<keel_core::query::PermissionMode>) -> Result<()> {
        match mode {
            None => {
                let message = format!("Permission mode: {}", self.options.permission_mode);
                self.status(Status::Info, &message)
            }
            Some(mode) => {
                self.options.permission_mode = mode;
                self.status(Status::Success, &format!("Permission mode set to {}", mode))
            }
        }
    }

    fn set_cwd(&mut self, path: Option<&str>) -> Result<()> {
        let Some(path) = path else {
            let message = format!("Working directory: {}", self.options.cwd.display());
            return self.status(Status::Info, &message);
        };

        let path = absolute(&self.options.cwd.join(path))?;
        if !path.is_dir() {
            let message = format!("Not a directory: {}", path.display());
            return self.status(Status::Error, &message);
        }
        self.options.cwd = path;
        let message = format!("Working directory set to {}", self.options.cwd.display());
        self.status(Status::Success, &message)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Sends a prompt to the collaborator and records the exchange.
    pub async fn ask(&mut self, prompt: &str) -> Result<()> {
        if self.registry.current().is_none() {
            return self.status(Status::Warning, "Please select or create a project first");
        }

        self.recorder.push_user(prompt);
        let mut events = match self.service.query(prompt, &self.options).await {
            Ok(events) => events,
            Err(e) => {
                self.recorder.abort_turn();
                return self.status(Status::Error, &format!("Error: {}", e));
            }
        };

        let mut started = false;
        loop {
            let next = tokio::select! {
                next = events.recv() => next,
                _ = tokio::signal::ctrl_c() => {
                    self.recorder.abort_turn();
                    writeln!(self.out)?;
                    return self.status(Status::Warning, "Interrupted");
                }
            };
            let Some(event) = next else { break };
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    self.recorder.abort_turn();
                    writeln!(self.out)?;
                    return self.status(Status::Error, &format!("Error: {}", e));
                }
            };

            self.render(&event, &mut started)?;
            self.recorder.observe(&event);
        }

        self.recorder.finish_turn();
        writeln!(self.out)?;
        if !self.recorder.turn_tools().is_empty() {
            let tools = format!("Tools used: {}", self.recorder.turn_tools().join(", "));
            writeln!(self.out, "{}", theme::muted(&tools))?;
        }
        Ok(())
    }

    fn render(&mut self, event: &QueryEvent, started: &mut bool) -> Result<()> {
        match event {
            QueryEvent::AssistantText(text) => {
                if !*started {
                    write!(self.out, "{}: ", theme::accent("Claude"))?;
                    *started = true;
                }
                write!(self.out, "{}", text)?;
                self.out.flush()?;
            }
            QueryEvent::ToolInvocation { name, input } => {
                writeln!(self.out)?;
                writeln!(self.out, "{}", theme::tool_use(name, input))?;
            }
            QueryEvent::SystemEvent { subtype, .. } => {
                tracing::debug!("System event: {}", subtype);
            }
            QueryEvent::ResultSummary {
                total_cost_usd,
                is_error,
                ..
            } => {
                if let Some(cost) = total_cost_usd {
                    write!(self.out, " {}", theme::muted(&format!("[${:.4}]", cost)))?;
                }
                if *is_error {
                    writeln!(self.out)?;
                    self.status(Status::Warning, "The query finished with an error")?;
                }
            }
        }
        Ok(())
    }

    fn status(&mut self, kind: Status, message: &str) -> Result<()> {
        writeln!(self.out, "{}", theme::status(kind, message))?;
        Ok(())
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
