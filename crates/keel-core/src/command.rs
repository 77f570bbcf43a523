//! Slash-command grammar.
//!
//! Commands are described by a static table mapping a verb (and, for the
//! `/project` and `/session` families, a sub-command) to a builder. Arity is
//! checked against the table before the builder runs, so builders only deal
//! with argument conversion.

use thiserror::Error;

use crate::query::PermissionMode;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Clear,
    ProjectList,
    ProjectNew {
        name: String,
        path: Option<String>,
    },
    ProjectTemp {
        name: Option<String>,
    },
    ProjectSelect {
        name: String,
    },
    ProjectConvert {
        temp_name: String,
        new_name: Option<String>,
    },
    ProjectSessions,
    SessionSave,
    SessionLoad {
        index: i64,
    },
    Model {
        name: Option<String>,
    },
    Permission {
        mode: Option<PermissionMode>,
    },
    Cwd {
        path: Option<String>,
    },
}

/// Errors produced while parsing a command line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown {verb} command: {sub}")]
    UnknownSubcommand { verb: String, sub: String },

    /// Wrong number of arguments; carries the usage line
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    InvalidArgument(String),
}

type Builder = fn(&[&str]) -> Result<Command, CommandError>;

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Command name without the leading `/`
    pub verb: &'static str,
    /// Sub-command for command families
    pub sub: Option<&'static str>,
    /// Usage format (e.g., "/project new <name> [path]")
    pub usage: &'static str,
    /// Human-readable description
    pub description: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    /// Used when the family verb is given without a sub-command
    pub default_for_verb: bool,
    build: Builder,
}

impl CommandSpec {
    /// The text a user types to reach this command, e.g. `/project new`.
    pub fn invocation(&self) -> String {
        match self.sub {
            Some(sub) => format!("/{} {}", self.verb, sub),
            None => format!("/{}", self.verb),
        }
    }
}

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        verb: "help",
        sub: None,
        usage: "/help",
        description: "Show this help message",
        min_args: 0,
        max_args: 0,
        default_for_verb: false,
        build: build_help,
    },
    CommandSpec {
        verb: "clear",
        sub: None,
        usage: "/clear",
        description: "Clear the screen",
        min_args: 0,
        max_args: 0,
        default_for_verb: false,
        build: build_clear,
    },
    CommandSpec {
        verb: "project",
        sub: Some("list"),
        usage: "/project list",
        description: "List all projects",
        min_args: 0,
        max_args: 0,
        default_for_verb: true,
        build: build_project_list,
    },
    CommandSpec {
        verb: "project",
        sub: Some("new"),
        usage: "/project new <name> [path]",
        description: "Create new project",
        min_args: 1,
        max_args: 2,
        default_for_verb: false,
        build: build_project_new,
    },
    CommandSpec {
        verb: "project",
        sub: Some("temp"),
        usage: "/project temp [name]",
        description: "Create temporary project",
        min_args: 0,
        max_args: 1,
        default_for_verb: false,
        build: build_project_temp,
    },
    CommandSpec {
        verb: "project",
        sub: Some("select"),
        usage: "/project select <name>",
        description: "Select a project",
        min_args: 1,
        max_args: 1,
        default_for_verb: false,
        build: build_project_select,
    },
    CommandSpec {
        verb: "project",
        sub: Some("convert"),
        usage: "/project convert <temp-name> [new-name]",
        description: "Convert temp to full project",
        min_args: 1,
        max_args: 2,
        default_for_verb: false,
        build: build_project_convert,
    },
    CommandSpec {
        verb: "project",
        sub: Some("sessions"),
        usage: "/project sessions",
        description: "Show project sessions",
        min_args: 0,
        max_args: 0,
        default_for_verb: false,
        build: build_project_sessions,
    },
    CommandSpec {
        verb: "session",
        sub: Some("save"),
        usage: "/session save",
        description: "Save current session",
        min_args: 0,
        max_args: 0,
        default_for_verb: true,
        build: build_session_save,
    },
    CommandSpec {
        verb: "session",
        sub: Some("load"),
        usage: "/session load <index>",
        description: "Load a previous session",
        min_args: 1,
        max_args: 1,
        default_for_verb: false,
        build: build_session_load,
    },
    CommandSpec {
        verb: "model",
        sub: None,
        usage: "/model [name]",
        description: "Set or show the model",
        min_args: 0,
        max_args: 1,
        default_for_verb: false,
        build: build_model,
    },
    CommandSpec {
        verb: "permission",
        sub: None,
        usage: "/permission [mode]",
        description: "Set or show permission mode",
        min_args: 0,
        max_args: 1,
        default_for_verb: false,
        build: build_permission,
    },
    CommandSpec {
        verb: "cwd",
        sub: None,
        usage: "/cwd [path]",
        description: "Set or show working directory",
        min_args: 0,
        max_args: 1,
        default_for_verb: false,
        build: build_cwd,
    },
];

fn build_help(_: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::Help)
}

fn build_clear(_: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::Clear)
}

fn build_project_list(_: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectList)
}

fn build_project_new(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectNew {
        name: args[0].to_string(),
        path: args.get(1).map(|s| s.to_string()),
    })
}

fn build_project_temp(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectTemp {
        name: args.first().map(|s| s.to_string()),
    })
}

fn build_project_select(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectSelect {
        name: args[0].to_string(),
    })
}

fn build_project_convert(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectConvert {
        temp_name: args[0].to_string(),
        new_name: args.get(1).map(|s| s.to_string()),
    })
}

fn build_project_sessions(_: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::ProjectSessions)
}

fn build_session_save(_: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::SessionSave)
}

fn build_session_load(args: &[&str]) -> Result<Command, CommandError> {
    let index = args[0].parse::<i64>().map_err(|_| {
        CommandError::InvalidArgument("Session index must be a number".to_string())
    })?;
    Ok(Command::SessionLoad { index })
}

fn build_model(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::Model {
        name: args.first().map(|s| s.to_string()),
    })
}

fn build_permission(args: &[&str]) -> Result<Command, CommandError> {
    let mode = args
        .first()
        .map(|s| s.parse::<PermissionMode>())
        .transpose()
        .map_err(CommandError::InvalidArgument)?;
    Ok(Command::Permission { mode })
}

fn build_cwd(args: &[&str]) -> Result<Command, CommandError> {
    Ok(Command::Cwd {
        path: args.first().map(|s| s.to_string()),
    })
}

/// Returns the full command table, in help order.
pub fn builtin_commands() -> &'static [CommandSpec] {
    COMMANDS
}

/// Whether the line should be parsed as a slash command.
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Whether the line ends the interactive loop.
pub fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Parses a slash-command line.
///
/// Arguments are separated by whitespace; quoting is not supported.
pub fn parse(input: &str) -> Result<Command, CommandError> {
    let mut parts = input.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let verb = head
        .strip_prefix('/')
        .ok_or_else(|| CommandError::UnknownCommand(head.to_string()))?;
    let rest: Vec<&str> = parts.collect();

    let family: Vec<&'static CommandSpec> = COMMANDS.iter().filter(|s| s.verb == verb).collect();
    if family.is_empty() {
        return Err(CommandError::UnknownCommand(head.to_string()));
    }

    let has_subcommands = family.iter().any(|s| s.sub.is_some());
    let (spec, args): (&CommandSpec, &[&str]) = if has_subcommands {
        match rest.split_first() {
            Some((sub, args)) => {
                let spec = family
                    .iter()
                    .copied()
                    .find(|s| s.sub == Some(*sub))
                    .ok_or_else(|| CommandError::UnknownSubcommand {
                        verb: verb.to_string(),
                        sub: sub.to_string(),
                    })?;
                (spec, args)
            }
            None => {
                let spec = family
                    .iter()
                    .copied()
                    .find(|s| s.default_for_verb)
                    .ok_or(CommandError::Usage(family[0].usage))?;
                (spec, &rest[..])
            }
        }
    } else {
        (family[0], &rest[..])
    };

    if args.len() < spec.min_args || args.len() > spec.max_args {
        return Err(CommandError::Usage(spec.usage));
    }

    (spec.build)(args)
}
