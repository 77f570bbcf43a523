use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use keel_core::command::builtin_commands;
use keel_core::query::PermissionMode;

use crate::theme;

/// Commands whose argument is a project name.
const PROJECT_ARGUMENT_COMMANDS: [&str; 2] = ["/project select ", "/project convert "];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
    project_names: Vec<String>,
}

impl CliHelper {
    pub fn new() -> Self {
        let mut commands: Vec<String> = builtin_commands()
            .iter()
            .map(|spec| spec.invocation())
            .collect();
        commands.dedup();
        commands.extend(PermissionMode::ALL.iter().map(|m| format!("/permission {}", m)));

        Self {
            commands,
            project_names: Vec::new(),
        }
    }

    /// Refreshes the project names offered after `/project select`.
    pub fn set_project_names(&mut self, names: Vec<String>) {
        self.project_names = names;
    }

    fn candidates(&self, line: &str) -> Vec<String> {
        if let Some(prefix) = PROJECT_ARGUMENT_COMMANDS
            .iter()
            .find(|prefix| line.starts_with(*prefix))
        {
            let partial = &line[prefix.len()..];
            if !partial.contains(' ') {
                return self
                    .project_names
                    .iter()
                    .filter(|name| name.starts_with(partial))
                    .map(|name| format!("{}{}", prefix, name))
                    .collect();
            }
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .cloned()
            .collect()
    }
}

impl Default for CliHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates = self
                .candidates(line)
                .into_iter()
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd,
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Owned(theme::highlight_prompt(prompt))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') {
            self.candidates(line)
                .into_iter()
                .find(|cmd| cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_candidates() {
        let helper = CliHelper::new();
        assert_eq!(
            helper.candidates("/project se"),
            vec!["/project select".to_string(), "/project sessions".to_string()]
        );
        assert!(helper.candidates("/he").contains(&"/help".to_string()));
        assert!(helper.candidates("/zzz").is_empty());
    }

    #[test]
    fn test_project_name_candidates() {
        let mut helper = CliHelper::new();
        helper.set_project_names(vec!["site".into(), "scratch".into(), "api".into()]);

        assert_eq!(
            helper.candidates("/project select s"),
            vec![
                "/project select site".to_string(),
                "/project select scratch".to_string()
            ]
        );
        assert!(helper.candidates("/project select site extra").is_empty());
    }
}
