//! Terminal styling for the REPL.

use colored::Colorize;
use keel_core::query::PermissionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// A one-line status message with an icon.
pub fn status(kind: Status, message: &str) -> String {
    match kind {
        Status::Success => format!("{} {}", "✓".green(), message.green()),
        Status::Error => format!("{} {}", "✗".red(), message.red()),
        Status::Warning => format!("{} {}", "!".yellow(), message.yellow()),
        Status::Info => format!("{} {}", "i".bright_blue(), message.bright_blue()),
    }
}

pub fn header(text: &str, width: usize) -> String {
    let rule = "─".repeat(width).bright_black();
    let padding = width.saturating_sub(text.chars().count()) / 2;
    format!(
        "{}\n{}{}\n{}",
        rule,
        " ".repeat(padding),
        text.bright_magenta().bold(),
        rule
    )
}

fn mode_indicator(mode: PermissionMode) -> &'static str {
    match mode {
        PermissionMode::Default => "◆",
        PermissionMode::AcceptEdits => "◈",
        PermissionMode::BypassPermissions => "◉",
        PermissionMode::Plan => "◇",
    }
}

/// Plain-text prompt; colouring happens in the line editor's highlighter.
pub fn prompt(project: Option<&str>, mode: PermissionMode, time: &str) -> String {
    format!(
        "[{}] {} {} ❯ ",
        time,
        mode_indicator(mode),
        project.unwrap_or("no-project")
    )
}

/// Colours a prompt produced by [`prompt`].
pub fn highlight_prompt(prompt: &str) -> String {
    match prompt.split_once("] ") {
        Some((time, rest)) => format!(
            "{} {}",
            format!("{}]", time).bright_black(),
            rest.bright_cyan()
        ),
        None => prompt.bright_cyan().to_string(),
    }
}

pub fn tool_use(name: &str, input: &serde_json::Value) -> String {
    let summary = match input {
        serde_json::Value::Object(map) if !map.is_empty() => {
            let text = serde_json::to_string(input).unwrap_or_default();
            if text.chars().count() > 80 {
                format!(" {}…", text.chars().take(80).collect::<String>())
            } else {
                format!(" {}", text)
            }
        }
        _ => String::new(),
    };
    format!("  {} {}{}", "⚙".bright_yellow(), name.yellow(), summary.bright_black())
}

pub fn muted(text: &str) -> String {
    text.bright_black().to_string()
}

pub fn accent(text: &str) -> String {
    text.bright_cyan().bold().to_string()
}

pub fn help_section(title: &str, rows: &[(String, &str)]) -> String {
    let width = rows.iter().map(|(usage, _)| usage.chars().count()).max().unwrap_or(0);
    let mut out = format!("{}\n", title.bright_magenta().bold());
    for (usage, description) in rows {
        let padded = format!("{:<width$}", usage, width = width);
        out.push_str(&format!("  {}  {}\n", padded.cyan(), description.bright_black()));
    }
    out
}
