//! ClaudeCodeService - the query collaborator backed by the `claude` CLI.
//!
//! Each query spawns `claude -p <prompt> --output-format stream-json` in the
//! project's working directory and forwards the decoded events over a channel
//! while the process runs.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;

use keel_core::error::{KeelError, Result};
use keel_core::query::{QueryEvent, QueryOptions, QueryService};

use crate::stream::parse_line;

const EVENT_BUFFER: usize = 64;

/// Runs queries through the Claude Code CLI.
///
/// # Example
///
/// ```rust,ignore
/// use keel_core::query::{QueryOptions, QueryService};
/// use keel_interaction::ClaudeCodeService;
///
/// let service = ClaudeCodeService::new();
/// let mut events = service.query("Summarise README.md", &QueryOptions::new(".")).await?;
/// while let Some(event) = events.recv().await {
///     println!("{:?}", event?);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClaudeCodeService {
    /// Path to the `claude` executable. If None, searches in PATH.
    claude_path: Option<PathBuf>,
}

impl ClaudeCodeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service using a custom path to the claude executable.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            claude_path: Some(path.into()),
        }
    }

    fn program(&self) -> String {
        self.claude_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Checks if the `claude` CLI is available in PATH.
    pub fn is_available() -> bool {
        #[cfg(unix)]
        let check_cmd = "which";
        #[cfg(windows)]
        let check_cmd = "where";

        std::process::Command::new(check_cmd)
            .arg("claude")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn build_command(&self, prompt: &str, options: &QueryOptions) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--permission-mode")
            .arg(options.permission_mode.as_str());

        if let Some(model) = &options.model {
            cmd.arg("--model").arg(model);
        }
        if options.continue_conversation {
            cmd.arg("--continue");
        }

        cmd.current_dir(&options.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl QueryService for ClaudeCodeService {
    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<mpsc::Receiver<Result<QueryEvent>>> {
        tracing::info!("Querying claude in {}", options.cwd.display());
        tracing::debug!("Prompt length: {} chars", prompt.len());
        tracing::trace!("Full prompt: {}", prompt);

        let mut child = self.build_command(prompt, options).spawn().map_err(|e| {
            tracing::error!("Failed to spawn claude process: {}", e);
            KeelError::query(format!(
                "Failed to spawn '{}': {}. Make sure the claude CLI is installed and in PATH, \
                 or set 'claude_path' in config.toml",
                self.program(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KeelError::query("claude stdout was not captured"))?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(forward_events(child, stdout, stderr, tx));
        Ok(rx)
    }
}

/// Streams decoded events until stdout closes, then reports how the process
/// ended if it never produced a result.
async fn forward_events(
    mut child: Child,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    tx: mpsc::Sender<Result<QueryEvent>>,
) {
    let stderr_task = stderr.map(|stderr| {
        tokio::spawn(async move {
            let mut text = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut text).await;
            text
        })
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut finished = false;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Ok(events) => {
                    for event in events {
                        finished |= event.is_terminal();
                        if tx.send(Ok(event)).await.is_err() {
                            tracing::debug!("Event receiver dropped, stopping claude");
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!("Ignoring unreadable claude output line: {}", e),
            },
            Ok(None) => break,
            Err(e) => {
                let _ = tx
                    .send(Err(KeelError::query(format!(
                        "Failed to read claude output: {}",
                        e
                    ))))
                    .await;
                return;
            }
        }
    }

    let status = child.wait().await;
    let stderr_text = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };

    if finished {
        tracing::info!("claude query completed");
        return;
    }

    let message = match status {
        Ok(status) if !status.success() => {
            format!("claude exited with {}: {}", status, stderr_text.trim())
        }
        Ok(_) => "claude exited without reporting a result".to_string(),
        Err(e) => format!("Failed to wait for claude: {}", e),
    };
    tracing::error!("{}", message);
    let _ = tx.send(Err(KeelError::query(message))).await;
}
