//! Runs the service against shell scripts standing in for the claude CLI.
#![cfg(unix)]

use std::fs;
use std::path::Path;

use keel_core::KeelError;
use keel_core::query::{QueryEvent, QueryOptions, QueryService};
use keel_interaction::ClaudeCodeService;
use tempfile::TempDir;

/// `sh -p <file> ...` executes `<file>`, so the prompt slot carries the
/// script path and the remaining flags become its ignored arguments.
fn fake_claude(dir: &TempDir, body: &str) -> (ClaudeCodeService, String) {
    let script = dir.path().join("fake_claude.sh");
    fs::write(&script, body).unwrap();
    (
        ClaudeCodeService::with_path("/bin/sh"),
        script.to_string_lossy().to_string(),
    )
}

async fn collect(
    service: &ClaudeCodeService,
    prompt: &str,
    cwd: &Path,
) -> Vec<Result<QueryEvent, KeelError>> {
    let mut rx = service
        .query(prompt, &QueryOptions::new(cwd))
        .await
        .unwrap();
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn streams_events_until_result() {
    let dir = TempDir::new().unwrap();
    let (service, prompt) = fake_claude(
        &dir,
        r#"
echo '{"type":"system","subtype":"init","session_id":"s-1"}'
echo 'not json'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi there"}]}}'
echo '{"type":"result","subtype":"success","is_error":false,"duration_ms":5,"num_turns":1,"session_id":"s-1","total_cost_usd":0.001}'
"#,
    );

    let events: Vec<QueryEvent> = collect(&service, &prompt, dir.path())
        .await
        .into_iter()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], QueryEvent::SystemEvent { subtype, .. } if subtype == "init"));
    assert_eq!(events[1], QueryEvent::AssistantText("hi there".into()));
    assert_eq!(
        events[2],
        QueryEvent::ResultSummary {
            session_id: Some("s-1".into()),
            total_cost_usd: Some(0.001),
            duration_ms: 5,
            num_turns: 1,
            is_error: false,
        }
    );
}

#[tokio::test]
async fn failing_process_reports_stderr() {
    let dir = TempDir::new().unwrap();
    let (service, prompt) = fake_claude(&dir, "echo 'not logged in' >&2\nexit 3\n");

    let events = collect(&service, &prompt, dir.path()).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        Err(KeelError::Query(message)) => assert!(message.contains("not logged in")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn missing_executable_fails_to_start() {
    let dir = TempDir::new().unwrap();
    let service = ClaudeCodeService::with_path(dir.path().join("no-such-claude"));

    let err = service
        .query("hi", &QueryOptions::new(dir.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, KeelError::Query(_)));
}
