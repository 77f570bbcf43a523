//! Registry behaviour against the JSON project document on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use keel_application::ProjectRegistry;
use keel_core::KeelError;
use keel_core::session::{ChatMessage, SessionRecord};
use keel_infrastructure::JsonProjectRepository;
use tempfile::TempDir;

fn open(dir: &Path) -> ProjectRegistry {
    ProjectRegistry::load(Arc::new(JsonProjectRepository::in_data_dir(dir)))
}

fn names(registry: &ProjectRegistry) -> Vec<String> {
    registry.list().iter().map(|p| p.name.clone()).collect()
}

fn document(dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(dir.join("projects.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn site_and_scratch_scenario() {
    let dir = TempDir::new().unwrap();

    {
        let mut registry = open(dir.path());
        registry
            .create("site", Some("/work/site".into()), false)
            .unwrap();
        registry.create("scratch", None, true).unwrap();
        registry
            .append_session(
                "site",
                SessionRecord::new(vec![ChatMessage::user("hi")], None, 0.001),
            )
            .unwrap();
        registry.save().unwrap();
    }

    let registry = open(dir.path());
    assert_eq!(names(&registry), vec!["site".to_string()]);
    let sessions = registry.sessions("site").unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].cost, 0.001);
    assert_eq!(sessions[0].messages, vec![ChatMessage::user("hi")]);
    assert!(registry.load_warning().is_none());
}

#[test]
fn distinct_creates_are_listed_and_selectable() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());

    for (name, is_temp) in [("beta", false), ("alpha", true), ("gamma", false)] {
        registry.create(name, Some(dir.path().into()), is_temp).unwrap();
    }

    assert_eq!(names(&registry), vec!["alpha", "beta", "gamma"]);
    for name in ["alpha", "beta", "gamma"] {
        assert_eq!(registry.select(name).unwrap().name, name);
        assert_eq!(registry.current_name(), Some(name));
    }
}

#[test]
fn duplicate_names_are_rejected_in_either_order() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());

    registry.create("p", Some("/a".into()), false).unwrap();
    assert_eq!(
        registry.create("p", Some("/b".into()), true).unwrap_err(),
        KeelError::DuplicateName("p".to_string())
    );

    registry.create("t", Some("/a".into()), true).unwrap();
    assert_eq!(
        registry.create("t", Some("/b".into()), false).unwrap_err(),
        KeelError::DuplicateName("t".to_string())
    );
    assert_eq!(registry.get("p").unwrap().path, Path::new("/a"));
}

#[test]
fn temporary_projects_are_never_written() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());

    registry.create("keep", Some("/a".into()), false).unwrap();
    registry.create("scratch", Some("/b".into()), true).unwrap();
    registry.select("scratch").unwrap();
    registry
        .append_session("scratch", SessionRecord::new(Vec::new(), None, 0.0))
        .unwrap();
    registry.save().unwrap();

    assert!(registry.contains("scratch"));
    let doc = document(dir.path());
    assert!(doc.get("keep").is_some());
    assert!(doc.get("scratch").is_none());
}

#[test]
fn converted_project_survives_reload_under_new_name() {
    let dir = TempDir::new().unwrap();

    {
        let mut registry = open(dir.path());
        registry.create("scratch", Some("/tmp/x".into()), true).unwrap();
        registry
            .append_session(
                "scratch",
                SessionRecord::new(vec![ChatMessage::user("q")], Some("sid".into()), 0.2),
            )
            .unwrap();

        let converted = registry
            .convert_temp_to_full("scratch", Some("keeper"))
            .unwrap();
        assert!(!converted.is_temp);
        assert_eq!(converted.sessions.len(), 1);
        assert!(!registry.contains("scratch"));
    }

    let registry = open(dir.path());
    assert_eq!(names(&registry), vec!["keeper".to_string()]);
    let keeper = registry.get("keeper").unwrap();
    assert!(!keeper.is_temp);
    assert_eq!(keeper.sessions[0].session_id.as_deref(), Some("sid"));
}

#[test]
fn convert_without_rename_keeps_name() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());
    registry.create("scratch", Some("/tmp".into()), true).unwrap();

    registry.convert_temp_to_full("scratch", None).unwrap();
    assert!(!registry.get("scratch").unwrap().is_temp);
    assert!(document(dir.path()).get("scratch").is_some());
}

#[test]
fn convert_of_permanent_project_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());
    registry.create("site", Some("/work".into()), false).unwrap();
    let before = document(dir.path());

    assert_eq!(
        registry
            .convert_temp_to_full("site", Some("other"))
            .unwrap_err(),
        KeelError::NotTemporary("site".to_string())
    );
    assert_eq!(names(&registry), vec!["site".to_string()]);
    assert_eq!(document(dir.path()), before);
}

#[test]
fn convert_onto_existing_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());
    registry.create("site", Some("/work".into()), false).unwrap();
    registry.create("scratch", Some("/tmp".into()), true).unwrap();

    assert_eq!(
        registry
            .convert_temp_to_full("scratch", Some("site"))
            .unwrap_err(),
        KeelError::DuplicateName("site".to_string())
    );
    assert!(registry.get("scratch").unwrap().is_temp);
}

#[test]
fn convert_of_unknown_project_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());

    assert!(
        registry
            .convert_temp_to_full("ghost", None)
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn sessions_reload_in_order() {
    let dir = TempDir::new().unwrap();

    {
        let mut registry = open(dir.path());
        registry.create("site", Some("/work".into()), false).unwrap();
        for i in 0..5 {
            let index = registry
                .append_session(
                    "site",
                    SessionRecord::new(
                        vec![
                            ChatMessage::user(format!("question {}", i)),
                            ChatMessage::assistant(format!("answer {}", i)),
                        ],
                        None,
                        0.0,
                    ),
                )
                .unwrap();
            assert_eq!(index, i);
        }
    }

    let registry = open(dir.path());
    let sessions = registry.sessions("site").unwrap();
    assert_eq!(sessions.len(), 5);
    for (i, session) in sessions.iter().enumerate() {
        assert_eq!(session.messages[0].content, format!("question {}", i));
        assert_eq!(session.messages[1].content, format!("answer {}", i));
    }
}

#[test]
fn out_of_range_session_index_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(dir.path());
    registry.create("site", Some("/work".into()), false).unwrap();
    registry
        .append_session("site", SessionRecord::new(Vec::new(), None, 0.0))
        .unwrap();

    assert!(registry.session("site", 0).is_ok());
    for index in [1, 7, -1] {
        assert_eq!(
            registry.session("site", index).unwrap_err(),
            KeelError::IndexOutOfRange { index, len: 1 }
        );
    }
    assert_eq!(registry.sessions("site").unwrap().len(), 1);
    assert!(registry.session("ghost", 0).unwrap_err().is_not_found());
}

#[test]
fn malformed_document_loads_empty_with_warning() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("projects.json"), "not json at all").unwrap();

    let mut registry = open(dir.path());
    assert!(registry.is_empty());
    assert!(registry.load_warning().unwrap().is_storage());

    // The unreadable original is kept aside before the first save replaces it.
    registry.create("fresh", Some("/a".into()), false).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("projects.json.corrupt")).unwrap(),
        "not json at all"
    );
    assert!(document(dir.path()).get("fresh").is_some());
}

#[test]
fn last_accessed_is_persisted_on_select() {
    let dir = TempDir::new().unwrap();

    {
        let mut registry = open(dir.path());
        registry.create("old", Some("/a".into()), false).unwrap();
        registry.create("new", Some("/b".into()), false).unwrap();
        registry.select("old").unwrap();
    }

    let registry = open(dir.path());
    assert!(registry.get("old").unwrap().last_accessed.is_some());
    assert!(registry.get("new").unwrap().last_accessed.is_none());
    assert!(registry.get("old").unwrap().recency() >= registry.get("new").unwrap().recency());
    assert!(registry.current().is_none());
}

#[test]
fn select_succeeds_when_data_dir_is_not_writable() {
    let dir = TempDir::new().unwrap();
    open(dir.path())
        .create("site", Some("/a".into()), false)
        .unwrap();
    let before = document(dir.path());

    // A directory where the temporary file goes makes every write fail.
    fs::create_dir(dir.path().join(".projects.json.tmp")).unwrap();

    let mut registry = open(dir.path());
    assert_eq!(registry.select("site").unwrap().name, "site");
    assert_eq!(registry.current_name(), Some("site"));
    assert!(registry.get("site").unwrap().last_accessed.is_some());
    assert_eq!(document(dir.path()), before);
}
