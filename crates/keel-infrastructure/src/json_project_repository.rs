//! JSON-file based ProjectRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use keel_core::error::{KeelError, Result};
use keel_core::project::{LoadOutcome, Project, ProjectRepository};

use crate::dto::{ProjectDocument, ProjectDto};
use crate::paths::KeelPaths;
use crate::storage::AtomicJsonFile;

/// Stores every permanent project in one JSON document keyed by project name.
///
/// ```text
/// data_dir/
/// ├── projects.json
/// └── projects.json.corrupt   # copy of the last document that failed to load
/// ```
///
/// Loading is forgiving: a malformed document loads as empty, and a single
/// malformed entry is skipped without affecting the others. In both cases
/// the original file is copied aside before anything overwrites it.
pub struct JsonProjectRepository {
    file: AtomicJsonFile<ProjectDocument>,
}

impl JsonProjectRepository {
    /// Creates a repository backed by the document at `path`.
    ///
    /// Nothing is created on disk until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.into()),
        }
    }

    /// Creates a repository using `projects.json` inside `data_dir`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(KeelPaths::projects_file(data_dir))
    }

    /// Path of the project document.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path().as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Copies the current document aside so a later save cannot destroy data
    /// that failed to load.
    fn preserve_unreadable(&self) {
        let backup = self.backup_path();
        match fs::copy(self.path(), &backup) {
            Ok(_) => tracing::warn!(
                "Copied unreadable project document to {}",
                backup.display()
            ),
            Err(e) => tracing::warn!(
                "Failed to back up unreadable project document to {}: {}",
                backup.display(),
                e
            ),
        }
    }

    fn convert_entry(
        key: &str,
        raw: serde_json::Value,
    ) -> std::result::Result<Option<Project>, String> {
        let dto: ProjectDto = serde_json::from_value(raw).map_err(|e| e.to_string())?;

        if dto.is_temp {
            return Ok(None);
        }

        let mut project = Project::try_from(dto)?;
        if project.name != key {
            tracing::warn!(
                "Project entry '{}' carries name '{}'; using the document key",
                key,
                project.name
            );
            project.name = key.to_string();
        }
        Ok(Some(project))
    }
}

impl ProjectRepository for JsonProjectRepository {
    fn load(&self) -> LoadOutcome {
        let document = match self.file.load() {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::debug!("No project document at {}", self.path().display());
                return LoadOutcome::empty();
            }
            Err(e) => {
                let warning = KeelError::storage_read(self.path(), e.to_string());
                tracing::warn!("{}", warning);
                self.preserve_unreadable();
                return LoadOutcome {
                    warning: Some(warning),
                    ..LoadOutcome::default()
                };
            }
        };

        let mut outcome = LoadOutcome::empty();
        let mut unreadable = Vec::new();

        for (key, raw) in document {
            match Self::convert_entry(&key, raw) {
                Ok(Some(project)) => {
                    outcome.projects.insert(key, project);
                }
                Ok(None) => {
                    tracing::debug!("Dropping temporary project '{}' found in document", key);
                    outcome.skipped.push(key);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable project entry '{}': {}", key, e);
                    unreadable.push(key.clone());
                    outcome.skipped.push(key);
                }
            }
        }

        if !unreadable.is_empty() {
            self.preserve_unreadable();
            outcome.warning = Some(KeelError::storage_read(
                self.path(),
                format!("skipped unreadable entries: {}", unreadable.join(", ")),
            ));
        }

        tracing::debug!(
            "Loaded {} projects from {}",
            outcome.projects.len(),
            self.path().display()
        );
        outcome
    }

    fn save(&self, projects: &[&Project]) -> Result<()> {
        let mut document = ProjectDocument::new();

        for project in projects.iter().filter(|p| !p.is_temp) {
            let value = serde_json::to_value(ProjectDto::from(*project))
                .map_err(|e| KeelError::storage_write(self.path(), e.to_string()))?;
            document.insert(project.name.clone(), value);
        }

        self.file
            .save(&document)
            .map_err(|e| KeelError::storage_write(self.path(), e.to_string()))?;

        tracing::debug!(
            "Saved {} projects to {}",
            document.len(),
            self.path().display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::session::{ChatMessage, SessionRecord};
    use serde_json::json;
    use tempfile::TempDir;

    fn repository(dir: &TempDir) -> JsonProjectRepository {
        JsonProjectRepository::in_data_dir(dir.path())
    }

    #[test]
    fn test_load_missing_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let outcome = repository(&dir).load();
        assert!(outcome.projects.is_empty());
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn test_save_skips_temporary_projects() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        let site = Project::new("site", "/work/site", false);
        let scratch = Project::new("scratch", "/tmp", true);
        repo.save(&[&site, &scratch]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert!(raw.get("site").is_some());
        assert!(raw.get("scratch").is_none());

        let outcome = repo.load();
        assert_eq!(outcome.projects.len(), 1);
        assert_eq!(outcome.projects["site"], site);
    }

    #[test]
    fn test_round_trip_keeps_sessions_in_order() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        let mut site = Project::new("site", "/work/site", false);
        for i in 0..3 {
            site.sessions.push(SessionRecord::new(
                vec![ChatMessage::user(format!("q{}", i))],
                Some(format!("s{}", i)),
                0.01 * i as f64,
            ));
        }
        repo.save(&[&site]).unwrap();

        let loaded = &repo.load().projects["site"];
        assert_eq!(loaded.sessions, site.sessions);
    }

    #[test]
    fn test_malformed_document_loads_empty_with_warning_and_backup() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        fs::write(repo.path(), "{\"site\": ").unwrap();

        let outcome = repo.load();
        assert!(outcome.projects.is_empty());
        assert!(matches!(
            outcome.warning,
            Some(KeelError::StorageReadFailure { .. })
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("projects.json.corrupt")).unwrap(),
            "{\"site\": "
        );
    }

    #[test]
    fn test_stale_temporary_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let document = json!({
            "keep": {"name": "keep", "path": "/a", "is_temp": false, "sessions": []},
            "stale": {"name": "stale", "path": "/b", "is_temp": true, "sessions": []}
        });
        fs::write(repo.path(), document.to_string()).unwrap();

        let outcome = repo.load();
        assert_eq!(outcome.projects.keys().collect::<Vec<_>>(), vec!["keep"]);
        assert_eq!(outcome.skipped, vec!["stale".to_string()]);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn test_one_bad_entry_does_not_hide_the_rest() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let document = json!({
            "good": {"name": "good", "path": "/a"},
            "bad": {"path": "/b"}
        });
        fs::write(repo.path(), document.to_string()).unwrap();

        let outcome = repo.load();
        assert!(outcome.projects.contains_key("good"));
        assert!(!outcome.projects.contains_key("bad"));
        assert!(outcome.warning.is_some());
        assert!(dir.path().join("projects.json.corrupt").exists());
    }

    #[test]
    fn test_entry_with_negative_session_cost_is_skipped() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let document = json!({
            "good": {"name": "good", "path": "/a"},
            "site": {
                "name": "site",
                "path": "/b",
                "sessions": [{
                    "timestamp": "2024-05-01T10:25:00",
                    "messages": [{"role": "user", "content": "hi"}],
                    "cost": -5.0
                }]
            }
        });
        fs::write(repo.path(), document.to_string()).unwrap();

        let outcome = repo.load();
        assert_eq!(outcome.projects.keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(outcome.skipped, vec!["site".to_string()]);
        assert!(outcome.warning.unwrap().is_storage());
    }

    #[test]
    fn test_document_key_wins_over_inner_name() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let document = json!({
            "renamed": {"name": "original", "path": "/a"}
        });
        fs::write(repo.path(), document.to_string()).unwrap();

        let outcome = repo.load();
        assert_eq!(outcome.projects["renamed"].name, "renamed");
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let repo = JsonProjectRepository::new(blocker.join("projects.json"));

        let site = Project::new("site", "/work/site", false);
        assert!(matches!(
            repo.save(&[&site]),
            Err(KeelError::StorageWriteFailure { .. })
        ));
    }
}
