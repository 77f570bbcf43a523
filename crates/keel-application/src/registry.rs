use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use keel_core::error::{KeelError, Result};
use keel_core::project::{Project, ProjectRepository};
use keel_core::session::SessionRecord;

/// Default name for a temporary project created at `at`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use keel_application::temporary_project_name;
///
/// let at = NaiveDate::from_ymd_opt(2024, 5, 1)
///     .unwrap()
///     .and_hms_opt(9, 3, 7)
///     .unwrap();
/// assert_eq!(temporary_project_name(at), "temp_20240501_090307");
/// ```
pub fn temporary_project_name(at: NaiveDateTime) -> String {
    format!("temp_{}", at.format("%Y%m%d_%H%M%S"))
}

/// In-memory registry of projects backed by a [`ProjectRepository`].
///
/// `ProjectRegistry` is responsible for:
/// - Enforcing unique project names
/// - Tracking the currently selected project (by name)
/// - Promoting temporary projects to permanent ones
/// - Appending saved sessions to a project
/// - Writing every change to a permanent project back to the repository
///
/// Every mutation either completes including its write, or leaves the
/// registry exactly as it was and returns the error. The access time
/// recorded by [`select`](Self::select) is the exception: it is kept in
/// memory when it cannot be written.
pub struct ProjectRegistry {
    /// All known projects, temporary ones included
    projects: BTreeMap<String, Project>,
    /// Name of the selected project
    current: Option<String>,
    /// Persistent storage for permanent projects
    repository: Arc<dyn ProjectRepository>,
    /// Problem reported while loading, if any
    load_warning: Option<KeelError>,
}

impl ProjectRegistry {
    /// Creates a registry populated from the repository.
    ///
    /// A document that cannot be read does not prevent startup; the problem
    /// is available from [`load_warning`](Self::load_warning).
    pub fn load(repository: Arc<dyn ProjectRepository>) -> Self {
        let outcome = repository.load();
        tracing::info!(
            "Loaded {} projects from {}",
            outcome.projects.len(),
            repository.location()
        );
        if !outcome.skipped.is_empty() {
            tracing::info!("Skipped project entries: {}", outcome.skipped.join(", "));
        }

        Self {
            projects: outcome.projects,
            current: None,
            repository,
            load_warning: outcome.warning,
        }
    }

    /// Problem encountered while loading the project document.
    pub fn load_warning(&self) -> Option<&KeelError> {
        self.load_warning.as_ref()
    }

    /// Where permanent projects are stored.
    pub fn storage_location(&self) -> String {
        self.repository.location()
    }

    // ============================================================================
    // Projects
    // ============================================================================

    /// Creates a project.
    ///
    /// `path` defaults to the current working directory. Permanent projects
    /// are written to the repository immediately.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is empty
    /// - `DuplicateName` if a project (temporary or not) already uses `name`
    /// - `StorageWriteFailure` if the project could not be persisted; the
    ///   project is not registered in that case
    pub fn create(&mut self, name: &str, path: Option<PathBuf>, is_temp: bool) -> Result<&Project> {
        Project::validate_name(name)?;
        if self.projects.contains_key(name) {
            return Err(KeelError::DuplicateName(name.to_string()));
        }

        let path = match path {
            Some(path) => path,
            None => std::env::current_dir()?,
        };

        self.projects
            .insert(name.to_string(), Project::new(name, path, is_temp));

        if !is_temp {
            if let Err(e) = self.persist() {
                self.projects.remove(name);
                return Err(e);
            }
        }

        tracing::info!("Created {} project '{}'", kind(is_temp), name);
        Ok(&self.projects[name])
    }

    /// Creates a temporary project in the current working directory.
    ///
    /// Without a name, one is generated from the current time; a numeric
    /// suffix is added if that name is already taken.
    pub fn create_temporary(&mut self, name: Option<&str>) -> Result<&Project> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.unused_temporary_name(),
        };
        self.create(&name, None, true)
    }

    fn unused_temporary_name(&self) -> String {
        let base = temporary_project_name(keel_core::time::now());
        if !self.projects.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.projects.contains_key(candidate))
            .unwrap_or(base)
    }

    /// All known projects, ordered by name.
    pub fn list(&self) -> Vec<&Project> {
        self.projects.values().collect()
    }

    /// All known projects, most recently used first.
    pub fn list_by_recency(&self) -> Vec<&Project> {
        let mut projects = self.list();
        projects.sort_by(|a, b| {
            b.recency()
                .cmp(&a.recency())
                .then_with(|| a.name.cmp(&b.name))
        });
        projects
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// The selected project, if any.
    pub fn current(&self) -> Option<&Project> {
        self.current
            .as_deref()
            .and_then(|name| self.projects.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Selects a project as current and records the access time.
    ///
    /// The access time of a permanent project is written to the repository.
    /// A failed write is logged and does not undo the selection.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no project is called `name`
    pub fn select(&mut self, name: &str) -> Result<&Project> {
        let project = self
            .projects
            .get_mut(name)
            .ok_or_else(|| KeelError::project_not_found(name))?;
        project.last_accessed = Some(keel_core::time::now());

        if !project.is_temp {
            if let Err(e) = self.persist() {
                tracing::warn!("Access time for '{}' not saved: {}", name, e);
            }
        }

        self.current = Some(name.to_string());
        tracing::debug!("Selected project '{}'", name);
        Ok(&self.projects[name])
    }

    /// Promotes a temporary project to a permanent one, optionally renaming it.
    ///
    /// The project keeps its sessions and creation time. If it was the
    /// current project it stays current under its new name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `temp_name` is unknown
    /// - `NotTemporary` if the project is already permanent
    /// - `InvalidName` if `new_name` is empty
    /// - `DuplicateName` if another project already uses `new_name`
    /// - `StorageWriteFailure` if the converted project could not be persisted
    ///
    /// On any error the registry is left unchanged.
    pub fn convert_temp_to_full(
        &mut self,
        temp_name: &str,
        new_name: Option<&str>,
    ) -> Result<&Project> {
        let project = self
            .projects
            .get(temp_name)
            .ok_or_else(|| KeelError::project_not_found(temp_name))?;

        if !project.is_temp {
            return Err(KeelError::NotTemporary(temp_name.to_string()));
        }

        let final_name = new_name.unwrap_or(temp_name);
        Project::validate_name(final_name)?;
        if final_name != temp_name && self.projects.contains_key(final_name) {
            return Err(KeelError::DuplicateName(final_name.to_string()));
        }

        let mut converted = project.clone();
        converted.is_temp = false;
        converted.name = final_name.to_string();

        // Write the post-conversion state before touching the in-memory map.
        let snapshot: Vec<&Project> = self
            .projects
            .iter()
            .filter(|(key, _)| key.as_str() != temp_name)
            .map(|(_, project)| project)
            .chain(std::iter::once(&converted))
            .collect();
        self.repository.save(&snapshot)?;

        self.projects.remove(temp_name);
        self.projects.insert(final_name.to_string(), converted);
        if self.current.as_deref() == Some(temp_name) {
            self.current = Some(final_name.to_string());
        }

        tracing::info!(
            "Converted temporary project '{}' to permanent project '{}'",
            temp_name,
            final_name
        );
        Ok(&self.projects[final_name])
    }

    // ============================================================================
    // Session log
    // ============================================================================

    /// Appends a session to a project and returns its index.
    ///
    /// Sessions of temporary projects are kept in memory only.
    ///
    /// # Errors
    ///
    /// - `InvalidSession` if the record fails validation
    /// - `NotFound` if no project is called `project_name`
    /// - `StorageWriteFailure` if a permanent project could not be persisted;
    ///   the session is not appended in that case
    pub fn append_session(&mut self, project_name: &str, record: SessionRecord) -> Result<usize> {
        record.validate()?;

        let project = self
            .projects
            .get_mut(project_name)
            .ok_or_else(|| KeelError::project_not_found(project_name))?;
        project.sessions.push(record);
        let index = project.sessions.len() - 1;

        if !project.is_temp {
            if let Err(e) = self.persist() {
                if let Some(project) = self.projects.get_mut(project_name) {
                    project.sessions.pop();
                }
                return Err(e);
            }
        }

        tracing::debug!("Saved session {} of project '{}'", index, project_name);
        Ok(index)
    }

    /// Returns the session at `index`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no project is called `project_name`
    /// - `IndexOutOfRange` unless `0 <= index < number of sessions`
    pub fn session(&self, project_name: &str, index: i64) -> Result<&SessionRecord> {
        let project = self
            .projects
            .get(project_name)
            .ok_or_else(|| KeelError::project_not_found(project_name))?;
        let len = project.sessions.len();

        usize::try_from(index)
            .ok()
            .and_then(|i| project.sessions.get(i))
            .ok_or(KeelError::IndexOutOfRange { index, len })
    }

    /// All sessions of a project, oldest first.
    pub fn sessions(&self, project_name: &str) -> Result<&[SessionRecord]> {
        self.projects
            .get(project_name)
            .map(|project| project.sessions.as_slice())
            .ok_or_else(|| KeelError::project_not_found(project_name))
    }

    // ============================================================================
    // Persistence
    // ============================================================================

    /// Writes all permanent projects to the repository.
    pub fn save(&self) -> Result<()> {
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let snapshot: Vec<&Project> = self.projects.values().collect();
        self.repository.save(&snapshot).inspect_err(|e| {
            tracing::error!("{}", e);
        })
    }
}

fn kind(is_temp: bool) -> &'static str {
    if is_temp { "temporary" } else { "permanent" }
}
