//! One-open-project session.
//!
//! # Responsibility
//! - Own the project store, the open project and its undo history.
//! - Route command execution and undo/redo to the open project's data.
//! - Run repair and history-aware asset cleanup.
//!
//! # Invariants
//! - At most one project is open; switching projects clears history first.
//! - History autosave is attached to the open project's directory only.
//! - Asset cleanup never deletes a file a command still on either stack
//!   could restore a reference to.

use super::consistency::{
    cleanup_unreferenced, referenced_assets, validate_and_repair, CleanupReport,
};
use crate::command::Command;
use crate::config::CoreConfig;
use crate::history::{HistoryError, HistoryLoadReport, UndoManager};
use crate::store::{OpenProject, ProjectStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    NoProjectOpen,
    Store(StoreError),
    History(HistoryError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoProjectOpen => write!(f, "no project is open"),
            Self::Store(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoProjectOpen => None,
            Self::Store(err) => Some(err),
            Self::History(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<HistoryError> for SessionError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

/// What opening a project repaired and restored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenReport {
    pub edges_removed: usize,
    pub history: HistoryLoadReport,
}

/// Counts from `validate_and_clean`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub edges_removed: usize,
    pub papers_removed: usize,
    pub images_removed: usize,
}

/// Session facade over one open project and its history.
pub struct ProjectSession {
    store: ProjectStore,
    history: UndoManager,
    current: Option<OpenProject>,
}

impl ProjectSession {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            store: ProjectStore::new(&config.projects_root),
            history: UndoManager::with_capacity(config.history_capacity),
            current: None,
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn project(&self) -> Option<&OpenProject> {
        self.current.as_ref()
    }

    pub fn is_project_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn create_project(&mut self, name: &str) -> SessionResult<OpenReport> {
        let project = self.store.create_project(name)?;
        Ok(self.install(project))
    }

    /// Opens `name`, replacing any open project. On failure the previous
    /// project stays open.
    pub fn open_project(&mut self, name: &str) -> SessionResult<OpenReport> {
        let project = self.store.open_project(name)?;
        Ok(self.install(project))
    }

    pub fn save_project(&self) -> SessionResult<()> {
        let project = self.current.as_ref().ok_or(SessionError::NoProjectOpen)?;
        self.store.save_project(project)?;
        Ok(())
    }

    pub fn close_project(&mut self) {
        if let Some(project) = self.current.take() {
            info!(
                "event=project_close module=session status=ok project={}",
                project.name
            );
        }
        self.history.clear();
        self.history.detach();
    }

    /// Deletes a project directory, closing it first when it is open.
    pub fn delete_project(&mut self, name: &str) -> SessionResult<()> {
        if self.current.as_ref().is_some_and(|project| project.name == name) {
            self.close_project();
        }
        self.store.delete_project(name)?;
        Ok(())
    }

    pub fn execute(&mut self, command: impl Into<Command>) -> SessionResult<bool> {
        let project = self.current.as_mut().ok_or(SessionError::NoProjectOpen)?;
        Ok(self.history.execute(command, &mut project.data)?)
    }

    pub fn undo(&mut self) -> SessionResult<bool> {
        let project = self.current.as_mut().ok_or(SessionError::NoProjectOpen)?;
        Ok(self.history.undo(&mut project.data)?)
    }

    pub fn redo(&mut self) -> SessionResult<bool> {
        let project = self.current.as_mut().ok_or(SessionError::NoProjectOpen)?;
        Ok(self.history.redo(&mut project.data)?)
    }

    /// Deletes asset files referenced neither by the project nor by any
    /// command on the undo/redo stacks.
    pub fn cleanup_orphaned_assets(&self) -> SessionResult<CleanupReport> {
        let project = self.current.as_ref().ok_or(SessionError::NoProjectOpen)?;
        let mut keep = referenced_assets(&project.data);
        for command in self
            .history
            .undo_commands()
            .chain(self.history.redo_commands())
        {
            keep.merge(command.referenced_assets());
        }
        Ok(cleanup_unreferenced(&keep, &project.assets())?)
    }

    /// Edge repair followed by history-aware orphan cleanup.
    pub fn validate_and_clean(&mut self) -> SessionResult<ValidationReport> {
        let project = self.current.as_mut().ok_or(SessionError::NoProjectOpen)?;
        let edges_removed = validate_and_repair(&mut project.data);
        let cleanup = self.cleanup_orphaned_assets()?;
        Ok(ValidationReport {
            edges_removed,
            papers_removed: cleanup.papers,
            images_removed: cleanup.images,
        })
    }

    fn install(&mut self, mut project: OpenProject) -> OpenReport {
        self.close_project();
        self.history.attach(&project.path);
        let history = match self.history.load_from_file(&project.path) {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    "event=history_load module=session status=error project={} error={err}",
                    project.name
                );
                HistoryLoadReport::default()
            }
        };
        let edges_removed = validate_and_repair(&mut project.data);
        info!(
            "event=project_activate module=session status=ok project={} edges_removed={} undo={} redo={}",
            project.name, edges_removed, history.undo_loaded, history.redo_loaded
        );
        self.current = Some(project);
        OpenReport {
            edges_removed,
            history,
        }
    }
}
