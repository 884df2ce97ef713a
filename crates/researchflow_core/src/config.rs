//! Core configuration defaults.
//!
//! There is no config file; callers build a `CoreConfig` from a projects
//! root and override individual fields.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

/// Maximum number of entries kept on the undo stack.
pub const MAX_HISTORY: usize = 100;
/// Project snapshot file name inside a project directory.
pub const PROJECT_DATA_FILE: &str = "project_data.json";
/// History artifact file name inside a project directory.
pub const HISTORY_FILE: &str = "undo_history.json";
/// Project-relative directory for markdown papers.
pub const PAPERS_DIR: &str = "assets/papers";
/// Project-relative directory for images.
pub const IMAGES_DIR: &str = "assets/images";
/// Directory name used when sanitizing leaves nothing.
pub const FALLBACK_PROJECT_NAME: &str = "Untitled_Project";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub projects_root: PathBuf,
    pub history_capacity: usize,
    pub log_level: String,
}

impl CoreConfig {
    pub fn new(projects_root: impl AsRef<Path>) -> Self {
        Self {
            projects_root: projects_root.as_ref().to_path_buf(),
            history_capacity: MAX_HISTORY,
            log_level: default_log_level().to_string(),
        }
    }

    /// Zero is bumped to one so the newest command always survives.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}
