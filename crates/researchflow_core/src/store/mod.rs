//! On-disk project store.
//!
//! # Responsibility
//! - Lay out one directory per project under a projects root.
//! - Read and write `project_data.json` snapshots.
//! - Hand out asset stores for open projects.
//!
//! # Invariants
//! - A directory counts as a project only if it holds `project_data.json`.
//! - Snapshots are written to a temp file first and renamed into place, so a
//!   failed save never truncates the previous snapshot.
//! - A failed save or open leaves in-memory state untouched.
//! - Project names address exactly one directory directly under the root;
//!   anything else is rejected before touching the filesystem.

pub mod assets;
pub mod naming;

pub use assets::{AssetCategory, AssetStore, DirAssetStore};
pub use naming::{extract_title_from_filename, sanitize_project_name};

use crate::config::PROJECT_DATA_FILE;
use crate::model::project::ProjectData;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Snapshot is not valid JSON.
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
    ProjectExists(String),
    ProjectNotFound(String),
    /// Name is empty, not a single path segment, or not in sanitized form.
    InvalidProjectName(String),
    /// Import source is missing, not a file, or has a non-UTF-8 name.
    InvalidAssetSource(PathBuf),
    /// Asset path is empty or escapes the project directory.
    InvalidAssetPath(String),
}

impl StoreError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at `{}`: {source}", path.display()),
            Self::Format { path, source } => {
                write!(f, "malformed project file `{}`: {source}", path.display())
            }
            Self::ProjectExists(name) => write!(f, "project already exists: {name}"),
            Self::ProjectNotFound(name) => write!(f, "project not found: {name}"),
            Self::InvalidProjectName(name) => write!(f, "invalid project name: `{name}`"),
            Self::InvalidAssetSource(path) => {
                write!(f, "asset source is not a readable file: `{}`", path.display())
            }
            Self::InvalidAssetPath(path) => write!(f, "invalid asset path: `{path}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A loaded project: its directory name, location and data.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenProject {
    pub name: String,
    pub path: PathBuf,
    pub data: ProjectData,
}

impl OpenProject {
    pub fn assets(&self) -> DirAssetStore {
        DirAssetStore::new(&self.path)
    }

    pub fn data_file(&self) -> PathBuf {
        self.path.join(PROJECT_DATA_FILE)
    }
}

/// Directory-per-project store under a projects root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of project `name`. Only sanitized single-segment names are
    /// accepted, so the result always sits directly under the root.
    pub fn project_dir(&self, name: &str) -> StoreResult<PathBuf> {
        let mut components = Path::new(name).components();
        let single_segment = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if name.is_empty() || !single_segment || sanitize_project_name(name) != name {
            return Err(StoreError::InvalidProjectName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Sorted names of every project directory under the root.
    pub fn list_projects(&self) -> StoreResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.root, err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.root, err))?;
            let path = entry.path();
            if !path.join(PROJECT_DATA_FILE).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates a project directory with empty asset folders and an empty
    /// snapshot. The directory name is `sanitize_project_name(name)`.
    pub fn create_project(&self, name: &str) -> StoreResult<OpenProject> {
        let dir_name = sanitize_project_name(name);
        let path = self.project_dir(&dir_name)?;
        if path.exists() {
            return Err(StoreError::ProjectExists(dir_name));
        }

        let project = OpenProject {
            name: dir_name,
            path,
            data: ProjectData::new(),
        };
        project.assets().ensure_dirs()?;
        self.save_project(&project)?;
        info!(
            "event=project_create module=store status=ok project={}",
            project.name
        );
        Ok(project)
    }

    pub fn open_project(&self, name: &str) -> StoreResult<OpenProject> {
        let path = self.project_dir(name)?;
        let data_file = path.join(PROJECT_DATA_FILE);
        if !data_file.is_file() {
            return Err(StoreError::ProjectNotFound(name.to_string()));
        }

        let text = std::fs::read_to_string(&data_file)
            .map_err(|source| StoreError::io(&data_file, source))?;
        let data = ProjectData::from_json(&text).map_err(|source| {
            error!("event=project_open module=store status=error project={name} reason=format");
            StoreError::Format {
                path: data_file.clone(),
                source,
            }
        })?;

        let project = OpenProject {
            name: name.to_string(),
            path,
            data,
        };
        project.assets().ensure_dirs()?;
        info!(
            "event=project_open module=store status=ok project={} nodes={} edges={} groups={}",
            project.name,
            project.data.nodes.len(),
            project.data.edges.len(),
            project.data.groups.len()
        );
        Ok(project)
    }

    /// Writes the snapshot with 2-space indentation via temp file + rename.
    pub fn save_project(&self, project: &OpenProject) -> StoreResult<()> {
        let data_file = project.data_file();
        let text = project.data.to_json().map_err(|source| StoreError::Format {
            path: data_file.clone(),
            source,
        })?;
        write_replacing(&data_file, text.as_bytes())
            .map_err(|(path, source)| StoreError::Io { path, source })?;
        info!(
            "event=project_save module=store status=ok project={}",
            project.name
        );
        Ok(())
    }

    /// Removes the project directory and everything in it.
    pub fn delete_project(&self, name: &str) -> StoreResult<()> {
        let path = self.project_dir(name)?;
        if !path.is_dir() {
            return Err(StoreError::ProjectNotFound(name.to_string()));
        }
        std::fs::remove_dir_all(&path).map_err(|source| StoreError::io(&path, source))?;
        info!("event=project_delete module=store status=ok project={name}");
        Ok(())
    }
}

/// Writes `bytes` next to `path` and renames the temp file over it, so a
/// crash mid-write leaves the previous file intact. Errors carry the path
/// the failing step touched.
pub(crate) fn write_replacing(
    path: &Path,
    bytes: &[u8],
) -> Result<(), (PathBuf, std::io::Error)> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| (parent.to_path_buf(), source))?;
    }
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    std::fs::write(&temp_path, bytes).map_err(|source| (temp_path.clone(), source))?;
    std::fs::rename(&temp_path, path).map_err(|source| (path.to_path_buf(), source))
}
