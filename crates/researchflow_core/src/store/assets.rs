//! Project asset directories.
//!
//! # Responsibility
//! - Import papers and images into `assets/papers` and `assets/images`.
//! - List and delete asset files by project-relative path.
//!
//! # Invariants
//! - Every path handed out or accepted is project-relative and uses `/`.
//! - Paths that escape the project directory are rejected.
//! - Deleting a missing asset is a success.

use super::naming::{timestamp, timestamp_micros};
use super::{StoreError, StoreResult};
use crate::config::{IMAGES_DIR, PAPERS_DIR};
use log::{info, warn};
use std::path::{Component, Path, PathBuf};

/// Asset directory an asset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Papers,
    Images,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 2] = [Self::Papers, Self::Images];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Papers => "papers",
            Self::Images => "images",
        }
    }

    /// Project-relative directory, e.g. `assets/images`.
    pub fn relative_dir(self) -> &'static str {
        match self {
            Self::Papers => PAPERS_DIR,
            Self::Images => IMAGES_DIR,
        }
    }
}

/// Asset file access used by orphan cleanup.
pub trait AssetStore {
    /// Project-relative paths of every regular file in `category`.
    fn list_assets(&self, category: AssetCategory) -> StoreResult<Vec<String>>;
    fn delete_asset(&self, relative_path: &str) -> StoreResult<()>;
}

/// Asset store rooted at a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirAssetStore {
    project_dir: PathBuf,
}

impl DirAssetStore {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn ensure_dirs(&self) -> StoreResult<()> {
        for category in AssetCategory::ALL {
            let dir = self.category_dir(category);
            std::fs::create_dir_all(&dir).map_err(|source| StoreError::io(&dir, source))?;
        }
        Ok(())
    }

    pub fn category_dir(&self, category: AssetCategory) -> PathBuf {
        self.project_dir.join(category.relative_dir())
    }

    /// Resolves a project-relative asset path to an absolute one.
    pub fn absolute_asset_path(&self, relative_path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(relative_path);
        let escapes = relative_path.is_empty()
            || relative
                .components()
                .any(|part| !matches!(part, Component::Normal(_)));
        if escapes {
            return Err(StoreError::InvalidAssetPath(relative_path.to_string()));
        }
        Ok(self.project_dir.join(relative))
    }

    /// Copies a markdown file into `assets/papers`, keeping its name unless
    /// that name is taken.
    pub fn copy_markdown_to_assets(&self, source: &Path) -> StoreResult<String> {
        let (stem, extension) = source_name_parts(source)?;
        let preferred = format!("{stem}{extension}");
        let file_name = if self.category_dir(AssetCategory::Papers).join(&preferred).exists() {
            format!("{stem}_{}{extension}", timestamp())
        } else {
            preferred
        };
        self.import_file(source, AssetCategory::Papers, &file_name)
    }

    /// Copies an image into `assets/images` under a timestamped name.
    pub fn copy_image_to_assets(&self, source: &Path) -> StoreResult<String> {
        let (stem, extension) = source_name_parts(source)?;
        let file_name = format!("{stem}_{}{extension}", timestamp());
        self.import_file(source, AssetCategory::Images, &file_name)
    }

    /// Writes raw image bytes as `clipboard_<timestamp>.<ext>`.
    pub fn save_clipboard_image(&self, bytes: &[u8], extension: &str) -> StoreResult<String> {
        let extension = extension.trim_start_matches('.');
        let extension = if extension.is_empty() { "png" } else { extension };
        let file_name = self.free_name(
            AssetCategory::Images,
            &format!("clipboard_{}", timestamp_micros()),
            &format!(".{extension}"),
        );
        let dest = self.category_dir(AssetCategory::Images).join(&file_name);
        std::fs::write(&dest, bytes).map_err(|source| StoreError::io(&dest, source))?;
        let relative = format!("{}/{file_name}", AssetCategory::Images.relative_dir());
        info!(
            "event=asset_import module=store status=ok category=images source=clipboard bytes={}",
            bytes.len()
        );
        Ok(relative)
    }

    fn import_file(
        &self,
        source: &Path,
        category: AssetCategory,
        file_name: &str,
    ) -> StoreResult<String> {
        let (stem, extension) = split_name(file_name);
        let file_name = self.free_name(category, stem, extension);
        let dest = self.category_dir(category).join(&file_name);
        std::fs::copy(source, &dest).map_err(|err| StoreError::io(&dest, err))?;
        info!(
            "event=asset_import module=store status=ok category={}",
            category.as_str()
        );
        Ok(format!("{}/{file_name}", category.relative_dir()))
    }

    /// `stem + extension`, or `stem_N + extension` for the first free `N`.
    fn free_name(&self, category: AssetCategory, stem: &str, extension: &str) -> String {
        let dir = self.category_dir(category);
        let mut candidate = format!("{stem}{extension}");
        let mut counter = 1;
        while dir.join(&candidate).exists() {
            candidate = format!("{stem}_{counter}{extension}");
            counter += 1;
        }
        candidate
    }
}

impl AssetStore for DirAssetStore {
    fn list_assets(&self, category: AssetCategory) -> StoreResult<Vec<String>> {
        let dir = self.category_dir(category);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&dir, err)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&dir, err))?;
            let is_file = entry
                .file_type()
                .map(|kind| kind.is_file())
                .map_err(|err| StoreError::io(entry.path(), err))?;
            if !is_file {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => paths.push(format!("{}/{name}", category.relative_dir())),
                None => warn!(
                    "event=asset_list module=store status=skip category={} reason=non_utf8_name",
                    category.as_str()
                ),
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn delete_asset(&self, relative_path: &str) -> StoreResult<()> {
        let path = self.absolute_asset_path(relative_path)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }
}

/// Validates an import source and splits its file name into stem and
/// dotted extension (`""` when there is none).
fn source_name_parts(source: &Path) -> StoreResult<(String, String)> {
    if !source.is_file() {
        return Err(StoreError::InvalidAssetSource(source.to_path_buf()));
    }
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::InvalidAssetSource(source.to_path_buf()))?;
    let (stem, extension) = split_name(file_name);
    Ok((stem.to_string(), extension.to_string()))
}

fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}
