//! Graph repair and asset garbage collection.
//!
//! # Responsibility
//! - Prune edges whose endpoints no longer exist.
//! - Compute which asset files a project still references.
//! - Delete asset files nothing references.
//!
//! # Invariants
//! - `validate_and_repair` is idempotent.
//! - Cleanup recomputes reachability from scratch on every call and is not
//!   undoable; keep-sets let callers protect paths history could restore.

use crate::model::node::NodeData;
use crate::model::project::ProjectData;
use crate::store::{AssetCategory, AssetStore, StoreResult};
use log::{info, warn};
use std::collections::{BTreeSet, HashSet};

/// Project-relative asset paths, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedAssets {
    pub papers: BTreeSet<String>,
    pub images: BTreeSet<String>,
}

impl ReferencedAssets {
    pub fn add_node(&mut self, node: &NodeData) {
        if let Some(path) = node.paper_path() {
            self.papers.insert(path.to_string());
        }
        self.images
            .extend(node.image_paths().map(str::to_string));
    }

    pub fn merge(&mut self, other: ReferencedAssets) {
        self.papers.extend(other.papers);
        self.images.extend(other.images);
    }

    pub fn contains(&self, category: AssetCategory, path: &str) -> bool {
        match category {
            AssetCategory::Papers => self.papers.contains(path),
            AssetCategory::Images => self.images.contains(path),
        }
    }
}

/// Per-category count of deleted files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub papers: usize,
    pub images: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.papers + self.images
    }
}

/// Removes edges with a missing endpoint and returns how many were removed.
pub fn validate_and_repair(project: &mut ProjectData) -> usize {
    let node_ids: HashSet<&str> = project.nodes.iter().map(|node| node.id.as_str()).collect();
    let before = project.edges.len();
    let kept: Vec<_> = project
        .edges
        .iter()
        .filter(|edge| {
            node_ids.contains(edge.source_id.as_str()) && node_ids.contains(edge.target_id.as_str())
        })
        .cloned()
        .collect();
    project.edges = kept;
    let removed = before - project.edges.len();
    if removed > 0 {
        warn!("event=graph_repair module=consistency status=ok edges_removed={removed}");
    }
    removed
}

/// Paper paths of reference-paper nodes plus image paths of image snippets.
pub fn referenced_assets(project: &ProjectData) -> ReferencedAssets {
    let mut assets = ReferencedAssets::default();
    for node in &project.nodes {
        assets.add_node(node);
    }
    assets
}

/// Deletes every asset file the project does not reference.
pub fn cleanup_orphaned_assets(
    project: &ProjectData,
    store: &dyn AssetStore,
) -> StoreResult<CleanupReport> {
    cleanup_unreferenced(&referenced_assets(project), store)
}

/// Deletes every asset file not listed in `keep`.
///
/// A file that fails to delete is logged and skipped; listing failures
/// abort the pass.
pub fn cleanup_unreferenced(
    keep: &ReferencedAssets,
    store: &dyn AssetStore,
) -> StoreResult<CleanupReport> {
    let mut report = CleanupReport::default();
    for category in AssetCategory::ALL {
        let mut deleted = 0;
        for path in store.list_assets(category)? {
            if keep.contains(category, &path) {
                continue;
            }
            match store.delete_asset(&path) {
                Ok(()) => deleted += 1,
                Err(err) => warn!(
                    "event=asset_cleanup module=consistency status=error category={} error={err}",
                    category.as_str()
                ),
            }
        }
        match category {
            AssetCategory::Papers => report.papers = deleted,
            AssetCategory::Images => report.images = deleted,
        }
    }
    info!(
        "event=asset_cleanup module=consistency status=ok papers_removed={} images_removed={}",
        report.papers, report.images
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{referenced_assets, validate_and_repair};
    use crate::model::graph::EdgeData;
    use crate::model::node::{NodeData, PaperMetadata, Position, Snippet};
    use crate::model::project::ProjectData;

    #[test]
    fn repair_is_idempotent() {
        let mut project = ProjectData::new();
        project.edges.push(EdgeData::new("ghost-a", "ghost-b"));
        assert_eq!(validate_and_repair(&mut project), 1);
        assert_eq!(validate_and_repair(&mut project), 0);
    }

    #[test]
    fn referenced_assets_skip_empty_paths_and_text_snippets() {
        let mut project = ProjectData::new();
        let mut paper = NodeData::reference_paper(
            PaperMetadata {
                title: "ResNet".to_string(),
                relative_path_to_md: "assets/papers/resnet.md".to_string(),
                ..PaperMetadata::default()
            },
            Position::default(),
        );
        paper.snippets.push(Snippet::image("assets/images/fig1.png"));
        paper.snippets.push(Snippet::text("assets/images/not-an-image.png"));
        paper.snippets.push(Snippet::image(""));
        project.nodes.push(paper);
        project
            .nodes
            .push(NodeData::reference_paper(PaperMetadata::default(), Position::default()));

        let assets = referenced_assets(&project);
        assert_eq!(
            assets.papers.into_iter().collect::<Vec<_>>(),
            vec!["assets/papers/resnet.md"]
        );
        assert_eq!(
            assets.images.into_iter().collect::<Vec<_>>(),
            vec!["assets/images/fig1.png"]
        );
    }
}
