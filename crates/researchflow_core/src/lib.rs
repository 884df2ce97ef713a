//! Core domain logic for ResearchFlow.
//! This crate owns the project graph, its reversible edit history and the
//! on-disk project layout.

pub mod command;
pub mod config;
pub mod history;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use command::{
    decode_command, encode_command, ApplyState, Command, CommandKind, MutationTarget, Reversible,
    TargetError, TargetResult,
};
pub use config::CoreConfig;
pub use history::{HistoryError, HistoryLoadReport, HistoryResult, ReplayFlag, UndoManager};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::graph::{EdgeData, GroupData};
pub use model::node::{
    ModuleMetadata, ModuleType, NodeData, NodeKind, NodeMetadata, PaperMetadata, Position,
    Snippet, SnippetKind,
};
pub use model::project::{ProjectData, TagEntry, TodoItem};
pub use model::record::Record;
pub use service::consistency::{
    cleanup_orphaned_assets, referenced_assets, validate_and_repair, CleanupReport,
    ReferencedAssets,
};
pub use service::session::{
    OpenReport, ProjectSession, SessionError, SessionResult, ValidationReport,
};
pub use store::{
    AssetCategory, AssetStore, DirAssetStore, OpenProject, ProjectStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
