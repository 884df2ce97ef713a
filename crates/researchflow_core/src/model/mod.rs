//! Project graph data model.
//!
//! # Responsibility
//! - Define the value records persisted in `project_data.json`.
//! - Provide the symmetric `to_record`/`from_record` contract for every entity.
//!
//! # Invariants
//! - Every node, edge, group and snippet carries a stable string id.
//! - `from_record` never fails; missing or malformed fields fall back to
//!   documented defaults.
//! - Entities have no side effects outside themselves. All graph mutation
//!   goes through `crate::command`.

pub mod graph;
pub mod node;
pub mod project;
pub mod record;
