//! Edge and group entities.
//!
//! # Invariants
//! - Edge endpoints must name existing nodes; violations are pruned by
//!   `service::consistency::validate_and_repair`.
//! - `GroupData::node_ids` never contains duplicates. Groups reference nodes
//!   by id and do not own them.

use super::node::Position;
use super::record::{
    dedup_preserving_order, f64_field, id_field, new_id, record_serde, str_field, string_list,
    Record,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_GROUP_NAME: &str = "Group";
pub const DEFAULT_GROUP_WIDTH: f64 = 300.0;
pub const DEFAULT_GROUP_HEIGHT: f64 = 200.0;
pub const DEFAULT_GROUP_COLOR: &str = "#78909C";

/// Directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct EdgeData {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

impl EdgeData {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Returns whether either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

impl Record for EdgeData {
    fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "source_id": self.source_id,
            "target_id": self.target_id,
        })
    }

    fn from_record(value: &Value) -> Self {
        Self {
            id: id_field(value, "id"),
            source_id: str_field(value, "source_id", ""),
            target_id: str_field(value, "target_id", ""),
        }
    }
}

record_serde!(EdgeData);

/// Rectangular container referencing member nodes by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct GroupData {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub color: String,
    /// Member node ids in insertion order.
    pub node_ids: Vec<String>,
}

impl Default for GroupData {
    fn default() -> Self {
        Self {
            id: new_id(),
            name: DEFAULT_GROUP_NAME.to_string(),
            position: Position::default(),
            width: DEFAULT_GROUP_WIDTH,
            height: DEFAULT_GROUP_HEIGHT,
            color: DEFAULT_GROUP_COLOR.to_string(),
            node_ids: Vec::new(),
        }
    }
}

impl GroupData {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            ..Self::default()
        }
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_ids.iter().any(|id| id == node_id)
    }

    /// Appends `node_id` unless it is already a member. Returns whether it was added.
    pub fn add_member(&mut self, node_id: &str) -> bool {
        if self.contains(node_id) {
            return false;
        }
        self.node_ids.push(node_id.to_string());
        true
    }

    /// Inserts `node_id` at `index` (clamped to the member count) unless it
    /// is already a member.
    pub fn insert_member(&mut self, index: usize, node_id: &str) -> bool {
        if self.contains(node_id) {
            return false;
        }
        let index = index.min(self.node_ids.len());
        self.node_ids.insert(index, node_id.to_string());
        true
    }

    /// Removes `node_id` if present. Returns whether it was a member.
    pub fn remove_member(&mut self, node_id: &str) -> bool {
        let before = self.node_ids.len();
        self.node_ids.retain(|id| id != node_id);
        self.node_ids.len() != before
    }
}

impl Record for GroupData {
    fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "position": self.position.to_record(),
            "width": self.width,
            "height": self.height,
            "color": self.color,
            "node_ids": self.node_ids,
        })
    }

    fn from_record(value: &Value) -> Self {
        Self {
            id: id_field(value, "id"),
            name: str_field(value, "name", DEFAULT_GROUP_NAME),
            position: Position::from_record(value.get("position").unwrap_or(&Value::Null)),
            width: f64_field(value, "width", DEFAULT_GROUP_WIDTH),
            height: f64_field(value, "height", DEFAULT_GROUP_HEIGHT),
            color: str_field(value, "color", DEFAULT_GROUP_COLOR),
            node_ids: dedup_preserving_order(string_list(value, "node_ids")),
        }
    }
}

record_serde!(GroupData);
