//! Project aggregate root.
//!
//! # Responsibility
//! - Own every node, edge, group, tag and to-do of one project.
//! - Round-trip `project_data.json` losslessly, including legacy documents.
//! - Answer read-only graph queries.
//!
//! # Invariants
//! - Global tag names are unique.
//! - Mutation is not exposed here as ad-hoc methods. Commands mutate a
//!   project through its `MutationTarget` implementation in
//!   `crate::command::target`.

use super::graph::{EdgeData, GroupData};
use super::node::{NodeData, NodeKind};
use super::record::{bool_field, list_field, opt_str_field, record_serde, str_field, Record};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_PIPELINE_EDGE_COLOR: &str = "#607D8B";
pub const DEFAULT_REFERENCE_EDGE_COLOR: &str = "#4CAF50";

/// Palette colors a fresh project starts with, keyed by module type.
pub const DEFAULT_MODULE_COLORS: [(&str, &str); 4] = [
    ("input", "#4CAF50"),
    ("process", "#9C27B0"),
    ("decision", "#FF9800"),
    ("output", "#2196F3"),
];

/// Returns an owned copy of [`DEFAULT_MODULE_COLORS`].
pub fn default_module_colors() -> BTreeMap<String, String> {
    DEFAULT_MODULE_COLORS
        .iter()
        .map(|(module_type, color)| ((*module_type).to_string(), (*color).to_string()))
        .collect()
}

/// Project-wide tag with an optional display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub color: Option<String>,
}

impl TagEntry {
    pub fn new(name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Accepts both `{name, color}` objects and legacy bare strings.
    fn from_legacy_or_record(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self::new(name.clone(), None)),
            Value::Object(_) => Some(Self::new(
                str_field(value, "name", ""),
                opt_str_field(value, "color"),
            )),
            _ => None,
        }
    }

    fn to_record(&self) -> Value {
        json!({"name": self.name, "color": self.color})
    }
}

/// One entry of the project to-do list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>, done: bool) -> Self {
        Self {
            text: text.into(),
            done,
        }
    }

    fn from_record(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::new(text.clone(), false)),
            Value::Object(_) => Some(Self::new(
                str_field(value, "text", ""),
                bool_field(value, "done", false),
            )),
            _ => None,
        }
    }

    fn to_record(&self) -> Value {
        json!({"text": self.text, "done": self.done})
    }
}

/// Complete persisted state of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct ProjectData {
    pub global_tags: Vec<TagEntry>,
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
    pub groups: Vec<GroupData>,
    pub pipeline_initialized: bool,
    pub description: String,
    pub todos: Vec<TodoItem>,
    pub pipeline_edge_color: String,
    pub reference_edge_color: String,
    /// Opaque GUI dock layout, carried so GUI-written files round-trip.
    pub dock_layout: Vec<i64>,
    pub module_colors: BTreeMap<String, String>,
}

impl Default for ProjectData {
    fn default() -> Self {
        Self {
            global_tags: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
            pipeline_initialized: false,
            description: String::new(),
            todos: Vec::new(),
            pipeline_edge_color: DEFAULT_PIPELINE_EDGE_COLOR.to_string(),
            reference_edge_color: DEFAULT_REFERENCE_EDGE_COLOR.to_string(),
            dock_layout: Vec::new(),
            module_colors: default_module_colors(),
        }
    }
}

impl ProjectData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a project snapshot. Only invalid JSON syntax is an error;
    /// everything else degrades to defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_record(&value))
    }

    /// Serializes with 2-space indentation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_record())
    }

    pub fn find_node(&self, node_id: &str) -> Option<&NodeData> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn find_group(&self, group_id: &str) -> Option<&GroupData> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    /// Edges with `node_id` as either endpoint, in collection order.
    pub fn edges_touching(&self, node_id: &str) -> Vec<&EdgeData> {
        self.edges.iter().filter(|edge| edge.touches(node_id)).collect()
    }

    /// First group listing `node_id` as a member.
    pub fn group_of(&self, node_id: &str) -> Option<&GroupData> {
        self.groups.iter().find(|group| group.contains(node_id))
    }

    pub fn has_pipeline_module(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.kind() == NodeKind::PipelineModule)
    }

    pub fn find_tag(&self, name: &str) -> Option<(usize, &TagEntry)> {
        self.global_tags
            .iter()
            .enumerate()
            .find(|(_, tag)| tag.name == name)
    }

    pub(crate) fn node_mut(&mut self, node_id: &str) -> Option<&mut NodeData> {
        self.nodes.iter_mut().find(|node| node.id == node_id)
    }

    pub(crate) fn group_mut(&mut self, group_id: &str) -> Option<&mut GroupData> {
        self.groups.iter_mut().find(|group| group.id == group_id)
    }
}

impl Record for ProjectData {
    fn to_record(&self) -> Value {
        json!({
            "global_tags": self.global_tags.iter().map(TagEntry::to_record).collect::<Vec<_>>(),
            "nodes": self.nodes.iter().map(Record::to_record).collect::<Vec<_>>(),
            "edges": self.edges.iter().map(Record::to_record).collect::<Vec<_>>(),
            "groups": self.groups.iter().map(Record::to_record).collect::<Vec<_>>(),
            "pipeline_initialized": self.pipeline_initialized,
            "description": self.description,
            "todos": self.todos.iter().map(TodoItem::to_record).collect::<Vec<_>>(),
            "pipeline_edge_color": self.pipeline_edge_color,
            "reference_edge_color": self.reference_edge_color,
            "dock_layout": self.dock_layout,
            "module_colors": self.module_colors,
        })
    }

    fn from_record(value: &Value) -> Self {
        let mut seen_tags = HashSet::new();
        let global_tags = list_field(value, "global_tags")
            .iter()
            .filter_map(TagEntry::from_legacy_or_record)
            .filter(|tag| seen_tags.insert(tag.name.clone()))
            .collect();

        let module_colors = match value.get("module_colors").and_then(Value::as_object) {
            Some(map) => read_color_map(map),
            None => default_module_colors(),
        };

        Self {
            global_tags,
            nodes: list_field(value, "nodes")
                .iter()
                .map(NodeData::from_record)
                .collect(),
            edges: list_field(value, "edges")
                .iter()
                .map(EdgeData::from_record)
                .collect(),
            groups: list_field(value, "groups")
                .iter()
                .map(GroupData::from_record)
                .collect(),
            pipeline_initialized: bool_field(value, "pipeline_initialized", false),
            description: str_field(value, "description", ""),
            todos: list_field(value, "todos")
                .iter()
                .filter_map(TodoItem::from_record)
                .collect(),
            pipeline_edge_color: str_field(value, "pipeline_edge_color", DEFAULT_PIPELINE_EDGE_COLOR),
            reference_edge_color: str_field(
                value,
                "reference_edge_color",
                DEFAULT_REFERENCE_EDGE_COLOR,
            ),
            dock_layout: list_field(value, "dock_layout")
                .iter()
                .filter_map(Value::as_i64)
                .collect(),
            module_colors,
        }
    }
}

record_serde!(ProjectData);

fn read_color_map(map: &Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .filter_map(|(key, color)| color.as_str().map(|color| (key.clone(), color.to_string())))
        .collect()
}
