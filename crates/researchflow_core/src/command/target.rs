//! Mutation target contract and its in-memory implementation.
//!
//! # Responsibility
//! - Define the primitives commands apply and reverse against.
//! - Implement them over `ProjectData`, which is the low-level mutator set
//!   commands use when no live view is attached.
//!
//! # Invariants
//! - Index-addressed list primitives never reorder entries they do not name,
//!   so indices stay stable for the duration of one apply/reverse call.
//! - `remove_node` also drops the node's edges and group memberships.
//! - Positional inserts take `None` to append and clamp `Some(index)` to the
//!   current length.
//! - Tag primitives touch the global tag list only.

use crate::model::graph::{EdgeData, GroupData};
use crate::model::node::{NodeData, Position};
use crate::model::project::{ProjectData, TagEntry, TodoItem};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TargetResult<T> = Result<T, TargetError>;

/// Failure of one mutation primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    NodeNotFound(String),
    GroupNotFound(String),
    EdgeNotFound(String),
    TagNotFound(String),
    DuplicateNode(String),
    DuplicateGroup(String),
    DuplicateEdge(String),
    DuplicateTag(String),
    /// `list` is `"todo"` or `"tag"`.
    IndexOutOfRange {
        list: &'static str,
        index: usize,
        len: usize,
    },
}

impl Display for TargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::EdgeNotFound(id) => write!(f, "edge not found: {id}"),
            Self::TagNotFound(name) => write!(f, "tag not found: {name}"),
            Self::DuplicateNode(id) => write!(f, "node already exists: {id}"),
            Self::DuplicateGroup(id) => write!(f, "group already exists: {id}"),
            Self::DuplicateEdge(id) => write!(f, "edge already exists: {id}"),
            Self::DuplicateTag(name) => write!(f, "tag already exists: {name}"),
            Self::IndexOutOfRange { list, index, len } => {
                write!(f, "{list} index {index} out of range for length {len}")
            }
        }
    }
}

impl Error for TargetError {}

/// Graph-mutating capability consumed by commands.
///
/// A GUI layer implements this over its live scene plus the `ProjectData` it
/// owns; headless callers use the `ProjectData` implementation directly.
pub trait MutationTarget {
    fn node(&self, node_id: &str) -> Option<&NodeData>;
    fn group(&self, group_id: &str) -> Option<&GroupData>;
    fn edge(&self, edge_id: &str) -> Option<&EdgeData>;
    /// Edges touching `node_id`, cloned.
    fn edges_touching(&self, node_id: &str) -> Vec<EdgeData>;
    /// Ids of every group listing `node_id`.
    fn groups_containing(&self, node_id: &str) -> Vec<String>;

    fn set_node_position(&mut self, node_id: &str, position: Position) -> TargetResult<()>;
    fn set_group_position(&mut self, group_id: &str, position: Position) -> TargetResult<()>;

    /// Collection positions, used to snapshot where a removed entity sat.
    fn node_index(&self, node_id: &str) -> Option<usize>;
    fn edge_index(&self, edge_id: &str) -> Option<usize>;
    fn group_index(&self, group_id: &str) -> Option<usize>;

    fn insert_node(&mut self, index: Option<usize>, node: NodeData) -> TargetResult<()>;
    fn remove_node(&mut self, node_id: &str) -> TargetResult<NodeData>;
    fn insert_edge(&mut self, index: Option<usize>, edge: EdgeData) -> TargetResult<()>;
    fn remove_edge(&mut self, edge_id: &str) -> TargetResult<EdgeData>;
    fn insert_group(&mut self, index: Option<usize>, group: GroupData) -> TargetResult<()>;
    fn remove_group(&mut self, group_id: &str) -> TargetResult<GroupData>;

    /// Makes `group_id` the only group holding `node_id`; `None` ungroups it.
    fn set_group_membership(&mut self, node_id: &str, group_id: Option<&str>) -> TargetResult<()>;
    /// Adds `node_id` to `group_id` at `index` without touching other groups.
    fn add_group_member(
        &mut self,
        group_id: &str,
        node_id: &str,
        index: Option<usize>,
    ) -> TargetResult<()>;

    fn description(&self) -> &str;
    fn set_description(&mut self, text: &str);

    /// `(pipeline, reference)` edge colors.
    fn edge_colors(&self) -> (&str, &str);
    fn set_edge_colors(&mut self, pipeline: &str, reference: &str);
    fn module_color(&self, module_type: &str) -> Option<&str>;
    /// `None` removes the palette entry.
    fn set_module_color(&mut self, module_type: &str, color: Option<&str>);

    fn todo(&self, index: usize) -> Option<&TodoItem>;
    fn todo_count(&self) -> usize;
    fn insert_todo(&mut self, index: usize, item: TodoItem) -> TargetResult<()>;
    fn remove_todo(&mut self, index: usize) -> TargetResult<TodoItem>;
    fn set_todo_text(&mut self, index: usize, text: &str) -> TargetResult<()>;
    fn set_todo_done(&mut self, index: usize, done: bool) -> TargetResult<()>;
    fn move_todo(&mut self, from: usize, to: usize) -> TargetResult<()>;

    /// Position and entry of the tag called `name`.
    fn tag(&self, name: &str) -> Option<(usize, &TagEntry)>;
    fn tag_count(&self) -> usize;
    fn insert_tag(&mut self, index: usize, tag: TagEntry) -> TargetResult<()>;
    fn remove_tag(&mut self, name: &str) -> TargetResult<(usize, TagEntry)>;
    fn rename_tag(&mut self, old_name: &str, new_name: &str) -> TargetResult<()>;
    fn set_tag_color(&mut self, name: &str, color: Option<&str>) -> TargetResult<()>;
    fn move_tag(&mut self, from: usize, to: usize) -> TargetResult<()>;
}

impl MutationTarget for ProjectData {
    fn node(&self, node_id: &str) -> Option<&NodeData> {
        self.find_node(node_id)
    }

    fn group(&self, group_id: &str) -> Option<&GroupData> {
        self.find_group(group_id)
    }

    fn edge(&self, edge_id: &str) -> Option<&EdgeData> {
        self.edges.iter().find(|edge| edge.id == edge_id)
    }

    fn edges_touching(&self, node_id: &str) -> Vec<EdgeData> {
        ProjectData::edges_touching(self, node_id)
            .into_iter()
            .cloned()
            .collect()
    }

    fn groups_containing(&self, node_id: &str) -> Vec<String> {
        self.groups
            .iter()
            .filter(|group| group.contains(node_id))
            .map(|group| group.id.clone())
            .collect()
    }

    fn set_node_position(&mut self, node_id: &str, position: Position) -> TargetResult<()> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| TargetError::NodeNotFound(node_id.to_string()))?;
        node.position = position;
        Ok(())
    }

    fn set_group_position(&mut self, group_id: &str, position: Position) -> TargetResult<()> {
        let group = self
            .group_mut(group_id)
            .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
        group.position = position;
        Ok(())
    }

    fn node_index(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == node_id)
    }

    fn edge_index(&self, edge_id: &str) -> Option<usize> {
        self.edges.iter().position(|edge| edge.id == edge_id)
    }

    fn group_index(&self, group_id: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.id == group_id)
    }

    fn insert_node(&mut self, index: Option<usize>, node: NodeData) -> TargetResult<()> {
        if self.find_node(&node.id).is_some() {
            return Err(TargetError::DuplicateNode(node.id));
        }
        insert_clamped(&mut self.nodes, index, node);
        Ok(())
    }

    fn remove_node(&mut self, node_id: &str) -> TargetResult<NodeData> {
        let index = self
            .node_index(node_id)
            .ok_or_else(|| TargetError::NodeNotFound(node_id.to_string()))?;
        let node = self.nodes.remove(index);
        self.edges.retain(|edge| !edge.touches(node_id));
        for group in &mut self.groups {
            group.remove_member(node_id);
        }
        Ok(node)
    }

    fn insert_edge(&mut self, index: Option<usize>, edge: EdgeData) -> TargetResult<()> {
        if self.edge_index(&edge.id).is_some() {
            return Err(TargetError::DuplicateEdge(edge.id));
        }
        insert_clamped(&mut self.edges, index, edge);
        Ok(())
    }

    fn remove_edge(&mut self, edge_id: &str) -> TargetResult<EdgeData> {
        let index = self
            .edge_index(edge_id)
            .ok_or_else(|| TargetError::EdgeNotFound(edge_id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    fn insert_group(&mut self, index: Option<usize>, group: GroupData) -> TargetResult<()> {
        if self.find_group(&group.id).is_some() {
            return Err(TargetError::DuplicateGroup(group.id));
        }
        insert_clamped(&mut self.groups, index, group);
        Ok(())
    }

    fn remove_group(&mut self, group_id: &str) -> TargetResult<GroupData> {
        let index = self
            .group_index(group_id)
            .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
        Ok(self.groups.remove(index))
    }

    fn set_group_membership(&mut self, node_id: &str, group_id: Option<&str>) -> TargetResult<()> {
        if let Some(group_id) = group_id {
            if self.find_group(group_id).is_none() {
                return Err(TargetError::GroupNotFound(group_id.to_string()));
            }
        }
        for group in &mut self.groups {
            if Some(group.id.as_str()) != group_id {
                group.remove_member(node_id);
            }
        }
        if let Some(group) = group_id.and_then(|id| self.group_mut(id)) {
            group.add_member(node_id);
        }
        Ok(())
    }

    fn add_group_member(
        &mut self,
        group_id: &str,
        node_id: &str,
        index: Option<usize>,
    ) -> TargetResult<()> {
        let group = self
            .group_mut(group_id)
            .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
        match index {
            Some(index) => group.insert_member(index, node_id),
            None => group.add_member(node_id),
        };
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, text: &str) {
        self.description = text.to_string();
    }

    fn edge_colors(&self) -> (&str, &str) {
        (&self.pipeline_edge_color, &self.reference_edge_color)
    }

    fn set_edge_colors(&mut self, pipeline: &str, reference: &str) {
        self.pipeline_edge_color = pipeline.to_string();
        self.reference_edge_color = reference.to_string();
    }

    fn module_color(&self, module_type: &str) -> Option<&str> {
        self.module_colors.get(module_type).map(String::as_str)
    }

    fn set_module_color(&mut self, module_type: &str, color: Option<&str>) {
        match color {
            Some(color) => {
                self.module_colors
                    .insert(module_type.to_string(), color.to_string());
            }
            None => {
                self.module_colors.remove(module_type);
            }
        }
    }

    fn todo(&self, index: usize) -> Option<&TodoItem> {
        self.todos.get(index)
    }

    fn todo_count(&self) -> usize {
        self.todos.len()
    }

    fn insert_todo(&mut self, index: usize, item: TodoItem) -> TargetResult<()> {
        check_insert_index("todo", index, self.todos.len())?;
        self.todos.insert(index, item);
        Ok(())
    }

    fn remove_todo(&mut self, index: usize) -> TargetResult<TodoItem> {
        check_index("todo", index, self.todos.len())?;
        Ok(self.todos.remove(index))
    }

    fn set_todo_text(&mut self, index: usize, text: &str) -> TargetResult<()> {
        let len = self.todos.len();
        let item = self
            .todos
            .get_mut(index)
            .ok_or(TargetError::IndexOutOfRange { list: "todo", index, len })?;
        item.text = text.to_string();
        Ok(())
    }

    fn set_todo_done(&mut self, index: usize, done: bool) -> TargetResult<()> {
        let len = self.todos.len();
        let item = self
            .todos
            .get_mut(index)
            .ok_or(TargetError::IndexOutOfRange { list: "todo", index, len })?;
        item.done = done;
        Ok(())
    }

    fn move_todo(&mut self, from: usize, to: usize) -> TargetResult<()> {
        move_entry("todo", &mut self.todos, from, to)
    }

    fn tag(&self, name: &str) -> Option<(usize, &TagEntry)> {
        self.find_tag(name)
    }

    fn tag_count(&self) -> usize {
        self.global_tags.len()
    }

    fn insert_tag(&mut self, index: usize, tag: TagEntry) -> TargetResult<()> {
        if self.find_tag(&tag.name).is_some() {
            return Err(TargetError::DuplicateTag(tag.name));
        }
        check_insert_index("tag", index, self.global_tags.len())?;
        self.global_tags.insert(index, tag);
        Ok(())
    }

    fn remove_tag(&mut self, name: &str) -> TargetResult<(usize, TagEntry)> {
        let (index, _) = self
            .find_tag(name)
            .ok_or_else(|| TargetError::TagNotFound(name.to_string()))?;
        Ok((index, self.global_tags.remove(index)))
    }

    fn rename_tag(&mut self, old_name: &str, new_name: &str) -> TargetResult<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.find_tag(new_name).is_some() {
            return Err(TargetError::DuplicateTag(new_name.to_string()));
        }
        let (index, _) = self
            .find_tag(old_name)
            .ok_or_else(|| TargetError::TagNotFound(old_name.to_string()))?;
        self.global_tags[index].name = new_name.to_string();
        Ok(())
    }

    fn set_tag_color(&mut self, name: &str, color: Option<&str>) -> TargetResult<()> {
        let (index, _) = self
            .find_tag(name)
            .ok_or_else(|| TargetError::TagNotFound(name.to_string()))?;
        self.global_tags[index].color = color.map(str::to_string);
        Ok(())
    }

    fn move_tag(&mut self, from: usize, to: usize) -> TargetResult<()> {
        move_entry("tag", &mut self.global_tags, from, to)
    }
}

fn insert_clamped<T>(items: &mut Vec<T>, index: Option<usize>, item: T) {
    let index = index.map_or(items.len(), |index| index.min(items.len()));
    items.insert(index, item);
}

fn check_index(list: &'static str, index: usize, len: usize) -> TargetResult<()> {
    if index >= len {
        return Err(TargetError::IndexOutOfRange { list, index, len });
    }
    Ok(())
}

fn check_insert_index(list: &'static str, index: usize, len: usize) -> TargetResult<()> {
    if index > len {
        return Err(TargetError::IndexOutOfRange { list, index, len });
    }
    Ok(())
}

/// Moves `items[from]` so that it ends up at `to`.
fn move_entry<T>(list: &'static str, items: &mut Vec<T>, from: usize, to: usize) -> TargetResult<()> {
    let len = items.len();
    check_index(list, from, len)?;
    check_index(list, to, len)?;
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MutationTarget, TargetError};
    use crate::model::graph::{EdgeData, GroupData};
    use crate::model::node::{ModuleType, NodeData, Position};
    use crate::model::project::{ProjectData, TodoItem};

    #[test]
    fn remove_node_drops_edges_and_memberships() {
        let mut project = ProjectData::new();
        let a = NodeData::pipeline_module("a", ModuleType::Input, Position::default());
        let b = NodeData::pipeline_module("b", ModuleType::Output, Position::default());
        let mut group = GroupData::new("g", Position::default());
        group.add_member(&a.id);
        project.edges.push(EdgeData::new(&a.id, &b.id));
        project.groups.push(group);
        let a_id = a.id.clone();
        project.nodes.extend([a, b]);

        project.remove_node(&a_id).unwrap();

        assert!(project.edges.is_empty());
        assert!(project.groups[0].node_ids.is_empty());
        assert_eq!(project.nodes.len(), 1);
    }

    #[test]
    fn positional_inserts_clamp_and_reject_duplicates() {
        let mut project = ProjectData::new();
        let a = NodeData::pipeline_module("a", ModuleType::Input, Position::default());
        let b = NodeData::pipeline_module("b", ModuleType::Output, Position::default());
        let c = NodeData::pipeline_module("c", ModuleType::Process, Position::default());
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());

        project.insert_node(None, a.clone()).unwrap();
        project.insert_node(Some(0), b).unwrap();
        project.insert_node(Some(99), c).unwrap();
        assert_eq!(project.node_index(&b_id), Some(0));
        assert_eq!(project.node_index(&a_id), Some(1));
        assert_eq!(project.node_index(&c_id), Some(2));
        assert_eq!(
            project.insert_node(None, a).unwrap_err(),
            TargetError::DuplicateNode(a_id.clone())
        );

        let mut group = GroupData::new("g", Position::default());
        group.add_member(&b_id);
        group.add_member(&c_id);
        let group_id = group.id.clone();
        project.insert_group(None, group).unwrap();
        project.add_group_member(&group_id, &a_id, Some(1)).unwrap();
        assert_eq!(
            project.find_group(&group_id).unwrap().node_ids,
            vec![b_id, a_id, c_id]
        );
    }

    #[test]
    fn move_todo_round_trips() {
        let mut project = ProjectData::new();
        for text in ["a", "b", "c", "d"] {
            let len = project.todo_count();
            project.insert_todo(len, TodoItem::new(text, false)).unwrap();
        }
        let before = project.todos.clone();
        project.move_todo(0, 3).unwrap();
        assert_eq!(project.todos[3].text, "a");
        project.move_todo(3, 0).unwrap();
        assert_eq!(project.todos, before);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut project = ProjectData::new();
        let err = project
            .insert_todo(2, TodoItem::new("late", false))
            .unwrap_err();
        assert_eq!(
            err,
            TargetError::IndexOutOfRange {
                list: "todo",
                index: 2,
                len: 0
            }
        );
    }
}
