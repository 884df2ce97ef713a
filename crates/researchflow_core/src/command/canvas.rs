//! Canvas commands: node moves, node/edge/group insertion and removal, and
//! group membership changes.
//!
//! # Invariants
//! - Removal commands carry a full snapshot of what they remove, so reverse
//!   never reads anything but the command's own fields.
//! - Removal commands also record where the entity sat, so reverse puts it
//!   back in place rather than at the end of its collection.
//! - `RemoveNode` restores the node's edges and every group membership it
//!   had when captured.

use super::target::{MutationTarget, TargetError, TargetResult};
use super::Reversible;
use crate::model::graph::{EdgeData, GroupData};
use crate::model::node::{NodeData, Position};
use serde::{Deserialize, Serialize};

/// Where a node sat in one group's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSlot {
    pub group_id: String,
    pub index: usize,
}

/// Every group listing `node_id`, with the node's position in each.
fn member_slots(target: &dyn MutationTarget, node_id: &str) -> Vec<MemberSlot> {
    target
        .groups_containing(node_id)
        .into_iter()
        .filter_map(|group_id| {
            let index = target
                .group(&group_id)?
                .node_ids
                .iter()
                .position(|id| id == node_id)?;
            Some(MemberSlot { group_id, index })
        })
        .collect()
}

fn restore_slots(
    target: &mut dyn MutationTarget,
    node_id: &str,
    slots: &[MemberSlot],
) -> TargetResult<()> {
    for slot in slots {
        // Groups removed later in history are not resurrected here.
        if target.group(&slot.group_id).is_some() {
            target.add_group_member(&slot.group_id, node_id, Some(slot.index))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub node_id: String,
    pub old_x: f64,
    pub old_y: f64,
    pub new_x: f64,
    pub new_y: f64,
}

impl NodePosition {
    pub fn new(node_id: impl Into<String>, old: Position, new: Position) -> Self {
        Self {
            node_id: node_id.into(),
            old_x: old.x,
            old_y: old.y,
            new_x: new.x,
            new_y: new.y,
        }
    }
}

impl Reversible for NodePosition {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_node_position(&self.node_id, Position::new(self.new_x, self.new_y))
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_node_position(&self.node_id, Position::new(self.old_x, self.old_y))
    }

    fn description(&self) -> String {
        "Move node".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddNode {
    pub node_data_dict: NodeData,
}

impl AddNode {
    pub fn new(node: NodeData) -> Self {
        Self {
            node_data_dict: node,
        }
    }
}

impl Reversible for AddNode {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_node(None, self.node_data_dict.clone())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_node(&self.node_data_dict.id).map(|_| ())
    }

    fn description(&self) -> String {
        "Add node".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveNode {
    pub node_data_dict: NodeData,
    pub connected_edges: Vec<EdgeData>,
    // Placement fields below are absent from older history files; reverse
    // then appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_index: Option<usize>,
    /// Collection index of each entry of `connected_edges`, ascending.
    #[serde(default)]
    pub edge_indices: Vec<usize>,
    #[serde(default)]
    pub memberships: Vec<MemberSlot>,
}

impl RemoveNode {
    /// Snapshots the node with its edges, group memberships and positions.
    pub fn capture(target: &dyn MutationTarget, node_id: &str) -> TargetResult<Self> {
        let node = target
            .node(node_id)
            .ok_or_else(|| TargetError::NodeNotFound(node_id.to_string()))?;
        let mut edges: Vec<(Option<usize>, EdgeData)> = target
            .edges_touching(node_id)
            .into_iter()
            .map(|edge| (target.edge_index(&edge.id), edge))
            .collect();
        edges.sort_by_key(|(index, _)| *index);
        Ok(Self {
            node_data_dict: node.clone(),
            node_index: target.node_index(node_id),
            edge_indices: edges.iter().filter_map(|(index, _)| *index).collect(),
            connected_edges: edges.into_iter().map(|(_, edge)| edge).collect(),
            memberships: member_slots(target, node_id),
        })
    }
}

impl Reversible for RemoveNode {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_node(&self.node_data_dict.id).map(|_| ())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        let node_id = self.node_data_dict.id.clone();
        target.insert_node(self.node_index, self.node_data_dict.clone())?;
        // Ascending indices make each insert land where it was captured.
        let placed = self.edge_indices.len() == self.connected_edges.len();
        for (position, edge) in self.connected_edges.iter().enumerate() {
            let index = if placed {
                Some(self.edge_indices[position])
            } else {
                None
            };
            target.insert_edge(index, edge.clone())?;
        }
        restore_slots(target, &node_id, &self.memberships)
    }

    fn description(&self) -> String {
        "Remove node".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEdge {
    pub edge_data_dict: EdgeData,
}

impl AddEdge {
    pub fn new(edge: EdgeData) -> Self {
        Self {
            edge_data_dict: edge,
        }
    }
}

impl Reversible for AddEdge {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_edge(None, self.edge_data_dict.clone())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_edge(&self.edge_data_dict.id).map(|_| ())
    }

    fn description(&self) -> String {
        "Add connection".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveEdge {
    pub edge_data_dict: EdgeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_index: Option<usize>,
}

impl RemoveEdge {
    /// Without a recorded index, reverse appends the edge.
    pub fn new(edge: EdgeData) -> Self {
        Self {
            edge_data_dict: edge,
            edge_index: None,
        }
    }

    pub fn capture(target: &dyn MutationTarget, edge_id: &str) -> TargetResult<Self> {
        let edge = target
            .edge(edge_id)
            .cloned()
            .ok_or_else(|| TargetError::EdgeNotFound(edge_id.to_string()))?;
        Ok(Self {
            edge_data_dict: edge,
            edge_index: target.edge_index(edge_id),
        })
    }
}

impl Reversible for RemoveEdge {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_edge(&self.edge_data_dict.id).map(|_| ())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_edge(self.edge_index, self.edge_data_dict.clone())
    }

    fn description(&self) -> String {
        "Remove connection".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddGroup {
    pub group_data_dict: GroupData,
}

impl AddGroup {
    pub fn new(group: GroupData) -> Self {
        Self {
            group_data_dict: group,
        }
    }
}

impl Reversible for AddGroup {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_group(None, self.group_data_dict.clone())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_group(&self.group_data_dict.id).map(|_| ())
    }

    fn description(&self) -> String {
        format!("Add group '{}'", self.group_data_dict.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveGroup {
    pub group_data_dict: GroupData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,
}

impl RemoveGroup {
    pub fn capture(target: &dyn MutationTarget, group_id: &str) -> TargetResult<Self> {
        let group = target
            .group(group_id)
            .cloned()
            .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
        Ok(Self {
            group_data_dict: group,
            group_index: target.group_index(group_id),
        })
    }
}

impl Reversible for RemoveGroup {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_group(&self.group_data_dict.id).map(|_| ())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_group(self.group_index, self.group_data_dict.clone())
    }

    fn description(&self) -> String {
        format!("Remove group '{}'", self.group_data_dict.name)
    }
}

/// Moves a node between groups. `None` on either side means "no group".
///
/// Apply leaves the node in `new_group_id` only. Reverse restores every
/// membership recorded in `old_memberships`; records without it fall back
/// to `old_group_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupChange {
    pub node_id: String,
    #[serde(default)]
    pub old_group_id: Option<String>,
    #[serde(default)]
    pub new_group_id: Option<String>,
    #[serde(default)]
    pub old_memberships: Vec<MemberSlot>,
}

impl NodeGroupChange {
    /// Snapshots every group currently listing the node.
    pub fn capture(
        target: &dyn MutationTarget,
        node_id: &str,
        new_group_id: Option<String>,
    ) -> TargetResult<Self> {
        if target.node(node_id).is_none() {
            return Err(TargetError::NodeNotFound(node_id.to_string()));
        }
        let old_memberships = member_slots(target, node_id);
        Ok(Self {
            node_id: node_id.to_string(),
            old_group_id: old_memberships.first().map(|slot| slot.group_id.clone()),
            new_group_id,
            old_memberships,
        })
    }
}

impl Reversible for NodeGroupChange {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_group_membership(&self.node_id, self.new_group_id.as_deref())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        if self.old_memberships.is_empty() {
            return target.set_group_membership(&self.node_id, self.old_group_id.as_deref());
        }
        target.set_group_membership(&self.node_id, None)?;
        restore_slots(target, &self.node_id, &self.old_memberships)
    }

    fn description(&self) -> String {
        match &self.new_group_id {
            Some(_) => "Add node to group".to_string(),
            None => "Remove node from group".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeGroupChange, RemoveNode};
    use crate::command::Reversible;
    use crate::model::graph::{EdgeData, GroupData};
    use crate::model::node::{ModuleType, NodeData, Position};
    use crate::model::project::ProjectData;

    #[test]
    fn node_group_change_restores_every_prior_group() {
        let mut project = ProjectData::new();
        let node = NodeData::pipeline_module("load", ModuleType::Input, Position::default());
        let node_id = node.id.clone();
        let mut first = GroupData::new("first", Position::default());
        let mut second = GroupData::new("second", Position::default());
        second.add_member("other");
        first.add_member(&node_id);
        second.add_member(&node_id);
        project.nodes.push(node);
        project.groups.extend([first, second]);
        let before = project.clone();

        let mut command = NodeGroupChange::capture(&project, &node_id, None).unwrap();
        assert_eq!(command.old_memberships.len(), 2);
        command.apply(&mut project).unwrap();
        assert!(project.group_of(&node_id).is_none());
        command.reverse(&mut project).unwrap();
        assert_eq!(project, before);
    }

    #[test]
    fn remove_node_reverse_restores_edges_and_membership() {
        let mut project = ProjectData::new();
        let a = NodeData::pipeline_module("load", ModuleType::Input, Position::new(0.0, 0.0));
        let b = NodeData::pipeline_module("train", ModuleType::Process, Position::new(50.0, 0.0));
        let mut group = GroupData::new("stage", Position::default());
        group.add_member(&a.id);
        let edge = EdgeData::new(&a.id, &b.id);
        let a_id = a.id.clone();
        project.nodes.extend([a, b]);
        project.edges.push(edge.clone());
        project.groups.push(group);

        let mut command = RemoveNode::capture(&project, &a_id).unwrap();
        command.apply(&mut project).unwrap();
        assert!(project.find_node(&a_id).is_none());
        assert!(project.edges.is_empty());
        assert!(!project.groups[0].contains(&a_id));

        command.reverse(&mut project).unwrap();
        assert!(project.find_node(&a_id).is_some());
        assert_eq!(project.edges, vec![edge]);
        assert!(project.groups[0].contains(&a_id));
    }
}
