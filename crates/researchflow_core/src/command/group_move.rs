//! Group move with contained-node co-movement.
//!
//! # Invariants
//! - `child_positions` holds each member's position from *before* the move.
//!   It is captured once at construction and reused on every replay.
//! - A member's target is `child_old + (dest - old_pos)`, so repeated
//!   undo/redo cycles land on the same two states with no drift.
//! - `ApplyState::PendingFirstApply` is only ever set by `after_drag`;
//!   deserialized commands are always `Normal`.

use super::target::{MutationTarget, TargetError, TargetResult};
use super::Reversible;
use crate::model::node::Position;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Whether the next `apply` must actually move anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyState {
    /// The interactive drag already moved the group; the first apply is a no-op.
    PendingFirstApply,
    #[default]
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMove {
    pub group_id: String,
    pub old_pos: (f64, f64),
    pub new_pos: (f64, f64),
    /// Member id -> position before the move.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub child_positions: BTreeMap<String, (f64, f64)>,
    #[serde(skip)]
    state: ApplyState,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, (f64, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BTreeMap<String, (f64, f64)>>::deserialize(deserializer)
        .map(Option::unwrap_or_default)
}

impl GroupMove {
    /// Builds the command after a drag already moved the group and its
    /// members to `new_pos`. Member pre-move positions are derived from their
    /// current positions minus the drag delta.
    pub fn after_drag(
        target: &dyn MutationTarget,
        group_id: &str,
        old_pos: Position,
        new_pos: Position,
    ) -> TargetResult<Self> {
        let dx = new_pos.x - old_pos.x;
        let dy = new_pos.y - old_pos.y;
        let child_positions = member_positions(target, group_id)?
            .into_iter()
            .map(|(id, pos)| (id, (pos.x - dx, pos.y - dy)))
            .collect();
        Ok(Self {
            group_id: group_id.to_string(),
            old_pos: (old_pos.x, old_pos.y),
            new_pos: (new_pos.x, new_pos.y),
            child_positions,
            state: ApplyState::PendingFirstApply,
        })
    }

    /// Builds the command before anything moved; the first apply performs the move.
    pub fn capture(
        target: &dyn MutationTarget,
        group_id: &str,
        new_pos: Position,
    ) -> TargetResult<Self> {
        let old = target
            .group(group_id)
            .map(|group| group.position)
            .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
        let child_positions = member_positions(target, group_id)?
            .into_iter()
            .map(|(id, pos)| (id, (pos.x, pos.y)))
            .collect();
        Ok(Self {
            group_id: group_id.to_string(),
            old_pos: (old.x, old.y),
            new_pos: (new_pos.x, new_pos.y),
            child_positions,
            state: ApplyState::Normal,
        })
    }

    pub fn state(&self) -> ApplyState {
        self.state
    }

    fn move_to(&self, target: &mut dyn MutationTarget, dest: (f64, f64)) -> TargetResult<()> {
        target.set_group_position(&self.group_id, Position::new(dest.0, dest.1))?;
        let dx = dest.0 - self.old_pos.0;
        let dy = dest.1 - self.old_pos.1;
        for (node_id, (old_x, old_y)) in &self.child_positions {
            // Members deleted since capture are skipped.
            if target.node(node_id).is_none() {
                continue;
            }
            target.set_node_position(node_id, Position::new(old_x + dx, old_y + dy))?;
        }
        Ok(())
    }
}

fn member_positions(
    target: &dyn MutationTarget,
    group_id: &str,
) -> TargetResult<Vec<(String, Position)>> {
    let group = target
        .group(group_id)
        .ok_or_else(|| TargetError::GroupNotFound(group_id.to_string()))?;
    Ok(group
        .node_ids
        .iter()
        .filter_map(|id| target.node(id).map(|node| (id.clone(), node.position)))
        .collect())
}

impl Reversible for GroupMove {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        if self.state == ApplyState::PendingFirstApply {
            self.state = ApplyState::Normal;
            return Ok(());
        }
        self.move_to(target, self.new_pos)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        self.state = ApplyState::Normal;
        self.move_to(target, self.old_pos)
    }

    fn description(&self) -> String {
        "Move group".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplyState, GroupMove};
    use crate::command::Reversible;
    use crate::model::graph::GroupData;
    use crate::model::node::{ModuleType, NodeData, Position};
    use crate::model::project::ProjectData;
    use serde_json::json;

    #[test]
    fn null_child_positions_read_as_empty() {
        let command: GroupMove = serde_json::from_value(json!({
            "group_id": "g1",
            "old_pos": [0, 0],
            "new_pos": [10, 20],
            "child_positions": null
        }))
        .unwrap();
        assert!(command.child_positions.is_empty());
        assert_eq!(command.state(), ApplyState::Normal);
    }

    #[test]
    fn capture_then_apply_moves_members_by_delta() {
        let mut project = ProjectData::new();
        let node = NodeData::pipeline_module("n", ModuleType::Process, Position::new(10.0, 10.0));
        let mut group = GroupData::new("g", Position::new(0.0, 0.0));
        group.add_member(&node.id);
        let (node_id, group_id) = (node.id.clone(), group.id.clone());
        project.nodes.push(node);
        project.groups.push(group);

        let mut command = GroupMove::capture(&project, &group_id, Position::new(5.0, -5.0)).unwrap();
        command.apply(&mut project).unwrap();

        assert_eq!(project.find_node(&node_id).unwrap().position, Position::new(15.0, 5.0));
        assert_eq!(project.find_group(&group_id).unwrap().position, Position::new(5.0, -5.0));
    }
}
