//! Reversible command model.
//!
//! # Responsibility
//! - Express every user edit as a closed set of serializable, reversible
//!   instructions that act on a `MutationTarget`.
//! - Keep the on-disk record shape `{"type": <kind>, ...fields}` stable.
//!
//! # Invariants
//! - Each variant stores both prior and new state; `apply`/`reverse` read
//!   only the command's own fields plus the target.
//! - `reverse` after `apply` restores the target observationally.
//! - Commands never own graph state.

pub mod canvas;
pub mod group_move;
pub mod meta;
pub mod registry;
pub mod target;

pub use canvas::{
    AddEdge, AddGroup, AddNode, MemberSlot, NodeGroupChange, NodePosition, RemoveEdge,
    RemoveGroup, RemoveNode,
};
pub use group_move::{ApplyState, GroupMove};
pub use meta::{
    DescriptionChange, GlobalEdgeColorChange, ModulePaletteColorChange, TagAdd, TagColorChange,
    TagMove, TagRemove, TagRename, TodoAdd, TodoEdit, TodoMove, TodoRemove, TodoToggle,
};
pub use registry::{decode_command, encode_command, CommandKind};
pub use target::{MutationTarget, TargetError, TargetResult};

use crate::model::node::NodeData;
use crate::service::consistency::ReferencedAssets;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability shared by every command variant.
pub trait Reversible {
    /// Performs the edit. May mutate `self` (first-apply bookkeeping).
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()>;
    /// Undoes the edit performed by `apply`.
    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()>;
    /// Short human-readable label, e.g. for an "Undo ..." menu entry.
    fn description(&self) -> String;
}

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    DescriptionChange(DescriptionChange),
    TodoAdd(TodoAdd),
    TodoRemove(TodoRemove),
    TodoEdit(TodoEdit),
    TodoToggle(TodoToggle),
    TodoMove(TodoMove),
    TagAdd(TagAdd),
    TagRemove(TagRemove),
    TagRename(TagRename),
    TagColorChange(TagColorChange),
    TagMove(TagMove),
    NodePosition(NodePosition),
    AddNode(AddNode),
    RemoveNode(RemoveNode),
    AddEdge(AddEdge),
    RemoveEdge(RemoveEdge),
    AddGroup(AddGroup),
    RemoveGroup(RemoveGroup),
    GroupMove(GroupMove),
    NodeGroupChange(NodeGroupChange),
    GlobalEdgeColorChange(GlobalEdgeColorChange),
    ModulePaletteColorChange(ModulePaletteColorChange),
}

macro_rules! dispatch {
    ($command:expr, $inner:ident => $body:expr) => {
        match $command {
            Command::DescriptionChange($inner) => $body,
            Command::TodoAdd($inner) => $body,
            Command::TodoRemove($inner) => $body,
            Command::TodoEdit($inner) => $body,
            Command::TodoToggle($inner) => $body,
            Command::TodoMove($inner) => $body,
            Command::TagAdd($inner) => $body,
            Command::TagRemove($inner) => $body,
            Command::TagRename($inner) => $body,
            Command::TagColorChange($inner) => $body,
            Command::TagMove($inner) => $body,
            Command::NodePosition($inner) => $body,
            Command::AddNode($inner) => $body,
            Command::RemoveNode($inner) => $body,
            Command::AddEdge($inner) => $body,
            Command::RemoveEdge($inner) => $body,
            Command::AddGroup($inner) => $body,
            Command::RemoveGroup($inner) => $body,
            Command::GroupMove($inner) => $body,
            Command::NodeGroupChange($inner) => $body,
            Command::GlobalEdgeColorChange($inner) => $body,
            Command::ModulePaletteColorChange($inner) => $body,
        }
    };
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::DescriptionChange(_) => CommandKind::DescriptionChange,
            Self::TodoAdd(_) => CommandKind::TodoAdd,
            Self::TodoRemove(_) => CommandKind::TodoRemove,
            Self::TodoEdit(_) => CommandKind::TodoEdit,
            Self::TodoToggle(_) => CommandKind::TodoToggle,
            Self::TodoMove(_) => CommandKind::TodoMove,
            Self::TagAdd(_) => CommandKind::TagAdd,
            Self::TagRemove(_) => CommandKind::TagRemove,
            Self::TagRename(_) => CommandKind::TagRename,
            Self::TagColorChange(_) => CommandKind::TagColorChange,
            Self::TagMove(_) => CommandKind::TagMove,
            Self::NodePosition(_) => CommandKind::NodePosition,
            Self::AddNode(_) => CommandKind::AddNode,
            Self::RemoveNode(_) => CommandKind::RemoveNode,
            Self::AddEdge(_) => CommandKind::AddEdge,
            Self::RemoveEdge(_) => CommandKind::RemoveEdge,
            Self::AddGroup(_) => CommandKind::AddGroup,
            Self::RemoveGroup(_) => CommandKind::RemoveGroup,
            Self::GroupMove(_) => CommandKind::GroupMove,
            Self::NodeGroupChange(_) => CommandKind::NodeGroupChange,
            Self::GlobalEdgeColorChange(_) => CommandKind::GlobalEdgeColorChange,
            Self::ModulePaletteColorChange(_) => CommandKind::ModulePaletteColorChange,
        }
    }

    pub fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        dispatch!(self, inner => inner.apply(target))
    }

    pub fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        dispatch!(self, inner => inner.reverse(target))
    }

    pub fn description(&self) -> String {
        dispatch!(self, inner => inner.description())
    }

    /// Serializes to `{"type": <kind>, ...fields}`.
    pub fn to_record(&self) -> serde_json::Result<Value> {
        encode_command(self)
    }

    /// Node snapshot carried by add/remove-node commands.
    pub fn node_snapshot(&self) -> Option<&NodeData> {
        match self {
            Self::AddNode(command) => Some(&command.node_data_dict),
            Self::RemoveNode(command) => Some(&command.node_data_dict),
            _ => None,
        }
    }

    /// Asset paths a replay of this command could bring back into the project.
    pub fn referenced_assets(&self) -> ReferencedAssets {
        let mut assets = ReferencedAssets::default();
        if let Some(node) = self.node_snapshot() {
            assets.add_node(node);
        }
        assets
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from_variant!(
    DescriptionChange,
    TodoAdd,
    TodoRemove,
    TodoEdit,
    TodoToggle,
    TodoMove,
    TagAdd,
    TagRemove,
    TagRename,
    TagColorChange,
    TagMove,
    NodePosition,
    AddNode,
    RemoveNode,
    AddEdge,
    RemoveEdge,
    AddGroup,
    RemoveGroup,
    GroupMove,
    NodeGroupChange,
    GlobalEdgeColorChange,
    ModulePaletteColorChange,
);
