//! Command kind table and record (de)serialization.
//!
//! # Invariants
//! - `CommandKind::as_str` equals the `"type"` tag serde writes for the
//!   matching `Command` variant.
//! - Decoding never fails a whole load: unknown kinds and malformed records
//!   are logged and dropped one at a time.

use super::Command;
use log::warn;
use serde::Deserialize;
use serde_json::Value;

/// Stable tag of every persisted command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
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
}

impl CommandKind {
    pub const ALL: [CommandKind; 22] = [
        Self::DescriptionChange,
        Self::TodoAdd,
        Self::TodoRemove,
        Self::TodoEdit,
        Self::TodoToggle,
        Self::TodoMove,
        Self::TagAdd,
        Self::TagRemove,
        Self::TagRename,
        Self::TagColorChange,
        Self::TagMove,
        Self::NodePosition,
        Self::AddNode,
        Self::RemoveNode,
        Self::AddEdge,
        Self::RemoveEdge,
        Self::AddGroup,
        Self::RemoveGroup,
        Self::GroupMove,
        Self::NodeGroupChange,
        Self::GlobalEdgeColorChange,
        Self::ModulePaletteColorChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DescriptionChange => "DescriptionChange",
            Self::TodoAdd => "TodoAdd",
            Self::TodoRemove => "TodoRemove",
            Self::TodoEdit => "TodoEdit",
            Self::TodoToggle => "TodoToggle",
            Self::TodoMove => "TodoMove",
            Self::TagAdd => "TagAdd",
            Self::TagRemove => "TagRemove",
            Self::TagRename => "TagRename",
            Self::TagColorChange => "TagColorChange",
            Self::TagMove => "TagMove",
            Self::NodePosition => "NodePosition",
            Self::AddNode => "AddNode",
            Self::RemoveNode => "RemoveNode",
            Self::AddEdge => "AddEdge",
            Self::RemoveEdge => "RemoveEdge",
            Self::AddGroup => "AddGroup",
            Self::RemoveGroup => "RemoveGroup",
            Self::GroupMove => "GroupMove",
            Self::NodeGroupChange => "NodeGroupChange",
            Self::GlobalEdgeColorChange => "GlobalEdgeColorChange",
            Self::ModulePaletteColorChange => "ModulePaletteColorChange",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Serializes a command to its persisted record.
pub fn encode_command(command: &Command) -> serde_json::Result<Value> {
    serde_json::to_value(command)
}

/// Rebuilds a command from its persisted record.
///
/// Returns `None` for records with an unknown or missing kind and for
/// records whose fields do not fit the kind. Both cases are logged.
pub fn decode_command(value: &Value) -> Option<Command> {
    let tag = value.get("type").and_then(Value::as_str);
    let Some(kind) = tag.and_then(CommandKind::parse) else {
        warn!(
            "event=command_decode module=command status=skip reason=unknown_kind kind={}",
            tag.unwrap_or("<missing>")
        );
        return None;
    };

    match Command::deserialize(value) {
        Ok(command) => Some(command),
        Err(err) => {
            warn!(
                "event=command_decode module=command status=skip reason=invalid_fields kind={} error={err}",
                kind.as_str()
            );
            None
        }
    }
}
