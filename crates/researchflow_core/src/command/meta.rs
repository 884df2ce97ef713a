//! Project-metadata commands: description, todos, global tags and colors.
//!
//! # Invariants
//! - Tag commands touch the global tag list only; node tag lists are left
//!   alone so every variant stays an exact inverse.
//! - A negative `todo_index`/`tag_index` means "append at the end".

use super::target::{MutationTarget, TargetError, TargetResult};
use super::Reversible;
use crate::model::project::{TagEntry, TodoItem};
use serde::{Deserialize, Serialize};

const APPEND_INDEX: i64 = -1;

fn append_index() -> i64 {
    APPEND_INDEX
}

/// Slot an insert lands in: `index` when it is inside `0..=len`, else `len`.
fn insert_slot(index: i64, len: usize) -> usize {
    usize::try_from(index)
        .ok()
        .filter(|slot| *slot <= len)
        .unwrap_or(len)
}

/// Slot the matching insert used, given the length after that insert.
fn inserted_slot(list: &'static str, index: i64, len: usize) -> TargetResult<usize> {
    if len == 0 {
        return Err(TargetError::IndexOutOfRange {
            list,
            index: 0,
            len,
        });
    }
    Ok(usize::try_from(index)
        .ok()
        .filter(|slot| *slot < len)
        .unwrap_or(len - 1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionChange {
    pub old_value: String,
    pub new_value: String,
}

impl DescriptionChange {
    pub fn new(old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// Snapshots the current description as the prior value.
    pub fn capture(target: &dyn MutationTarget, new_value: impl Into<String>) -> Self {
        Self::new(target.description(), new_value)
    }
}

impl Reversible for DescriptionChange {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_description(&self.new_value);
        Ok(())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_description(&self.old_value);
        Ok(())
    }

    fn description(&self) -> String {
        "Edit description".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoAdd {
    pub todo_text: String,
    #[serde(default = "append_index")]
    pub todo_index: i64,
}

impl TodoAdd {
    /// Appends at whatever the end of the list is when applied.
    pub fn new(todo_text: impl Into<String>) -> Self {
        Self {
            todo_text: todo_text.into(),
            todo_index: APPEND_INDEX,
        }
    }

    /// Appends at the current end of the list, recording that index.
    pub fn append(target: &dyn MutationTarget, todo_text: impl Into<String>) -> Self {
        Self {
            todo_text: todo_text.into(),
            todo_index: i64::try_from(target.todo_count()).unwrap_or(APPEND_INDEX),
        }
    }
}

impl Reversible for TodoAdd {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        let slot = insert_slot(self.todo_index, target.todo_count());
        target.insert_todo(slot, TodoItem::new(self.todo_text.clone(), false))
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        let slot = inserted_slot("todo", self.todo_index, target.todo_count())?;
        target.remove_todo(slot).map(|_| ())
    }

    fn description(&self) -> String {
        "Add todo".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRemove {
    pub todo_index: usize,
    pub todo_text: String,
    pub is_done: bool,
}

impl TodoRemove {
    pub fn capture(target: &dyn MutationTarget, todo_index: usize) -> TargetResult<Self> {
        let item = target.todo(todo_index).ok_or(TargetError::IndexOutOfRange {
            list: "todo",
            index: todo_index,
            len: target.todo_count(),
        })?;
        Ok(Self {
            todo_index,
            todo_text: item.text.clone(),
            is_done: item.done,
        })
    }
}

impl Reversible for TodoRemove {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_todo(self.todo_index).map(|_| ())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.insert_todo(
            self.todo_index,
            TodoItem::new(self.todo_text.clone(), self.is_done),
        )
    }

    fn description(&self) -> String {
        "Remove todo".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEdit {
    pub todo_index: usize,
    pub old_text: String,
    pub new_text: String,
}

impl TodoEdit {
    pub fn capture(
        target: &dyn MutationTarget,
        todo_index: usize,
        new_text: impl Into<String>,
    ) -> TargetResult<Self> {
        let item = target.todo(todo_index).ok_or(TargetError::IndexOutOfRange {
            list: "todo",
            index: todo_index,
            len: target.todo_count(),
        })?;
        Ok(Self {
            todo_index,
            old_text: item.text.clone(),
            new_text: new_text.into(),
        })
    }
}

impl Reversible for TodoEdit {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_todo_text(self.todo_index, &self.new_text)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_todo_text(self.todo_index, &self.old_text)
    }

    fn description(&self) -> String {
        "Edit todo".to_string()
    }
}

/// Sets a todo's done flag; the prior flag is always `!new_state`.
///
/// Build it with `capture` so that precondition holds; a hand-built toggle
/// to the flag the todo already has does not reverse cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoToggle {
    pub todo_index: usize,
    pub new_state: bool,
}

impl TodoToggle {
    /// Flips the todo's current flag.
    pub fn capture(target: &dyn MutationTarget, todo_index: usize) -> TargetResult<Self> {
        let item = target.todo(todo_index).ok_or(TargetError::IndexOutOfRange {
            list: "todo",
            index: todo_index,
            len: target.todo_count(),
        })?;
        Ok(Self {
            todo_index,
            new_state: !item.done,
        })
    }
}

impl Reversible for TodoToggle {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_todo_done(self.todo_index, self.new_state)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_todo_done(self.todo_index, !self.new_state)
    }

    fn description(&self) -> String {
        if self.new_state {
            "Complete todo".to_string()
        } else {
            "Reopen todo".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoMove {
    pub from_index: usize,
    pub to_index: usize,
}

impl Reversible for TodoMove {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.move_todo(self.from_index, self.to_index)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.move_todo(self.to_index, self.from_index)
    }

    fn description(&self) -> String {
        "Move todo".to_string()
    }
}

/// Adds an uncolored tag to the global list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAdd {
    pub tag_name: String,
    #[serde(default = "append_index")]
    pub tag_index: i64,
}

impl TagAdd {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            tag_index: APPEND_INDEX,
        }
    }

    pub fn append(target: &dyn MutationTarget, tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            tag_index: i64::try_from(target.tag_count()).unwrap_or(APPEND_INDEX),
        }
    }
}

impl Reversible for TagAdd {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        let slot = insert_slot(self.tag_index, target.tag_count());
        target.insert_tag(slot, TagEntry::new(self.tag_name.clone(), None))
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_tag(&self.tag_name).map(|_| ())
    }

    fn description(&self) -> String {
        format!("Add tag '{}'", self.tag_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRemove {
    pub tag_name: String,
    pub tag_color: Option<String>,
    pub tag_index: usize,
}

impl TagRemove {
    pub fn capture(target: &dyn MutationTarget, tag_name: &str) -> TargetResult<Self> {
        let (tag_index, tag) = target
            .tag(tag_name)
            .ok_or_else(|| TargetError::TagNotFound(tag_name.to_string()))?;
        Ok(Self {
            tag_name: tag.name.clone(),
            tag_color: tag.color.clone(),
            tag_index,
        })
    }
}

impl Reversible for TagRemove {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.remove_tag(&self.tag_name).map(|_| ())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        let slot = self.tag_index.min(target.tag_count());
        target.insert_tag(
            slot,
            TagEntry::new(self.tag_name.clone(), self.tag_color.clone()),
        )
    }

    fn description(&self) -> String {
        format!("Remove tag '{}'", self.tag_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRename {
    pub old_name: String,
    pub new_name: String,
}

impl Reversible for TagRename {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.rename_tag(&self.old_name, &self.new_name)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.rename_tag(&self.new_name, &self.old_name)
    }

    fn description(&self) -> String {
        format!("Rename tag '{}' to '{}'", self.old_name, self.new_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagColorChange {
    pub tag_name: String,
    pub old_color: Option<String>,
    pub new_color: Option<String>,
}

impl TagColorChange {
    pub fn capture(
        target: &dyn MutationTarget,
        tag_name: &str,
        new_color: Option<String>,
    ) -> TargetResult<Self> {
        let (_, tag) = target
            .tag(tag_name)
            .ok_or_else(|| TargetError::TagNotFound(tag_name.to_string()))?;
        Ok(Self {
            tag_name: tag.name.clone(),
            old_color: tag.color.clone(),
            new_color,
        })
    }
}

impl Reversible for TagColorChange {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_tag_color(&self.tag_name, self.new_color.as_deref())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_tag_color(&self.tag_name, self.old_color.as_deref())
    }

    fn description(&self) -> String {
        format!("Change color of tag '{}'", self.tag_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMove {
    pub from_index: usize,
    pub to_index: usize,
}

impl Reversible for TagMove {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.move_tag(self.from_index, self.to_index)
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.move_tag(self.to_index, self.from_index)
    }

    fn description(&self) -> String {
        "Move tag".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEdgeColorChange {
    pub old_pipeline_color: String,
    pub old_reference_color: String,
    pub new_pipeline_color: String,
    pub new_reference_color: String,
}

impl GlobalEdgeColorChange {
    pub fn capture(
        target: &dyn MutationTarget,
        new_pipeline_color: impl Into<String>,
        new_reference_color: impl Into<String>,
    ) -> Self {
        let (pipeline, reference) = target.edge_colors();
        Self {
            old_pipeline_color: pipeline.to_string(),
            old_reference_color: reference.to_string(),
            new_pipeline_color: new_pipeline_color.into(),
            new_reference_color: new_reference_color.into(),
        }
    }
}

impl Reversible for GlobalEdgeColorChange {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_edge_colors(&self.new_pipeline_color, &self.new_reference_color);
        Ok(())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_edge_colors(&self.old_pipeline_color, &self.old_reference_color);
        Ok(())
    }

    fn description(&self) -> String {
        "Change edge colors".to_string()
    }
}

/// Palette color for one module type. `module_type` is free-form because
/// palette entries also exist for non-module items such as groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePaletteColorChange {
    pub module_type: String,
    /// `None` when the palette had no entry before the change.
    pub old_color: Option<String>,
    pub new_color: String,
}

impl ModulePaletteColorChange {
    pub fn capture(
        target: &dyn MutationTarget,
        module_type: impl Into<String>,
        new_color: impl Into<String>,
    ) -> Self {
        let module_type = module_type.into();
        let old_color = target.module_color(&module_type).map(str::to_string);
        Self {
            module_type,
            old_color,
            new_color: new_color.into(),
        }
    }
}

impl Reversible for ModulePaletteColorChange {
    fn apply(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_module_color(&self.module_type, Some(&self.new_color));
        Ok(())
    }

    fn reverse(&mut self, target: &mut dyn MutationTarget) -> TargetResult<()> {
        target.set_module_color(&self.module_type, self.old_color.as_deref());
        Ok(())
    }

    fn description(&self) -> String {
        format!("Change {} color", self.module_type)
    }
}

#[cfg(test)]
mod tests {
    use super::{insert_slot, inserted_slot, TagAdd, TodoAdd, TodoToggle};
    use crate::command::Reversible;
    use crate::model::project::{ProjectData, TagEntry, TodoItem};

    #[test]
    fn insert_slot_clamps_negative_and_overflowing_indices() {
        assert_eq!(insert_slot(-1, 3), 3);
        assert_eq!(insert_slot(7, 3), 3);
        assert_eq!(insert_slot(1, 3), 1);
        assert_eq!(inserted_slot("todo", -1, 4).unwrap(), 3);
        assert!(inserted_slot("todo", 0, 0).is_err());
    }

    #[test]
    fn legacy_append_todo_reverses_last_entry() {
        let mut project = ProjectData::new();
        project.todos.push(TodoItem::new("keep", true));
        let mut command = TodoAdd::new("added");

        command.apply(&mut project).unwrap();
        assert_eq!(project.todos[1].text, "added");
        command.reverse(&mut project).unwrap();

        assert_eq!(project.todos, vec![TodoItem::new("keep", true)]);
    }

    #[test]
    fn todo_toggle_capture_flips_current_flag() {
        let mut project = ProjectData::new();
        project.todos.push(TodoItem::new("open", false));
        project.todos.push(TodoItem::new("closed", true));
        let before = project.todos.clone();

        for index in 0..2 {
            let mut command = TodoToggle::capture(&project, index).unwrap();
            assert_eq!(command.new_state, !before[index].done);
            command.apply(&mut project).unwrap();
            assert_ne!(project.todos[index].done, before[index].done);
            command.reverse(&mut project).unwrap();
            assert_eq!(project.todos, before);
        }
        assert!(TodoToggle::capture(&project, 2).is_err());
    }

    #[test]
    fn tag_add_rejects_duplicate_name() {
        let mut project = ProjectData::new();
        project.global_tags.push(TagEntry::new("ml", None));
        let mut command = TagAdd::new("ml");
        assert!(command.apply(&mut project).is_err());
        assert_eq!(project.global_tags.len(), 1);
    }
}
