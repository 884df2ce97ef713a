use researchflow_core::command::{DescriptionChange, NodePosition, TodoAdd, TodoToggle};
use researchflow_core::{
    EdgeData, GroupData, HistoryError, ModuleType, MutationTarget, NodeData, Position,
    ProjectData, ReplayFlag, TagEntry, TargetError, TargetResult, TodoItem, UndoManager,
};
use serde_json::json;

fn describe(history: &mut UndoManager, project: &mut ProjectData, text: &str) {
    let command = DescriptionChange::capture(&*project, text);
    assert!(history.execute(command, project).unwrap());
}

#[test]
fn undo_stack_keeps_only_the_newest_hundred_commands() {
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    for i in 0..150 {
        describe(&mut history, &mut project, &format!("v{i}"));
    }
    assert_eq!(history.undo_len(), 100);
    assert_eq!(project.description, "v149");

    let mut undone = 0;
    while history.undo(&mut project).unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 100);
    assert_eq!(project.description, "v49");
    assert_eq!(history.redo_len(), 100);
}

#[test]
fn capacity_is_configurable() {
    let mut project = ProjectData::new();
    let mut history = UndoManager::with_capacity(3);
    for i in 0..5 {
        describe(&mut history, &mut project, &format!("v{i}"));
    }
    assert_eq!(history.capacity(), 3);
    assert_eq!(history.undo_len(), 3);
}

#[test]
fn execute_clears_redo_and_undo_redo_walk_the_stacks() {
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    assert!(!history.undo(&mut project).unwrap());
    assert!(!history.redo(&mut project).unwrap());

    describe(&mut history, &mut project, "one");
    describe(&mut history, &mut project, "two");
    assert!(history.undo(&mut project).unwrap());
    assert_eq!(project.description, "one");
    assert!(history.can_redo());
    assert!(history.redo_label().is_some());

    assert!(history.redo(&mut project).unwrap());
    assert_eq!(project.description, "two");
    assert!(history.undo(&mut project).unwrap());

    describe(&mut history, &mut project, "three");
    assert_eq!(history.redo_len(), 0);
    assert!(!history.redo(&mut project).unwrap());
    assert_eq!(history.undo_len(), 2);
    assert!(history.undo_label().is_some());
}

#[test]
fn execute_is_suppressed_while_replaying() {
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    let flag = history.replay_flag();
    {
        let _guard = flag.enter();
        let command = DescriptionChange::capture(&project, "ignored");
        assert!(!history.execute(command, &mut project).unwrap());
    }
    assert_eq!(project.description, "");
    assert_eq!(history.undo_len(), 0);
    assert!(!history.is_replaying());
}

#[test]
fn failed_execute_records_nothing_and_keeps_redo() {
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    describe(&mut history, &mut project, "one");
    history.undo(&mut project).unwrap();

    let missing = NodePosition::new("ghost", Position::new(0.0, 0.0), Position::new(1.0, 1.0));
    let err = history.execute(missing, &mut project).unwrap_err();
    assert!(matches!(
        err,
        HistoryError::Target(TargetError::NodeNotFound(_))
    ));
    assert_eq!(history.undo_len(), 0);
    assert_eq!(history.redo_len(), 1);
}

#[test]
fn failed_undo_discards_command_and_clears_replay_flag() {
    let mut project = ProjectData::new();
    let node = NodeData::pipeline_module("load", ModuleType::Input, Position::new(0.0, 0.0));
    let node_id = node.id.clone();
    project.nodes.push(node);

    let mut history = UndoManager::new();
    let moved = NodePosition::new(&node_id, Position::new(0.0, 0.0), Position::new(8.0, 4.0));
    history.execute(moved, &mut project).unwrap();
    project.nodes.clear();

    let err = history.undo(&mut project).unwrap_err();
    assert!(matches!(
        err,
        HistoryError::Target(TargetError::NodeNotFound(_))
    ));
    assert!(!history.is_replaying());
    assert_eq!(history.undo_len(), 0);
    assert_eq!(history.redo_len(), 0);

    describe(&mut history, &mut project, "still works");
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn attached_history_autosaves_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = ProjectData::new();
    project.todos.push(TodoItem::new("read", false));

    let mut history = UndoManager::new();
    history.attach(dir.path());
    describe(&mut history, &mut project, "one");
    let add = TodoAdd::append(&project, "write");
    history.execute(add, &mut project).unwrap();
    let toggle = TodoToggle::capture(&project, 0).unwrap();
    history.execute(toggle, &mut project).unwrap();
    history.undo(&mut project).unwrap();
    assert!(history.history_file().unwrap().exists());

    let mut reloaded = UndoManager::new();
    let report = reloaded.load_from_file(dir.path()).unwrap();
    assert_eq!(report.undo_loaded, 2);
    assert_eq!(report.redo_loaded, 1);
    assert_eq!(report.dropped, 0);

    let labels: Vec<String> = history.undo_commands().map(|c| c.description()).collect();
    let reloaded_labels: Vec<String> = reloaded
        .undo_commands()
        .map(|c| c.description())
        .collect();
    assert_eq!(labels, reloaded_labels);

    assert!(reloaded.redo(&mut project).unwrap());
    assert!(project.todos[0].done);
    assert!(reloaded.undo(&mut project).unwrap());
    assert!(reloaded.undo(&mut project).unwrap());
    assert_eq!(project.todos.len(), 1);
}

#[test]
fn load_skips_unknown_and_malformed_records() {
    let dir = tempfile::tempdir().unwrap();
    let history_json = json!({
        "undo_stack": [
            {"type": "DescriptionChange", "old_value": "", "new_value": "a"},
            {"type": "ScriptRun", "script": "rm -rf"},
            {"type": "DescriptionChange", "old_value": "a", "new_value": "b"}
        ],
        "redo_stack": [
            {"type": "TodoMove", "from_index": "first"},
            {"type": "TodoToggle", "todo_index": 0, "new_state": true}
        ]
    });
    std::fs::write(
        dir.path().join("undo_history.json"),
        serde_json::to_string(&history_json).unwrap(),
    )
    .unwrap();

    let mut history = UndoManager::new();
    let report = history.load_from_file(dir.path()).unwrap();
    assert_eq!(report.undo_loaded, 2);
    assert_eq!(report.redo_loaded, 1);
    assert_eq!(report.dropped, 2);
}

#[test]
fn load_trims_oversized_undo_stack() {
    let dir = tempfile::tempdir().unwrap();
    let records: Vec<_> = (0..5)
        .map(|i| json!({"type": "DescriptionChange", "old_value": "", "new_value": format!("v{i}")}))
        .collect();
    std::fs::write(
        dir.path().join("undo_history.json"),
        serde_json::to_string(&json!({"undo_stack": records, "redo_stack": []})).unwrap(),
    )
    .unwrap();

    let mut history = UndoManager::with_capacity(2);
    let report = history.load_from_file(dir.path()).unwrap();
    assert_eq!(report.undo_loaded, 2);
    assert_eq!(report.dropped, 3);
    let mut project = ProjectData::new();
    project.description = "v4".to_string();
    history.undo(&mut project).unwrap();
    assert_eq!(project.description, "");
}

#[test]
fn missing_file_yields_empty_stacks() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    describe(&mut history, &mut project, "one");

    let report = history.load_from_file(dir.path()).unwrap();
    assert_eq!(report.undo_loaded, 0);
    assert!(!history.can_undo());
}

#[test]
fn malformed_file_is_an_error_and_keeps_current_stacks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("undo_history.json"), "{not json").unwrap();

    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    describe(&mut history, &mut project, "one");

    let err = history.load_from_file(dir.path()).unwrap_err();
    assert!(matches!(err, HistoryError::Format(_)));
    assert_eq!(history.undo_len(), 1);
}

/// `ProjectData` wrapper that notes the replay flag on every description or
/// node-position write.
struct RecordingTarget {
    project: ProjectData,
    flag: ReplayFlag,
    seen: Vec<bool>,
}

impl RecordingTarget {
    fn new(project: ProjectData, flag: ReplayFlag) -> Self {
        Self {
            project,
            flag,
            seen: Vec::new(),
        }
    }

    fn take_seen(&mut self) -> Vec<bool> {
        std::mem::take(&mut self.seen)
    }
}

impl MutationTarget for RecordingTarget {
    fn node(&self, node_id: &str) -> Option<&NodeData> {
        self.project.node(node_id)
    }
    fn group(&self, group_id: &str) -> Option<&GroupData> {
        self.project.group(group_id)
    }
    fn edge(&self, edge_id: &str) -> Option<&EdgeData> {
        self.project.edge(edge_id)
    }
    fn edges_touching(&self, node_id: &str) -> Vec<EdgeData> {
        MutationTarget::edges_touching(&self.project, node_id)
    }
    fn groups_containing(&self, node_id: &str) -> Vec<String> {
        self.project.groups_containing(node_id)
    }
    fn set_node_position(&mut self, node_id: &str, position: Position) -> TargetResult<()> {
        self.seen.push(self.flag.is_active());
        self.project.set_node_position(node_id, position)
    }
    fn set_group_position(&mut self, group_id: &str, position: Position) -> TargetResult<()> {
        self.project.set_group_position(group_id, position)
    }
    fn node_index(&self, node_id: &str) -> Option<usize> {
        self.project.node_index(node_id)
    }
    fn edge_index(&self, edge_id: &str) -> Option<usize> {
        self.project.edge_index(edge_id)
    }
    fn group_index(&self, group_id: &str) -> Option<usize> {
        self.project.group_index(group_id)
    }
    fn insert_node(&mut self, index: Option<usize>, node: NodeData) -> TargetResult<()> {
        self.project.insert_node(index, node)
    }
    fn remove_node(&mut self, node_id: &str) -> TargetResult<NodeData> {
        self.project.remove_node(node_id)
    }
    fn insert_edge(&mut self, index: Option<usize>, edge: EdgeData) -> TargetResult<()> {
        self.project.insert_edge(index, edge)
    }
    fn remove_edge(&mut self, edge_id: &str) -> TargetResult<EdgeData> {
        self.project.remove_edge(edge_id)
    }
    fn insert_group(&mut self, index: Option<usize>, group: GroupData) -> TargetResult<()> {
        self.project.insert_group(index, group)
    }
    fn remove_group(&mut self, group_id: &str) -> TargetResult<GroupData> {
        self.project.remove_group(group_id)
    }
    fn set_group_membership(&mut self, node_id: &str, group_id: Option<&str>) -> TargetResult<()> {
        self.project.set_group_membership(node_id, group_id)
    }
    fn add_group_member(
        &mut self,
        group_id: &str,
        node_id: &str,
        index: Option<usize>,
    ) -> TargetResult<()> {
        self.project.add_group_member(group_id, node_id, index)
    }
    fn description(&self) -> &str {
        MutationTarget::description(&self.project)
    }
    fn set_description(&mut self, text: &str) {
        self.seen.push(self.flag.is_active());
        self.project.set_description(text)
    }
    fn edge_colors(&self) -> (&str, &str) {
        self.project.edge_colors()
    }
    fn set_edge_colors(&mut self, pipeline: &str, reference: &str) {
        self.project.set_edge_colors(pipeline, reference)
    }
    fn module_color(&self, module_type: &str) -> Option<&str> {
        self.project.module_color(module_type)
    }
    fn set_module_color(&mut self, module_type: &str, color: Option<&str>) {
        self.project.set_module_color(module_type, color)
    }
    fn todo(&self, index: usize) -> Option<&TodoItem> {
        self.project.todo(index)
    }
    fn todo_count(&self) -> usize {
        self.project.todo_count()
    }
    fn insert_todo(&mut self, index: usize, item: TodoItem) -> TargetResult<()> {
        self.project.insert_todo(index, item)
    }
    fn remove_todo(&mut self, index: usize) -> TargetResult<TodoItem> {
        self.project.remove_todo(index)
    }
    fn set_todo_text(&mut self, index: usize, text: &str) -> TargetResult<()> {
        self.project.set_todo_text(index, text)
    }
    fn set_todo_done(&mut self, index: usize, done: bool) -> TargetResult<()> {
        self.project.set_todo_done(index, done)
    }
    fn move_todo(&mut self, from: usize, to: usize) -> TargetResult<()> {
        self.project.move_todo(from, to)
    }
    fn tag(&self, name: &str) -> Option<(usize, &TagEntry)> {
        self.project.tag(name)
    }
    fn tag_count(&self) -> usize {
        self.project.tag_count()
    }
    fn insert_tag(&mut self, index: usize, tag: TagEntry) -> TargetResult<()> {
        self.project.insert_tag(index, tag)
    }
    fn remove_tag(&mut self, name: &str) -> TargetResult<(usize, TagEntry)> {
        self.project.remove_tag(name)
    }
    fn rename_tag(&mut self, old_name: &str, new_name: &str) -> TargetResult<()> {
        self.project.rename_tag(old_name, new_name)
    }
    fn set_tag_color(&mut self, name: &str, color: Option<&str>) -> TargetResult<()> {
        self.project.set_tag_color(name, color)
    }
    fn move_tag(&mut self, from: usize, to: usize) -> TargetResult<()> {
        self.project.move_tag(from, to)
    }
}

#[test]
fn replay_flag_is_raised_only_while_undo_and_redo_run() {
    let mut history = UndoManager::new();
    let mut target = RecordingTarget::new(ProjectData::new(), history.replay_flag());

    let command = DescriptionChange::capture(&target, "edited");
    assert!(history.execute(command, &mut target).unwrap());
    assert_eq!(target.take_seen(), vec![false]);

    assert!(history.undo(&mut target).unwrap());
    assert_eq!(target.take_seen(), vec![true]);
    assert!(!history.is_replaying());
    assert_eq!(target.project.description, "");

    assert!(history.redo(&mut target).unwrap());
    assert_eq!(target.take_seen(), vec![true]);
    assert!(!history.is_replaying());
    assert_eq!(target.project.description, "edited");
}

#[test]
fn replay_flag_drops_after_a_failing_reverse() {
    let node = NodeData::pipeline_module("load", ModuleType::Input, Position::new(0.0, 0.0));
    let node_id = node.id.clone();
    let mut project = ProjectData::new();
    project.nodes.push(node);

    let mut history = UndoManager::new();
    let flag = history.replay_flag();
    let mut target = RecordingTarget::new(project, flag.clone());
    let moved = NodePosition::new(&node_id, Position::new(0.0, 0.0), Position::new(3.0, 3.0));
    history.execute(moved, &mut target).unwrap();
    target.take_seen();
    target.project.nodes.clear();

    assert!(history.undo(&mut target).is_err());
    assert_eq!(target.take_seen(), vec![true]);
    assert!(!flag.is_active());

    // Edits made after the failure are recorded normally.
    let command = DescriptionChange::capture(&target, "after");
    assert!(history.execute(command, &mut target).unwrap());
    assert_eq!(target.take_seen(), vec![false]);
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn save_creates_missing_directories_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    describe(&mut history, &mut project, "one");

    history.save_to_file(&nested).unwrap();
    assert!(nested.join("undo_history.json").exists());
    assert!(!nested.join("undo_history.json.tmp").exists());

    let mut reloaded = UndoManager::new();
    assert_eq!(reloaded.load_from_file(&nested).unwrap().undo_loaded, 1);
}

#[test]
fn autosave_replaces_the_file_in_one_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = ProjectData::new();
    let mut history = UndoManager::new();
    history.attach(dir.path());
    for i in 0..3 {
        describe(&mut history, &mut project, &format!("v{i}"));
    }
    history.undo(&mut project).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["undo_history.json".to_string()]);

    let mut reloaded = UndoManager::new();
    let report = reloaded.load_from_file(dir.path()).unwrap();
    assert_eq!((report.undo_loaded, report.redo_loaded), (2, 1));
}
