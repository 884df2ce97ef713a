use researchflow_core::command::{AddEdge, AddNode, DescriptionChange, RemoveNode};
use researchflow_core::{
    AssetStore, CoreConfig, EdgeData, ModuleType, NodeData, PaperMetadata, Position,
    ProjectSession, ProjectStore, SessionError, Snippet, StoreError,
};
use std::fs;

fn session(root: &std::path::Path) -> ProjectSession {
    ProjectSession::new(&CoreConfig::new(root))
}

#[test]
fn create_list_open_and_delete_projects() {
    let root = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(root.path());

    let created = store.create_project("My Thesis: v2").unwrap();
    assert_eq!(created.name, "My_Thesis_v2");
    assert!(created.path.join("assets/papers").is_dir());
    assert!(created.path.join("assets/images").is_dir());
    assert!(created.data_file().is_file());

    assert_eq!(store.list_projects().unwrap(), vec!["My_Thesis_v2"]);
    assert!(matches!(
        store.create_project("My Thesis v2"),
        Err(StoreError::ProjectExists(_))
    ));

    let opened = store.open_project("My_Thesis_v2").unwrap();
    assert_eq!(opened.data, created.data);

    store.delete_project("My_Thesis_v2").unwrap();
    assert!(store.list_projects().unwrap().is_empty());
    assert!(matches!(
        store.open_project("My_Thesis_v2"),
        Err(StoreError::ProjectNotFound(_))
    ));
}

#[test]
fn open_rejects_malformed_snapshot() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("project_data.json"), "{ nope").unwrap();

    let store = ProjectStore::new(root.path());
    assert!(matches!(
        store.open_project("broken"),
        Err(StoreError::Format { .. })
    ));
}

#[test]
fn operations_need_an_open_project() {
    let root = tempfile::tempdir().unwrap();
    let mut session = session(root.path());
    assert!(!session.is_project_open());
    assert!(matches!(session.undo(), Err(SessionError::NoProjectOpen)));
    assert!(matches!(
        session.save_project(),
        Err(SessionError::NoProjectOpen)
    ));
    assert!(matches!(
        session.cleanup_orphaned_assets(),
        Err(SessionError::NoProjectOpen)
    ));
}

#[test]
fn edits_and_history_survive_save_and_reopen() {
    let root = tempfile::tempdir().unwrap();
    let mut session = session(root.path());
    session.create_project("demo").unwrap();

    let node = NodeData::pipeline_module("load", ModuleType::Input, Position::new(1.0, 2.0));
    let node_id = node.id.clone();
    assert!(session.execute(AddNode::new(node)).unwrap());
    let describe = DescriptionChange::new("", "graph for thesis");
    assert!(session.execute(describe).unwrap());
    session.save_project().unwrap();
    session.close_project();
    assert!(!session.history().can_undo());

    let report = session.open_project("demo").unwrap();
    assert_eq!(report.edges_removed, 0);
    assert_eq!(report.history.undo_loaded, 2);
    let data = &session.project().unwrap().data;
    assert!(data.find_node(&node_id).is_some());
    assert_eq!(data.description, "graph for thesis");

    assert!(session.undo().unwrap());
    assert!(session.undo().unwrap());
    assert!(session.project().unwrap().data.nodes.is_empty());
    assert!(session.redo().unwrap());
    assert!(session.project().unwrap().data.find_node(&node_id).is_some());
}

#[test]
fn opening_repairs_dangling_edges() {
    let root = tempfile::tempdir().unwrap();
    let mut session = session(root.path());
    session.create_project("repair").unwrap();

    let node = NodeData::pipeline_module("a", ModuleType::Process, Position::new(0.0, 0.0));
    let node_id = node.id.clone();
    session.execute(AddNode::new(node)).unwrap();
    session
        .execute(AddEdge::new(EdgeData::new(&node_id, "gone")))
        .unwrap();
    session.save_project().unwrap();

    let report = session.open_project("repair").unwrap();
    assert_eq!(report.edges_removed, 1);
    assert!(session.project().unwrap().data.edges.is_empty());
}

#[test]
fn cleanup_keeps_assets_history_could_restore() {
    let root = tempfile::tempdir().unwrap();
    let mut session = session(root.path());
    session.create_project("assets").unwrap();
    let assets = session.project().unwrap().assets();

    let kept = assets.save_clipboard_image(b"kept", "png").unwrap();
    let orphan = assets.save_clipboard_image(b"orphan", "png").unwrap();

    let mut node = NodeData::reference_paper(PaperMetadata::default(), Position::new(0.0, 0.0));
    node.snippets.push(Snippet::image(&kept));
    let node_id = node.id.clone();
    session.execute(AddNode::new(node)).unwrap();

    let remove = RemoveNode::capture(&session.project().unwrap().data, &node_id).unwrap();
    session.execute(remove).unwrap();
    assert!(session.project().unwrap().data.nodes.is_empty());

    let report = session.cleanup_orphaned_assets().unwrap();
    assert_eq!(report.images, 1);
    let remaining = assets
        .list_assets(researchflow_core::AssetCategory::Images)
        .unwrap();
    assert_eq!(remaining, vec![kept.clone()]);
    assert!(!remaining.contains(&orphan));

    assert!(session.undo().unwrap());
    assert!(session.project().unwrap().data.find_node(&node_id).is_some());
}

#[test]
fn deleting_the_open_project_closes_it() {
    let root = tempfile::tempdir().unwrap();
    let mut session = session(root.path());
    session.create_project("gone").unwrap();
    session
        .execute(DescriptionChange::new("", "soon deleted"))
        .unwrap();

    session.delete_project("gone").unwrap();
    assert!(!session.is_project_open());
    assert!(!session.history().can_undo());
    assert!(!root.path().join("gone").exists());
}

#[test]
fn names_that_leave_the_root_are_rejected() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("projects");
    let sibling = outer.path().join("sibling");
    fs::create_dir_all(&sibling).unwrap();
    fs::write(sibling.join("project_data.json"), "{}").unwrap();

    let store = ProjectStore::new(&root);
    store.create_project("kept").unwrap();
    for name in ["", ".", "..", "../sibling", "kept/..", "/tmp"] {
        assert!(
            matches!(store.delete_project(name), Err(StoreError::InvalidProjectName(_))),
            "delete accepted {name:?}"
        );
        assert!(
            matches!(store.open_project(name), Err(StoreError::InvalidProjectName(_))),
            "open accepted {name:?}"
        );
    }
    assert!(root.join("kept").is_dir());
    assert!(sibling.join("project_data.json").is_file());
    assert_eq!(store.list_projects().unwrap(), vec!["kept"]);

    let mut session = session(&root);
    assert!(matches!(
        session.delete_project(".."),
        Err(SessionError::Store(StoreError::InvalidProjectName(_)))
    ));
    assert!(root.is_dir());
}

#[test]
fn create_still_sanitizes_hostile_names() {
    let root = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(root.path());
    let created = store.create_project("../escape").unwrap();
    assert_eq!(created.name, "escape");
    assert_eq!(created.path, root.path().join("escape"));
}
