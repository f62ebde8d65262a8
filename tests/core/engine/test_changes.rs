// Integration tests for change notifications

use crate::common::{create_test_engine, ids_of, node_with_id, TestRepo};
use nodex::core::engine::{Change, ContentSource};
use nodex::core::graph::{Path, Property};
use std::sync::Arc;

fn path(text: &str) -> Path {
    Path::parse(text).unwrap()
}

fn indexed_repo() -> (TestRepo, nodex::core::engine::SearchEngine, tempfile::TempDir) {
    let repo = TestRepo::small();
    let (engine, temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);
    engine.index_content("default", &Path::root(), None).unwrap();
    (repo, engine, temp)
}

#[test]
fn test_create_and_update_nodes() {
    let (repo, engine, _temp) = indexed_repo();

    let created = node_with_id(
        "/site/news",
        "news",
        vec![Property::single("title", "Breaking announcement")],
    );
    repo.source.put_node("default", created.clone()).unwrap();
    let stats = engine
        .index_changes(&[Change::CreateNode {
            workspace: "default".to_string(),
            node: created,
        }])
        .unwrap();
    assert_eq!(stats.indexed, 1);
    let hits = engine
        .full_text_search("default", "announcement", None, 0)
        .unwrap();
    assert_eq!(ids_of(&hits), vec!["news"]);

    // Property updates are re-read from the source
    let updated = node_with_id(
        "/site/news",
        "news",
        vec![Property::single("title", "Retracted story")],
    );
    repo.source.put_node("default", updated).unwrap();
    engine
        .index_changes(&[Change::SetProperties {
            workspace: "default".to_string(),
            path: path("/site/news"),
            properties: vec![Property::single("title", "Retracted story")],
        }])
        .unwrap();
    assert!(engine
        .full_text_search("default", "announcement", None, 0)
        .unwrap()
        .is_empty());
    assert_eq!(
        ids_of(&engine.full_text_search("default", "retracted", None, 0).unwrap()),
        vec!["news"]
    );
}

#[test]
fn test_remove_subtree() {
    let (repo, engine, _temp) = indexed_repo();

    repo.source
        .remove_below("default", &path("/site/section/child1"))
        .unwrap();
    let stats = engine
        .index_changes(&[Change::RemoveNode {
            workspace: "default".to_string(),
            path: path("/site/section/child1"),
        }])
        .unwrap();
    assert_eq!(stats.removed, 3);

    let leaves = engine
        .full_text_search("default", "leaf", Some(50), 0)
        .unwrap();
    assert_eq!(ids_of(&leaves), vec!["leaf21", "leaf22", "leaf31", "leaf32"]);
}

#[test]
fn test_move_subtree_keeps_identifiers() {
    let (repo, engine, _temp) = indexed_repo();

    let from = path("/site/section/child2");
    let to = path("/other/moved");
    repo.source.move_below("default", &from, &to).unwrap();
    let stats = engine
        .index_changes(&[Change::MoveNode {
            workspace: "default".to_string(),
            from,
            to,
        }])
        .unwrap();
    assert_eq!(stats.moved, 3);

    let hits = engine
        .full_text_search("default", "leaf", Some(50), 0)
        .unwrap();
    assert_eq!(hits.len(), 6);
    let moved = hits
        .iter()
        .find(|l| l.id.as_deref() == Some("leaf21"))
        .unwrap();
    assert_eq!(moved.path, path("/other/moved/leaf1"));
}

#[test]
fn test_changes_from_json() {
    let (repo, engine, _temp) = indexed_repo();
    repo.source.remove_below("default", &path("/other")).unwrap();

    let changes: Vec<Change> = serde_json::from_str(
        r#"[
            {"type": "set_properties", "workspace": "default", "path": "/site", "properties": []},
            {"type": "remove_node", "workspace": "default", "path": "/other"}
        ]"#,
    )
    .unwrap();
    let stats = engine.index_changes(&changes).unwrap();
    assert_eq!(stats.indexed, 1);
    assert_eq!(stats.removed, 1);
    assert!(engine
        .full_text_search("default", "unrelated", None, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_changes_for_unknown_workspace_fail() {
    let (_repo, engine, _temp) = indexed_repo();

    let err = engine
        .index_changes(&[Change::RemoveNode {
            workspace: "missing".to_string(),
            path: path("/site"),
        }])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_destroy_workspace_drops_indexes() {
    let (repo, engine, temp) = indexed_repo();
    assert!(temp.path().join("default").exists());

    repo.source.remove_workspace("default");
    engine
        .index_changes(&[Change::DestroyWorkspace {
            workspace: "default".to_string(),
        }])
        .unwrap();
    assert!(!temp.path().join("default").exists());
    assert!(engine
        .full_text_search("default", "leaf", None, 0)
        .unwrap_err()
        .is_not_found());
}
