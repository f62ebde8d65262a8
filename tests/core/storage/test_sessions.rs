// Integration tests for index sessions

use crate::common::{count_matches, node_with_id, open_session, TestIndexes, TestTree};
use nodex::core::error::NodexError;
use nodex::core::graph::{Path, Property};
use nodex::core::search::IndexQuery;
use nodex::core::storage::schema::{content, paths};
use nodex::core::storage::IndexKind;

fn documents_for(indexes: &TestIndexes, id: &str) -> (usize, usize) {
    (
        count_matches(indexes, IndexKind::Paths, &IndexQuery::term(paths::ID, id)),
        count_matches(indexes, IndexKind::Content, &IndexQuery::term(content::ID, id)),
    )
}

#[test]
fn test_each_node_has_one_document_per_index() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    for node in TestTree::new().nodes {
        session.index_node(&node).unwrap();
    }
    session.commit().unwrap();

    for node in TestTree::new().nodes {
        let id = node.location.id.clone().unwrap();
        assert_eq!(documents_for(&indexes, &id), (1, 1), "node {id}");
    }

    // Re-indexing replaces both documents
    let mut session = open_session(&indexes, 10, false);
    session
        .index_node(&node_with_id(
            "/site/section/child1",
            "child1",
            vec![Property::single("title", "Renamed child")],
        ))
        .unwrap();
    session.commit().unwrap();
    assert_eq!(documents_for(&indexes, "child1"), (1, 1));

    // Deleting a subtree removes both documents of every node in it
    let mut session = open_session(&indexes, 4, false);
    let deleted = session
        .delete_below(&Path::parse("/site/section").unwrap())
        .unwrap();
    session.commit().unwrap();
    assert_eq!(deleted, 10);
    for id in ["section", "child1", "child3", "leaf11", "leaf32"] {
        assert_eq!(documents_for(&indexes, id), (0, 0), "node {id}");
    }
    assert_eq!(documents_for(&indexes, "site"), (1, 1));
    assert_eq!(documents_for(&indexes, "other"), (1, 1));
}

#[test]
fn test_new_identifier_at_a_path_replaces_the_old_node() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    session.index_node(&node_with_id("/a", "x", vec![])).unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, false);
    session.index_node(&node_with_id("/a", "y", vec![])).unwrap();
    session.commit().unwrap();

    assert_eq!(documents_for(&indexes, "x"), (0, 0));
    assert_eq!(documents_for(&indexes, "y"), (1, 1));
    let mut session = open_session(&indexes, 10, true);
    assert_eq!(
        session.id_at(&Path::parse("/a").unwrap()).unwrap(),
        Some("y".to_string())
    );
}

#[test]
fn test_new_identifier_at_a_pending_path_replaces_the_pending_node() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    session.index_node(&node_with_id("/a", "x", vec![])).unwrap();
    session.index_node(&node_with_id("/a", "y", vec![])).unwrap();
    assert_eq!(
        session.id_at(&Path::parse("/a").unwrap()).unwrap(),
        Some("y".to_string())
    );
    session.commit().unwrap();

    assert_eq!(documents_for(&indexes, "x"), (0, 0));
    assert_eq!(documents_for(&indexes, "y"), (1, 1));
}

#[test]
fn test_paths_round_trip_through_the_index() {
    let indexes = TestIndexes::new();
    let cases = [
        ("/", "root"),
        ("/a", "a"),
        ("/a/b[2]", "b2"),
        ("/a/b[2]/jcr:content[3]", "content3"),
    ];
    let mut session = open_session(&indexes, 10, false);
    for (path, id) in cases {
        session.index_node(&node_with_id(path, id, Vec::new())).unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, true);
    for (path, id) in cases {
        let location = session.location_for(id).unwrap().unwrap();
        assert_eq!(location.path, Path::parse(path).unwrap());
        assert_eq!(location.id.as_deref(), Some(id));
    }
    let root = session.location_for("root").unwrap().unwrap();
    assert_eq!(root.path.to_string(), "/");
    let sns = session.location_for("content3").unwrap().unwrap();
    assert_eq!(sns.path.to_string(), "/a[1]/b[2]/jcr:content[3]");
    assert!(session.location_for("missing").unwrap().is_none());
}

#[test]
fn test_rolled_back_session_leaves_indexes_untouched() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    session
        .index_node(&node_with_id("/kept", "kept", Vec::new()))
        .unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, false);
    session
        .index_node(&node_with_id("/discarded", "discarded", Vec::new()))
        .unwrap();
    session.delete_below(&Path::parse("/kept").unwrap()).unwrap();
    session.rollback().unwrap();

    assert_eq!(documents_for(&indexes, "kept"), (1, 1));
    assert_eq!(documents_for(&indexes, "discarded"), (0, 0));
}

#[test]
fn test_closed_session_rejects_work() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    session.commit().unwrap();
    let err = session
        .index_node(&node_with_id("/late", "late", Vec::new()))
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        NodexError::SessionClosed("committed")
    ));
    assert!(session.commit().is_err());
}

#[test]
fn test_new_session_sees_committed_writes() {
    let indexes = TestIndexes::new();
    let mut reader = open_session(&indexes, 10, true);
    assert!(reader.location_for("n1").unwrap().is_none());

    let mut writer = open_session(&indexes, 10, false);
    writer
        .index_node(&node_with_id("/n1", "n1", Vec::new()))
        .unwrap();
    writer.commit().unwrap();

    let mut fresh = open_session(&indexes, 10, true);
    assert!(fresh.location_for("n1").unwrap().is_some());
}
