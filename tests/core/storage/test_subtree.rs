// Integration tests for subtree maintenance

use crate::common::{node_with_id, open_session, TestIndexes, TestTree};
use nodex::core::graph::{Path, Property};

fn seed_documents(indexes: &TestIndexes, count: usize) {
    let mut session = open_session(indexes, 10, false);
    session
        .index_node(&node_with_id("/docs", "docs", Vec::new()))
        .unwrap();
    for i in 0..count {
        session
            .index_node(&node_with_id(
                &format!("/docs/doc{i}"),
                &format!("doc{i}"),
                vec![Property::single("body", "text")],
            ))
            .unwrap();
    }
    session.commit().unwrap();
}

#[test]
fn test_batched_delete_issues_ceiling_batches() {
    // 1 folder + 9 documents = 10 nodes
    for (batch_size, expected_batches) in [(3usize, 4usize), (5, 2), (10, 1), (20, 1)] {
        let indexes = TestIndexes::new();
        seed_documents(&indexes, 9);

        let mut session = open_session(&indexes, batch_size, false);
        let stats = session
            .delete_below_batched(&Path::parse("/docs").unwrap())
            .unwrap();
        session.commit().unwrap();
        assert_eq!(stats.deleted, 10, "batch size {batch_size}");
        assert_eq!(stats.batches, expected_batches, "batch size {batch_size}");

        let mut check = open_session(&indexes, batch_size, true);
        assert!(check
            .ids_for_descendants_of(&Path::root(), false)
            .unwrap()
            .is_empty());
    }
}

#[test]
fn test_exact_multiple_of_batch_size() {
    let indexes = TestIndexes::new();
    seed_documents(&indexes, 8);
    let mut session = open_session(&indexes, 3, false);
    let stats = session
        .delete_below_batched(&Path::parse("/docs").unwrap())
        .unwrap();
    assert_eq!(stats.deleted, 9);
    assert_eq!(stats.batches, 3);
    session.commit().unwrap();
}

#[test]
fn test_delete_on_missing_index_is_zero() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 3, false);
    let stats = session
        .delete_below_batched(&Path::parse("/anything").unwrap())
        .unwrap();
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.batches, 0);
    session.commit().unwrap();
}

#[test]
fn test_children_versus_descendants() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    for node in TestTree::new().nodes {
        session.index_node(&node).unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, true);
    let section = Path::parse("/site/section").unwrap();
    let children: Vec<String> = session
        .ids_for_children_of(&section)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(children, TestTree::child_ids());

    let descendants: Vec<String> = session
        .ids_for_descendants_of(&section, false)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(descendants, TestTree::descendant_ids());

    let with_self = session.ids_for_descendants_of(&section, true).unwrap();
    assert_eq!(with_self.len(), 10);
    assert!(with_self.contains("section"));

    let top: Vec<String> = session
        .ids_for_children_of(&Path::root())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(top, vec!["other".to_string(), "site".to_string()]);
}

#[test]
fn test_move_rewrites_paths_only() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 10, false);
    for node in TestTree::new().nodes {
        session.index_node(&node).unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, false);
    let moved = session
        .move_subtree(
            &Path::parse("/site/section/child2").unwrap(),
            &Path::parse("/other/moved[2]").unwrap(),
        )
        .unwrap();
    assert_eq!(moved, 3);
    session.commit().unwrap();

    let mut session = open_session(&indexes, 10, true);
    let leaf = session.location_for("leaf21").unwrap().unwrap();
    assert_eq!(leaf.path.to_string(), "/other[1]/moved[2]/leaf1[1]");
    let children = session
        .ids_for_children_of(&Path::parse("/other").unwrap())
        .unwrap();
    assert_eq!(children.into_iter().collect::<Vec<_>>(), vec!["child2".to_string()]);
    assert_eq!(
        session
            .ids_for_children_of(&Path::parse("/site/section").unwrap())
            .unwrap()
            .len(),
        2
    );
    // Content is untouched and still joined by identifier
    let hits = session.search("leaf", 10, 0).unwrap();
    assert!(hits
        .iter()
        .any(|l| l.path.to_string() == "/other[1]/moved[2]/leaf2[1]"));
}
