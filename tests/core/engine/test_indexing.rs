// Integration tests for indexing content from a source

use crate::common::{create_test_engine, ids_of, TestRepo, TestTree};
use nodex::core::engine::ContentSource;
use nodex::core::graph::Path;
use nodex::core::search::{Constraint, QueryCommand};
use std::sync::Arc;

#[test]
fn test_index_whole_workspace() {
    let repo = TestRepo::small();
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);

    let stats = engine.index_content("default", &Path::root(), None).unwrap();
    assert_eq!(stats.indexed, TestTree::new().nodes.len());
    assert_eq!(stats.removed, 0);

    let leaves = engine
        .full_text_search("default", "leaf", Some(50), 0)
        .unwrap();
    assert_eq!(leaves.len(), 6);

    let results = engine
        .execute(
            "default",
            &QueryCommand::new("nodes").with_constraint(Constraint::DescendantNode {
                ancestor: Path::parse("/site/section").unwrap(),
            }),
        )
        .unwrap();
    let locations: Vec<_> = results.tuples.into_iter().map(|t| t.location).collect();
    assert_eq!(ids_of(&locations), TestTree::descendant_ids());
}

#[test]
fn test_offsets_past_the_end_are_empty() {
    let repo = TestRepo::small();
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);
    engine.index_content("default", &Path::root(), None).unwrap();

    assert!(engine
        .full_text_search("default", "leaf", None, usize::MAX)
        .unwrap()
        .is_empty());
    let command = QueryCommand::new("nodes")
        .with_constraint(Constraint::full_text(None, "leaf"))
        .with_limit(10, usize::MAX);
    assert!(engine.execute("default", &command).unwrap().is_empty());
}

#[test]
fn test_reindex_replaces_subtree() {
    let repo = TestRepo::small();
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);
    engine.index_content("default", &Path::root(), None).unwrap();

    // Drop a branch from the source without notifying, then re-crawl its parent
    repo.source
        .remove_below("default", &Path::parse("/site/section/child3").unwrap())
        .unwrap();
    let stats = engine
        .index_content("default", &Path::parse("/site/section").unwrap(), Some(1))
        .unwrap();
    assert_eq!(stats.removed, 10);
    assert_eq!(stats.indexed, 7);

    let hits = engine.full_text_search("default", "leaf", Some(50), 0).unwrap();
    assert_eq!(hits.len(), 4);
    // Nodes outside the crawled subtree are untouched
    let other = engine
        .full_text_search("default", "unrelated", Some(50), 0)
        .unwrap();
    assert_eq!(ids_of(&other), vec!["other"]);
}

#[test]
fn test_many_documents_with_small_batches() {
    let repo = TestRepo::with_documents(40);
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);

    let stats = engine.index_content("default", &Path::root(), Some(1)).unwrap();
    assert_eq!(stats.indexed, 41);

    // Re-indexing deletes in batches of 3 before reading again
    let stats = engine.index_content("default", &Path::root(), None).unwrap();
    assert_eq!(stats.removed, 41);
    assert_eq!(stats.indexed, 41);

    let page = engine
        .full_text_search("default", "document", Some(10), 35)
        .unwrap();
    assert_eq!(page.len(), 5);
}

#[test]
fn test_unknown_workspace() {
    let repo = TestRepo::small();
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);

    let err = engine
        .index_content("missing", &Path::root(), None)
        .unwrap_err();
    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.contains("missing"));
    assert!(message.contains("repo"));
}

#[test]
fn test_optimize_every_workspace() {
    let repo = TestRepo::small();
    repo.source.create_workspace("drafts");
    let (engine, _temp) = create_test_engine(Arc::clone(&repo.source) as Arc<dyn ContentSource>);
    engine.index_content("default", &Path::root(), None).unwrap();

    assert_eq!(engine.optimize(None).unwrap(), 2);
    assert_eq!(engine.optimize(Some("default")).unwrap(), 1);
    assert_eq!(
        engine.full_text_search("default", "leaf", Some(50), 0).unwrap().len(),
        6
    );
}
