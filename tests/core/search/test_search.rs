// Integration tests for identifier queries and free-text search

use crate::common::{count_matches, node_with_id, open_session, TestIndexes};
use nodex::core::graph::Property;
use nodex::core::search::{
    identifier_query, Constraint, IndexQuery, QueryCommand, IDENTIFIER_DISJUNCTION_LIMIT,
};
use nodex::core::storage::schema::content;
use nodex::core::storage::IndexKind;
use std::collections::BTreeSet;

#[test]
fn test_identifier_sets_around_disjunction_limit() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for i in 0..1000 {
        session
            .index_node(&node_with_id(
                &format!("/n{i}"),
                &format!("id-{i:04}"),
                vec![Property::single("title", "x")],
            ))
            .unwrap();
    }
    session.commit().unwrap();

    assert_eq!(IDENTIFIER_DISJUNCTION_LIMIT, 50);
    for size in [0usize, 1, 49, 50, 51, 1000] {
        let ids: BTreeSet<String> = (0..size).map(|i| format!("id-{i:04}")).collect();
        let query = identifier_query(content::ID, &ids);
        assert_eq!(
            count_matches(&indexes, IndexKind::Content, &query),
            size,
            "identifier set of {size}"
        );
    }
    assert_eq!(identifier_query(content::ID, &BTreeSet::new()), IndexQuery::MatchNone);

    // Unknown identifiers match nothing
    let mut mixed: BTreeSet<String> = (0..60).map(|i| format!("id-{i:04}")).collect();
    mixed.insert("unknown".to_string());
    assert_eq!(
        count_matches(&indexes, IndexKind::Content, &identifier_query(content::ID, &mixed)),
        60
    );
}

#[test]
fn test_offset_matches_slice_of_full_ranking() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for i in 0..20usize {
        let body = format!("{} filler words here", "needle ".repeat(i + 1));
        session
            .index_node(&node_with_id(
                &format!("/doc{i}"),
                &format!("doc{i}"),
                vec![Property::single("body", body)],
            ))
            .unwrap();
    }
    session
        .index_node(&node_with_id(
            "/unrelated",
            "unrelated",
            vec![Property::single("body", "haystack only")],
        ))
        .unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let all = session.search("needle", 20, 0).unwrap();
    assert_eq!(all.len(), 20);
    let page = session.search("needle", 5, 10).unwrap();
    assert_eq!(page, all[10..15].to_vec());

    let hits = session.search_hits("needle", 20, 0).unwrap();
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

    assert!(session.search("needle", 5, 20).unwrap().is_empty());
}

#[test]
fn test_huge_offsets_return_nothing() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for i in 0..3 {
        session
            .index_node(&node_with_id(
                &format!("/doc{i}"),
                &format!("doc{i}"),
                vec![Property::single("body", "quick brown fox")],
            ))
            .unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    assert!(session.search("quick", 10, usize::MAX - 5).unwrap().is_empty());
    assert_eq!(session.search("quick", usize::MAX, 1).unwrap().len(), 2);

    let command = QueryCommand::new("nodes")
        .with_constraint(Constraint::full_text(None, "quick"))
        .with_limit(10, usize::MAX);
    assert!(session.query(&command).unwrap().is_empty());
    let command = command.with_limit(usize::MAX, 2);
    assert_eq!(session.query(&command).unwrap().len(), 1);
}

#[test]
fn test_free_text_operators() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for (path, id, body) in [
        ("/a", "a", "apple banana"),
        ("/b", "b", "apple cherry"),
        ("/c", "c", "banana cherry"),
    ] {
        session
            .index_node(&node_with_id(path, id, vec![Property::single("body", body)]))
            .unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let ids = |session: &mut nodex::core::storage::IndexSession, q: &str| {
        let mut ids: Vec<String> = session
            .search(q, 10, 0)
            .unwrap()
            .into_iter()
            .filter_map(|l| l.id)
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&mut session, "apple AND cherry"), vec!["b"]);
    assert_eq!(ids(&mut session, "apple OR cherry"), vec!["a", "b", "c"]);
    assert_eq!(ids(&mut session, "banana -apple"), vec!["c"]);
    assert_eq!(ids(&mut session, "\"banana cherry\""), vec!["c"]);

    let err = session.search("props:apple", 10, 0).unwrap_err();
    assert!(err.is_bad_request());
}
