// Integration tests for structured constraints executed by the access component

use crate::common::{node_with_id, open_session, TestIndexes, TestTree};
use nodex::core::graph::{Path, Property, Value};
use nodex::core::search::{Constraint, DynamicOperand, Operator, QueryCommand};
use nodex::core::storage::IndexSession;

fn ids(session: &mut IndexSession, constraint: Constraint) -> Vec<String> {
    let results = session
        .query(&QueryCommand::new("nodes").with_constraint(constraint))
        .unwrap();
    let mut ids: Vec<String> = results
        .tuples
        .into_iter()
        .filter_map(|t| t.location.id)
        .collect();
    ids.sort();
    ids
}

fn seed_codes(indexes: &TestIndexes) {
    let mut session = open_session(indexes, 100, false);
    for (i, code) in ["ab", "abc", "abcd", "xab", "ac", "abbc", "%value", "avalue"]
        .iter()
        .enumerate()
    {
        session
            .index_node(&node_with_id(
                &format!("/code{i}"),
                code,
                vec![Property::single("code", *code)],
            ))
            .unwrap();
    }
    session.commit().unwrap();
}

fn like(pattern: &str) -> Constraint {
    Constraint::compare(DynamicOperand::property("code"), Operator::Like, pattern)
}

#[test]
fn test_like_wildcards() {
    let indexes = TestIndexes::new();
    seed_codes(&indexes);
    let mut session = open_session(&indexes, 100, true);

    assert_eq!(ids(&mut session, like("ab%")), vec!["ab", "abbc", "abc", "abcd"]);
    assert_eq!(ids(&mut session, like("a_c")), vec!["abc"]);
    assert_eq!(ids(&mut session, like(r"\%value")), vec!["%value"]);
    assert_eq!(ids(&mut session, like("%value")), vec!["%value", "avalue"]);
    assert_eq!(ids(&mut session, like("%")).len(), 8);
}

#[test]
fn test_like_spans_multiline_values() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    session
        .index_node(&node_with_id(
            "/multi",
            "m1",
            vec![Property::single("code", "line one\nline two")],
        ))
        .unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    assert_eq!(ids(&mut session, like("line%")), vec!["m1"]);
    assert_eq!(ids(&mut session, like("%two")), vec!["m1"]);
    assert_eq!(ids(&mut session, like("line one_line%")), vec!["m1"]);
    assert!(ids(&mut session, like("line two%")).is_empty());
}

#[test]
fn test_deep_nodes_have_no_depth_ceiling() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    let deep: String = (0..150).map(|i| format!("/n{i}")).collect();
    session.index_node(&node_with_id(&deep, "deep", vec![])).unwrap();
    session.index_node(&node_with_id("/shallow", "shallow", vec![])).unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    assert_eq!(
        ids(&mut session, Constraint::DescendantNode { ancestor: Path::root() }),
        vec!["deep", "shallow"]
    );
    assert_eq!(
        ids(
            &mut session,
            Constraint::compare(DynamicOperand::NodeDepth, Operator::GreaterThan, 100i64)
        ),
        vec!["deep"]
    );
    assert_eq!(
        ids(
            &mut session,
            Constraint::compare(DynamicOperand::NodeDepth, Operator::GreaterThanOrEqualTo, 150i64)
        ),
        vec!["deep"]
    );
    assert!(ids(
        &mut session,
        Constraint::compare(DynamicOperand::NodeDepth, Operator::GreaterThan, i64::MAX)
    )
    .is_empty());
    assert!(ids(
        &mut session,
        Constraint::compare(DynamicOperand::NodeDepth, Operator::LessThan, i64::MIN)
    )
    .is_empty());
}

#[test]
fn test_high_same_name_sibling_indexes() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    session.index_node(&node_with_id("/item[1500]", "far", vec![])).unwrap();
    session.index_node(&node_with_id("/item[2]", "near", vec![])).unwrap();
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let name = |op, value: &str| Constraint::compare(DynamicOperand::NodeName, op, value);
    assert_eq!(ids(&mut session, name(Operator::Like, "item[%]")), vec!["far", "near"]);
    assert_eq!(ids(&mut session, name(Operator::GreaterThan, "item[2]")), vec!["far"]);
}

#[test]
fn test_boolean_ordering() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for (id, flag) in [("t1", true), ("t2", true), ("f1", false)] {
        session
            .index_node(&node_with_id(
                &format!("/{id}"),
                id,
                vec![Property::single("flag", Value::Boolean(flag))],
            ))
            .unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let flag = |op, value: bool| Constraint::compare(DynamicOperand::property("flag"), op, value);
    assert!(ids(&mut session, flag(Operator::GreaterThan, true)).is_empty());
    assert!(ids(&mut session, flag(Operator::LessThan, false)).is_empty());
    assert_eq!(
        ids(&mut session, flag(Operator::GreaterThanOrEqualTo, true)),
        vec!["t1", "t2"]
    );
    assert_eq!(ids(&mut session, flag(Operator::LessThanOrEqualTo, false)), vec!["f1"]);
    assert_eq!(ids(&mut session, flag(Operator::GreaterThan, false)), vec!["t1", "t2"]);
    assert_eq!(ids(&mut session, flag(Operator::NotEqualTo, true)), vec!["f1"]);
}

#[test]
fn test_structural_constraints() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for node in TestTree::new().nodes {
        session.index_node(&node).unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let section = Path::parse("/site/section").unwrap();
    assert_eq!(
        ids(&mut session, Constraint::ChildNode { parent: section.clone() }),
        TestTree::child_ids()
    );
    assert_eq!(
        ids(&mut session, Constraint::DescendantNode { ancestor: section.clone() }),
        TestTree::descendant_ids()
    );
    assert_eq!(
        ids(&mut session, Constraint::SameNode { path: section }),
        vec!["section"]
    );
    assert_eq!(
        ids(
            &mut session,
            Constraint::compare(DynamicOperand::NodeDepth, Operator::EqualTo, 4i64)
        )
        .len(),
        6
    );
    assert_eq!(
        ids(
            &mut session,
            Constraint::compare(DynamicOperand::NodeLocalName, Operator::Like, "leaf%")
        )
        .len(),
        6
    );
    // Structure combined with full text
    assert_eq!(
        ids(
            &mut session,
            Constraint::and(vec![
                Constraint::DescendantNode {
                    ancestor: Path::parse("/site/section/child2").unwrap(),
                },
                Constraint::full_text(Some("title"), "leaf"),
            ])
        ),
        vec!["leaf21", "leaf22"]
    );
}

#[test]
fn test_projection_score_and_paging() {
    let indexes = TestIndexes::new();
    let mut session = open_session(&indexes, 100, false);
    for node in TestTree::new().nodes {
        session.index_node(&node).unwrap();
    }
    session.commit().unwrap();

    let mut session = open_session(&indexes, 100, true);
    let command = QueryCommand::new("nodes")
        .with_columns(["title", "absent"])
        .with_score()
        .with_constraint(Constraint::full_text(None, "child"));
    let all = session.query(&command).unwrap();
    assert_eq!(all.columns, vec!["title".to_string(), "absent".to_string()]);
    assert!(!all.is_empty());
    for tuple in &all.tuples {
        assert!(tuple.score.is_some());
        assert_eq!(tuple.values.len(), 2);
        assert!(tuple.values[0].is_some());
        assert!(tuple.values[1].is_none());
    }

    let page = session.query(&command.clone().with_limit(2, 1)).unwrap();
    assert_eq!(page.len(), 2);
    for tuple in &page.tuples {
        assert!(all.tuples.contains(tuple));
    }
}
