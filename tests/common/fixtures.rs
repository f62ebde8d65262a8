// Test fixtures for integration testing

use nodex::core::engine::InMemorySource;
use nodex::core::graph::{Location, Node, Path, Property};
use std::sync::Arc;

/// Node at `path` with no identifier
#[allow(dead_code)] // Used in integration tests
pub fn node(path: &str, properties: Vec<Property>) -> Node {
    Node::new(Location::new(Path::parse(path).unwrap()), properties)
}

/// Node at `path` carrying identifier `id`
#[allow(dead_code)] // Used in integration tests
pub fn node_with_id(path: &str, id: &str, properties: Vec<Property>) -> Node {
    Node::new(
        Location::with_id(Path::parse(path).unwrap(), id),
        properties,
    )
}

/// Tree used for the structural tests
///
/// ```text
/// /site                              depth 1
/// /site/section                      depth 2
/// /site/section/child{1..3}          depth 3
/// /site/section/childN/leaf{1,2}     depth 4
/// /other                             depth 1
/// ```
#[allow(dead_code)] // Used in integration tests
pub struct TestTree {
    pub nodes: Vec<Node>,
}

impl TestTree {
    #[allow(dead_code)] // Used in integration tests
    pub fn new() -> Self {
        let mut nodes = vec![
            node_with_id("/site", "site", vec![Property::single("title", "Site root")]),
            node_with_id(
                "/site/section",
                "section",
                vec![Property::single("title", "Main section")],
            ),
        ];
        for c in 1..=3 {
            nodes.push(node_with_id(
                &format!("/site/section/child{c}"),
                &format!("child{c}"),
                vec![Property::single("title", format!("Child number {c}"))],
            ));
            for l in 1..=2 {
                nodes.push(node_with_id(
                    &format!("/site/section/child{c}/leaf{l}"),
                    &format!("leaf{c}{l}"),
                    vec![Property::single("title", format!("Leaf {l} of child {c}"))],
                ));
            }
        }
        nodes.push(node_with_id(
            "/other",
            "other",
            vec![Property::single("title", "Unrelated")],
        ));
        Self { nodes }
    }

    #[allow(dead_code)] // Used in integration tests
    pub fn child_ids() -> Vec<String> {
        (1..=3).map(|c| format!("child{c}")).collect()
    }

    #[allow(dead_code)] // Used in integration tests
    pub fn descendant_ids() -> Vec<String> {
        let mut ids = Self::child_ids();
        for c in 1..=3 {
            for l in 1..=2 {
                ids.push(format!("leaf{c}{l}"));
            }
        }
        ids.sort();
        ids
    }
}

/// Content source fixture
#[allow(dead_code)] // Used in integration tests
pub struct TestRepo {
    pub source: Arc<InMemorySource>,
}

impl TestRepo {
    /// Source "repo" with workspace "default" holding [`TestTree`]
    #[allow(dead_code)] // Used in integration tests
    pub fn small() -> Self {
        let source = Arc::new(InMemorySource::new("repo"));
        source.create_workspace("default");
        for node in TestTree::new().nodes {
            source.put_node("default", node).unwrap();
        }
        Self { source }
    }

    /// Source with `count` documents below `/docs` in workspace "default"
    #[allow(dead_code)] // Used in integration tests
    pub fn with_documents(count: usize) -> Self {
        let source = Arc::new(InMemorySource::new("repo"));
        source.create_workspace("default");
        source
            .put_node("default", node("/docs", Vec::new()))
            .unwrap();
        for i in 0..count {
            source
                .put_node(
                    "default",
                    node_with_id(
                        &format!("/docs/doc{i}"),
                        &format!("doc{i}"),
                        vec![Property::single("body", format!("document {i} body text"))],
                    ),
                )
                .unwrap();
        }
        Self { source }
    }
}
