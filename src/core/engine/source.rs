//! Content sources.
//!
//! A [`ContentSource`] is the system of record the indexes are built
//! from. The engine only reads from it: single nodes for re-reads and
//! depth-bounded subgraphs for crawls.

use crate::core::error::{NodexError, Result};
use crate::core::graph::{Node, Path};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// Read access to the nodes of every workspace of one source
pub trait ContentSource: Send + Sync {
    /// Name used in error messages
    fn name(&self) -> &str;

    fn workspace_names(&self) -> Vec<String>;

    fn workspace_exists(&self, workspace: &str) -> bool;

    /// The node at exactly `path`, if any
    fn read_node(&self, workspace: &str, path: &Path) -> Result<Option<Node>>;

    /// Nodes at or below `path` no more than `max_depth` levels down
    ///
    /// Breadth-first: ordered by depth, the start node first.
    fn read_subgraph(&self, workspace: &str, path: &Path, max_depth: usize) -> Result<Vec<Node>>;
}

/// On-disk form of an [`InMemorySource`]
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SourceDump {
    #[serde(default = "default_source_name")]
    pub name: String,
    #[serde(default)]
    pub workspaces: BTreeMap<String, Vec<Node>>,
}

fn default_source_name() -> String {
    "source".to_string()
}

/// Content source holding every node in memory
///
/// Within a workspace nodes keep their insertion order, which breaks
/// ties between nodes of equal depth in subgraph reads.
pub struct InMemorySource {
    name: String,
    workspaces: RwLock<BTreeMap<String, Vec<Node>>>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workspaces: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_dump(dump: SourceDump) -> Self {
        Self {
            name: dump.name,
            workspaces: RwLock::new(dump.workspaces),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let dump: SourceDump = serde_json::from_str(json)?;
        Ok(Self::from_dump(dump))
    }

    /// Load a JSON node dump
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            NodexError::SourceError(format!("Failed to read source dump {}: {e}", path.display()))
        })?;
        let source = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded source '{}' with {} workspace(s) from {}",
            source.name,
            source.workspaces.read().len(),
            path.display()
        );
        Ok(source)
    }

    /// Add an empty workspace; existing workspaces are left alone
    pub fn create_workspace(&self, workspace: &str) {
        self.workspaces
            .write()
            .entry(workspace.to_string())
            .or_default();
    }

    pub fn remove_workspace(&self, workspace: &str) -> bool {
        self.workspaces.write().remove(workspace).is_some()
    }

    /// Add a node, replacing the node already at its path
    pub fn put_node(&self, workspace: &str, node: Node) -> Result<()> {
        let mut workspaces = self.workspaces.write();
        let nodes = workspaces
            .get_mut(workspace)
            .ok_or_else(|| self.not_found(workspace))?;
        match nodes.iter_mut().find(|n| n.path() == node.path()) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
        Ok(())
    }

    /// Remove the node at `path` and its subtree; returns how many went
    pub fn remove_below(&self, workspace: &str, path: &Path) -> Result<usize> {
        let mut workspaces = self.workspaces.write();
        let nodes = workspaces
            .get_mut(workspace)
            .ok_or_else(|| self.not_found(workspace))?;
        let before = nodes.len();
        nodes.retain(|n| !n.path().is_at_or_below(path));
        Ok(before - nodes.len())
    }

    /// Relocate the subtree at `from` to `to`
    pub fn move_below(&self, workspace: &str, from: &Path, to: &Path) -> Result<usize> {
        let mut workspaces = self.workspaces.write();
        let nodes = workspaces
            .get_mut(workspace)
            .ok_or_else(|| self.not_found(workspace))?;
        let mut moved = 0;
        for node in nodes.iter_mut() {
            if let Some(path) = node.path().relocate(from, to) {
                node.location.path = path;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Number of nodes in a workspace
    pub fn len(&self, workspace: &str) -> usize {
        self.workspaces
            .read()
            .get(workspace)
            .map_or(0, Vec::len)
    }

    fn not_found(&self, workspace: &str) -> NodexError {
        NodexError::WorkspaceNotFound {
            workspace: workspace.to_string(),
            source_name: self.name.clone(),
        }
    }
}

impl ContentSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn workspace_names(&self) -> Vec<String> {
        self.workspaces.read().keys().cloned().collect()
    }

    fn workspace_exists(&self, workspace: &str) -> bool {
        self.workspaces.read().contains_key(workspace)
    }

    fn read_node(&self, workspace: &str, path: &Path) -> Result<Option<Node>> {
        let workspaces = self.workspaces.read();
        let nodes = workspaces
            .get(workspace)
            .ok_or_else(|| self.not_found(workspace))?;
        Ok(nodes.iter().find(|n| n.path() == path).cloned())
    }

    fn read_subgraph(&self, workspace: &str, path: &Path, max_depth: usize) -> Result<Vec<Node>> {
        let workspaces = self.workspaces.read();
        let nodes = workspaces
            .get(workspace)
            .ok_or_else(|| self.not_found(workspace))?;
        let base = path.depth();
        let mut subgraph: Vec<Node> = nodes
            .iter()
            .filter(|n| n.path().is_at_or_below(path) && n.path().depth() - base <= max_depth)
            .cloned()
            .collect();
        // Stable, so equal depths keep insertion order
        subgraph.sort_by_key(|n| n.path().depth());
        Ok(subgraph)
    }
}
