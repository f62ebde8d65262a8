//! Change notifications and their reduction to index work.
//!
//! A batch of [`Change`]s is grouped by workspace and reduced to a
//! [`WorkPlan`] per workspace. Planning keeps arrival order and drops
//! work that a later or pending step makes redundant.

use crate::core::graph::{Node, Path, Property};
use serde::{Deserialize, Serialize};

/// One change reported by a content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    CreateNode {
        workspace: String,
        node: Node,
    },
    RemoveNode {
        workspace: String,
        path: Path,
    },
    MoveNode {
        workspace: String,
        from: Path,
        to: Path,
    },
    SetProperties {
        workspace: String,
        path: Path,
        properties: Vec<Property>,
    },
    RemoveProperties {
        workspace: String,
        path: Path,
        names: Vec<String>,
    },
    CreateWorkspace {
        workspace: String,
    },
    DestroyWorkspace {
        workspace: String,
    },
}

impl Change {
    pub fn workspace(&self) -> &str {
        match self {
            Change::CreateNode { workspace, .. }
            | Change::RemoveNode { workspace, .. }
            | Change::MoveNode { workspace, .. }
            | Change::SetProperties { workspace, .. }
            | Change::RemoveProperties { workspace, .. }
            | Change::CreateWorkspace { workspace }
            | Change::DestroyWorkspace { workspace } => workspace,
        }
    }
}

/// One step applied to a workspace's indexes
#[derive(Debug, Clone, PartialEq)]
pub enum Work {
    /// Remove every document of the workspace
    ClearWorkspace,
    /// Delete the subtree and index it again from the source
    Crawl { path: Path },
    /// Index a node carried by the change itself
    Index { node: Node },
    /// Read one node from the source and index it, or drop it if gone
    Reread { path: Path },
    Remove { path: Path },
    Move { from: Path, to: Path },
}

impl Work {
    /// Path of a single-node step
    fn node_path(&self) -> Option<&Path> {
        match self {
            Work::Index { node } => Some(node.path()),
            Work::Reread { path } => Some(path),
            _ => None,
        }
    }
}

/// The work for one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct WorkPlan {
    pub workspace: String,
    pub work: Vec<Work>,
    /// The batch destroyed the workspace at some point
    pub destroys: bool,
}

impl WorkPlan {
    fn new(workspace: &str) -> Self {
        Self {
            workspace: workspace.to_string(),
            work: Vec::new(),
            destroys: false,
        }
    }

    fn push(&mut self, change: &Change) {
        match change {
            Change::DestroyWorkspace { .. } => {
                self.work.clear();
                self.work.push(Work::ClearWorkspace);
                self.destroys = true;
            }
            Change::CreateWorkspace { .. } => self.push_crawl(Path::root()),
            Change::CreateNode { node, .. } => self.push_node(Work::Index { node: node.clone() }),
            Change::SetProperties { path, .. } | Change::RemoveProperties { path, .. } => {
                self.push_node(Work::Reread { path: path.clone() })
            }
            Change::RemoveNode { path, .. } => {
                while self
                    .work
                    .last()
                    .and_then(Work::node_path)
                    .is_some_and(|p| p.is_at_or_below(path))
                {
                    self.work.pop();
                }
                self.work.push(Work::Remove { path: path.clone() });
            }
            Change::MoveNode { from, to, .. } => self.work.push(Work::Move {
                from: from.clone(),
                to: to.clone(),
            }),
        }
    }

    fn push_crawl(&mut self, path: Path) {
        // Trailing single-node steps inside the subtree are re-read anyway
        while self
            .work
            .last()
            .is_some_and(|w| match w {
                Work::Crawl { path: p } => p.is_at_or_below(&path),
                other => other.node_path().is_some_and(|p| p.is_at_or_below(&path)),
            })
        {
            self.work.pop();
        }
        self.work.push(Work::Crawl { path });
    }

    fn push_node(&mut self, step: Work) {
        let Some(path) = step.node_path() else {
            return;
        };
        if self.covered_by_crawl(path) {
            return;
        }
        if self.work.last().and_then(Work::node_path) == Some(path) {
            self.work.pop();
        }
        self.work.push(step);
    }

    /// A crawl later than any structural step already covers `path`
    fn covered_by_crawl(&self, path: &Path) -> bool {
        for step in self.work.iter().rev() {
            match step {
                Work::Crawl { path: crawled } if path.is_at_or_below(crawled) => return true,
                Work::Crawl { .. } | Work::Index { .. } | Work::Reread { .. } => {}
                Work::ClearWorkspace | Work::Remove { .. } | Work::Move { .. } => return false,
            }
        }
        false
    }
}

/// Group changes by workspace, first-seen order, and plan each group
pub fn plan_changes(changes: &[Change]) -> Vec<WorkPlan> {
    let mut plans: Vec<WorkPlan> = Vec::new();
    for change in changes {
        let workspace = change.workspace();
        let index = match plans.iter().position(|p| p.workspace == workspace) {
            Some(index) => index,
            None => {
                plans.push(WorkPlan::new(workspace));
                plans.len() - 1
            }
        };
        plans[index].push(change);
    }
    for plan in &plans {
        tracing::debug!(
            "Planned {} step(s) for '{}' from {} change(s)",
            plan.work.len(),
            plan.workspace,
            changes
                .iter()
                .filter(|c| c.workspace() == plan.workspace)
                .count()
        );
    }
    plans
}
