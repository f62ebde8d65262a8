//! Per-workspace engine.
//!
//! A [`WorkspaceEngine`] runs units of work against one workspace. Each
//! unit gets a fresh [`IndexSession`]; sessions of the same workspace
//! never overlap. A unit commits when it succeeds and rolls back on the
//! first failure, so a batch of steps is applied entirely or not at all.

use crate::core::engine::changes::Work;
use crate::core::engine::source::ContentSource;
use crate::core::error::{NodexError, Result};
use crate::core::graph::Path;
use crate::core::rules::IndexRules;
use crate::core::search::{QueryCommand, QueryResults, SearchHit};
use crate::core::storage::{IndexDirectories, IndexSession, SessionSettings};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Counts of what one indexing call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexingStats {
    pub indexed: usize,
    pub removed: usize,
    pub moved: usize,
}

impl AddAssign for IndexingStats {
    fn add_assign(&mut self, other: Self) {
        self.indexed += other.indexed;
        self.removed += other.removed;
        self.moved += other.moved;
    }
}

struct WorkspaceState {
    changes_since_optimize: usize,
}

/// Serializes and runs the sessions of one workspace
pub struct WorkspaceEngine {
    workspace: String,
    source: Arc<dyn ContentSource>,
    directories: Arc<dyn IndexDirectories>,
    rules: Arc<IndexRules>,
    settings: SessionSettings,
    read_depth: usize,
    optimize_after: usize,
    state: Mutex<WorkspaceState>,
}

impl WorkspaceEngine {
    pub fn new(
        workspace: impl Into<String>,
        source: Arc<dyn ContentSource>,
        directories: Arc<dyn IndexDirectories>,
        rules: Arc<IndexRules>,
        settings: SessionSettings,
        read_depth: usize,
        optimize_after: usize,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            source,
            directories,
            rules,
            settings,
            read_depth: read_depth.max(1),
            optimize_after,
            state: Mutex::new(WorkspaceState {
                changes_since_optimize: 0,
            }),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Changes committed since the indexes were last optimized
    pub fn changes_since_optimize(&self) -> usize {
        self.state.lock().changes_since_optimize
    }

    /// Run `activity` in one session of this workspace
    ///
    /// Commits when the activity succeeds and rolls back otherwise.
    /// Failures are wrapped with the workspace, source and operation.
    pub fn execute<T, F>(&self, operation: &str, read_only: bool, activity: F) -> Result<T>
    where
        F: FnOnce(&mut IndexSession) -> Result<T>,
    {
        let mut state = self.state.lock();
        let start = Instant::now();
        let mut session = IndexSession::new(
            self.workspace.as_str(),
            self.source.name(),
            Arc::clone(&self.directories),
            Arc::clone(&self.rules),
            self.settings,
            read_only,
        )
        .map_err(|e| self.wrap(operation, e))?;

        let value = match activity(&mut session) {
            Ok(value) => value,
            Err(e) => {
                if let Err(rollback_err) = session.rollback() {
                    error!(
                        "Rollback after failed {} in '{}' also failed: {}",
                        operation, self.workspace, rollback_err
                    );
                }
                return Err(self.wrap(operation, e));
            }
        };

        let changes = session.change_count();
        session.commit().map_err(|e| self.wrap(operation, e))?;
        debug!(
            "{} in '{}' done in {}ms ({} changes)",
            operation,
            self.workspace,
            start.elapsed().as_millis(),
            changes
        );

        if !read_only && changes > 0 {
            state.changes_since_optimize += changes;
            if self.optimize_after > 0 && state.changes_since_optimize > self.optimize_after {
                info!(
                    "'{}' reached {} changes since the last optimize",
                    self.workspace, state.changes_since_optimize
                );
                self.optimize_locked(&mut state)?;
            }
        }
        Ok(value)
    }

    /// Merge the segments of both indexes
    pub fn optimize(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.optimize_locked(&mut state)
    }

    fn optimize_locked(&self, state: &mut WorkspaceState) -> Result<()> {
        let mut session = IndexSession::new(
            self.workspace.as_str(),
            self.source.name(),
            Arc::clone(&self.directories),
            Arc::clone(&self.rules),
            self.settings,
            false,
        )
        .map_err(|e| self.wrap("optimizing", e))?;
        if let Err(e) = session.optimize() {
            if let Err(rollback_err) = session.rollback() {
                error!(
                    "Rollback after failed optimize of '{}' also failed: {}",
                    self.workspace, rollback_err
                );
            }
            return Err(self.wrap("optimizing", e));
        }
        session.commit().map_err(|e| self.wrap("optimizing", e))?;
        state.changes_since_optimize = 0;
        Ok(())
    }

    /// Re-index the subtree at `path` from the source
    pub fn index_subtree(&self, path: &Path, batch_depth: Option<usize>) -> Result<IndexingStats> {
        let batch_depth = batch_depth.unwrap_or(self.read_depth).max(1);
        self.execute("indexing content", false, |session| {
            self.crawl(session, path, batch_depth)
        })
    }

    /// Apply planned work in one session
    pub fn apply(&self, work: &[Work]) -> Result<IndexingStats> {
        self.execute("applying changes", false, |session| {
            let mut stats = IndexingStats::default();
            for step in work {
                stats += self.apply_step(session, step)?;
            }
            Ok(stats)
        })
    }

    pub fn search_hits(&self, text: &str, max_results: usize, offset: usize) -> Result<Vec<SearchHit>> {
        self.execute("searching", true, |session| {
            session.search_hits(text, max_results, offset)
        })
    }

    pub fn query(&self, command: &QueryCommand) -> Result<QueryResults> {
        self.execute("querying", true, |session| session.query(command))
    }

    fn apply_step(&self, session: &mut IndexSession, step: &Work) -> Result<IndexingStats> {
        let mut stats = IndexingStats::default();
        match step {
            Work::ClearWorkspace => session.delete_all()?,
            Work::Crawl { path } => stats += self.crawl(session, path, self.read_depth)?,
            Work::Index { node } => {
                session.index_node(node)?;
                stats.indexed += 1;
            }
            Work::Reread { path } => match self.source.read_node(&self.workspace, path)? {
                Some(node) => {
                    session.index_node(&node)?;
                    stats.indexed += 1;
                }
                None => {
                    debug!("{} is gone from '{}'; removing it", path, self.workspace);
                    stats.removed += session.delete_below(path)?;
                }
            },
            Work::Remove { path } => stats.removed += session.delete_below(path)?,
            Work::Move { from, to } => stats.moved += session.move_subtree(from, to)?,
        }
        Ok(stats)
    }

    /// Delete the subtree, then index it again breadth-first
    ///
    /// Each read covers `batch_depth` levels. Nodes on the last level of
    /// a read start the next reads; they are already indexed, so those
    /// reads skip their start node.
    fn crawl(&self, session: &mut IndexSession, path: &Path, batch_depth: usize) -> Result<IndexingStats> {
        let mut stats = IndexingStats {
            removed: session.delete_below(path)?,
            ..Default::default()
        };
        let mut frontier = VecDeque::from([(path.clone(), true)]);
        let mut reads = 0;
        while let Some((start, include_start)) = frontier.pop_front() {
            let nodes = self
                .source
                .read_subgraph(&self.workspace, &start, batch_depth)?;
            reads += 1;
            for node in &nodes {
                let relative = node.path().depth() - start.depth();
                if relative == 0 && !include_start {
                    continue;
                }
                session.index_node(node)?;
                stats.indexed += 1;
                if relative == batch_depth {
                    frontier.push_back((node.path().clone(), false));
                }
            }
        }
        info!(
            "Crawled {} in '{}': {} indexed, {} removed, {} reads",
            path, self.workspace, stats.indexed, stats.removed, reads
        );
        Ok(stats)
    }

    fn wrap(&self, operation: &str, source: NodexError) -> NodexError {
        NodexError::Transaction {
            operation: operation.to_string(),
            workspace: self.workspace.clone(),
            source_name: self.source.name().to_string(),
            source: Box::new(source),
        }
    }
}
