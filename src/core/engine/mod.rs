//! Engine orchestration.
//!
//! [`SearchEngine`] is the entry point used by callers. It checks that
//! workspaces exist in the [`ContentSource`], lazily creates one
//! [`WorkspaceEngine`] per workspace, and turns change batches into
//! work plans.

pub mod changes;
pub mod source;
pub mod workspace;

pub use changes::{plan_changes, Change, Work, WorkPlan};
pub use source::{ContentSource, InMemorySource, SourceDump};
pub use workspace::{IndexingStats, WorkspaceEngine};

use crate::core::config::Config;
use crate::core::error::{NodexError, Result};
use crate::core::graph::{Location, Path};
use crate::core::rules::IndexRules;
use crate::core::search::{check_query_length, QueryCommand, QueryResults, SearchHit};
use crate::core::storage::{IndexDirectories, SessionSettings};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Tunables of a [`SearchEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub session: SessionSettings,
    pub read_depth: usize,
    pub optimize_after_changes: usize,
    pub default_max_results: usize,
    pub max_results: usize,
    pub max_query_length: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session: config.indexing.session_settings(),
            read_depth: config.indexing.read_depth,
            optimize_after_changes: config.indexing.optimize_after_changes,
            default_max_results: config.search.default_max_results,
            max_results: config.search.max_results,
            max_query_length: config.search.max_query_length,
        }
    }
}

/// Indexing and search over every workspace of one content source
pub struct SearchEngine {
    source: Arc<dyn ContentSource>,
    directories: Arc<dyn IndexDirectories>,
    rules: Arc<IndexRules>,
    settings: EngineSettings,
    workspaces: RwLock<HashMap<String, Arc<WorkspaceEngine>>>,
}

impl SearchEngine {
    pub fn new(
        source: Arc<dyn ContentSource>,
        directories: Arc<dyn IndexDirectories>,
        rules: IndexRules,
        settings: EngineSettings,
    ) -> Self {
        Self {
            source,
            directories,
            rules: Arc::new(rules),
            settings,
            workspaces: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.source
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Engine of an existing workspace, created on first use
    pub fn workspace(&self, workspace: &str) -> Result<Arc<WorkspaceEngine>> {
        if !self.source.workspace_exists(workspace) {
            return Err(NodexError::WorkspaceNotFound {
                workspace: workspace.to_string(),
                source_name: self.source.name().to_string(),
            });
        }
        Ok(self.workspace_engine(workspace))
    }

    fn workspace_engine(&self, workspace: &str) -> Arc<WorkspaceEngine> {
        if let Some(engine) = self.workspaces.read().get(workspace) {
            return Arc::clone(engine);
        }
        let mut workspaces = self.workspaces.write();
        // Another caller may have created it between the two locks
        if let Some(engine) = workspaces.get(workspace) {
            return Arc::clone(engine);
        }
        tracing::debug!("Creating engine for workspace '{}'", workspace);
        let engine = Arc::new(WorkspaceEngine::new(
            workspace,
            Arc::clone(&self.source),
            Arc::clone(&self.directories),
            Arc::clone(&self.rules),
            self.settings.session,
            self.settings.read_depth,
            self.settings.optimize_after_changes,
        ));
        workspaces.insert(workspace.to_string(), Arc::clone(&engine));
        engine
    }

    /// Re-index the subtree at `path` from the source
    ///
    /// `batch_depth` overrides the configured read depth.
    pub fn index_content(
        &self,
        workspace: &str,
        path: &Path,
        batch_depth: Option<usize>,
    ) -> Result<IndexingStats> {
        self.workspace(workspace)?.index_subtree(path, batch_depth)
    }

    /// Apply a batch of change notifications
    ///
    /// Each workspace's work runs in its own session; a failure stops
    /// the batch after rolling back that workspace's session.
    pub fn index_changes(&self, changes: &[Change]) -> Result<IndexingStats> {
        let mut stats = IndexingStats::default();
        for plan in plan_changes(changes) {
            if plan.work.is_empty() {
                continue;
            }
            // A destroyed workspace is gone from the source by now
            let engine = if plan.destroys {
                self.workspace_engine(&plan.workspace)
            } else {
                self.workspace(&plan.workspace)?
            };
            stats += engine.apply(&plan.work)?;
            if plan.destroys && !self.source.workspace_exists(&plan.workspace) {
                self.workspaces.write().remove(&plan.workspace);
                self.directories.remove_workspace(&plan.workspace)?;
                tracing::info!("Dropped indexes of destroyed workspace '{}'", plan.workspace);
            }
        }
        Ok(stats)
    }

    /// Merge index segments of one workspace, or of every workspace
    ///
    /// Returns the number of workspaces optimized.
    pub fn optimize(&self, workspace: Option<&str>) -> Result<usize> {
        let names = match workspace {
            Some(name) => vec![name.to_string()],
            None => self.source.workspace_names(),
        };
        for name in &names {
            self.workspace(name)?.optimize()?;
        }
        tracing::info!("Optimized {} workspace(s)", names.len());
        Ok(names.len())
    }

    /// Free-text search returning node locations
    pub fn full_text_search(
        &self,
        workspace: &str,
        text: &str,
        max_results: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Location>> {
        Ok(self
            .full_text_search_hits(workspace, text, max_results, offset)?
            .into_iter()
            .map(|hit| hit.location)
            .collect())
    }

    /// Free-text search keeping relevance scores
    ///
    /// `max_results` defaults to the configured default and is capped
    /// at the configured maximum.
    pub fn full_text_search_hits(
        &self,
        workspace: &str,
        text: &str,
        max_results: Option<usize>,
        offset: usize,
    ) -> Result<Vec<SearchHit>> {
        check_query_length(text, self.settings.max_query_length)?;
        let max_results = max_results
            .unwrap_or(self.settings.default_max_results)
            .min(self.settings.max_results);
        self.workspace(workspace)?
            .search_hits(text, max_results, offset)
    }

    /// Execute one access against a workspace
    ///
    /// The row limit is capped at the configured maximum.
    pub fn execute(&self, workspace: &str, command: &QueryCommand) -> Result<QueryResults> {
        let mut command = command.clone();
        command.limit = Some(
            command
                .limit
                .unwrap_or(self.settings.max_results)
                .min(self.settings.max_results),
        );
        self.workspace(workspace)?.query(&command)
    }
}
