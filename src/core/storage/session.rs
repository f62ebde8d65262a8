//! Index sessions.
//!
//! An [`IndexSession`] is one unit of work against the two indexes of a
//! workspace. Readers and writers open lazily on first use and are
//! released together by [`IndexSession::commit`] or
//! [`IndexSession::rollback`]. A session is not safe for concurrent use;
//! the workspace engine serializes sessions per workspace.
//!
//! Writes are not visible to the session's own searchers until commit.
//! The session therefore remembers the nodes it wrote (`pending`) and
//! the identifiers it invalidated (`deleted`), and overlays both on
//! every paths lookup.

use crate::core::error::{NodexError, Result};
use crate::core::graph::{Location, Node, Path};
use crate::core::rules::IndexRules;
use crate::core::search::{IndexQuery, TermValue};
use crate::core::storage::directory::IndexDirectories;
use crate::core::storage::handles::{finish, Completion, IndexHandles, SessionResource};
use crate::core::storage::mapper::DocumentMapper;
use crate::core::storage::schema::{
    create_content_schema, create_paths_schema, paths, ContentFields, IndexKind, PathsFields,
};
use crate::core::storage::subtree::node_at;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::{Index, IndexWriter, Searcher, TantivyDocument};
use tracing::{debug, info, trace, warn};

/// Tunables of a session, taken from the indexing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Memory budget of each index writer
    pub writer_heap_bytes: usize,
    /// Hits per search window when deleting a subtree
    pub delete_batch_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            writer_heap_bytes: 50_000_000,
            delete_batch_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Committed,
    RolledBack,
}

/// One unit of work against a workspace's paths and content indexes
pub struct IndexSession {
    pub(crate) workspace: String,
    source_name: String,
    directories: Arc<dyn IndexDirectories>,
    rules: Arc<IndexRules>,
    pub(crate) settings: SessionSettings,
    read_only: bool,
    state: SessionState,
    pub(crate) mapper: DocumentMapper,
    pub(crate) paths_fields: PathsFields,
    pub(crate) content_fields: ContentFields,
    paths: IndexHandles,
    content: IndexHandles,
    pub(crate) change_count: usize,
    /// Nodes written in this session, by identifier
    pub(crate) pending: HashMap<String, Location>,
    /// Identifiers whose committed documents this session deleted
    pub(crate) deleted: HashSet<String>,
    /// Both indexes were cleared in this session
    cleared: bool,
}

impl IndexSession {
    pub fn new(
        workspace: impl Into<String>,
        source_name: impl Into<String>,
        directories: Arc<dyn IndexDirectories>,
        rules: Arc<IndexRules>,
        settings: SessionSettings,
        read_only: bool,
    ) -> Result<Self> {
        let paths_fields = PathsFields::from_schema(&create_paths_schema())?;
        let content_fields = ContentFields::from_schema(&create_content_schema())?;
        let workspace = workspace.into();
        trace!(
            "Opening {} session for '{}'",
            if read_only { "read-only" } else { "writable" },
            workspace
        );
        Ok(Self {
            workspace,
            source_name: source_name.into(),
            directories,
            mapper: DocumentMapper::new(Arc::clone(&rules), paths_fields, content_fields),
            rules,
            settings,
            read_only,
            state: SessionState::Open,
            paths_fields,
            content_fields,
            paths: IndexHandles::new(IndexKind::Paths),
            content: IndexHandles::new(IndexKind::Content),
            change_count: 0,
            pending: HashMap::new(),
            deleted: HashSet::new(),
            cleared: false,
        })
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn rules(&self) -> &Arc<IndexRules> {
        &self.rules
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Documents written or deleted so far
    pub fn change_count(&self) -> usize {
        self.change_count
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Committed => Err(NodexError::SessionClosed("committed")),
            SessionState::RolledBack => Err(NodexError::SessionClosed("rolled back")),
        }
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if self.read_only {
            return Err(NodexError::ReadOnlySession);
        }
        Ok(())
    }

    /// Paths searcher, `None` while the workspace has never been indexed
    pub(crate) fn paths_searcher(&mut self) -> Result<Option<Searcher>> {
        self.ensure_open()?;
        self.paths.searcher(self.directories.as_ref(), &self.workspace)
    }

    /// Content searcher, `None` while the workspace has never been indexed
    pub(crate) fn content_searcher(&mut self) -> Result<Option<Searcher>> {
        self.ensure_open()?;
        self.content.searcher(self.directories.as_ref(), &self.workspace)
    }

    /// Content index, `None` while the workspace has never been indexed
    pub(crate) fn content_index(&mut self) -> Result<Option<Index>> {
        self.ensure_open()?;
        Ok(self
            .content
            .index(self.directories.as_ref(), &self.workspace, false)?
            .cloned())
    }

    pub(crate) fn paths_writer(&mut self) -> Result<&mut IndexWriter> {
        self.ensure_writable()?;
        self.paths.writer(
            self.directories.as_ref(),
            &self.workspace,
            self.settings.writer_heap_bytes,
        )
    }

    pub(crate) fn content_writer(&mut self) -> Result<&mut IndexWriter> {
        self.ensure_writable()?;
        self.content.writer(
            self.directories.as_ref(),
            &self.workspace,
            self.settings.writer_heap_bytes,
        )
    }

    /// Index one node, replacing any documents it already has
    ///
    /// The identifier comes from the node's location, else from the node
    /// currently indexed at the same path, else a new one is generated.
    pub fn index_node(&mut self, node: &Node) -> Result<String> {
        self.index_node_inner(node)
            .map_err(|e| NodexError::IndexingFailed {
                path: node.path().to_string(),
                source: Box::new(e),
            })
    }

    /// Index several nodes in order; returns their identifiers
    pub fn index_nodes<'n>(
        &mut self,
        nodes: impl IntoIterator<Item = &'n Node>,
    ) -> Result<Vec<String>> {
        nodes.into_iter().map(|node| self.index_node(node)).collect()
    }

    fn index_node_inner(&mut self, node: &Node) -> Result<String> {
        self.ensure_writable()?;
        let at_path = self.ids_matching_paths(&node_at(node.path()))?;
        let id = match DocumentMapper::existing_id(&node.location) {
            Some(id) => id,
            None => match at_path.iter().next() {
                Some(id) => id.clone(),
                None => DocumentMapper::resolve_id(&node.location),
            },
        };

        // Replace: drop whatever is indexed under this identifier or at
        // this path first
        for stale in at_path.iter().filter(|stale| **stale != id) {
            debug!("Replacing {} at {} with {}", stale, node.path(), id);
            self.delete_node_documents(stale)?;
            self.pending.remove(stale);
        }
        self.delete_node_documents(&id)?;

        let mapped = self.mapper.index_node_with_id(node, id)?;
        self.paths_writer()?
            .add_document(mapped.path_doc)
            .map_err(|e| NodexError::index("add paths document", e))?;
        self.content_writer()?
            .add_document(mapped.content_doc)
            .map_err(|e| NodexError::index("add content document", e))?;

        let mut location = node.location.clone();
        location.id = Some(mapped.id.clone());
        self.pending.insert(mapped.id.clone(), location);
        self.change_count += 1;
        trace!("Indexed {} as {}", node.path(), mapped.id);
        Ok(mapped.id)
    }

    /// Identifier of the node at exactly `path`
    pub fn id_at(&mut self, path: &Path) -> Result<Option<String>> {
        Ok(self.ids_matching_paths(&node_at(path))?.into_iter().next())
    }

    /// Identifiers of every node whose paths document matches `query`
    pub fn ids_matching_paths(&mut self, query: &IndexQuery) -> Result<BTreeSet<String>> {
        Ok(self
            .locations_matching(query)?
            .into_iter()
            .filter_map(|location| location.id)
            .collect())
    }

    /// Locations of every node whose paths document matches `query`
    pub fn locations_matching(&mut self, query: &IndexQuery) -> Result<Vec<Location>> {
        let mut locations = Vec::new();
        if !self.cleared && *query != IndexQuery::MatchNone {
            if let Some(searcher) = self.paths_searcher()? {
                let tantivy_query = query.to_tantivy(searcher.schema())?;
                let addresses = searcher
                    .search(&tantivy_query, &DocSetCollector)
                    .map_err(|e| NodexError::index("search paths index", e))?;
                for address in addresses {
                    let doc: TantivyDocument = searcher
                        .doc(address)
                        .map_err(|e| NodexError::index("read paths document", e))?;
                    let Some(id) = self.mapper.read_path_id(&doc) else {
                        continue;
                    };
                    if self.deleted.contains(&id) || self.pending.contains_key(&id) {
                        continue;
                    }
                    locations.push(self.mapper.read_location(&doc)?);
                }
            }
        }

        locations.extend(
            self.pending
                .values()
                .filter(|location| query.matches(&|field| location_terms(location, field)))
                .cloned(),
        );
        debug!(
            "Paths lookup in '{}' matched {} nodes",
            self.workspace,
            locations.len()
        );
        Ok(locations)
    }

    /// Location of the node with identifier `id`
    pub fn location_for(&mut self, id: &str) -> Result<Option<Location>> {
        if let Some(location) = self.pending.get(id) {
            return Ok(Some(location.clone()));
        }
        if self.cleared || self.deleted.contains(id) {
            return Ok(None);
        }
        let Some(searcher) = self.paths_searcher()? else {
            return Ok(None);
        };
        let query = IndexQuery::term(paths::ID, id).to_tantivy(searcher.schema())?;
        let hits = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| NodexError::index("look up paths document", e))?;
        match hits.first() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher
                    .doc(*address)
                    .map_err(|e| NodexError::index("read paths document", e))?;
                Ok(Some(self.mapper.read_location(&doc)?))
            }
            None => Ok(None),
        }
    }

    /// Resolve the locations of many identifiers in one pass
    ///
    /// Identifiers without a paths document are absent from the result.
    pub fn locations_for<'i>(
        &mut self,
        ids: impl IntoIterator<Item = &'i str>,
    ) -> Result<HashMap<String, Location>> {
        let mut resolved = HashMap::new();
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            match self.location_for(id)? {
                Some(location) => {
                    resolved.insert(id.to_string(), location);
                }
                None => warn!(
                    "No paths document for identifier {} in '{}'",
                    id, self.workspace
                ),
            }
        }
        Ok(resolved)
    }

    /// Analyze text with the index analyzer
    pub fn analyze(&mut self, text: &str) -> Vec<String> {
        self.mapper.analyze(text)
    }

    /// Remove every document from both indexes
    pub fn delete_all(&mut self) -> Result<()> {
        self.paths_writer()?
            .delete_all_documents()
            .map_err(|e| NodexError::index("clear paths index", e))?;
        self.content_writer()?
            .delete_all_documents()
            .map_err(|e| NodexError::index("clear content index", e))?;
        self.pending.clear();
        self.deleted.clear();
        self.cleared = true;
        self.change_count += 1;
        info!("Cleared both indexes of '{}'", self.workspace);
        Ok(())
    }

    /// Merge all searchable segments of both indexes
    ///
    /// Indexes that do not exist yet are skipped.
    pub fn optimize(&mut self) -> Result<()> {
        self.ensure_writable()?;
        for kind in [IndexKind::Paths, IndexKind::Content] {
            let handles = match kind {
                IndexKind::Paths => &mut self.paths,
                IndexKind::Content => &mut self.content,
            };
            let Some(index) = handles.index(self.directories.as_ref(), &self.workspace, false)?
            else {
                continue;
            };
            let segments = index
                .searchable_segment_ids()
                .map_err(|e| NodexError::index(format!("list {} segments", kind.dir_name()), e))?;
            if segments.len() < 2 {
                debug!(
                    "{} index of '{}' has {} segment(s); nothing to merge",
                    kind.dir_name(),
                    self.workspace,
                    segments.len()
                );
                continue;
            }
            let writer = handles.writer(
                self.directories.as_ref(),
                &self.workspace,
                self.settings.writer_heap_bytes,
            )?;
            writer
                .merge(&segments)
                .wait()
                .map_err(|e| NodexError::index(format!("merge {} segments", kind.dir_name()), e))?;
            info!(
                "Merged {} segments of the {} index of '{}'",
                segments.len(),
                kind.dir_name(),
                self.workspace
            );
        }
        Ok(())
    }

    /// Make every write of this session durable and release all handles
    pub fn commit(&mut self) -> Result<()> {
        self.complete(Completion::Commit)
    }

    /// Discard every write of this session and release all handles
    pub fn rollback(&mut self) -> Result<()> {
        self.complete(Completion::Rollback)
    }

    fn complete(&mut self, completion: Completion) -> Result<()> {
        self.ensure_open()?;
        self.state = match completion {
            Completion::Commit => SessionState::Committed,
            Completion::Rollback => SessionState::RolledBack,
        };
        debug!(
            "{} session for '{}' ({} changes)",
            completion.verb(),
            self.workspace,
            self.change_count
        );
        finish(self.take_resources(), completion)
    }

    /// Readers first, then writers, paths before content
    fn take_resources(&mut self) -> Vec<Box<dyn SessionResource>> {
        [
            self.paths.take_reader(),
            self.content.take_reader(),
            self.paths.take_writer(),
            self.content.take_writer(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Drop for IndexSession {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            if let Err(e) = self.rollback() {
                warn!("Rolling back abandoned session for '{}' failed: {}", self.workspace, e);
            }
        }
    }
}

/// Term values of a location as they appear in its paths document
fn location_terms(location: &Location, field: &str) -> Vec<TermValue> {
    let segment = location.path.last_segment();
    let sns = segment.map(|s| s.index()).unwrap_or(1);
    match field {
        paths::PATH => vec![TermValue::Text(location.path.to_index_string())],
        paths::NAME => vec![TermValue::from(segment.map(|s| s.name()).unwrap_or(""))],
        paths::LOCAL_NAME => vec![TermValue::from(segment.map(|s| s.local_name()).unwrap_or(""))],
        paths::SNS => vec![TermValue::Int(i64::from(sns))],
        paths::SNS_TEXT => vec![TermValue::Text(sns.to_string())],
        paths::ID => location.id.iter().map(|id| TermValue::from(id.as_str())).collect(),
        paths::DEPTH => vec![TermValue::Int(location.path.depth() as i64)],
        _ => Vec::new(),
    }
}
