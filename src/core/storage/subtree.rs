//! Subtree maintenance.
//!
//! Query builders over the paths index for nodes at, below and directly
//! under a path, plus the session operations that use them: batched
//! subtree deletion, subtree moves and identifier resolution.

use crate::core::error::{NodexError, Result};
use crate::core::graph::Path;
use crate::core::search::IndexQuery;
use crate::core::storage::schema::paths;
use crate::core::storage::session::IndexSession;
use std::collections::BTreeSet;
use tantivy::collector::{Count, TopDocs};
use tantivy::{TantivyDocument, Term};
use tracing::{debug, info, trace};

/// Outcome of a batched subtree deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteStats {
    /// Nodes removed from both indexes
    pub deleted: usize,
    /// Search batches issued against the paths index
    pub batches: usize,
}

/// The node at exactly `path`
pub fn node_at(path: &Path) -> IndexQuery {
    IndexQuery::term(paths::PATH, path.to_index_string())
}

/// `path` and everything below it
pub fn at_or_below(path: &Path) -> IndexQuery {
    descendants_of(path, true)
}

/// Everything below `path`, optionally including `path` itself
///
/// The root short-circuits: its subtree is the whole workspace.
pub fn descendants_of(path: &Path, include_self: bool) -> IndexQuery {
    if path.is_root() {
        return if include_self {
            IndexQuery::MatchAll
        } else {
            IndexQuery::int_at_least(paths::DEPTH, 1)
        };
    }
    let below = IndexQuery::prefix(paths::PATH, format!("{}/", path.to_index_string()));
    if include_self {
        IndexQuery::or(vec![node_at(path), below])
    } else {
        below
    }
}

/// Direct children of `path`: below it and exactly one level deeper
pub fn children_of(path: &Path) -> IndexQuery {
    let child_depth = IndexQuery::term(paths::DEPTH, path.depth() as i64 + 1);
    IndexQuery::and(vec![descendants_of(path, false), child_depth])
}

impl IndexSession {
    /// Delete `path` and everything below it from both indexes
    ///
    /// Returns the number of nodes deleted; 0 when the workspace has
    /// never been indexed.
    pub fn delete_below(&mut self, path: &Path) -> Result<usize> {
        Ok(self.delete_below_batched(path)?.deleted)
    }

    /// Batched subtree deletion
    ///
    /// The paths index is searched in windows of `delete_batch_size`
    /// hits. Deletions only become visible on commit, so every batch
    /// pages further into the same snapshot; the loop stops at the
    /// first batch with fewer hits than the batch size or once the
    /// snapshot's matches are exhausted. Nodes written
    /// earlier in this session are matched on their pending location.
    pub fn delete_below_batched(&mut self, path: &Path) -> Result<DeleteStats> {
        self.ensure_writable()?;
        let mut stats = DeleteStats::default();

        let pending: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, location)| location.path.is_at_or_below(path))
            .map(|(id, _)| id.clone())
            .collect();
        let relocated: BTreeSet<String> = self.pending.keys().cloned().collect();
        for id in &pending {
            self.delete_node_documents(id)?;
            self.pending.remove(id);
            stats.deleted += 1;
        }

        let Some(searcher) = self.paths_searcher()? else {
            debug!("No paths index for '{}'; nothing below {} to delete", self.workspace, path);
            return Ok(stats);
        };
        let query = at_or_below(path).to_tantivy(searcher.schema())?;
        let batch_size = self.settings.delete_batch_size.max(1);

        let mut offset = 0;
        loop {
            let (hits, total) = searcher
                .search(
                    &query,
                    &(TopDocs::with_limit(batch_size).and_offset(offset), Count),
                )
                .map_err(|e| NodexError::index(format!("search below {path}"), e))?;
            stats.batches += 1;
            let hit_count = hits.len();

            for (_score, address) in hits {
                let doc: TantivyDocument = searcher
                    .doc(address)
                    .map_err(|e| NodexError::index("read paths document", e))?;
                let Some(id) = self.mapper.read_path_id(&doc) else {
                    continue;
                };
                // Rewritten in this session; its pending location decided above
                if self.deleted.contains(&id) || relocated.contains(&id) {
                    continue;
                }
                self.delete_node_documents(&id)?;
                stats.deleted += 1;
            }
            trace!("Delete batch {} below {}: {} hits", stats.batches, path, hit_count);

            if hit_count < batch_size || offset + hit_count >= total {
                break;
            }
            offset += batch_size;
        }

        info!(
            "Deleted {} nodes at or below {} in '{}' ({} batches)",
            stats.deleted, path, self.workspace, stats.batches
        );
        Ok(stats)
    }

    /// Rewrite the paths documents of `from` and its subtree to live under `to`
    ///
    /// Content documents are untouched; they are joined by identifier.
    /// Returns the number of nodes moved.
    pub fn move_subtree(&mut self, from: &Path, to: &Path) -> Result<usize> {
        self.ensure_writable()?;
        if from.is_root() {
            return Err(NodexError::InvalidPath("the root node cannot be moved".to_string()));
        }
        if to.is_at_or_below(from) {
            return Err(NodexError::InvalidPath(format!(
                "cannot move {from} below itself ({to})"
            )));
        }

        let mut moved = 0;
        for mut location in self.locations_matching(&at_or_below(from))? {
            let Some(id) = location.id.clone() else {
                continue;
            };
            let Some(new_path) = location.path.relocate(from, to) else {
                continue;
            };
            trace!("Moving {} to {}", location.path, new_path);
            location.path = new_path;
            let doc = self.mapper.path_document(&id, &location)?;
            let id_term = Term::from_field_text(self.paths_fields.id, &id);
            let writer = self.paths_writer()?;
            writer.delete_term(id_term);
            writer
                .add_document(doc)
                .map_err(|e| NodexError::index("add moved paths document", e))?;
            self.pending.insert(id, location);
            self.change_count += 1;
            moved += 1;
        }
        info!("Moved {} nodes from {} to {} in '{}'", moved, from, to, self.workspace);
        Ok(moved)
    }

    /// Identifiers of the direct children of `path`
    pub fn ids_for_children_of(&mut self, path: &Path) -> Result<BTreeSet<String>> {
        self.ids_matching_paths(&children_of(path))
    }

    /// Identifiers of everything below `path`
    pub fn ids_for_descendants_of(
        &mut self,
        path: &Path,
        include_self: bool,
    ) -> Result<BTreeSet<String>> {
        self.ids_matching_paths(&descendants_of(path, include_self))
    }

    /// Delete both documents of one node by identifier term
    pub(crate) fn delete_node_documents(&mut self, id: &str) -> Result<()> {
        let paths_term = Term::from_field_text(self.paths_fields.id, id);
        let content_term = Term::from_field_text(self.content_fields.id, id);
        self.paths_writer()?.delete_term(paths_term);
        self.content_writer()?.delete_term(content_term);
        self.deleted.insert(id.to_string());
        self.change_count += 1;
        Ok(())
    }
}
