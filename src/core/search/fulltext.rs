//! Free-text search over the content index.

use crate::core::error::{NodexError, Result};
use crate::core::graph::Location;
use crate::core::search::preprocess::{preprocess_query, validate_query_fields};
use crate::core::storage::IndexSession;
use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::TantivyDocument;
use tracing::{debug, trace, warn};

/// One ranked free-text hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub location: Location,
    pub score: f32,
}

impl IndexSession {
    /// Free-text search returning the locations of the best matches
    pub fn search(&mut self, text: &str, max_results: usize, offset: usize) -> Result<Vec<Location>> {
        Ok(self
            .search_hits(text, max_results, offset)?
            .into_iter()
            .map(|hit| hit.location)
            .collect())
    }

    /// Free-text search keeping the relevance score of each hit
    ///
    /// The content index is asked for `max_results + offset` hits in
    /// descending score order and the first `offset` are skipped. Hits
    /// whose node has no paths document are dropped.
    pub fn search_hits(
        &mut self,
        text: &str,
        max_results: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>> {
        if text.trim().is_empty() {
            return Err(self.invalid_query(text, "query cannot be empty".to_string()));
        }
        validate_query_fields(text)?;
        let prepared = preprocess_query(text, false);
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let Some(index) = self.content_index()? else {
            debug!("No content index for '{}'; no hits", self.workspace);
            return Ok(Vec::new());
        };
        let Some(searcher) = self.content_searcher()? else {
            return Ok(Vec::new());
        };

        let parser = QueryParser::for_index(&index, vec![self.content_fields.full_text]);
        let query = parser
            .parse_query(&prepared)
            .map_err(|e| self.invalid_query(text, e.to_string()))?;

        // No window needs more hits than the index holds
        let wanted = max_results
            .saturating_add(offset)
            .min(searcher.num_docs() as usize);
        if wanted <= offset {
            return Ok(Vec::new());
        }
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(wanted))
            .map_err(|e| NodexError::index(format!("search '{}'", self.workspace), e))?;

        let mut hits = Vec::with_capacity(top_docs.len().saturating_sub(offset));
        for (score, address) in top_docs.into_iter().skip(offset) {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| NodexError::index("read content document", e))?;
            let Some(id) = self.mapper.read_content_id(&doc) else {
                warn!("Content document without identifier in '{}'", self.workspace);
                continue;
            };
            if self.deleted.contains(&id) && !self.pending.contains_key(&id) {
                trace!("Skipping {} deleted in this session", id);
                continue;
            }
            match self.location_for(&id)? {
                Some(location) => hits.push(SearchHit { location, score }),
                None => warn!(
                    "Dropping orphan content document {} in '{}'",
                    id, self.workspace
                ),
            }
        }
        debug!(
            "Search '{}' in '{}' returned {} hits",
            text,
            self.workspace,
            hits.len()
        );
        Ok(hits)
    }

    fn invalid_query(&self, query: &str, message: String) -> NodexError {
        NodexError::InvalidQuery {
            query: query.to_string(),
            workspace: self.workspace.clone(),
            source_name: self.source_name().to_string(),
            message,
        }
    }
}
