//! The access component: leaf execution of a structured query.
//!
//! A [`QueryCommand`] names one selector, the columns to project and a
//! residual [`Constraint`]. The constraint is translated into a content
//! query, hits are collected into tuples, and node locations are
//! resolved in one pass once the result set is known.

use crate::core::error::{NodexError, Result};
use crate::core::graph::Location;
use crate::core::search::constraint::Constraint;
use crate::core::search::translator::{QueryTranslator, ScoreFilter};
use crate::core::storage::IndexSession;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::TopDocs;
use tantivy::TantivyDocument;
use tracing::{debug, trace};

/// Compiled access request for one selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCommand {
    /// Name of the selector this access serves
    pub selector: String,
    /// Property names projected into each tuple
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    /// Record the full-text score of each tuple
    #[serde(default)]
    pub include_score: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl QueryCommand {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            columns: Vec::new(),
            constraint: None,
            include_score: false,
            limit: None,
            offset: 0,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_score(mut self) -> Self {
        self.include_score = true;
        self
    }

    pub fn with_limit(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}

/// One result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tuple {
    pub location: Location,
    /// One entry per requested column, `None` when the node has no
    /// stored value for it
    pub values: Vec<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Rows produced by one access
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResults {
    pub columns: Vec<String>,
    pub tuples: Vec<Tuple>,
    pub duration_ms: u64,
}

impl QueryResults {
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

/// A tuple whose location is still only an identifier
struct PendingTuple {
    id: String,
    values: Vec<Option<String>>,
    score: f32,
}

impl IndexSession {
    /// Execute one access against the content index
    pub fn query(&mut self, command: &QueryCommand) -> Result<QueryResults> {
        let start = Instant::now();
        let rules = Arc::clone(self.rules());
        let translated = QueryTranslator::new(&mut *self, rules.as_ref())
            .translate_top(command.constraint.as_ref())?;
        debug!(
            "Access on selector '{}' in '{}': {:?}",
            command.selector, self.workspace, translated.query
        );

        let empty = |start: Instant| QueryResults {
            columns: command.columns.clone(),
            tuples: Vec::new(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        if command.limit == Some(0) {
            return Ok(empty(start));
        }
        let Some(searcher) = self.content_searcher()? else {
            return Ok(empty(start));
        };
        let query = translated.query.to_tantivy(searcher.schema())?;

        // Score filters run after collection, so only an unfiltered
        // access can stop at limit + offset hits
        let num_docs = searcher.num_docs() as usize;
        let wanted = match command.limit {
            Some(limit) if translated.score_filters.is_empty() => {
                limit.saturating_add(command.offset).min(num_docs)
            }
            _ => num_docs,
        };
        if wanted == 0 || command.offset >= num_docs {
            return Ok(empty(start));
        }
        let hits = searcher
            .search(&query, &TopDocs::with_limit(wanted))
            .map_err(|e| NodexError::index(format!("access '{}'", command.selector), e))?;

        let mut pending = Vec::with_capacity(hits.len());
        for (score, address) in hits {
            if !passes(&translated.score_filters, score) {
                continue;
            }
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| NodexError::index("read content document", e))?;
            let Some(id) = self.mapper.read_content_id(&doc) else {
                continue;
            };
            if self.deleted.contains(&id) && !self.pending.contains_key(&id) {
                continue;
            }
            let stored = self.mapper.read_stored_values(&doc);
            let values = command
                .columns
                .iter()
                .map(|column| {
                    stored
                        .iter()
                        .find(|(name, _)| name == column)
                        .map(|(_, value)| value.clone())
                })
                .collect();
            trace!("Tuple {} scored {}", id, score);
            pending.push(PendingTuple { id, values, score });
        }

        let window: Vec<PendingTuple> = pending
            .into_iter()
            .skip(command.offset)
            .take(command.limit.unwrap_or(usize::MAX))
            .collect();

        // Second pass: resolve every location at once
        let mut locations = self.locations_for(window.iter().map(|t| t.id.as_str()))?;
        let tuples: Vec<Tuple> = window
            .into_iter()
            .filter_map(|t| {
                locations.remove(&t.id).map(|location| Tuple {
                    location,
                    values: t.values,
                    score: command.include_score.then_some(t.score),
                })
            })
            .collect();

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Access on '{}' returned {} tuples in {}ms",
            command.selector,
            tuples.len(),
            duration_ms
        );
        Ok(QueryResults {
            columns: command.columns.clone(),
            tuples,
            duration_ms,
        })
    }
}

fn passes(filters: &[ScoreFilter], score: f32) -> bool {
    filters.iter().all(|filter| filter.accepts(score))
}
