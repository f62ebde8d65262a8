//! Lazily opened tantivy handles and their orderly release.
//!
//! A session owns up to four resources: a reader and a writer for each
//! index. [`finish`] commits (or rolls back) all of them and only then
//! closes them, both passes in a fixed order. Every step is attempted
//! even after a failure; the first runtime-kind error wins over the
//! first I/O-kind error.

use crate::core::error::{NodexError, Result};
use crate::core::storage::directory::IndexDirectories;
use crate::core::storage::schema::IndexKind;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};
use tracing::{debug, error};

/// How a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Commit,
    Rollback,
}

impl Completion {
    pub fn verb(self) -> &'static str {
        match self {
            Completion::Commit => "committing",
            Completion::Rollback => "rolling back",
        }
    }
}

/// A resource released when a session ends
pub trait SessionResource {
    fn label(&self) -> String;

    /// Make pending work durable (writers only)
    fn commit(&mut self) -> Result<()>;

    /// Discard pending work (writers only)
    fn rollback(&mut self) -> Result<()>;

    fn close(self: Box<Self>) -> Result<()>;
}

/// Keeps the first error of each category
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    first_io: Option<NodexError>,
    first_runtime: Option<NodexError>,
}

impl ErrorAggregator {
    pub fn record(&mut self, err: NodexError) {
        let slot = if err.is_io() {
            &mut self.first_io
        } else {
            &mut self.first_runtime
        };
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self.first_runtime.or(self.first_io) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Commit or roll back every resource in order, then close them in order
///
/// Closing a writer waits for its merges, so no resource closes before
/// every writer has committed.
pub fn finish(mut resources: Vec<Box<dyn SessionResource>>, completion: Completion) -> Result<()> {
    let mut errors = ErrorAggregator::default();
    for resource in resources.iter_mut() {
        let outcome = match completion {
            Completion::Commit => resource.commit(),
            Completion::Rollback => resource.rollback(),
        };
        if let Err(e) = outcome {
            error!("Failed {} {}: {}", completion.verb(), resource.label(), e);
            errors.record(e);
        }
    }
    for resource in resources {
        let label = resource.label();
        if let Err(e) = resource.close() {
            error!("Failed closing {}: {}", label, e);
            errors.record(e);
        }
    }
    errors.into_result()
}

struct ReaderResource {
    kind: IndexKind,
    reader: IndexReader,
}

impl SessionResource for ReaderResource {
    fn label(&self) -> String {
        format!("{} reader", self.kind.dir_name())
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        drop(self.reader);
        Ok(())
    }
}

struct WriterResource {
    kind: IndexKind,
    writer: IndexWriter,
}

impl SessionResource for WriterResource {
    fn label(&self) -> String {
        format!("{} writer", self.kind.dir_name())
    }

    fn commit(&mut self) -> Result<()> {
        let opstamp = self
            .writer
            .commit()
            .map_err(|e| NodexError::index(format!("commit {} index", self.kind.dir_name()), e))?;
        debug!("Committed {} index at opstamp {}", self.kind.dir_name(), opstamp);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.writer
            .rollback()
            .map_err(|e| NodexError::index(format!("roll back {} index", self.kind.dir_name()), e))?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let kind = self.kind;
        self.writer
            .wait_merging_threads()
            .map_err(|e| NodexError::index(format!("close {} writer", kind.dir_name()), e))
    }
}

/// Lazily opened index, reader and writer for one index of a workspace
pub struct IndexHandles {
    kind: IndexKind,
    index: Option<Index>,
    reader: Option<IndexReader>,
    searcher: Option<Searcher>,
    writer: Option<IndexWriter>,
}

impl IndexHandles {
    pub fn new(kind: IndexKind) -> Self {
        Self {
            kind,
            index: None,
            reader: None,
            searcher: None,
            writer: None,
        }
    }

    /// Open the index; with `create` an empty index is created first
    ///
    /// Returns `None` when the index does not exist yet and `create` is
    /// false.
    pub fn index(
        &mut self,
        directories: &dyn IndexDirectories,
        workspace: &str,
        create: bool,
    ) -> Result<Option<&Index>> {
        if self.index.is_none() {
            let dir = directories.directory(workspace, self.kind)?;
            let name = self.kind.dir_name();
            let exists = Index::exists(&*dir).map_err(|e| {
                NodexError::index(format!("check for {name} index of '{workspace}'"), e.into())
            })?;
            if exists {
                let index = Index::open(dir).map_err(|e| {
                    NodexError::index(format!("open {name} index of '{workspace}'"), e)
                })?;
                self.index = Some(index);
            } else if create {
                let index = Index::open_or_create(dir, self.kind.schema()).map_err(|e| {
                    NodexError::index(format!("create {name} index of '{workspace}'"), e)
                })?;
                debug!("Created {} index for workspace '{}'", name, workspace);
                self.index = Some(index);
            }
        }
        Ok(self.index.as_ref())
    }

    /// Point-in-time searcher, opened on first use
    pub fn searcher(
        &mut self,
        directories: &dyn IndexDirectories,
        workspace: &str,
    ) -> Result<Option<Searcher>> {
        if let Some(searcher) = &self.searcher {
            return Ok(Some(searcher.clone()));
        }
        let kind = self.kind;
        let Some(index) = self.index(directories, workspace, false)? else {
            return Ok(None);
        };
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| NodexError::index(format!("open {} reader", kind.dir_name()), e))?;
        let searcher = reader.searcher();
        self.reader = Some(reader);
        self.searcher = Some(searcher.clone());
        Ok(Some(searcher))
    }

    /// Writer, opened (and the index created) on first use
    pub fn writer(
        &mut self,
        directories: &dyn IndexDirectories,
        workspace: &str,
        heap_bytes: usize,
    ) -> Result<&mut IndexWriter> {
        if self.writer.is_none() {
            let kind = self.kind;
            let index = self
                .index(directories, workspace, true)?
                .ok_or_else(|| NodexError::index(
                    format!("open {} index", kind.dir_name()),
                    tantivy::TantivyError::InternalError("index was not created".to_string()),
                ))?;
            let writer: IndexWriter<TantivyDocument> = index
                .writer(heap_bytes)
                .map_err(|e| NodexError::index(format!("open {} writer", kind.dir_name()), e))?;
            self.writer = Some(writer);
        }
        self.writer
            .as_mut()
            .ok_or(NodexError::SessionClosed("closed"))
    }

    /// Hand over the reader for release; drops the cached searcher
    pub fn take_reader(&mut self) -> Option<Box<dyn SessionResource>> {
        self.searcher = None;
        self.reader.take().map(|reader| {
            Box::new(ReaderResource {
                kind: self.kind,
                reader,
            }) as Box<dyn SessionResource>
        })
    }

    /// Hand over the writer for release
    pub fn take_writer(&mut self) -> Option<Box<dyn SessionResource>> {
        self.writer.take().map(|writer| {
            Box::new(WriterResource {
                kind: self.kind,
                writer,
            }) as Box<dyn SessionResource>
        })
    }
}
