//! Error types and error handling for nodex.
//!
//! Every failure is classified into one of a small number of
//! categories (see [`ErrorCategory`]). Commit and rollback use the
//! category to decide which of several cleanup failures surfaces.

use thiserror::Error;

/// Result type alias for nodex operations
pub type Result<T> = std::result::Result<T, NodexError>;

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Opening, reading, writing or closing an index resource failed
    Io,
    /// Malformed free-text query syntax
    Parse,
    /// Caller contract violation (e.g. LIKE on a date)
    Contract,
    /// Unknown workspace or path
    NotFound,
    /// Anything else
    Runtime,
}

/// Main error type for nodex
#[derive(Error, Debug)]
pub enum NodexError {
    #[error("Workspace '{workspace}' does not exist in source '{source_name}'")]
    WorkspaceNotFound {
        workspace: String,
        source_name: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid query '{query}' against workspace '{workspace}' in source '{source_name}': {message}")]
    InvalidQuery {
        query: String,
        workspace: String,
        source_name: String,
        message: String,
    },

    #[error("Invalid query field '{field}': {message}")]
    InvalidQueryField { field: String, message: String },

    #[error("Query too long: {length} characters (limit {limit})")]
    QueryTooLong { length: usize, limit: usize },

    #[error("Unsupported constraint: {0}")]
    UnsupportedConstraint(String),

    #[error("Failed to index content at '{path}': {source}")]
    IndexingFailed {
        path: String,
        #[source]
        source: Box<NodexError>,
    },

    #[error("Error while {operation} in workspace '{workspace}' of source '{source_name}': {source}")]
    Transaction {
        operation: String,
        workspace: String,
        source_name: String,
        #[source]
        source: Box<NodexError>,
    },

    #[error("Index error ({context}): {source}")]
    Index {
        context: String,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    #[error("Index session is already {0}")]
    SessionClosed(&'static str),

    #[error("Index session is read-only")]
    ReadOnlySession,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Content source error: {0}")]
    SourceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl NodexError {
    /// Wrap a tantivy error with a short description of what was attempted
    pub fn index(context: impl Into<String>, source: tantivy::TantivyError) -> Self {
        NodexError::Index {
            context: context.into(),
            source,
        }
    }

    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        use tantivy::TantivyError as T;
        match self {
            NodexError::IoError(_) => ErrorCategory::Io,
            NodexError::Index { source, .. } => match source {
                T::IoError(_)
                | T::OpenDirectoryError(_)
                | T::OpenReadError(_)
                | T::OpenWriteError(_)
                | T::LockFailure(..) => ErrorCategory::Io,
                _ => ErrorCategory::Runtime,
            },
            NodexError::QueryParse(_)
            | NodexError::InvalidQuery { .. }
            | NodexError::InvalidQueryField { .. }
            | NodexError::QueryTooLong { .. } => ErrorCategory::Parse,
            NodexError::UnsupportedConstraint(_) | NodexError::ReadOnlySession => {
                ErrorCategory::Contract
            }
            NodexError::WorkspaceNotFound { .. } | NodexError::InvalidPath(_) => {
                ErrorCategory::NotFound
            }
            NodexError::IndexingFailed { source, .. } | NodexError::Transaction { source, .. } => {
                source.category()
            }
            _ => ErrorCategory::Runtime,
        }
    }

    /// Check if this is an I/O-kind error
    pub fn is_io(&self) -> bool {
        self.category() == ErrorCategory::Io
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Parse | ErrorCategory::Contract
        ) || matches!(
            self.root_cause(),
            NodexError::InvalidValue(_) | NodexError::ConfigError(_)
        )
    }

    /// The innermost error beneath indexing and transaction context
    pub fn root_cause(&self) -> &NodexError {
        match self {
            NodexError::IndexingFailed { source, .. } | NodexError::Transaction { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
