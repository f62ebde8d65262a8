//! nodex - search indexing for hierarchical content repositories
//!
//! Maintains a pair of tantivy indexes per workspace: a paths index
//! holding the identity of every node and a content index holding its
//! properties. Structural constraints are resolved against the paths
//! index and joined to the content index by node identifier.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - config, error, xdg
//!   - graph (paths, values, nodes)
//!   - rules (per-property indexing policy)
//!   - storage (schemas, document mapper, index sessions)
//!   - search (query translation, free-text search, access)
//!   - engine (content sources, change application, workspaces)
//!   - services (unified service container)
//!
//! - **cli**: the `nodex` command line (depends on core)
//!
//! # Key Features
//!
//! - Two correlated indexes kept consistent within one session
//! - Path, name and depth constraints answered in two phases
//! - LIKE patterns, typed range comparisons and JCR full-text syntax
//! - Incremental application of node and workspace changes

// Core domain logic
pub mod core;

// Command line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::engine::{Change, ContentSource, InMemorySource, IndexingStats, SearchEngine};
pub use core::error::{NodexError, Result};
pub use core::graph::{Location, Node, Path, Property, Value};
pub use core::search::{Constraint, QueryCommand, QueryResults};
pub use core::services::Services;
