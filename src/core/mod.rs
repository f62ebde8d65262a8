//! Core domain logic
//!
//! Everything that is independent of the command line lives here.
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **xdg**: XDG directory handling
//! - **graph**: Paths, values and nodes read from a content source
//! - **rules**: Per-property indexing policy
//! - **storage**: Schemas, document mapping and index sessions
//! - **search**: Query translation, free-text search and access
//! - **engine**: Content sources, change planning and orchestration
//! - **services**: Unified service container

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod rules;
pub mod search;
pub mod services;
pub mod storage;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use error::{NodexError, Result};
pub use services::Services;
