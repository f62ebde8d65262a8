//! Unified service container for nodex
//!
//! Provides shared access to the configuration and the search engine.

use crate::core::config::Config;
use crate::core::engine::{ContentSource, EngineSettings, SearchEngine};
use crate::core::storage::{FsDirectories, IndexDirectories, RamDirectories};
use std::sync::Arc;

/// Unified services container
#[derive(Clone)]
pub struct Services {
    /// Indexing and search over the content source
    pub engine: Arc<SearchEngine>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration over a content source
    pub fn new(config: Config, source: Arc<dyn ContentSource>) -> Self {
        let directories: Arc<dyn IndexDirectories> = if config.storage.in_memory {
            Arc::new(RamDirectories::new())
        } else {
            Arc::new(FsDirectories::new(config.storage.index_dir.clone()))
        };

        let engine = Arc::new(SearchEngine::new(
            source,
            directories,
            config.rules.build(),
            EngineSettings::from_config(&config),
        ));

        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
