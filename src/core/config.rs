//! Configuration management for nodex.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{NodexError, Result};
use crate::core::rules::{IndexRules, IndexRulesBuilder};
use crate::core::storage::SessionSettings;
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest writer heap tantivy accepts
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the per-workspace indexes
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Keep indexes in memory instead of on disk
    #[serde(default)]
    pub in_memory: bool,
}

/// Indexing configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IndexingConfig {
    /// Memory budget of each index writer in bytes
    #[serde(default = "default_writer_heap_bytes")]
    pub writer_heap_bytes: usize,

    /// Hits per search window when deleting a subtree
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,

    /// Levels read from the source per crawl batch
    #[serde(default = "default_read_depth")]
    pub read_depth: usize,

    /// Optimize a workspace once this many changes accumulate (0 = never)
    #[serde(default)]
    pub optimize_after_changes: usize,
}

/// Search configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Results returned when the caller does not ask for a number
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,

    /// Upper bound on results per search
    #[serde(default = "default_result_limit")]
    pub max_results: usize,

    /// Maximum free-text query length in characters
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

/// Property names layered on top of the standard index rules
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub index: Vec<String>,
    #[serde(default)]
    pub analyze: Vec<String>,
    #[serde(default)]
    pub store: Vec<String>,
    #[serde(default)]
    pub full_text: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
}

// Default value functions
fn default_index_dir() -> PathBuf {
    PathBuf::from("./indexes")
}

fn default_writer_heap_bytes() -> usize {
    50_000_000
}

fn default_delete_batch_size() -> usize {
    1000
}

fn default_read_depth() -> usize {
    10
}

fn default_max_results() -> usize {
    10
}

fn default_result_limit() -> usize {
    1000
}

fn default_max_query_length() -> usize {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            in_memory: false,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            writer_heap_bytes: default_writer_heap_bytes(),
            delete_batch_size: default_delete_batch_size(),
            read_depth: default_read_depth(),
            optimize_after_changes: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
            max_results: default_result_limit(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl IndexingConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            writer_heap_bytes: self.writer_heap_bytes,
            delete_batch_size: self.delete_batch_size,
        }
    }
}

impl RulesConfig {
    /// Standard rules with the configured names layered on top
    pub fn build(&self) -> IndexRules {
        let mut builder: IndexRulesBuilder = IndexRules::standard_builder();
        builder
            .index(self.index.iter().cloned())
            .analyze(self.analyze.iter().cloned())
            .store(self.store.iter().cloned())
            .full_text(self.full_text.iter().cloned())
            .treat_as_dates(self.dates.iter().cloned())
            .skip(self.skip.iter().cloned());
        builder.build()
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| NodexError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. NODEX_CONFIG env var
    /// 2. XDG config file (~/.config/nodex/config.toml, or NODEX_CONFIG_FILE)
    /// 3. ./nodex.toml
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("NODEX_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else if Path::new("nodex.toml").exists() {
                Self::from_file("nodex.toml")?
            } else {
                Self::default()
            }
        };

        // Indexes live in the XDG data directory unless set explicitly
        if env::var("NODEX_DATA_DIR").is_err() && config.storage.index_dir == default_index_dir() {
            config.storage.index_dir = xdg.indexes_dir();
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(data_dir) = env::var("NODEX_DATA_DIR") {
            self.storage.index_dir = PathBuf::from(data_dir).join("indexes");
        }

        if let Some(v) = env_number("NODEX_WRITER_HEAP_BYTES") {
            self.indexing.writer_heap_bytes = v;
        }
        if let Some(v) = env_number("NODEX_DELETE_BATCH_SIZE") {
            self.indexing.delete_batch_size = v;
        }
        if let Some(v) = env_number("NODEX_READ_DEPTH") {
            self.indexing.read_depth = v;
        }
        if let Some(v) = env_number("NODEX_OPTIMIZE_AFTER_CHANGES") {
            self.indexing.optimize_after_changes = v;
        }

        if let Some(v) = env_number("NODEX_DEFAULT_MAX_RESULTS") {
            self.search.default_max_results = v;
        }
        if let Some(v) = env_number("NODEX_MAX_RESULTS") {
            self.search.max_results = v;
        }
        if let Some(v) = env_number("NODEX_MAX_QUERY_LENGTH") {
            self.search.max_query_length = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.indexing.delete_batch_size == 0 {
            return Err(NodexError::ConfigError(
                "Delete batch size must be non-zero".to_string(),
            ));
        }

        if self.indexing.read_depth == 0 {
            return Err(NodexError::ConfigError(
                "Read depth must be non-zero".to_string(),
            ));
        }

        if self.indexing.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            return Err(NodexError::ConfigError(format!(
                "Writer heap must be at least {MIN_WRITER_HEAP_BYTES} bytes"
            )));
        }

        if self.search.default_max_results == 0 {
            return Err(NodexError::ConfigError(
                "Default max results must be non-zero".to_string(),
            ));
        }

        if self.search.default_max_results > self.search.max_results {
            return Err(NodexError::ConfigError(
                "Default max results cannot exceed max results".to_string(),
            ));
        }

        if self.search.max_query_length == 0 {
            return Err(NodexError::ConfigError(
                "Max query length must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Log the resolved configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        if self.storage.in_memory {
            tracing::info!("  Index storage: in memory");
        } else {
            tracing::info!("  Index dir: {:?}", self.storage.index_dir);
        }
        tracing::info!("  Writer heap: {} bytes", self.indexing.writer_heap_bytes);
        tracing::info!("  Delete batch size: {}", self.indexing.delete_batch_size);
        tracing::info!("  Read depth: {}", self.indexing.read_depth);
        tracing::info!(
            "  Optimize after changes: {}",
            self.indexing.optimize_after_changes
        );
        tracing::info!("  Default max results: {}", self.search.default_max_results);
        tracing::info!("  Max results: {}", self.search.max_results);
        tracing::info!("  Max query length: {}", self.search.max_query_length);
        tracing::info!(
            "  Rule overrides: {} skipped, {} date properties",
            self.rules.skip.len(),
            self.rules.dates.len()
        );
    }
}

fn env_number(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
