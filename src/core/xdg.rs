//! XDG Base Directory support.
//!
//! Resolves where nodex keeps its configuration file and its indexes on
//! Linux/Unix systems.

use std::env;
use std::fs;
use std::path::PathBuf;

/// XDG directory structure for nodex
#[derive(Debug, Clone)]
pub struct XdgDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl XdgDirs {
    /// Resolve directories
    ///
    /// Priority order (highest to lowest):
    /// 1. Explicit NODEX_* env vars
    /// 2. XDG_* environment variables
    /// 3. XDG defaults (~/.config, ~/.local/share)
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
            data_dir: Self::resolve_data_dir(),
        }
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(dir) = env::var("NODEX_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("nodex");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("nodex")
    }

    fn resolve_data_dir() -> PathBuf {
        if let Ok(dir) = env::var("NODEX_DATA_DIR") {
            return PathBuf::from(dir);
        }
        if let Ok(xdg) = env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("nodex");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("nodex")
    }

    /// Config file path; `NODEX_CONFIG_FILE` overrides the XDG location
    pub fn config_file(&self) -> PathBuf {
        if let Ok(file) = env::var("NODEX_CONFIG_FILE") {
            return PathBuf::from(file);
        }
        self.config_dir.join("config.toml")
    }

    /// Root of the per-workspace index directories
    pub fn indexes_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }

    /// Create the config and index directories if they don't exist
    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        fs::create_dir_all(self.indexes_dir())?;
        Ok(())
    }

    /// Log the resolved paths
    pub fn log_paths(&self) {
        tracing::info!("XDG directories resolved:");
        tracing::info!("  Config: {:?}", self.config_dir);
        tracing::info!("  Data: {:?}", self.data_dir);
        tracing::info!("  Config file: {:?}", self.config_file());
        tracing::info!("  Indexes: {:?}", self.indexes_dir());
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}
