//! Index directory resolution.
//!
//! Each workspace owns two independent index directories, `paths` and
//! `content`. Where they live is decided by an [`IndexDirectories`]
//! implementation keyed by workspace name.
//!
//! ```text
//! {index_dir}/
//! ├── {workspace-1}/
//! │   ├── paths/      # identity documents
//! │   └── content/    # property documents
//! └── {workspace-2}/
//! ```

use crate::core::error::{NodexError, Result};
use crate::core::storage::schema::IndexKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tantivy::directory::{Directory, MmapDirectory, RamDirectory};

/// Resolves the tantivy directory of one index of one workspace
pub trait IndexDirectories: Send + Sync {
    /// Directory for the index, created if necessary
    fn directory(&self, workspace: &str, kind: IndexKind) -> Result<Box<dyn Directory>>;

    /// Remove every index of a workspace
    fn remove_workspace(&self, workspace: &str) -> Result<()>;
}

/// Indexes stored on disk under a root directory
#[derive(Debug, Clone)]
pub struct FsDirectories {
    root: PathBuf,
}

impl FsDirectories {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory of a workspace
    pub fn workspace_dir(&self, workspace: &str) -> PathBuf {
        self.root.join(encode_workspace_name(workspace))
    }

    /// Directory of one index
    pub fn index_dir(&self, workspace: &str, kind: IndexKind) -> PathBuf {
        self.workspace_dir(workspace).join(kind.dir_name())
    }
}

impl IndexDirectories for FsDirectories {
    fn directory(&self, workspace: &str, kind: IndexKind) -> Result<Box<dyn Directory>> {
        let dir = self.index_dir(workspace, kind);
        fs::create_dir_all(&dir)?;
        let mmap = MmapDirectory::open(&dir).map_err(|e| {
            NodexError::index(format!("open directory {}", dir.display()), e.into())
        })?;
        Ok(Box::new(mmap))
    }

    fn remove_workspace(&self, workspace: &str) -> Result<()> {
        let dir = self.workspace_dir(workspace);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            tracing::info!("Removed index directories for workspace '{}'", workspace);
        }
        Ok(())
    }
}

/// Indexes kept in memory, shared by every session of the process
#[derive(Default)]
pub struct RamDirectories {
    dirs: Mutex<HashMap<(String, IndexKind), RamDirectory>>,
}

impl RamDirectories {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexDirectories for RamDirectories {
    fn directory(&self, workspace: &str, kind: IndexKind) -> Result<Box<dyn Directory>> {
        let mut dirs = self.dirs.lock();
        let dir = dirs
            .entry((workspace.to_string(), kind))
            .or_insert_with(RamDirectory::create);
        Ok(Box::new(dir.clone()))
    }

    fn remove_workspace(&self, workspace: &str) -> Result<()> {
        self.dirs.lock().retain(|(name, _), _| name != workspace);
        Ok(())
    }
}

/// Make a workspace name safe as a single directory name
fn encode_workspace_name(workspace: &str) -> String {
    let mut out = String::with_capacity(workspace.len());
    for byte in workspace.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    if out.is_empty() {
        out.push_str("%00");
    }
    out
}
