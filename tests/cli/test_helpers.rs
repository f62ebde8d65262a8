//! CLI test helpers
//!
//! Services over the small test repository, optionally indexed, wrapped
//! in Arc the way the CLI execute() functions take them.

use crate::common::{create_test_services, TestRepo};
use nodex::core::engine::{ContentSource, InMemorySource};
use nodex::core::graph::Path;
use nodex::core::services::Services;
use std::sync::Arc;
use tempfile::TempDir;

/// Services over [`TestRepo::small`] with nothing indexed yet
pub fn create_cli_test_services() -> (Arc<Services>, Arc<InMemorySource>, TempDir) {
    let repo = TestRepo::small();
    let (services, temp) = create_test_services(Arc::clone(&repo.source) as Arc<dyn ContentSource>);
    (services, repo.source, temp)
}

/// Services whose "default" workspace is already indexed
pub fn create_indexed_services() -> (Arc<Services>, Arc<InMemorySource>, TempDir) {
    let (services, source, temp) = create_cli_test_services();
    services
        .engine
        .index_content("default", &Path::root(), None)
        .expect("Failed to index test repo");
    (services, source, temp)
}
