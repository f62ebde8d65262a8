// Test helper functions

use nodex::core::config::Config;
use nodex::core::engine::{ContentSource, EngineSettings, SearchEngine};
use nodex::core::graph::Location;
use nodex::core::rules::IndexRules;
use nodex::core::search::IndexQuery;
use nodex::core::services::Services;
use nodex::core::storage::{
    FsDirectories, IndexDirectories, IndexKind, IndexSession, SessionSettings,
};
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::Index;
use tempfile::TempDir;

/// Heap large enough for tantivy, small enough for parallel tests
#[allow(dead_code)]
pub const TEST_HEAP_BYTES: usize = 20_000_000;

/// On-disk indexes in a temporary directory
#[allow(dead_code)] // Used in integration tests
pub struct TestIndexes {
    pub dir: TempDir,
    pub dirs: Arc<FsDirectories>,
}

impl TestIndexes {
    #[allow(dead_code)] // Used in integration tests
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let dirs = Arc::new(FsDirectories::new(dir.path().to_path_buf()));
        Self { dir, dirs }
    }
}

/// Open a session on workspace "default"
#[allow(dead_code)] // Used in integration tests
pub fn open_session(
    indexes: &TestIndexes,
    delete_batch_size: usize,
    read_only: bool,
) -> IndexSession {
    IndexSession::new(
        "default",
        "repo",
        Arc::clone(&indexes.dirs) as Arc<dyn IndexDirectories>,
        Arc::new(IndexRules::standard()),
        SessionSettings {
            writer_heap_bytes: TEST_HEAP_BYTES,
            delete_batch_size,
        },
        read_only,
    )
    .expect("Failed to open session")
}

/// Committed documents of one index of "default" matching `query`
#[allow(dead_code)] // Used in integration tests
pub fn count_matches(indexes: &TestIndexes, kind: IndexKind, query: &IndexQuery) -> usize {
    let index = Index::open_in_dir(indexes.dirs.index_dir("default", kind))
        .expect("Failed to open index");
    let reader = index.reader().expect("Failed to open reader");
    let searcher = reader.searcher();
    let query = query.to_tantivy(&index.schema()).expect("Invalid query");
    searcher.search(&query, &Count).expect("Search failed")
}

/// Sorted identifiers of some locations
#[allow(dead_code)] // Used in integration tests
pub fn ids_of(locations: &[Location]) -> Vec<String> {
    let mut ids: Vec<String> = locations.iter().filter_map(|l| l.id.clone()).collect();
    ids.sort();
    ids
}

/// Engine over `source` with indexes in a temporary directory
#[allow(dead_code)] // Used in integration tests
pub fn create_test_engine(source: Arc<dyn ContentSource>) -> (SearchEngine, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut settings = EngineSettings::default();
    settings.session.writer_heap_bytes = TEST_HEAP_BYTES;
    settings.session.delete_batch_size = 3;
    let engine = SearchEngine::new(
        source,
        Arc::new(FsDirectories::new(temp_dir.path().to_path_buf())),
        IndexRules::standard(),
        settings,
    );
    (engine, temp_dir)
}

/// Services with temporary storage, wrapped in Arc like the CLI uses them
#[allow(dead_code)] // Used in integration tests
pub fn create_test_services(source: Arc<dyn ContentSource>) -> (Arc<Services>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.storage.index_dir = temp_dir.path().to_path_buf();
    config.indexing.writer_heap_bytes = TEST_HEAP_BYTES;
    (Arc::new(Services::new(config, source)), temp_dir)
}
