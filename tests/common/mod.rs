// Common test utilities and fixtures

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
// Note: These may appear unused in some test binaries
#[allow(unused_imports)]
pub use fixtures::{node, node_with_id, TestRepo, TestTree};
#[allow(unused_imports)]
pub use helpers::{
    count_matches, create_test_engine, create_test_services, ids_of, open_session, TestIndexes,
};
