//! Storage layer over two tantivy indexes per workspace.
//!
//! # Architecture
//!
//! - **schema**: fixed schemas of the paths and content indexes
//! - **encoding**: property names and typed values in term space
//! - **directory**: where each workspace's indexes live
//! - **mapper**: nodes to documents and back
//! - **handles**: lazily opened readers/writers and their release
//! - **session**: one unit of work against both indexes
//! - **subtree**: subtree deletion, moves and path-relationship lookups
//!
//! # Layout
//!
//! ```text
//! {index_dir}/
//! ├── {workspace}/
//! │   ├── paths/      # one identity document per node
//! │   └── content/    # one property document per node
//! ```

pub mod directory;
pub mod encoding;
pub mod handles;
pub mod mapper;
pub mod schema;
pub mod session;
pub mod subtree;

pub use directory::{FsDirectories, IndexDirectories, RamDirectories};
pub use mapper::{DocumentMapper, MappedNode};
pub use schema::IndexKind;
pub use session::{IndexSession, SessionSettings};
pub use subtree::DeleteStats;
