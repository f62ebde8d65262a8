//! Engine tests
//!
//! Indexing from a content source and applying change batches.

mod test_changes;
mod test_indexing;
