//! Storage layer tests
//!
//! Index sessions against on-disk indexes: the one-to-one pairing of
//! paths and content documents, path recovery and subtree maintenance.

mod test_sessions;
mod test_subtree;
