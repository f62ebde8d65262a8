//! Search layer tests
//!
//! Query translation and execution against committed indexes.

mod test_access;
mod test_search;
