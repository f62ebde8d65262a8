//! Node graph model consumed by the indexer.
//!
//! - **path**: paths and segments with same-name-sibling indexes
//! - **value**: typed property values
//! - **node**: properties, locations and nodes

pub mod node;
pub mod path;
pub mod value;

pub use node::{Location, Node, Property};
pub use path::{Path, Segment};
pub use value::{format_date, parse_date, PropertyType, Value};
