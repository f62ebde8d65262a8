//! Nodes, properties and locations.

use crate::core::graph::path::Path;
use crate::core::graph::value::Value;
use serde::{Deserialize, Serialize};

/// A named, possibly multi-valued property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Property {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn single(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, vec![value.into()])
    }

    pub fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }
}

/// Caller-facing identity of a node
///
/// `id` is the primary identifier. `identification` carries extra
/// identifying properties supplied by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub path: Path,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identification: Vec<Property>,
}

impl Location {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            id: None,
            identification: Vec::new(),
        }
    }

    pub fn with_id(path: Path, id: impl Into<String>) -> Self {
        Self {
            path,
            id: Some(id.into()),
            identification: Vec::new(),
        }
    }
}

/// A node read from a content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub location: Location,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Node {
    pub fn new(location: Location, properties: Vec<Property>) -> Self {
        Self {
            location,
            properties,
        }
    }

    pub fn path(&self) -> &Path {
        &self.location.path
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Replace or add a property
    pub fn set_property(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn remove_property(&mut self, name: &str) {
        self.properties.retain(|p| p.name != name);
    }
}
