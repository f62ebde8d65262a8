//! Hierarchical node paths.
//!
//! A path is an ordered list of segments; every segment carries a
//! same-name-sibling (SNS) index starting at 1. The root is the empty
//! path and renders as `/`. Rendering for storage always includes the
//! SNS suffix (`/a[1]/b[2]`) so path strings are unique per node and
//! sort consistently.

use crate::core::error::{NodexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path separator
pub const SEPARATOR: char = '/';

/// One named path segment with its same-name-sibling index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    name: String,
    index: u32,
}

impl Segment {
    /// Create a segment; an index of 0 is normalized to 1
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index: index.max(1),
        }
    }

    /// Qualified name (e.g. `jcr:content`), without the SNS suffix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Part of the name after the namespace prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Parse `name` or `name[n]`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NodexError::InvalidPath("empty path segment".to_string()));
        }
        let (name, index) = match text.find('[') {
            Some(open) => {
                let close = text
                    .strip_suffix(']')
                    .ok_or_else(|| NodexError::InvalidPath(format!("unterminated SNS index in '{text}'")))?;
                let digits = &close[open + 1..];
                let index = digits.parse::<u32>().map_err(|_| {
                    NodexError::InvalidPath(format!("invalid SNS index '{digits}' in '{text}'"))
                })?;
                if index == 0 {
                    return Err(NodexError::InvalidPath(format!(
                        "SNS index must start at 1 in '{text}'"
                    )));
                }
                (&text[..open], index)
            }
            None => (text, 1),
        };
        if name.is_empty() || name.contains(SEPARATOR) || name.contains(']') {
            return Err(NodexError::InvalidPath(format!("invalid segment name '{name}'")));
        }
        Ok(Self::new(name, index))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.index)
    }
}

/// Absolute path of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse an absolute path; segments without `[n]` get index 1
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let rest = text
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| NodexError::InvalidPath(format!("path must be absolute: '{text}'")))?;
        let rest = rest.strip_suffix(SEPARATOR).unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Self::root());
        }
        let segments = rest
            .split(SEPARATOR)
            .map(Segment::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments (root = 0)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, name: impl Into<String>, index: u32) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(name, index));
        Self { segments }
    }

    /// True when `self` equals `ancestor` or lies below it
    pub fn is_at_or_below(&self, ancestor: &Path) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
        self.depth() > ancestor.depth() && self.is_at_or_below(ancestor)
    }

    /// Re-root `self` from under `from` to under `to`
    pub fn relocate(&self, from: &Path, to: &Path) -> Option<Path> {
        if !self.is_at_or_below(from) {
            return None;
        }
        let mut segments = to.segments.clone();
        segments.extend_from_slice(&self.segments[from.depth()..]);
        Some(Self { segments })
    }

    /// Canonical storage form with explicit SNS suffixes
    pub fn to_index_string(&self) -> String {
        if self.is_root() {
            return SEPARATOR.to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            out.push(SEPARATOR);
            out.push_str(&segment.to_string());
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_index_string())
    }
}

impl FromStr for Path {
    type Err = NodexError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_index_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Path::parse(&text).map_err(serde::de::Error::custom)
    }
}
