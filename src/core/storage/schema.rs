//! Tantivy schemas for the paths and content indexes.
//!
//! Both schemas are fixed. Property names never become tantivy fields;
//! they are folded into term space instead (see [`super::encoding`]).

use crate::core::error::{NodexError, Result};
use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};

/// Paths index field names
pub mod paths {
    pub const PATH: &str = "path";
    pub const NAME: &str = "name";
    pub const LOCAL_NAME: &str = "local_name";
    pub const SNS: &str = "sns";
    pub const SNS_TEXT: &str = "sns_text";
    pub const ID: &str = "id";
    pub const DEPTH: &str = "depth";
    pub const IDENTIFICATION: &str = "idp";
}

/// Content index field names
pub mod content {
    pub const ID: &str = "id";
    pub const FULL_TEXT: &str = "fts";
    pub const PROPERTIES: &str = "props";
    pub const PROPERTY_FULL_TEXT: &str = "props_ft";
    pub const STORED_VALUES: &str = "props_stored";
}

/// Which of the two per-workspace indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Paths,
    Content,
}

impl IndexKind {
    /// Directory name of this index inside a workspace
    pub fn dir_name(self) -> &'static str {
        match self {
            IndexKind::Paths => "paths",
            IndexKind::Content => "content",
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            IndexKind::Paths => create_paths_schema(),
            IndexKind::Content => create_content_schema(),
        }
    }
}

/// Create the paths (identity) schema
///
/// Fields:
/// - path: canonical path with SNS suffixes (STRING | STORED)
/// - name / local_name: qualified and local node name (STRING | STORED)
/// - sns: same-name-sibling index (i64 INDEXED | STORED | FAST)
/// - sns_text: SNS index as text for pattern matching (STRING)
/// - id: node identifier (STRING | STORED)
/// - depth: segment count, root = 0 (i64 INDEXED | STORED | FAST)
/// - idp: serialized identifying properties (STORED, multi-valued)
pub fn create_paths_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(paths::PATH, STRING | STORED);
    builder.add_text_field(paths::NAME, STRING | STORED);
    builder.add_text_field(paths::LOCAL_NAME, STRING | STORED);
    builder.add_i64_field(paths::SNS, INDEXED | STORED | FAST);
    builder.add_text_field(paths::SNS_TEXT, STRING);
    builder.add_text_field(paths::ID, STRING | STORED);
    builder.add_i64_field(paths::DEPTH, INDEXED | STORED | FAST);
    builder.add_text_field(paths::IDENTIFICATION, STORED);

    builder.build()
}

/// Create the content (property) schema
///
/// Fields:
/// - id: node identifier, join key to the paths index (STRING | STORED)
/// - fts: aggregate full text of all full-text properties (TEXT)
/// - props: exact property terms (STRING)
/// - props_ft: per-property analyzed tokens, pre-tokenized (TEXT)
/// - props_stored: stored property values (STORED)
pub fn create_content_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(content::ID, STRING | STORED);
    builder.add_text_field(content::FULL_TEXT, TEXT);
    builder.add_text_field(content::PROPERTIES, STRING);
    builder.add_text_field(content::PROPERTY_FULL_TEXT, TEXT);
    builder.add_text_field(content::STORED_VALUES, STORED);

    builder.build()
}

/// Analyzer used for full text, identical to tantivy's `default` tokenizer
pub fn default_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .build()
}

pub(crate) fn field(schema: &Schema, name: &str) -> Result<Field> {
    schema
        .get_field(name)
        .map_err(|e| NodexError::index(format!("missing field '{name}'"), e))
}

/// Resolved paths-index fields
#[derive(Debug, Clone, Copy)]
pub struct PathsFields {
    pub path: Field,
    pub name: Field,
    pub local_name: Field,
    pub sns: Field,
    pub sns_text: Field,
    pub id: Field,
    pub depth: Field,
    pub identification: Field,
}

impl PathsFields {
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        Ok(Self {
            path: field(schema, paths::PATH)?,
            name: field(schema, paths::NAME)?,
            local_name: field(schema, paths::LOCAL_NAME)?,
            sns: field(schema, paths::SNS)?,
            sns_text: field(schema, paths::SNS_TEXT)?,
            id: field(schema, paths::ID)?,
            depth: field(schema, paths::DEPTH)?,
            identification: field(schema, paths::IDENTIFICATION)?,
        })
    }
}

/// Resolved content-index fields
#[derive(Debug, Clone, Copy)]
pub struct ContentFields {
    pub id: Field,
    pub full_text: Field,
    pub properties: Field,
    pub property_full_text: Field,
    pub stored_values: Field,
}

impl ContentFields {
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        Ok(Self {
            id: field(schema, content::ID)?,
            full_text: field(schema, content::FULL_TEXT)?,
            properties: field(schema, content::PROPERTIES)?,
            property_full_text: field(schema, content::PROPERTY_FULL_TEXT)?,
            stored_values: field(schema, content::STORED_VALUES)?,
        })
    }
}
