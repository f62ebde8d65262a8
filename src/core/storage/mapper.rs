//! Node to document mapping.
//!
//! A node becomes two documents: an identity document for the paths
//! index and a property document for the content index. Both carry the
//! node identifier, which is the only link between them.

use crate::core::error::{NodexError, Result};
use crate::core::graph::{format_date, Location, Node, Path, Property, Value};
use crate::core::rules::IndexRules;
use crate::core::storage::encoding::{self, ValueTag};
use crate::core::storage::schema::{default_analyzer, ContentFields, PathsFields};
use std::sync::Arc;
use tantivy::schema::Value as _;
use tantivy::tokenizer::{PreTokenizedString, TextAnalyzer, Token, TokenStream};
use tantivy::TantivyDocument;
use tracing::{trace, warn};

/// Both documents for one node
#[derive(Debug)]
pub struct MappedNode {
    pub id: String,
    pub path_doc: TantivyDocument,
    pub content_doc: TantivyDocument,
}

/// Converts nodes into index documents and back
#[derive(Clone)]
pub struct DocumentMapper {
    rules: Arc<IndexRules>,
    paths: PathsFields,
    content: ContentFields,
    analyzer: TextAnalyzer,
}

impl DocumentMapper {
    pub fn new(rules: Arc<IndexRules>, paths: PathsFields, content: ContentFields) -> Self {
        Self {
            rules,
            paths,
            content,
            analyzer: default_analyzer(),
        }
    }

    pub fn rules(&self) -> &IndexRules {
        &self.rules
    }

    /// Identifier of a location, if the source supplied one
    ///
    /// A single UUID identifying property counts as the identifier.
    pub fn existing_id(location: &Location) -> Option<String> {
        location
            .id
            .clone()
            .or_else(|| single_uuid(&location.identification))
    }

    /// Identifier for a node, synthesized when the source has none
    ///
    /// A synthesized identifier is not stable across re-indexing unless
    /// the source persists it.
    pub fn resolve_id(location: &Location) -> String {
        Self::existing_id(location).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// Map a node using a known identifier
    pub fn index_node_with_id(&mut self, node: &Node, id: String) -> Result<MappedNode> {
        let path_doc = self.path_document(&id, &node.location)?;
        let content_doc = self.content_document(&id, &node.properties);
        trace!("Mapped node {} as {}", node.path(), id);
        Ok(MappedNode {
            id,
            path_doc,
            content_doc,
        })
    }

    /// Identity document for a location
    pub fn path_document(&self, id: &str, location: &Location) -> Result<TantivyDocument> {
        let path = &location.path;
        let (name, local_name, sns) = match path.last_segment() {
            Some(segment) => (segment.name(), segment.local_name(), segment.index()),
            None => ("", "", 1),
        };

        let mut doc = TantivyDocument::default();
        doc.add_text(self.paths.path, path.to_index_string());
        doc.add_text(self.paths.name, name);
        doc.add_text(self.paths.local_name, local_name);
        doc.add_i64(self.paths.sns, i64::from(sns));
        doc.add_text(self.paths.sns_text, sns.to_string());
        doc.add_text(self.paths.id, id);
        doc.add_i64(self.paths.depth, path.depth() as i64);
        for property in &location.identification {
            doc.add_text(self.paths.identification, serde_json::to_string(property)?);
        }
        Ok(doc)
    }

    /// Property document for a node's properties
    pub fn content_document(&mut self, id: &str, properties: &[Property]) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.content.id, id);

        let mut full_text: Vec<String> = Vec::new();
        for property in properties {
            let rule = self.rules.rule_for(&property.name);
            if rule.is_skipped() {
                continue;
            }
            let (indexed, stored) = (rule.is_indexed(), rule.is_stored());
            let (analyzed, full_text_rule) = (rule.is_analyzed(), rule.is_full_text());
            let as_date = rule.is_treated_as_date();
            let name = property.name.as_str();

            for value in &property.values {
                if indexed {
                    doc.add_text(
                        self.content.properties,
                        encoding::i64_term(name, ValueTag::Length, value.length()),
                    );
                }

                if as_date || matches!(value, Value::Date(_)) {
                    match value.as_date_millis() {
                        Ok(millis) => {
                            if indexed {
                                doc.add_text(
                                    self.content.properties,
                                    encoding::i64_term(name, ValueTag::Date, millis),
                                );
                            }
                            if stored {
                                let text = match value {
                                    Value::Date(date) => format_date(date),
                                    other => other.as_text(),
                                };
                                doc.add_text(
                                    self.content.stored_values,
                                    encoding::stored_entry(name, &text),
                                );
                            }
                        }
                        Err(e) => warn!("Skipping date property '{}' on {}: {}", name, id, e),
                    }
                    continue;
                }

                // Binary content has no text extraction
                if matches!(value, Value::Binary(_)) {
                    continue;
                }

                let text = value.as_text();
                if indexed {
                    doc.add_text(self.content.properties, typed_term(name, value, &text));
                }
                if stored {
                    doc.add_text(
                        self.content.stored_values,
                        encoding::stored_entry(name, &text),
                    );
                }
                if analyzed || full_text_rule {
                    let tokens = self.property_tokens(name, &text);
                    if !tokens.is_empty() {
                        doc.add_pre_tokenized_text(
                            self.content.property_full_text,
                            PreTokenizedString {
                                text: text.clone(),
                                tokens,
                            },
                        );
                    }
                }
                if full_text_rule {
                    full_text.push(text);
                }
            }
        }

        if !full_text.is_empty() {
            doc.add_text(self.content.full_text, full_text.join(" "));
        }
        doc
    }

    /// Analyze `text` and prefix every token with the property name
    fn property_tokens(&mut self, name: &str, text: &str) -> Vec<Token> {
        let mut stream = self.analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            let mut token = stream.token().clone();
            token.text = encoding::token_term(name, &token.text);
            tokens.push(token);
        }
        tokens
    }

    /// Analyze free text into plain tokens
    pub fn analyze(&mut self, text: &str) -> Vec<String> {
        let mut stream = self.analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        tokens
    }

    /// Identifier stored in a paths document
    pub fn read_path_id(&self, doc: &TantivyDocument) -> Option<String> {
        doc.get_first(self.paths.id)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Identifier stored in a content document
    pub fn read_content_id(&self, doc: &TantivyDocument) -> Option<String> {
        doc.get_first(self.content.id)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Rebuild the location recorded in a paths document
    pub fn read_location(&self, doc: &TantivyDocument) -> Result<Location> {
        let path_text = doc
            .get_first(self.paths.path)
            .and_then(|v| v.as_str())
            .ok_or_else(|| NodexError::InvalidPath("paths document without a path".to_string()))?;
        let path = Path::parse(path_text)?;

        let identification = doc
            .get_all(self.paths.identification)
            .filter_map(|v| v.as_str())
            .map(serde_json::from_str::<Property>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut location = Location {
            path,
            id: self.read_path_id(doc),
            identification,
        };

        // A lone UUID identifying property is the primary identifier
        if let Some(uuid) = single_uuid(&location.identification) {
            location.id = Some(uuid);
            location.identification.clear();
        }
        Ok(location)
    }

    /// Stored values of a content document, in stored order
    pub fn read_stored_values(&self, doc: &TantivyDocument) -> Vec<(String, String)> {
        doc.get_all(self.content.stored_values)
            .filter_map(|v| v.as_str())
            .filter_map(encoding::split_entry)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

fn single_uuid(identification: &[Property]) -> Option<String> {
    match identification {
        [property] => match property.values.as_slice() {
            [Value::Uuid(uuid)] => Some(uuid.to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Exact term for a non-date, non-binary value
fn typed_term(name: &str, value: &Value, text: &str) -> String {
    match value {
        Value::Long(v) => encoding::i64_term(name, ValueTag::Long, *v),
        Value::Double(v) => encoding::f64_term(name, *v),
        Value::Decimal(s) => match s.trim().parse::<f64>() {
            Ok(v) => encoding::f64_term(name, v),
            Err(_) => encoding::string_term(name, text),
        },
        Value::Boolean(v) => encoding::boolean_term(name, *v),
        _ => encoding::string_term(name, text),
    }
}
