//! Engine-neutral query algebra.
//!
//! The translator produces [`IndexQuery`] values; they are lowered to
//! tantivy queries only when executed. This keeps translation testable
//! without an index.

use crate::core::error::{NodexError, Result};
use crate::core::storage::schema::field;
use std::collections::BTreeSet;
use std::ops::Bound;
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery, RegexQuery,
    TermQuery, TermSetQuery,
};
use tantivy::schema::{IndexRecordOption, Schema};
use tantivy::Term;

/// Identifier sets smaller than this become a disjunction of term
/// queries; larger sets use a single term-set query
pub const IDENTIFIER_DISJUNCTION_LIMIT: usize = 50;

/// Regex for any single character, line breaks included
pub const ANY_CHAR: &str = "(?s:.)";

/// A term value for text or i64 fields
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TermValue {
    Text(String),
    Int(i64),
}

impl From<&str> for TermValue {
    fn from(value: &str) -> Self {
        TermValue::Text(value.to_string())
    }
}

impl From<String> for TermValue {
    fn from(value: String) -> Self {
        TermValue::Text(value)
    }
}

impl From<i64> for TermValue {
    fn from(value: i64) -> Self {
        TermValue::Int(value)
    }
}

/// Query over one index, independent of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum IndexQuery {
    MatchAll,
    MatchNone,
    Term {
        field: &'static str,
        value: TermValue,
    },
    Range {
        field: &'static str,
        lower: Bound<TermValue>,
        upper: Bound<TermValue>,
    },
    Prefix {
        field: &'static str,
        prefix: String,
    },
    /// `*` matches any run of characters, `?` exactly one
    Wildcard {
        field: &'static str,
        pattern: String,
    },
    /// Anchored regular expression over whole terms
    Regex {
        field: &'static str,
        pattern: String,
    },
    /// Any of a set of exact text terms
    TermSet {
        field: &'static str,
        values: BTreeSet<String>,
    },
    /// Consecutive tokens of an analyzed field
    Phrase {
        field: &'static str,
        terms: Vec<String>,
    },
    And(Vec<IndexQuery>),
    Or(Vec<IndexQuery>),
    Not(Box<IndexQuery>),
}

impl IndexQuery {
    pub fn term(field: &'static str, value: impl Into<TermValue>) -> Self {
        IndexQuery::Term {
            field,
            value: value.into(),
        }
    }

    pub fn range(field: &'static str, lower: Bound<TermValue>, upper: Bound<TermValue>) -> Self {
        IndexQuery::Range {
            field,
            lower,
            upper,
        }
    }

    /// Closed i64 range
    pub fn int_range(field: &'static str, lower: i64, upper: i64) -> Self {
        if lower > upper {
            return IndexQuery::MatchNone;
        }
        Self::range(
            field,
            Bound::Included(TermValue::Int(lower)),
            Bound::Included(TermValue::Int(upper)),
        )
    }

    /// Integer values from `lower` upward, with no upper limit
    pub fn int_at_least(field: &'static str, lower: i64) -> Self {
        Self::range(field, Bound::Included(TermValue::Int(lower)), Bound::Unbounded)
    }

    pub fn prefix(field: &'static str, prefix: impl Into<String>) -> Self {
        IndexQuery::Prefix {
            field,
            prefix: prefix.into(),
        }
    }

    /// Conjunction; drops `MatchAll` members and collapses trivial cases
    pub fn and(queries: Vec<IndexQuery>) -> Self {
        let mut members = Vec::with_capacity(queries.len());
        for query in queries {
            match query {
                IndexQuery::MatchAll => {}
                IndexQuery::MatchNone => return IndexQuery::MatchNone,
                IndexQuery::And(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        match members.len() {
            0 => IndexQuery::MatchAll,
            1 => members.remove(0),
            _ => IndexQuery::And(members),
        }
    }

    /// Disjunction; drops `MatchNone` members and collapses trivial cases
    pub fn or(queries: Vec<IndexQuery>) -> Self {
        let mut members = Vec::with_capacity(queries.len());
        for query in queries {
            match query {
                IndexQuery::MatchNone => {}
                IndexQuery::MatchAll => return IndexQuery::MatchAll,
                IndexQuery::Or(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        match members.len() {
            0 => IndexQuery::MatchNone,
            1 => members.remove(0),
            _ => IndexQuery::Or(members),
        }
    }

    pub fn negate(query: IndexQuery) -> Self {
        match query {
            IndexQuery::MatchAll => IndexQuery::MatchNone,
            IndexQuery::MatchNone => IndexQuery::MatchAll,
            IndexQuery::Not(inner) => *inner,
            other => IndexQuery::Not(Box::new(other)),
        }
    }

    /// Evaluate against one document's term values, without an index
    ///
    /// `values` returns the indexed terms of a field. Phrases never match
    /// since analyzed text is not available here.
    pub fn matches(&self, values: &dyn Fn(&str) -> Vec<TermValue>) -> bool {
        match self {
            IndexQuery::MatchAll => true,
            IndexQuery::MatchNone | IndexQuery::Phrase { .. } => false,
            IndexQuery::Term { field, value } => values(field).contains(value),
            IndexQuery::Range {
                field,
                lower,
                upper,
            } => values(field).iter().any(|v| within(v, lower, upper)),
            IndexQuery::Prefix { field, prefix } => {
                texts(values(field)).any(|text| text.starts_with(prefix.as_str()))
            }
            IndexQuery::Wildcard { field, pattern } => {
                regex_matches(&wildcard_to_regex(pattern), values(field))
            }
            IndexQuery::Regex { field, pattern } => regex_matches(pattern, values(field)),
            IndexQuery::TermSet {
                field,
                values: set,
            } => texts(values(field)).any(|text| set.contains(&text)),
            IndexQuery::And(members) => members.iter().all(|q| q.matches(values)),
            IndexQuery::Or(members) => members.iter().any(|q| q.matches(values)),
            IndexQuery::Not(inner) => !inner.matches(values),
        }
    }

    /// Lower to a tantivy query against `schema`
    pub fn to_tantivy(&self, schema: &Schema) -> Result<Box<dyn Query>> {
        let query: Box<dyn Query> = match self {
            IndexQuery::MatchAll => Box::new(AllQuery),
            IndexQuery::MatchNone => Box::new(EmptyQuery),
            IndexQuery::Term { field: name, value } => {
                let term = make_term(schema, name, value)?;
                Box::new(TermQuery::new(term, IndexRecordOption::Basic))
            }
            IndexQuery::Range {
                field: name,
                lower,
                upper,
            } => range_query(name, lower, upper)?,
            IndexQuery::Prefix { field: name, prefix } => {
                let pattern = format!("{}{ANY_CHAR}*", regex::escape(prefix));
                regex_query(schema, name, &pattern)?
            }
            IndexQuery::Wildcard {
                field: name,
                pattern,
            } => regex_query(schema, name, &wildcard_to_regex(pattern))?,
            IndexQuery::Regex {
                field: name,
                pattern,
            } => regex_query(schema, name, pattern)?,
            IndexQuery::TermSet {
                field: name,
                values,
            } => {
                let f = field(schema, name)?;
                let terms = values.iter().map(|v| Term::from_field_text(f, v));
                Box::new(TermSetQuery::new(terms))
            }
            IndexQuery::Phrase { field: name, terms } => {
                let f = field(schema, name)?;
                let mut terms: Vec<Term> = terms.iter().map(|t| Term::from_field_text(f, t)).collect();
                match terms.len() {
                    0 => Box::new(EmptyQuery),
                    1 => Box::new(TermQuery::new(
                        terms.remove(0),
                        IndexRecordOption::WithFreqs,
                    )),
                    _ => Box::new(PhraseQuery::new(terms)),
                }
            }
            IndexQuery::And(members) => {
                let clauses = members
                    .iter()
                    .map(|q| Ok((Occur::Must, q.to_tantivy(schema)?)))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(BooleanQuery::new(clauses))
            }
            IndexQuery::Or(members) => {
                let clauses = members
                    .iter()
                    .map(|q| Ok((Occur::Should, q.to_tantivy(schema)?)))
                    .collect::<Result<Vec<_>>>()?;
                Box::new(BooleanQuery::new(clauses))
            }
            IndexQuery::Not(inner) => Box::new(BooleanQuery::new(vec![
                (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
                (Occur::MustNot, inner.to_tantivy(schema)?),
            ])),
        };
        Ok(query)
    }
}

/// Content query matching exactly the documents whose identifier is in `ids`
pub fn identifier_query(field: &'static str, ids: &BTreeSet<String>) -> IndexQuery {
    match ids.len() {
        0 => IndexQuery::MatchNone,
        1 => ids
            .iter()
            .next()
            .map(|id| IndexQuery::term(field, id.as_str()))
            .unwrap_or(IndexQuery::MatchNone),
        n if n < IDENTIFIER_DISJUNCTION_LIMIT => IndexQuery::Or(
            ids.iter()
                .map(|id| IndexQuery::term(field, id.as_str()))
                .collect(),
        ),
        _ => IndexQuery::TermSet {
            field,
            values: ids.clone(),
        },
    }
}

/// Translate a `*`/`?` wildcard into an anchored regex
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            '*' => {
                out.push_str(ANY_CHAR);
                out.push('*');
            }
            '?' => out.push_str(ANY_CHAR),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out
}

fn texts(values: Vec<TermValue>) -> impl Iterator<Item = String> {
    values.into_iter().filter_map(|v| match v {
        TermValue::Text(text) => Some(text),
        TermValue::Int(_) => None,
    })
}

fn regex_matches(pattern: &str, values: Vec<TermValue>) -> bool {
    match regex::Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => texts(values).any(|text| re.is_match(&text)),
        Err(_) => false,
    }
}

fn within(value: &TermValue, lower: &Bound<TermValue>, upper: &Bound<TermValue>) -> bool {
    let same_kind = |bound: &TermValue| {
        std::mem::discriminant(bound) == std::mem::discriminant(value)
    };
    let above = match lower {
        Bound::Included(b) => same_kind(b) && value >= b,
        Bound::Excluded(b) => same_kind(b) && value > b,
        Bound::Unbounded => true,
    };
    let below = match upper {
        Bound::Included(b) => same_kind(b) && value <= b,
        Bound::Excluded(b) => same_kind(b) && value < b,
        Bound::Unbounded => true,
    };
    above && below
}

fn make_term(schema: &Schema, name: &str, value: &TermValue) -> Result<Term> {
    let f = field(schema, name)?;
    Ok(match value {
        TermValue::Text(text) => Term::from_field_text(f, text),
        TermValue::Int(v) => Term::from_field_i64(f, *v),
    })
}

fn regex_query(schema: &Schema, name: &str, pattern: &str) -> Result<Box<dyn Query>> {
    let f = field(schema, name)?;
    let query = RegexQuery::from_pattern(pattern, f)
        .map_err(|e| NodexError::index(format!("regex '{pattern}' on '{name}'"), e))?;
    Ok(Box::new(query))
}

fn range_query(name: &str, lower: &Bound<TermValue>, upper: &Bound<TermValue>) -> Result<Box<dyn Query>> {
    let is_int = |b: &Bound<TermValue>| matches!(b, Bound::Included(TermValue::Int(_)) | Bound::Excluded(TermValue::Int(_)));
    let is_text = |b: &Bound<TermValue>| matches!(b, Bound::Included(TermValue::Text(_)) | Bound::Excluded(TermValue::Text(_)));

    if is_int(lower) || is_int(upper) {
        if is_text(lower) || is_text(upper) {
            return Err(NodexError::UnsupportedConstraint(format!(
                "range on '{name}' mixes numeric and text bounds"
            )));
        }
        let int = |b: &Bound<TermValue>| match b {
            Bound::Included(TermValue::Int(v)) => Bound::Included(*v),
            Bound::Excluded(TermValue::Int(v)) => Bound::Excluded(*v),
            _ => Bound::Unbounded,
        };
        return Ok(Box::new(RangeQuery::new_i64_bounds(
            name.to_string(),
            int(lower),
            int(upper),
        )));
    }

    let text = |b: &Bound<TermValue>| -> Bound<String> {
        match b {
            Bound::Included(TermValue::Text(v)) => Bound::Included(v.clone()),
            Bound::Excluded(TermValue::Text(v)) => Bound::Excluded(v.clone()),
            _ => Bound::Unbounded,
        }
    };
    let (lower, upper) = (text(lower), text(upper));
    Ok(Box::new(RangeQuery::new_str_bounds(
        name.to_string(),
        as_str_bound(&lower),
        as_str_bound(&upper),
    )))
}

fn as_str_bound(bound: &Bound<String>) -> Bound<&str> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_str()),
        Bound::Excluded(v) => Bound::Excluded(v.as_str()),
        Bound::Unbounded => Bound::Unbounded,
    }
}
