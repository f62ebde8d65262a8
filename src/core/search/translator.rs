//! Constraint to index query translation.
//!
//! Property predicates translate directly into content-index queries.
//! Predicates over the node's identity (path, name, local name, depth
//! and the path-relationship constraints) are answered by the paths
//! index in two phases:
//!
//! 1. run the paths query and collect the matching identifiers;
//! 2. turn the identifier set into a content query on the `id` field
//!    (see [`identifier_query`]).
//!
//! Comparisons on the full-text score cannot be expressed as an index
//! query. They are accepted only as top-level conjuncts and come back as
//! [`ScoreFilter`]s for the caller to apply to collected hits.

use crate::core::error::{NodexError, Result};
use crate::core::graph::{Path, Segment, Value};
use crate::core::rules::IndexRules;
use crate::core::search::constraint::{
    parse_full_text, Constraint, DynamicOperand, FullTextTerm, Operator,
};
use crate::core::search::index_query::{identifier_query, IndexQuery, TermValue};
use crate::core::search::like::{like_query, path_like_query, sns_like_query};
use crate::core::storage::encoding::{self, ValueTag, MAX_TEXT};
use crate::core::storage::schema::{content, paths};
use crate::core::storage::subtree::{children_of, descendants_of, node_at};
use std::collections::BTreeSet;
use std::ops::Bound;
use tracing::debug;

/// Paths-index access needed by the translator
pub trait PathsLookup {
    /// Identifiers of the nodes whose paths document matches `query`
    fn ids_matching(&mut self, query: &IndexQuery) -> Result<BTreeSet<String>>;

    /// Tokens of `text` under the index analyzer
    fn analyze(&mut self, text: &str) -> Vec<String>;
}

impl PathsLookup for crate::core::storage::IndexSession {
    fn ids_matching(&mut self, query: &IndexQuery) -> Result<BTreeSet<String>> {
        self.ids_matching_paths(query)
    }

    fn analyze(&mut self, text: &str) -> Vec<String> {
        crate::core::storage::IndexSession::analyze(self, text)
    }
}

/// Post-filter on the full-text score of a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFilter {
    pub operator: Operator,
    pub value: f32,
}

impl ScoreFilter {
    pub fn accepts(&self, score: f32) -> bool {
        self.operator.compare(score, self.value)
    }
}

/// A translated constraint: the content query plus score post-filters
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedConstraint {
    pub query: IndexQuery,
    pub score_filters: Vec<ScoreFilter>,
}

/// Translates constraints into content-index queries
pub struct QueryTranslator<'a, L: PathsLookup + ?Sized> {
    lookup: &'a mut L,
    rules: &'a IndexRules,
}

impl<'a, L: PathsLookup + ?Sized> QueryTranslator<'a, L> {
    pub fn new(lookup: &'a mut L, rules: &'a IndexRules) -> Self {
        Self { lookup, rules }
    }

    /// Translate the residual constraint of an access node
    ///
    /// No constraint matches everything.
    pub fn translate_top(&mut self, constraint: Option<&Constraint>) -> Result<TranslatedConstraint> {
        let mut score_filters = Vec::new();
        let query = match constraint {
            None => IndexQuery::MatchAll,
            Some(Constraint::And { constraints }) => {
                let mut members = Vec::with_capacity(constraints.len());
                for member in constraints {
                    match score_filter(member)? {
                        Some(filter) => score_filters.push(filter),
                        None => members.push(self.translate(member)?),
                    }
                }
                IndexQuery::and(members)
            }
            Some(other) => match score_filter(other)? {
                Some(filter) => {
                    score_filters.push(filter);
                    IndexQuery::MatchAll
                }
                None => self.translate(other)?,
            },
        };
        debug!("Translated constraint to {:?} with {} score filters", query, score_filters.len());
        Ok(TranslatedConstraint {
            query,
            score_filters,
        })
    }

    /// Translate one constraint into a content-index query
    pub fn translate(&mut self, constraint: &Constraint) -> Result<IndexQuery> {
        match constraint {
            Constraint::And { constraints } => Ok(IndexQuery::and(
                constraints
                    .iter()
                    .map(|c| self.translate(c))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Constraint::Or { constraints } => Ok(IndexQuery::or(
                constraints
                    .iter()
                    .map(|c| self.translate(c))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Constraint::Not { constraint } => Ok(IndexQuery::negate(self.translate(constraint)?)),
            Constraint::Comparison {
                operand,
                operator,
                value,
            } => self.comparison(operand, *operator, value, false),
            Constraint::Between {
                operand,
                lower,
                upper,
                include_lower,
                include_upper,
            } => self.between(operand, lower, upper, *include_lower, *include_upper),
            Constraint::SetCriteria { operand, values } => {
                let alternatives = values
                    .iter()
                    .map(|value| self.comparison(operand, Operator::EqualTo, value, false))
                    .collect::<Result<Vec<_>>>()?;
                Ok(IndexQuery::or(alternatives))
            }
            Constraint::PropertyExistence { property } => {
                if self.rules.rule_for(property).is_skipped() {
                    return Ok(IndexQuery::MatchNone);
                }
                Ok(IndexQuery::prefix(
                    content::PROPERTIES,
                    encoding::property_prefix(property),
                ))
            }
            Constraint::FullTextSearch {
                property,
                expression,
            } => {
                let parsed = parse_full_text(expression)?;
                Ok(self
                    .full_text(property.as_deref(), &parsed)
                    .unwrap_or(IndexQuery::MatchNone))
            }
            Constraint::SameNode { path } => self.resolve_ids(node_at(path)),
            Constraint::ChildNode { parent } => self.resolve_ids(children_of(parent)),
            Constraint::DescendantNode { ancestor } => {
                self.resolve_ids(descendants_of(ancestor, false))
            }
        }
    }

    fn comparison(
        &mut self,
        operand: &DynamicOperand,
        operator: Operator,
        value: &Value,
        case_insensitive: bool,
    ) -> Result<IndexQuery> {
        match operand {
            DynamicOperand::PropertyValue { property } => {
                self.property_comparison(property, operator, value, case_insensitive)
            }
            DynamicOperand::Length { property } => {
                if case_insensitive {
                    return Err(unsupported("case folding of a property length"));
                }
                self.length_comparison(property, operator, value)
            }
            DynamicOperand::LowerCase { operand } | DynamicOperand::UpperCase { operand } => {
                self.comparison(operand, operator, value, true)
            }
            DynamicOperand::NodeDepth => {
                if case_insensitive {
                    return Err(unsupported("case folding of a node depth"));
                }
                self.paths_comparison(operand, operator, value, false)
            }
            DynamicOperand::NodePath | DynamicOperand::NodeName | DynamicOperand::NodeLocalName => {
                self.paths_comparison(operand, operator, value, case_insensitive)
            }
            DynamicOperand::FullTextSearchScore => Err(unsupported(
                "full-text score comparisons are only allowed as top-level conjuncts",
            )),
        }
    }

    /// Two-phase comparison on a paths-index field
    ///
    /// Inequality negates the equality result on the content index.
    fn paths_comparison(
        &mut self,
        operand: &DynamicOperand,
        operator: Operator,
        value: &Value,
        case_insensitive: bool,
    ) -> Result<IndexQuery> {
        if operator == Operator::NotEqualTo {
            let equal = self.paths_comparison(operand, Operator::EqualTo, value, case_insensitive)?;
            return Ok(IndexQuery::negate(equal));
        }
        let text = || {
            let text = value.as_text();
            if case_insensitive {
                text.to_lowercase()
            } else {
                text
            }
        };
        let query = match operand {
            DynamicOperand::NodePath => node_path_query(operator, &text())?,
            DynamicOperand::NodeName => node_name_query(operator, &text())?,
            DynamicOperand::NodeLocalName => text_comparison(paths::LOCAL_NAME, operator, &text()),
            DynamicOperand::NodeDepth => node_depth_query(operator, value.as_i64()?)?,
            other => return Err(unsupported(&format!("{other:?} is not a paths field"))),
        };
        self.resolve_ids(query)
    }

    /// Phase two: identifiers of a paths query as a content query
    fn resolve_ids(&mut self, paths_query: IndexQuery) -> Result<IndexQuery> {
        match paths_query {
            IndexQuery::MatchAll => Ok(IndexQuery::MatchAll),
            IndexQuery::MatchNone => Ok(IndexQuery::MatchNone),
            query => {
                let ids = self.lookup.ids_matching(&query)?;
                debug!("Resolved {} identifiers for {:?}", ids.len(), query);
                Ok(identifier_query(content::ID, &ids))
            }
        }
    }

    fn property_comparison(
        &mut self,
        name: &str,
        operator: Operator,
        value: &Value,
        case_insensitive: bool,
    ) -> Result<IndexQuery> {
        let rule = self.rules.rule_for(name);
        if rule.is_skipped() {
            return Ok(IndexQuery::MatchNone);
        }
        let (tag, term) = encode_value(name, value, rule.is_treated_as_date(), case_insensitive)?;

        match (tag, operator) {
            (ValueTag::String, Operator::Like) => {
                let pattern = if case_insensitive {
                    value.as_text().to_lowercase()
                } else {
                    value.as_text()
                };
                Ok(like_query(
                    content::PROPERTIES,
                    &encoding::tagged_prefix(name, ValueTag::String),
                    &pattern,
                ))
            }
            (_, Operator::Like) => Err(unsupported(&format!(
                "LIKE on the {tag:?} property '{name}'"
            ))),
            (ValueTag::Boolean, _) => Ok(boolean_comparison(name, operator, value.as_bool()?)),
            _ => Ok(ordered_comparison(name, tag, term, operator)),
        }
    }

    fn length_comparison(&mut self, name: &str, operator: Operator, value: &Value) -> Result<IndexQuery> {
        if operator == Operator::Like {
            return Err(unsupported(&format!("LIKE on the length of '{name}'")));
        }
        if self.rules.rule_for(name).is_skipped() {
            return Ok(IndexQuery::MatchNone);
        }
        let term = encoding::i64_term(name, ValueTag::Length, value.as_i64()?);
        Ok(ordered_comparison(name, ValueTag::Length, term, operator))
    }

    fn between(
        &mut self,
        operand: &DynamicOperand,
        lower: &Value,
        upper: &Value,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<IndexQuery> {
        let bound = |term: String, inclusive: bool| {
            if inclusive {
                Bound::Included(TermValue::Text(term))
            } else {
                Bound::Excluded(TermValue::Text(term))
            }
        };
        match operand {
            DynamicOperand::NodeDepth => {
                let low = lower.as_i64()?.checked_add(i64::from(!include_lower));
                let high = upper.as_i64()?.checked_sub(i64::from(!include_upper));
                match (low, high) {
                    (Some(low), Some(high)) => {
                        self.resolve_ids(IndexQuery::int_range(paths::DEPTH, low.max(0), high))
                    }
                    _ => Ok(IndexQuery::MatchNone),
                }
            }
            DynamicOperand::PropertyValue { property } => {
                let rule = self.rules.rule_for(property);
                if rule.is_skipped() {
                    return Ok(IndexQuery::MatchNone);
                }
                let as_date = rule.is_treated_as_date();
                let (lower_tag, lower_term) = encode_value(property, lower, as_date, false)?;
                let (upper_tag, upper_term) = encode_value(property, upper, as_date, false)?;
                if lower_tag != upper_tag {
                    return Err(unsupported(&format!(
                        "range on '{property}' mixes {lower_tag:?} and {upper_tag:?} bounds"
                    )));
                }
                match lower_tag {
                    ValueTag::Long | ValueTag::Double | ValueTag::Date => Ok(IndexQuery::range(
                        content::PROPERTIES,
                        bound(lower_term, include_lower),
                        bound(upper_term, include_upper),
                    )),
                    _ => self.between_as_comparisons(operand, lower, upper, include_lower, include_upper),
                }
            }
            DynamicOperand::Length { property } => {
                if self.rules.rule_for(property).is_skipped() {
                    return Ok(IndexQuery::MatchNone);
                }
                Ok(IndexQuery::range(
                    content::PROPERTIES,
                    bound(
                        encoding::i64_term(property, ValueTag::Length, lower.as_i64()?),
                        include_lower,
                    ),
                    bound(
                        encoding::i64_term(property, ValueTag::Length, upper.as_i64()?),
                        include_upper,
                    ),
                ))
            }
            _ => self.between_as_comparisons(operand, lower, upper, include_lower, include_upper),
        }
    }

    fn between_as_comparisons(
        &mut self,
        operand: &DynamicOperand,
        lower: &Value,
        upper: &Value,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<IndexQuery> {
        let lower_op = if include_lower {
            Operator::GreaterThanOrEqualTo
        } else {
            Operator::GreaterThan
        };
        let upper_op = if include_upper {
            Operator::LessThanOrEqualTo
        } else {
            Operator::LessThan
        };
        let low = self.comparison(operand, lower_op, lower, false)?;
        let high = self.comparison(operand, upper_op, upper, false)?;
        Ok(IndexQuery::and(vec![low, high]))
    }

    /// Full-text expression over `fts`, or over one property's tokens
    ///
    /// Returns `None` when nothing in the expression survives analysis.
    fn full_text(&mut self, property: Option<&str>, term: &FullTextTerm) -> Option<IndexQuery> {
        match term {
            FullTextTerm::Word(text) | FullTextTerm::Phrase(text) => {
                let tokens = self.lookup.analyze(text);
                let (field, mut terms): (&'static str, Vec<String>) = match property {
                    Some(name) => (
                        content::PROPERTY_FULL_TEXT,
                        tokens.iter().map(|t| encoding::token_term(name, t)).collect(),
                    ),
                    None => (content::FULL_TEXT, tokens),
                };
                match terms.len() {
                    0 => None,
                    1 => Some(IndexQuery::term(field, terms.remove(0))),
                    _ => Some(IndexQuery::Phrase { field, terms }),
                }
            }
            FullTextTerm::Not(inner) => self.full_text(property, inner).map(IndexQuery::negate),
            FullTextTerm::And(members) => {
                let members: Vec<IndexQuery> =
                    members.iter().filter_map(|m| self.full_text(property, m)).collect();
                (!members.is_empty()).then(|| IndexQuery::and(members))
            }
            FullTextTerm::Or(members) => {
                let members: Vec<IndexQuery> =
                    members.iter().filter_map(|m| self.full_text(property, m)).collect();
                (!members.is_empty()).then(|| IndexQuery::or(members))
            }
        }
    }
}

fn unsupported(what: &str) -> NodexError {
    NodexError::UnsupportedConstraint(what.to_string())
}

/// Score comparison at the top level, if `constraint` is one
fn score_filter(constraint: &Constraint) -> Result<Option<ScoreFilter>> {
    match constraint {
        Constraint::Comparison {
            operand: DynamicOperand::FullTextSearchScore,
            operator,
            value,
        } => {
            if *operator == Operator::Like {
                return Err(unsupported("LIKE on a full-text score"));
            }
            Ok(Some(ScoreFilter {
                operator: *operator,
                value: value.as_f64()? as f32,
            }))
        }
        _ => Ok(None),
    }
}

/// Tag and exact `props` term of a query value
///
/// The value's own type decides the encoding; a date rule on the
/// property forces the date encoding.
fn encode_value(
    name: &str,
    value: &Value,
    treat_as_date: bool,
    case_insensitive: bool,
) -> Result<(ValueTag, String)> {
    if treat_as_date || matches!(value, Value::Date(_)) {
        let millis = value.as_date_millis()?;
        return Ok((ValueTag::Date, encoding::i64_term(name, ValueTag::Date, millis)));
    }
    Ok(match value {
        Value::Long(v) => (ValueTag::Long, encoding::i64_term(name, ValueTag::Long, *v)),
        Value::Double(_) | Value::Decimal(_) => {
            (ValueTag::Double, encoding::f64_term(name, value.as_f64()?))
        }
        Value::Boolean(v) => (ValueTag::Boolean, encoding::boolean_term(name, *v)),
        Value::Binary(_) => {
            return Err(unsupported(&format!(
                "comparison of '{name}' against a binary value"
            )))
        }
        other => {
            let text = if case_insensitive {
                other.as_text().to_lowercase()
            } else {
                other.as_text()
            };
            (ValueTag::String, encoding::string_term(name, &text))
        }
    })
}

/// Comparison within one tag of a property, bounded by the tag's
/// smallest and largest possible terms
fn ordered_comparison(name: &str, tag: ValueTag, term: String, operator: Operator) -> IndexQuery {
    let min = encoding::tagged_prefix(name, tag);
    let max = format!("{min}{MAX_TEXT}");
    let text = |t: String| TermValue::Text(t);
    match operator {
        Operator::EqualTo => IndexQuery::term(content::PROPERTIES, term),
        Operator::NotEqualTo => IndexQuery::and(vec![
            IndexQuery::prefix(content::PROPERTIES, min),
            IndexQuery::negate(IndexQuery::term(content::PROPERTIES, term)),
        ]),
        Operator::GreaterThan => IndexQuery::range(
            content::PROPERTIES,
            Bound::Excluded(text(term)),
            Bound::Included(text(max)),
        ),
        Operator::GreaterThanOrEqualTo => IndexQuery::range(
            content::PROPERTIES,
            Bound::Included(text(term)),
            Bound::Included(text(max)),
        ),
        Operator::LessThan => IndexQuery::range(
            content::PROPERTIES,
            Bound::Included(text(min)),
            Bound::Excluded(text(term)),
        ),
        Operator::LessThanOrEqualTo => IndexQuery::range(
            content::PROPERTIES,
            Bound::Included(text(min)),
            Bound::Included(text(term)),
        ),
        Operator::Like => IndexQuery::MatchNone,
    }
}

/// Boolean comparisons with `false < true`
fn boolean_comparison(name: &str, operator: Operator, value: bool) -> IndexQuery {
    let is = |v: bool| IndexQuery::term(content::PROPERTIES, encoding::boolean_term(name, v));
    let any = || IndexQuery::prefix(content::PROPERTIES, encoding::tagged_prefix(name, ValueTag::Boolean));
    match (operator, value) {
        (Operator::EqualTo, v) => is(v),
        (Operator::NotEqualTo, v) => is(!v),
        // Nothing is greater than true or less than false
        (Operator::GreaterThan, true) | (Operator::LessThan, false) => IndexQuery::MatchNone,
        (Operator::GreaterThan, false) | (Operator::GreaterThanOrEqualTo, true) => is(true),
        (Operator::LessThan, true) | (Operator::LessThanOrEqualTo, false) => is(false),
        (Operator::GreaterThanOrEqualTo, false) | (Operator::LessThanOrEqualTo, true) => any(),
        (Operator::Like, _) => IndexQuery::MatchNone,
    }
}

/// Comparison on an exact text field of the paths index
fn text_comparison(field: &'static str, operator: Operator, text: &str) -> IndexQuery {
    let value = || TermValue::from(text);
    match operator {
        Operator::EqualTo => IndexQuery::term(field, text),
        Operator::NotEqualTo => IndexQuery::negate(IndexQuery::term(field, text)),
        Operator::GreaterThan => IndexQuery::range(
            field,
            Bound::Excluded(value()),
            Bound::Included(TermValue::from(MAX_TEXT)),
        ),
        Operator::GreaterThanOrEqualTo => IndexQuery::range(
            field,
            Bound::Included(value()),
            Bound::Included(TermValue::from(MAX_TEXT)),
        ),
        Operator::LessThan => IndexQuery::range(
            field,
            Bound::Included(TermValue::from("")),
            Bound::Excluded(value()),
        ),
        Operator::LessThanOrEqualTo => IndexQuery::range(
            field,
            Bound::Included(TermValue::from("")),
            Bound::Included(value()),
        ),
        Operator::Like => like_query(field, "", text),
    }
}

fn node_path_query(operator: Operator, text: &str) -> Result<IndexQuery> {
    if operator == Operator::Like {
        return Ok(path_like_query(text));
    }
    let path = Path::parse(text)?;
    Ok(text_comparison(paths::PATH, operator, &path.to_index_string()))
}

/// Name comparisons order on (name, SNS index) when an index is given
fn node_name_query(operator: Operator, text: &str) -> Result<IndexQuery> {
    if operator == Operator::Like {
        let (name_part, sns_part) = match text.find('[') {
            Some(open) => (&text[..open], Some(&text[open..])),
            None => (text, None),
        };
        let name_query = (!name_part.is_empty()).then(|| like_query(paths::NAME, "", name_part));
        let sns_query = sns_part.and_then(sns_like_query);
        return Ok(match (name_query, sns_query) {
            (Some(name), Some(sns)) => IndexQuery::and(vec![name, sns]),
            (Some(name), None) => name,
            (None, Some(sns)) => sns,
            (None, None) => IndexQuery::MatchNone,
        });
    }

    let segment = Segment::parse(text)?;
    let name = segment.name();
    let sns = i64::from(segment.index());
    if !text.contains('[') {
        return Ok(text_comparison(paths::NAME, operator, name));
    }

    let same_name = || IndexQuery::term(paths::NAME, name);
    let query = match operator {
        Operator::EqualTo => IndexQuery::and(vec![same_name(), IndexQuery::term(paths::SNS, sns)]),
        Operator::NotEqualTo => IndexQuery::negate(IndexQuery::and(vec![
            same_name(),
            IndexQuery::term(paths::SNS, sns),
        ])),
        Operator::GreaterThan | Operator::GreaterThanOrEqualTo => {
            let from = if operator == Operator::GreaterThan { sns + 1 } else { sns };
            IndexQuery::or(vec![
                text_comparison(paths::NAME, Operator::GreaterThan, name),
                IndexQuery::and(vec![
                    same_name(),
                    IndexQuery::int_at_least(paths::SNS, from),
                ]),
            ])
        }
        Operator::LessThan | Operator::LessThanOrEqualTo => {
            let to = if operator == Operator::LessThan { sns - 1 } else { sns };
            IndexQuery::or(vec![
                text_comparison(paths::NAME, Operator::LessThan, name),
                IndexQuery::and(vec![same_name(), IndexQuery::int_range(paths::SNS, 1, to)]),
            ])
        }
        Operator::Like => IndexQuery::MatchNone,
    };
    Ok(query)
}

fn node_depth_query(operator: Operator, depth: i64) -> Result<IndexQuery> {
    Ok(match operator {
        Operator::EqualTo => IndexQuery::term(paths::DEPTH, depth),
        Operator::NotEqualTo => IndexQuery::negate(IndexQuery::term(paths::DEPTH, depth)),
        Operator::GreaterThan => match depth.checked_add(1) {
            Some(from) => IndexQuery::int_at_least(paths::DEPTH, from),
            None => IndexQuery::MatchNone,
        },
        Operator::GreaterThanOrEqualTo => IndexQuery::int_at_least(paths::DEPTH, depth),
        Operator::LessThan => match depth.checked_sub(1) {
            Some(to) => IndexQuery::int_range(paths::DEPTH, 0, to),
            None => IndexQuery::MatchNone,
        },
        Operator::LessThanOrEqualTo => IndexQuery::int_range(paths::DEPTH, 0, depth),
        Operator::Like => return Err(unsupported("LIKE on a node depth")),
    })
}
