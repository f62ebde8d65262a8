//! Structured constraints served by the access component.
//!
//! Constraints serialize as tagged JSON, e.g.
//!
//! ```json
//! {"type": "comparison",
//!  "operand": {"kind": "property_value", "property": "title"},
//!  "operator": "like",
//!  "value": {"type": "string", "value": "draft%"}}
//! ```

use crate::core::error::{NodexError, Result};
use crate::core::graph::{Path, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Like,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::EqualTo => "=",
            Operator::NotEqualTo => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::Like => "LIKE",
        }
    }

    /// Apply to two ordered values; LIKE never matches here
    pub fn compare<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            Operator::EqualTo => left == right,
            Operator::NotEqualTo => left != right,
            Operator::LessThan => left < right,
            Operator::LessThanOrEqualTo => left <= right,
            Operator::GreaterThan => left > right,
            Operator::GreaterThanOrEqualTo => left >= right,
            Operator::Like => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The left-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicOperand {
    PropertyValue { property: String },
    Length { property: String },
    LowerCase { operand: Box<DynamicOperand> },
    UpperCase { operand: Box<DynamicOperand> },
    NodeDepth,
    NodePath,
    NodeName,
    NodeLocalName,
    FullTextSearchScore,
}

impl DynamicOperand {
    pub fn property(name: impl Into<String>) -> Self {
        DynamicOperand::PropertyValue {
            property: name.into(),
        }
    }

    pub fn length(name: impl Into<String>) -> Self {
        DynamicOperand::Length {
            property: name.into(),
        }
    }

    pub fn lower_case(operand: DynamicOperand) -> Self {
        DynamicOperand::LowerCase {
            operand: Box::new(operand),
        }
    }

    pub fn upper_case(operand: DynamicOperand) -> Self {
        DynamicOperand::UpperCase {
            operand: Box::new(operand),
        }
    }
}

/// A residual predicate over one selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    And {
        constraints: Vec<Constraint>,
    },
    Or {
        constraints: Vec<Constraint>,
    },
    Not {
        constraint: Box<Constraint>,
    },
    Comparison {
        operand: DynamicOperand,
        operator: Operator,
        value: Value,
    },
    Between {
        operand: DynamicOperand,
        lower: Value,
        upper: Value,
        #[serde(default = "inclusive")]
        include_lower: bool,
        #[serde(default = "inclusive")]
        include_upper: bool,
    },
    SetCriteria {
        operand: DynamicOperand,
        values: Vec<Value>,
    },
    PropertyExistence {
        property: String,
    },
    FullTextSearch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<String>,
        expression: String,
    },
    SameNode {
        path: Path,
    },
    ChildNode {
        parent: Path,
    },
    DescendantNode {
        ancestor: Path,
    },
}

fn inclusive() -> bool {
    true
}

impl Constraint {
    pub fn compare(operand: DynamicOperand, operator: Operator, value: impl Into<Value>) -> Self {
        Constraint::Comparison {
            operand,
            operator,
            value: value.into(),
        }
    }

    pub fn and(constraints: Vec<Constraint>) -> Self {
        Constraint::And { constraints }
    }

    pub fn or(constraints: Vec<Constraint>) -> Self {
        Constraint::Or { constraints }
    }

    pub fn not(constraint: Constraint) -> Self {
        Constraint::Not {
            constraint: Box::new(constraint),
        }
    }

    pub fn full_text(property: Option<&str>, expression: impl Into<String>) -> Self {
        Constraint::FullTextSearch {
            property: property.map(str::to_string),
            expression: expression.into(),
        }
    }
}

/// Parsed full-text search expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullTextTerm {
    Word(String),
    Phrase(String),
    Not(Box<FullTextTerm>),
    And(Vec<FullTextTerm>),
    Or(Vec<FullTextTerm>),
}

/// Parse a full-text expression
///
/// Whitespace-separated terms are all required, `OR` separates
/// alternatives, a leading `-` excludes a term and double quotes
/// delimit phrases (`\"` inside a phrase is a literal quote).
pub fn parse_full_text(expression: &str) -> Result<FullTextTerm> {
    let mut alternatives = Vec::new();
    let mut conjuncts = Vec::new();
    let mut chars = expression.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else { break };

        let negated = first == '-';
        if negated {
            chars.next();
        }

        let term = if chars.peek() == Some(&'"') {
            chars.next();
            let mut phrase = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            phrase.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => phrase.push(other),
                }
            }
            if !closed {
                return Err(NodexError::InvalidValue(format!(
                    "unterminated phrase in full-text expression '{expression}'"
                )));
            }
            FullTextTerm::Phrase(phrase)
        } else {
            let mut word = String::new();
            while let Some(ch) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(ch);
            }
            if word == "OR" && !negated {
                if !conjuncts.is_empty() {
                    alternatives.push(conjunction(std::mem::take(&mut conjuncts)));
                }
                continue;
            }
            if word.is_empty() {
                continue;
            }
            FullTextTerm::Word(word)
        };

        conjuncts.push(if negated {
            FullTextTerm::Not(Box::new(term))
        } else {
            term
        });
    }

    if !conjuncts.is_empty() {
        alternatives.push(conjunction(conjuncts));
    }
    Ok(match alternatives.len() {
        1 => alternatives.remove(0),
        _ => FullTextTerm::Or(alternatives),
    })
}

fn conjunction(mut terms: Vec<FullTextTerm>) -> FullTextTerm {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        FullTextTerm::And(terms)
    }
}
