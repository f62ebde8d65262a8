//! Free-text query preprocessing.
//!
//! Node paths and qualified names contain characters the tantivy query
//! grammar treats as syntax:
//! - Paths: `/a/b[2]` -> `"/a/b[2]"`
//! - Qualified names: `jcr:title` -> `"jcr:title"` (not a field prefix)
//! - Braces and brackets outside quotes are escaped
//!
//! A "literal" mode escapes every special character so the whole input
//! is searched as plain text.

use crate::core::error::{NodexError, Result};
use crate::core::storage::schema::content;
use once_cell::sync::Lazy;
use regex::Regex;

static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^/[^\s"]*$"#).unwrap());

static QUALIFIED_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.\-]+:[^\s:][^\s]*$").unwrap());

static FIELD_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):([^\s:])").unwrap());

/// Content index fields that are never valid in free text
const INTERNAL_FIELDS: [&str; 4] = [
    content::ID,
    content::PROPERTIES,
    content::PROPERTY_FULL_TEXT,
    content::STORED_VALUES,
];

/// Preprocess a free-text query for the tantivy query parser.
///
/// # Examples
///
/// ```
/// use nodex::core::search::preprocess_query;
///
/// assert_eq!(preprocess_query("/a/b[2]", false), "\"/a/b[2]\"");
/// assert_eq!(preprocess_query("jcr:title draft", false), "\"jcr:title\" draft");
/// assert_eq!(preprocess_query("fts:draft", false), "fts:draft");
/// assert_eq!(preprocess_query("a:b", true), "a\\:b");
/// ```
pub fn preprocess_query(query: &str, literal: bool) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if literal {
        return escape_all_special(trimmed);
    }
    split_outside_quotes(trimmed)
        .into_iter()
        .map(preprocess_token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject field prefixes that address internal fields.
pub fn validate_query_fields(query: &str) -> Result<()> {
    for token in split_outside_quotes(query.trim()) {
        if token.starts_with('"') {
            continue;
        }
        let Some(cap) = FIELD_PREFIX_PATTERN.captures(token) else {
            continue;
        };
        let whole = cap.get(0).map(|m| m.start()).unwrap_or(0);
        // Only a prefix when it starts the token (after grouping/negation)
        if !token[..whole].chars().all(|c| matches!(c, '(' | '-' | '+')) {
            continue;
        }
        let field = &cap[1];
        if INTERNAL_FIELDS.contains(&field) {
            return Err(NodexError::InvalidQueryField {
                field: field.to_string(),
                message: format!(
                    "'{field}' is not searchable directly; search plain terms or use 'fts:'"
                ),
            });
        }
    }
    Ok(())
}

/// Reject queries longer than `limit` characters.
pub fn check_query_length(query: &str, limit: usize) -> Result<()> {
    let length = query.chars().count();
    if length > limit {
        return Err(NodexError::QueryTooLong { length, limit });
    }
    Ok(())
}

fn preprocess_token(token: &str) -> String {
    if token.starts_with('"') {
        return token.to_string();
    }
    let start = token
        .find(|c: char| !matches!(c, '(' | '-' | '+'))
        .unwrap_or(token.len());
    let (lead, rest) = token.split_at(start);
    let core = rest.trim_end_matches(')');
    let trail = &rest[core.len()..];
    if core.is_empty() {
        return token.to_string();
    }

    let is_full_text_field = core
        .split_once(':')
        .is_some_and(|(field, _)| field == content::FULL_TEXT);
    if PATH_PATTERN.is_match(core) || (QUALIFIED_NAME_PATTERN.is_match(core) && !is_full_text_field) {
        return format!("{lead}\"{core}\"{trail}");
    }
    format!("{lead}{}{trail}", escape_brackets(core))
}

/// Split on whitespace that is not inside double quotes
fn split_outside_quotes(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;
    for (i, ch) in s.char_indices() {
        if ch.is_whitespace() && !in_quotes {
            if let Some(begin) = start.take() {
                tokens.push(&s[begin..i]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        match ch {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => in_quotes = !in_quotes,
            _ => {}
        }
        escaped = false;
    }
    if let Some(begin) = start {
        tokens.push(&s[begin..]);
    }
    tokens
}

fn escape_brackets(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut escaped = false;
    for ch in s.chars() {
        if !escaped && matches!(ch, '{' | '}' | '[' | ']') {
            result.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        result.push(ch);
    }
    result
}

/// Escape every character with meaning in the query grammar.
fn escape_all_special(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for ch in s.chars() {
        match ch {
            ':' | '{' | '}' | '[' | ']' | '(' | ')' | '@' | '"' | '\\' | '+' | '-' | '!' | '^'
            | '~' | '*' => {
                result.push('\\');
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }
    result
}
