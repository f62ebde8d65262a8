//! LIKE pattern translation.
//!
//! `%` matches any run of characters (including none), `_` matches
//! exactly one character and `\x` matches a literal `x`.

use crate::core::search::index_query::{IndexQuery, ANY_CHAR};
use crate::core::storage::schema::paths;

/// Regex matching one SNS suffix written as `[%]` in a path pattern
const ANY_SNS_REGEX: &str = r"\[[0-9]+\]";

/// Anchored regex body equivalent to a LIKE pattern
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => {
                out.push_str(ANY_CHAR);
                out.push('*');
            }
            '_' => out.push_str(ANY_CHAR),
            '\\' => push_literal(&mut out, chars.next().unwrap_or('\\')),
            other => push_literal(&mut out, other),
        }
    }
    out
}

/// The literal text of a pattern without wildcards
fn like_literal(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' | '_' => return None,
            '\\' => out.push(chars.next().unwrap_or('\\')),
            other => out.push(other),
        }
    }
    Some(out)
}

/// `*`/`?` form of a LIKE pattern, unless it contains a literal `*` or `?`
fn like_to_wildcard(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '*' | '?' => return None,
            '\\' => match chars.next().unwrap_or('\\') {
                '*' | '?' => return None,
                literal => out.push(literal),
            },
            other => out.push(other),
        }
    }
    Some(out)
}

fn push_literal(out: &mut String, ch: char) {
    out.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4])));
}

/// Query for a LIKE pattern against whole terms of an exact text field
///
/// `prefix` is prepended literally to every term (the property
/// namespace of the `props` field). Patterns that start with a literal
/// character become wildcard queries; patterns that start with `%` or
/// `_` become regex queries.
pub fn like_query(field: &'static str, prefix: &str, pattern: &str) -> IndexQuery {
    if let Some(literal) = like_literal(pattern) {
        return IndexQuery::term(field, format!("{prefix}{literal}"));
    }
    let leading_wildcard = matches!(pattern.chars().next(), Some('%' | '_'));
    if !leading_wildcard && !prefix.contains(['*', '?']) {
        if let Some(wildcard) = like_to_wildcard(pattern) {
            return IndexQuery::Wildcard {
                field,
                pattern: format!("{prefix}{wildcard}"),
            };
        }
    }
    IndexQuery::Regex {
        field,
        pattern: format!("{}{}", regex::escape(prefix), like_to_regex(pattern)),
    }
}

/// Query for the SNS part of a node-name LIKE pattern (`[1_]`, `[%]`, `[3]`)
///
/// Returns `None` when the expression is empty and places no
/// constraint on the SNS index.
pub fn sns_like_query(expression: &str) -> Option<IndexQuery> {
    let trimmed = expression.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = match inner.find(']') {
        Some(close) => &inner[..close],
        None => inner,
    };
    if inner.is_empty() {
        return None;
    }

    let query = match inner {
        // A single digit
        "_" => IndexQuery::int_range(paths::SNS, 1, 9),
        "%" => IndexQuery::int_at_least(paths::SNS, 1),
        _ => {
            let single_chars = inner.matches('_').count();
            let has_any = inner.contains('%');
            if has_any || single_chars > 1 {
                like_query(paths::SNS_TEXT, "", inner)
            } else if single_chars == 1 {
                let lower = inner.replace('_', "0").parse::<i64>();
                let upper = inner.replace('_', "9").parse::<i64>();
                match (lower, upper) {
                    (Ok(lower), Ok(upper)) => IndexQuery::int_range(paths::SNS, lower, upper),
                    _ => IndexQuery::MatchNone,
                }
            } else {
                match inner.parse::<i64>() {
                    Ok(sns) => IndexQuery::term(paths::SNS, sns),
                    Err(_) => IndexQuery::MatchNone,
                }
            }
        }
    };
    Some(query)
}

/// Normalize a path LIKE pattern to the stored path form
///
/// Runs of `%` collapse to one, and segments without an explicit SNS
/// suffix get `[1]` unless the whole segment is a wildcard.
pub fn normalize_path_pattern(pattern: &str) -> String {
    if pattern == "/" || pattern == "%" {
        return pattern.to_string();
    }
    let mut collapsed = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        if ch == '%' && collapsed.ends_with('%') {
            continue;
        }
        collapsed.push(ch);
    }

    let mut out = String::with_capacity(collapsed.len() + 8);
    let mut rest = collapsed.as_str();
    if let Some(stripped) = rest.strip_prefix("%/") {
        out.push('%');
        if stripped.is_empty() {
            return out;
        }
        rest = stripped;
    }
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
        if segment == "%" || segment == "_" {
            continue;
        }
        if !(segment.ends_with(']') || segment.ends_with("]%") || segment.ends_with("]_")) {
            out.push_str("[1]");
        }
    }
    if collapsed.ends_with('/') {
        out.push('/');
    }
    out
}

/// Query for a LIKE pattern against the stored path
///
/// `[%]` only matches a numeric SNS suffix.
pub fn path_like_query(pattern: &str) -> IndexQuery {
    let normalized = normalize_path_pattern(pattern);
    if !normalized.contains("[%]") {
        return like_query(paths::PATH, "", &normalized);
    }
    let regex = normalized
        .split("[%]")
        .map(like_to_regex)
        .collect::<Vec<_>>()
        .join(ANY_SNS_REGEX);
    IndexQuery::Regex {
        field: paths::PATH,
        pattern: regex,
    }
}
