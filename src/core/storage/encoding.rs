//! Term encoding for dynamic properties.
//!
//! Every indexed property value becomes one term in the content index's
//! `props` field:
//!
//! ```text
//! <property name> \u{1f} <tag> <encoded value>
//! ```
//!
//! Numbers are encoded as fixed-width, order-preserving hex so that a
//! numeric range maps onto a lexicographic term range within one tag.

/// Separates the property name from the rest of a term
pub const NAME_SEPARATOR: char = '\u{1f}';

/// Sorts after every valid value text
pub const MAX_TEXT: &str = "\u{10ffff}";

/// Kind of value encoded in a term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    String,
    Boolean,
    Long,
    Double,
    Date,
    Length,
}

impl ValueTag {
    pub fn as_char(self) -> char {
        match self {
            ValueTag::String => 's',
            ValueTag::Boolean => 'b',
            ValueTag::Long => 'l',
            ValueTag::Double => 'd',
            ValueTag::Date => 't',
            ValueTag::Length => 'n',
        }
    }
}

/// Prefix shared by every term of a property
pub fn property_prefix(name: &str) -> String {
    format!("{name}{NAME_SEPARATOR}")
}

/// Prefix shared by every term of one tag of a property
pub fn tagged_prefix(name: &str, tag: ValueTag) -> String {
    format!("{name}{NAME_SEPARATOR}{}", tag.as_char())
}

pub fn string_term(name: &str, value: &str) -> String {
    format!("{}{value}", tagged_prefix(name, ValueTag::String))
}

pub fn boolean_term(name: &str, value: bool) -> String {
    format!("{}{value}", tagged_prefix(name, ValueTag::Boolean))
}

pub fn i64_term(name: &str, tag: ValueTag, value: i64) -> String {
    format!("{}{}", tagged_prefix(name, tag), encode_i64(value))
}

pub fn f64_term(name: &str, value: f64) -> String {
    format!("{}{}", tagged_prefix(name, ValueTag::Double), encode_f64(value))
}

/// Term of an analyzed per-property token
pub fn token_term(name: &str, token: &str) -> String {
    format!("{name}{NAME_SEPARATOR}{token}")
}

/// Stored `name -> value` entry
pub fn stored_entry(name: &str, value: &str) -> String {
    format!("{name}{NAME_SEPARATOR}{value}")
}

/// Split a stored entry back into name and value
pub fn split_entry(entry: &str) -> Option<(&str, &str)> {
    entry.split_once(NAME_SEPARATOR)
}

/// Order-preserving hex encoding of an i64
pub fn encode_i64(value: i64) -> String {
    format!("{:016x}", (value as u64) ^ (1 << 63))
}

pub fn decode_i64(encoded: &str) -> Option<i64> {
    u64::from_str_radix(encoded, 16)
        .ok()
        .map(|bits| (bits ^ (1 << 63)) as i64)
}

/// Order-preserving hex encoding of an f64 (NaN sorts last)
pub fn encode_f64(value: f64) -> String {
    let bits = value.to_bits();
    let sortable = if bits >> 63 == 1 { !bits } else { bits | (1 << 63) };
    format!("{sortable:016x}")
}

pub fn decode_f64(encoded: &str) -> Option<f64> {
    let sortable = u64::from_str_radix(encoded, 16).ok()?;
    let bits = if sortable >> 63 == 1 {
        sortable & !(1 << 63)
    } else {
        !sortable
    };
    Some(f64::from_bits(bits))
}
