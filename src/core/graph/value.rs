//! Typed property values.

use crate::core::error::{NodexError, Result};
use crate::core::graph::path::Path;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Name,
    Path,
    Reference,
    Uri,
    Uuid,
    Date,
    Long,
    Double,
    Decimal,
    Boolean,
    Binary,
}

impl PropertyType {
    /// Types compared as strings
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            PropertyType::String
                | PropertyType::Name
                | PropertyType::Path
                | PropertyType::Reference
                | PropertyType::Uri
                | PropertyType::Uuid
        )
    }
}

/// A single typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Name(String),
    Path(Path),
    Reference(String),
    Uri(String),
    Uuid(Uuid),
    Date(DateTime<Utc>),
    Long(i64),
    Double(f64),
    /// Decimal kept in its textual form
    Decimal(String),
    Boolean(bool),
    /// Raw bytes; serialized as an array of numbers
    Binary(Vec<u8>),
}

impl Value {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Value::String(_) => PropertyType::String,
            Value::Name(_) => PropertyType::Name,
            Value::Path(_) => PropertyType::Path,
            Value::Reference(_) => PropertyType::Reference,
            Value::Uri(_) => PropertyType::Uri,
            Value::Uuid(_) => PropertyType::Uuid,
            Value::Date(_) => PropertyType::Date,
            Value::Long(_) => PropertyType::Long,
            Value::Double(_) => PropertyType::Double,
            Value::Decimal(_) => PropertyType::Decimal,
            Value::Boolean(_) => PropertyType::Boolean,
            Value::Binary(_) => PropertyType::Binary,
        }
    }

    /// String form used for storage, full text and string comparisons
    pub fn as_text(&self) -> String {
        match self {
            Value::String(s) | Value::Name(s) | Value::Reference(s) | Value::Uri(s) => s.clone(),
            Value::Decimal(s) => s.clone(),
            Value::Path(p) => p.to_index_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Date(d) => format_date(d),
            Value::Long(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Length as reported by length comparisons
    pub fn length(&self) -> i64 {
        match self {
            Value::Binary(bytes) => bytes.len() as i64,
            other => other.as_text().chars().count() as i64,
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Long(v) => Ok(*v),
            Value::Double(v) => Ok(*v as i64),
            Value::Date(d) => Ok(d.timestamp_millis()),
            Value::Boolean(_) | Value::Binary(_) => Err(self.conversion_error("long")),
            other => other
                .as_text()
                .trim()
                .parse::<i64>()
                .map_err(|_| other.conversion_error("long")),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Long(v) => Ok(*v as f64),
            Value::Double(v) => Ok(*v),
            Value::Boolean(_) | Value::Binary(_) | Value::Date(_) => {
                Err(self.conversion_error("double"))
            }
            other => other
                .as_text()
                .trim()
                .parse::<f64>()
                .map_err(|_| other.conversion_error("double")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(v) => Ok(*v),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.conversion_error("boolean")),
            },
            _ => Err(self.conversion_error("boolean")),
        }
    }

    /// Epoch milliseconds of a date-like value
    pub fn as_date_millis(&self) -> Result<i64> {
        match self {
            Value::Date(d) => Ok(d.timestamp_millis()),
            Value::Long(v) => Ok(*v),
            Value::String(s) => parse_date(s)
                .map(|d| d.timestamp_millis())
                .ok_or_else(|| self.conversion_error("date")),
            _ => Err(self.conversion_error("date")),
        }
    }

    fn conversion_error(&self, target: &str) -> NodexError {
        NodexError::InvalidValue(format!(
            "cannot convert {:?} value '{}' to {target}",
            self.property_type(),
            self.as_text()
        ))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

/// Render a date in ISO-8601 with millisecond precision
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601/RFC 3339 date, or a bare epoch-millisecond number
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    text.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}
