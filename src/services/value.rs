//! Field types and naive-value coercion.
//!
//! DESIGN
//! ======
//! Risk model fields are dynamically typed: each field declares one of four
//! types and object values arrive as naive JSON. Coercion turns a naive
//! value into a typed `FieldValue` or a per-value error the API can report
//! positionally. Enum fields carry their admissible choices as a
//! comma-separated string on the field row.

use std::collections::HashSet;

use time::Date;
use time::macros::format_description;

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

// =============================================================================
// FIELD TYPE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Enum,
}

impl FieldType {
    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Enum => "enum",
        }
    }
}

// =============================================================================
// VALUES
// =============================================================================

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("expected a text value")]
    NotText,
    #[error("expected an integer value")]
    NotNumber,
    #[error("expected a date in YYYY-MM-DD form")]
    NotDate,
    #[error("value is not one of the declared choices")]
    NotAChoice,
}

/// A typed object value. Exactly one variant per field type; storage keeps
/// one column per variant.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Date(Date),
    Enum(String),
}

impl FieldValue {
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Number(_) => FieldType::Number,
            Self::Date(_) => FieldType::Date,
            Self::Enum(_) => FieldType::Enum,
        }
    }

    /// JSON rendering for API responses. Dates render back in the same
    /// `YYYY-MM-DD` form they were submitted in.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) | Self::Enum(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Date(d) => serde_json::Value::String(
                d.format(DATE_FORMAT).unwrap_or_else(|_| d.to_string()),
            ),
        }
    }
}

/// Coerce a naive JSON value into a typed value for `field_type`.
///
/// Text accepts strings and renders scalars; number accepts integers and
/// integer strings; date accepts `YYYY-MM-DD` strings; enum accepts a string
/// present in `choices`.
///
/// # Errors
///
/// Returns the per-type `ValueError` when the naive value doesn't fit.
pub fn coerce(
    field_type: FieldType,
    naive: &serde_json::Value,
    choices: Option<&str>,
) -> Result<FieldValue, ValueError> {
    match field_type {
        FieldType::Text => match naive {
            serde_json::Value::String(s) => Ok(FieldValue::Text(s.clone())),
            serde_json::Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            serde_json::Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            _ => Err(ValueError::NotText),
        },
        FieldType::Number => match naive {
            serde_json::Value::Number(n) => n.as_i64().map(FieldValue::Number).ok_or(ValueError::NotNumber),
            serde_json::Value::String(s) => {
                s.trim().parse::<i64>().map(FieldValue::Number).map_err(|_| ValueError::NotNumber)
            }
            _ => Err(ValueError::NotNumber),
        },
        FieldType::Date => {
            let raw = naive.as_str().ok_or(ValueError::NotDate)?;
            Date::parse(raw, DATE_FORMAT).map(FieldValue::Date).map_err(|_| ValueError::NotDate)
        }
        FieldType::Enum => {
            let raw = naive.as_str().ok_or(ValueError::NotAChoice)?;
            if parse_choices(choices.unwrap_or("")).iter().any(|c| c == raw) {
                Ok(FieldValue::Enum(raw.to_string()))
            } else {
                Err(ValueError::NotAChoice)
            }
        }
    }
}

/// Split a stored comma-separated choices string.
#[must_use]
pub fn parse_choices(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|c| !c.is_empty()).map(str::to_string).collect()
}

// =============================================================================
// SLUGS
// =============================================================================

/// Derive a URL-safe slug from a field name: lowercase alphanumeric runs
/// joined by single dashes. `"Type of Car"` becomes `"type-of-car"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug unique within a model: the base slug, or `base-2`, `base-3`, ...
/// on collision.
#[must_use]
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
