//! Shared types used across all pipeline stages.
//!
//! Header fields become entries in a [`Fields`] map keyed by the lower-cased
//! field name. Each value is a [`FieldValue`], a closed tagged union over the
//! three shapes a header value can take once the engine config has been
//! applied: plain text, a list of tokens, or a datetime.
//!
//! Permalink resolution and pack grouping both switch on the tag rather than
//! inspecting values at runtime.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Header fields of a unit, keyed by lower-cased field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A typed header value.
///
/// Ordering is derived so values can live in ordered sets and be used as
/// sort keys; values of different kinds order by variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// De-duplicated tokens, kept sorted.
    List(Vec<String>),
    DateTime(NaiveDateTime),
}

/// Tag of a [`FieldValue`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
    DateTime,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::List => "list",
            FieldKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::List(_) => FieldKind::List,
            FieldValue::DateTime(_) => FieldKind::DateTime,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

/// String form used when a value is interpolated without a format:
/// lists are joined with `", "`, datetimes use ISO-like `%Y-%m-%d %H:%M:%S`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Render a datetime with a strftime-style format.
///
/// Returns `Err` instead of panicking when the format contains an invalid
/// directive.
pub fn format_datetime(dt: &NaiveDateTime, format: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "{}", dt.format(format))?;
    Ok(out)
}

/// Parse a datetime with a strftime-style format.
///
/// A format with no time directives is accepted and yields midnight of that
/// day, so `%Y-%m-%d` works as a content datetime format.
pub fn parse_datetime(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Split a separator-delimited string into a de-duplicated, sorted token list.
///
/// Tokens are trimmed; empty tokens are dropped.
pub fn split_list(value: &str, sep: &str) -> Vec<String> {
    let tokens: std::collections::BTreeSet<String> = value
        .split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tokens.into_iter().collect()
}
