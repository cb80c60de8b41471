//! Permalink pattern parsing and resolution.
//!
//! A permalink pattern is a `/`-delimited string whose segments are either
//! literal path components or a single bracketed field reference:
//!
//! ```text
//! {time:%Y/%m/%d}/{slug}     → ["blog", "2009", "10", "04", "hello"]
//! post/{time:%d}/{slug}      → ["blog", "post", "04", "hello"]
//! i/love /mustard            → ["blog", "i", "love", "mustard"]
//! ```
//!
//! Only slashes outside braces delimit segments, so a datetime format may
//! itself contain `/` and expand one field into several path segments.
//!
//! ## Resolution rules
//!
//! - `{field:format}`: the field must be a datetime. It is rendered with the
//!   format and split on `/`; empty parts are dropped. Parts are not slugified.
//! - `{field}`: the field's string form is slugified into one segment.
//! - Literal segments are slugified.
//! - The base URL is split on `/`, slugified, and prepended.
//! - Empty segments are dropped from the final list.

use crate::slug::{SlugError, Slugifier};
use crate::types::{FieldKind, FieldValue, format_datetime};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PermalinkError {
    #[error("Permalink pattern '{pattern}' is malformed: {reason}")]
    MalformedPattern { pattern: String, reason: String },
    #[error("'{id}' has no '{field}' attribute")]
    MissingField { id: String, field: String },
    #[error("'{id}' field '{field}' is {kind}, but a datetime format was given")]
    NotDatetime {
        id: String,
        field: String,
        kind: FieldKind,
    },
    #[error("Invalid datetime format '{format}' for field '{field}' in '{id}'")]
    BadFormat {
        id: String,
        field: String,
        format: String,
    },
    #[error("Permalink segment '{segment}' in '{id}' is not a single path component")]
    UnsafeSegment { id: String, segment: String },
    #[error("Permalink segment in '{id}': {source}")]
    Slug {
        id: String,
        #[source]
        source: SlugError,
    },
}

/// Anything a permalink pattern can be resolved against.
pub trait Attributes {
    /// Identifier used in error messages (e.g. the source path).
    fn id(&self) -> &str;
    /// Look up a field by name.
    fn attribute(&self, name: &str) -> Option<&FieldValue>;
}

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field {
        name: String,
        format: Option<String>,
    },
}

impl Segment {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Field { .. })
    }
}

/// Renders the segment back to pattern syntax.
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(s) => f.write_str(s),
            Segment::Field { name, format: None } => write!(f, "{{{name}}}"),
            Segment::Field {
                name,
                format: Some(fmt),
            } => write!(f, "{{{name}:{fmt}}}"),
        }
    }
}

/// A tokenized permalink or pack pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Tokenize a pattern string.
    ///
    /// Leading, trailing and repeated `/` are ignored. Braces must balance
    /// and may not nest; a segment containing braces must be exactly one
    /// `{field}` or `{field:format}` reference.
    pub fn parse(raw: &str) -> Result<Self, PermalinkError> {
        let malformed = |reason: &str| PermalinkError::MalformedPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_braces = false;
        for c in raw.chars() {
            match c {
                '{' if in_braces => return Err(malformed("nested '{'")),
                '{' => {
                    in_braces = true;
                    current.push(c);
                }
                '}' if !in_braces => return Err(malformed("unmatched '}'")),
                '}' => {
                    in_braces = false;
                    current.push(c);
                }
                '/' if !in_braces => tokens.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        if in_braces {
            return Err(malformed("unclosed '{'"));
        }
        tokens.push(current);

        let mut segments = Vec::new();
        for token in tokens {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let segment = match token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
                Some(inner) if !inner.contains(['{', '}']) => {
                    let (name, format) = match inner.split_once(':') {
                        Some((name, format)) => (name.trim(), Some(format.to_string())),
                        None => (inner.trim(), None),
                    };
                    if name.is_empty() {
                        return Err(malformed("empty field name"));
                    }
                    Segment::Field {
                        name: name.to_string(),
                        format,
                    }
                }
                _ if token.contains(['{', '}']) => {
                    return Err(malformed(&format!(
                        "segment '{token}' mixes literal text and a field reference"
                    )));
                }
                _ => Segment::Literal(token.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Split a base URL into slugified, non-empty segments.
pub fn base_segments(
    base_url: &str,
    slugifier: &Slugifier,
    id: &str,
) -> Result<Vec<String>, PermalinkError> {
    let mut segments = Vec::new();
    for part in base_url.split('/') {
        let slug = slugifier.slugify(part).map_err(|source| PermalinkError::Slug {
            id: id.to_string(),
            source,
        })?;
        if !slug.is_empty() {
            segments.push(slug);
        }
    }
    Ok(segments)
}

/// Resolve `pattern` against `subject`, producing ordered URL path segments.
pub fn resolve(
    pattern: &Pattern,
    subject: &impl Attributes,
    base_url: &str,
    slugifier: &Slugifier,
) -> Result<Vec<String>, PermalinkError> {
    let id = subject.id();
    let slug = |text: &str| {
        slugifier.slugify(text).map_err(|source| PermalinkError::Slug {
            id: id.to_string(),
            source,
        })
    };

    let mut permalist = base_segments(base_url, slugifier, id)?;
    for segment in pattern.segments() {
        match segment {
            Segment::Literal(text) => permalist.push(slug(text)?),
            Segment::Field { name, format } => {
                let value = subject
                    .attribute(name)
                    .ok_or_else(|| PermalinkError::MissingField {
                        id: id.to_string(),
                        field: name.clone(),
                    })?;
                match format {
                    Some(format) => {
                        let dt = value.as_datetime().ok_or_else(|| PermalinkError::NotDatetime {
                            id: id.to_string(),
                            field: name.clone(),
                            kind: value.kind(),
                        })?;
                        let rendered =
                            format_datetime(dt, format).map_err(|_| PermalinkError::BadFormat {
                                id: id.to_string(),
                                field: name.clone(),
                                format: format.clone(),
                            })?;
                        permalist.extend(rendered.split('/').map(str::to_string));
                    }
                    None => permalist.push(slug(&value.to_string())?),
                }
            }
        }
    }

    permalist.retain(|s| !s.is_empty());
    Ok(permalist)
}
