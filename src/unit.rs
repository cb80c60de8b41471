//! Content units: one source file parsed into typed header fields and a body.
//!
//! ## File Format
//!
//! ```text
//! ---
//! title: Hello World
//! time: 2009/10/04 08:00
//! tags: rust, web
//! ---
//!
//! Body text, passed to the renderer as-is.
//! ```
//!
//! The header is the block between the first two lines consisting of exactly
//! `---`. Everything after the second delimiter is the body. Each header line
//! is `key: value`; keys are stored lower-cased.
//!
//! ## Field Conversion
//!
//! | Key | Stored as |
//! |-----|-----------|
//! | `slug` | slugified text |
//! | listed in `fields_as_list` | sorted, de-duplicated token list |
//! | listed in `fields_as_datetime` | datetime parsed with `datetime_format` |
//! | anything else | text |
//!
//! Global fields from the engine config go through the same conversion and
//! fill in keys the header did not set. A unit without a `slug` gets one
//! derived from its `title`.

use crate::config::{EngineConfig, SiteSection};
use crate::page::Page;
use crate::permalink::{Attributes, Pattern, PermalinkError, resolve};
use crate::slug::{SlugError, Slugifier};
use crate::types::{FieldValue, Fields, parse_datetime, split_list};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("'{id}' has no header: expected a block delimited by '---' lines at the top")]
    MissingHeader { id: String },
    #[error("Line '{line}' in '{id}' is not a proper header entry")]
    MalformedHeader { id: String, line: String },
    #[error("'{id}' should not define the protected header field '{field}'")]
    ProtectedField { id: String, field: String },
    #[error("Required header field '{field}' is missing in '{id}'")]
    MissingField { id: String, field: String },
    #[error("'{id}' field '{field}' value '{value}' does not match datetime format '{format}'")]
    BadDatetime {
        id: String,
        field: String,
        value: String,
        format: String,
    },
    #[error("'{id}': {source}")]
    EmptySlug {
        id: String,
        #[source]
        source: SlugError,
    },
    #[error("'{id}' has no '{field}' field to sort by")]
    SortKeyMissing { id: String, field: String },
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Permalink(#[from] PermalinkError),
}

/// Per-engine parsing rules shared by every unit of that engine.
#[derive(Debug)]
pub struct UnitOptions {
    pub protected: BTreeSet<String>,
    pub required: Vec<String>,
    pub list_fields: BTreeSet<String>,
    pub list_sep: String,
    pub datetime_fields: BTreeSet<String>,
    pub datetime_format: String,
    pub global_fields: BTreeMap<String, String>,
    pub permalink: Pattern,
    pub url: String,
    pub slugifier: Slugifier,
}

impl UnitOptions {
    pub fn new(engine: &EngineConfig, site: &SiteSection) -> Result<Self, PermalinkError> {
        Ok(Self {
            protected: engine.protected.iter().cloned().collect(),
            required: engine.required.clone(),
            list_fields: engine.fields_as_list.iter().cloned().collect(),
            list_sep: engine.list_sep.clone(),
            datetime_fields: engine.fields_as_datetime.iter().cloned().collect(),
            datetime_format: engine.datetime_format.clone(),
            global_fields: engine.global_fields.clone(),
            permalink: Pattern::parse(&engine.permalink)?,
            url: engine.url.clone(),
            slugifier: Slugifier::new(site.slug_char_map.clone()),
        })
    }

    fn is_protected(&self, key: &str) -> bool {
        self.protected.contains(key) || self.protected.contains(&key.to_lowercase())
    }

    /// Convert a raw header value according to the field's declared type.
    fn convert(&self, id: &str, key: &str, value: &str) -> Result<FieldValue, ContentError> {
        if key == "slug" {
            let slug = self
                .slugifier
                .slugify(value)
                .map_err(|source| ContentError::EmptySlug {
                    id: id.to_string(),
                    source,
                })?;
            Ok(FieldValue::Text(slug))
        } else if self.list_fields.contains(key) {
            Ok(FieldValue::List(split_list(value, &self.list_sep)))
        } else if self.datetime_fields.contains(key) {
            parse_datetime(value, &self.datetime_format)
                .map(FieldValue::DateTime)
                .ok_or_else(|| ContentError::BadDatetime {
                    id: id.to_string(),
                    field: key.to_string(),
                    value: value.to_string(),
                    format: self.datetime_format.clone(),
                })
        } else {
            Ok(FieldValue::Text(value.to_string()))
        }
    }
}

/// One parsed content item.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    id: String,
    fields: Fields,
    content: String,
    #[serde(skip)]
    options: Arc<UnitOptions>,
    #[serde(skip)]
    permalist: OnceLock<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permalink_prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permalink_next: Option<String>,
}

impl Unit {
    /// Parse a unit from raw text. `id` identifies the unit in errors.
    pub fn parse(
        id: impl Into<String>,
        text: &str,
        options: Arc<UnitOptions>,
    ) -> Result<Self, ContentError> {
        let id = id.into();
        let (header, body) = split_header(&id, text)?;

        let mut fields = Fields::new();
        for line in header.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = line
                .split_once(':')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| ContentError::MalformedHeader {
                    id: id.clone(),
                    line: line.to_string(),
                })?;
            if options.is_protected(key) {
                return Err(ContentError::ProtectedField {
                    id,
                    field: key.to_string(),
                });
            }
            let key = key.to_lowercase();
            let value = options.convert(&id, &key, value)?;
            fields.insert(key, value);
        }

        for (key, value) in &options.global_fields {
            let key = key.to_lowercase();
            if !fields.contains_key(&key) {
                let value = options.convert(&id, &key, value)?;
                fields.insert(key, value);
            }
        }

        for field in &options.required {
            if !fields.contains_key(&field.to_lowercase()) {
                return Err(ContentError::MissingField {
                    id,
                    field: field.clone(),
                });
            }
        }

        if !fields.contains_key("slug") {
            let title = fields
                .get("title")
                .ok_or_else(|| ContentError::MissingField {
                    id: id.clone(),
                    field: "title".to_string(),
                })?
                .to_string();
            let slug = options
                .slugifier
                .slugify(&title)
                .and_then(|s| {
                    if s.is_empty() {
                        Err(SlugError::Empty(title.clone()))
                    } else {
                        Ok(s)
                    }
                })
                .map_err(|source| ContentError::EmptySlug {
                    id: id.clone(),
                    source,
                })?;
            fields.insert("slug".to_string(), FieldValue::Text(slug));
        }

        Ok(Self {
            id,
            fields,
            content: body.to_string(),
            options,
            permalist: OnceLock::new(),
            permalink_prev: None,
            permalink_next: None,
        })
    }

    /// Read and parse a unit file. The id is the path as given.
    pub fn from_file(path: &Path, options: Arc<UnitOptions>) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path.display().to_string(), &text, options)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(FieldValue::as_text)
    }

    /// The unit slug. Empty only for a root page (`slug: /`).
    pub fn slug(&self) -> &str {
        self.get("slug").and_then(FieldValue::as_text).unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn permalink_prev(&self) -> Option<&str> {
        self.permalink_prev.as_deref()
    }

    pub fn permalink_next(&self) -> Option<&str> {
        self.permalink_next.as_deref()
    }
}

impl Attributes for Unit {
    fn id(&self) -> &str {
        &self.id
    }

    fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

impl Page for Unit {
    fn id(&self) -> &str {
        &self.id
    }

    /// Resolved on first access and cached for the life of the unit.
    fn permalist(&self) -> Result<&[String], PermalinkError> {
        if let Some(permalist) = self.permalist.get() {
            return Ok(permalist);
        }
        let resolved = resolve(
            &self.options.permalink,
            self,
            &self.options.url,
            &self.options.slugifier,
        )?;
        Ok(self.permalist.get_or_init(|| resolved))
    }

    fn set_neighbors(&mut self, prev: Option<String>, next: Option<String>) {
        self.permalink_prev = prev;
        self.permalink_next = next;
    }
}

/// Split raw text into header and trimmed body.
fn split_header<'t>(id: &str, text: &'t str) -> Result<(&'t str, &'t str), ContentError> {
    let missing = || ContentError::MissingHeader { id: id.to_string() };

    // Byte ranges of delimiter lines, including their line terminator.
    let mut delimiters = Vec::with_capacity(2);
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n').trim_end_matches('\r');
        if bare == "---" {
            delimiters.push((offset, offset + line.len()));
            if delimiters.len() == 2 {
                break;
            }
        }
        offset += line.len();
    }

    let &[(first_start, first_end), (second_start, second_end)] = delimiters.as_slice() else {
        return Err(missing());
    };
    if !text[..first_start].trim().is_empty() {
        return Err(missing());
    }
    Ok((
        &text[first_end..second_start],
        text[second_end..].trim(),
    ))
}

/// Stable sort by `sort_key`; a leading `-` sorts descending.
///
/// Every unit must carry the key field.
pub fn sort_units(units: &mut [Unit], sort_key: &str) -> Result<(), ContentError> {
    let (field, descending) = match sort_key.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort_key, false),
    };
    if let Some(unit) = units.iter().find(|u| u.get(field).is_none()) {
        return Err(ContentError::SortKeyMissing {
            id: unit.id.clone(),
            field: field.to_string(),
        });
    }
    if descending {
        units.sort_by(|a, b| b.get(field).cmp(&a.get(field)));
    } else {
        units.sort_by(|a, b| a.get(field).cmp(&b.get(field)));
    }
    tracing::debug!(sort_key, count = units.len(), "done: sorting units");
    Ok(())
}
