//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the project root and is layered on top of the stock defaults, so a user
//! file only needs the keys it wants to override.
//!
//! ## Project Layout
//!
//! ```text
//! project/
//! ├── config.toml        # Site and engine config (optional)
//! ├── assets/            # Copied verbatim into the output root
//! └── contents/
//!     ├── blog/          # Units for the `blog` engine
//!     │   └── hello.md
//!     └── pages/         # Units for the `pages` engine
//!         └── about.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! title = "My Site"
//! url = "http://localhost:8000"
//! index_html_only = true    # /post/ (true) or /post.html (false)
//! pack_url = "page"         # marker segment for pack pages > 1
//!
//! [site.slug_char_map]
//! "ß" = "ss"
//!
//! [engines.blog]            # an engine is on when its table exists
//! url = "/blog"
//! permalink = "{time:%Y/%m/%d}/{slug}"
//! sort_key = "-time"
//! units_per_pack = 10
//! packs = ["", "tag/{tags}", "{time:%Y/%m}"]
//! ```
//!
//! `packs` may also be a table mapping each pattern to a title template:
//! `%s` is replaced by the group value, and datetime patterns use a strftime
//! format.
//!
//! Unknown keys are rejected to catch typos early.

use crate::pack;
use crate::permalink::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site-wide settings.
    pub site: SiteSection,
    /// Engine configs keyed by engine name. An absent engine is off.
    pub engines: BTreeMap<String, EngineConfig>,
}

impl SiteConfig {
    /// Validate every engine. Errors name the offending engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, engine) in &self.engines {
            engine
                .validate()
                .map_err(|msg| ConfigError::Validation(format!("engines.{name}: {msg}")))?;
        }
        Ok(())
    }
}

/// The `[site]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    /// Absolute site URL, prefixed onto permalinks for `permalink_abs`.
    pub url: String,
    /// Write `<permalink>/index.html` instead of `<permalink>.html`.
    pub index_html_only: bool,
    /// Marker segment inserted before the page number of pack pages > 1.
    pub pack_url: String,
    /// Content root, relative to the project directory.
    pub content_dir: String,
    /// Static assets copied into the output root.
    pub assets_dir: String,
    /// Template ids rendered once each to `<output>/<id>.html`.
    pub extra_pages: Vec<String>,
    /// Substitutions applied before slugifying (e.g. `ö` → `oe`).
    pub slug_char_map: BTreeMap<String, String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            url: "http://localhost:8000".to_string(),
            index_html_only: true,
            pack_url: "page".to_string(),
            content_dir: "contents".to_string(),
            assets_dir: "assets".to_string(),
            extra_pages: Vec::new(),
            slug_char_map: BTreeMap::new(),
        }
    }
}

/// One `[engines.<name>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Base URL prepended to every unit and pack permalink.
    pub url: String,
    /// Unit directory under the content root. Defaults to the engine name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<String>,
    pub permalink: String,
    pub unit_template: String,
    pub pack_template: String,
    /// Header keys users may not set.
    pub protected: Vec<String>,
    /// Header keys every unit must end up with.
    pub required: Vec<String>,
    pub fields_as_list: Vec<String>,
    pub list_sep: String,
    pub fields_as_datetime: Vec<String>,
    /// strftime format used to parse datetime header values.
    pub datetime_format: String,
    /// strftime format the built-in renderer uses to show datetimes.
    pub display_datetime_format: String,
    /// Defaults applied to every unit for keys its header does not set.
    pub global_fields: BTreeMap<String, String>,
    pub packs: PackPatterns,
    pub units_per_pack: usize,
    /// Field to sort units by; a leading `-` sorts descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "/".to_string(),
            content_dir: None,
            permalink: "{slug}".to_string(),
            unit_template: "unit".to_string(),
            pack_template: "pack".to_string(),
            protected: [
                "id",
                "content",
                "permalist",
                "permalink",
                "permalink_prev",
                "permalink_next",
            ]
            .map(String::from)
            .to_vec(),
            required: vec!["title".to_string()],
            fields_as_list: vec!["tags".to_string(), "categories".to_string()],
            list_sep: ",".to_string(),
            fields_as_datetime: vec!["time".to_string()],
            datetime_format: "%Y/%m/%d %H:%M".to_string(),
            display_datetime_format: "%A, %d %B %Y".to_string(),
            global_fields: BTreeMap::new(),
            packs: PackPatterns::default(),
            units_per_pack: 10,
            sort_key: None,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.units_per_pack == 0 {
            return Err("units_per_pack must be greater than 0".into());
        }
        if self.list_sep.is_empty() {
            return Err("list_sep must not be empty".into());
        }
        Pattern::parse(&self.permalink).map_err(|e| e.to_string())?;
        for (raw, _) in self.packs.entries() {
            let pattern = Pattern::parse(raw).map_err(|e| e.to_string())?;
            pack::validate_pattern(&pattern).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Unit directory name, falling back to the engine name.
    pub fn content_dir_or<'a>(&'a self, engine_name: &'a str) -> &'a str {
        self.content_dir.as_deref().unwrap_or(engine_name)
    }
}

/// Pack pattern declaration: a plain list, or pattern → title template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackPatterns {
    List(Vec<String>),
    Titled(BTreeMap<String, String>),
}

impl Default for PackPatterns {
    fn default() -> Self {
        PackPatterns::List(Vec::new())
    }
}

impl PackPatterns {
    /// Every pattern with its optional title template, in declaration order
    /// for lists and key order for tables.
    pub fn entries(&self) -> Vec<(&str, Option<&str>)> {
        match self {
            PackPatterns::List(patterns) => patterns.iter().map(|p| (p.as_str(), None)).collect(),
            PackPatterns::Titled(map) => map
                .iter()
                .map(|(p, title)| (p.as_str(), Some(title.as_str())))
                .collect(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `config.toml` from `path` as a raw TOML value, if present.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config, falling back to stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// A documented `config.toml` with a `blog` and a `pages` engine.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Press Configuration
# ==========================
# Values shown below are the defaults unless noted.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "My Site"

# Absolute site URL, used for absolute permalinks.
url = "http://localhost:8000"

# true:  /blog/hello/ is written to blog/hello/index.html
# false: /blog/hello.html is written to blog/hello.html
index_html_only = true

# Marker segment for pack pages after the first: /blog/page/2/
pack_url = "page"

# Directories relative to the project root.
content_dir = "contents"
assets_dir = "assets"

# Template ids rendered once each to <output>/<id>.html.
extra_pages = []

# Substitutions applied before slugifying.
[site.slug_char_map]
# "ß" = "ss"

# ---------------------------------------------------------------------------
# Engines
# ---------------------------------------------------------------------------
# Each [engines.<name>] table turns an engine on. Units are read from
# <content_dir>/<name>/ unless the engine sets its own content_dir.

[engines.blog]
url = "/blog"
permalink = "{time:%Y/%m/%d}/{slug}"
unit_template = "unit"
pack_template = "pack"
protected = ["id", "content", "permalist", "permalink", "permalink_prev", "permalink_next"]
required = ["title", "time"]
fields_as_list = ["tags", "categories"]
list_sep = ","
fields_as_datetime = ["time"]
datetime_format = "%Y/%m/%d %H:%M"
display_datetime_format = "%A, %d %B %Y"
units_per_pack = 10
# A leading '-' sorts descending.
sort_key = "-time"

# Pattern -> title template. Only the last segment may be a {field}.
# '%s' is replaced by the group value; datetime groups use a strftime format.
[engines.blog.packs]
"" = "All posts"
"tag/{tags}" = "Posts tagged %s"
"{time:%Y/%m}" = "Posts from %B %Y"

[engines.blog.global_fields]
author = "Anonymous"

[engines.pages]
url = "/"
permalink = "{slug}"
"##
}
