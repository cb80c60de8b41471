//! URL slug generation.
//!
//! Slugs are the URL-safe identifiers used for unit permalinks and literal
//! permalink segments. The transform is:
//!
//! 1. Trim. An empty input or a lone `/` is the root sentinel and yields `""`.
//! 2. Apply the configured character map (e.g. `ß` → `ss`) so accented
//!    characters keep their phonetic meaning instead of being dropped.
//! 3. Replace runs of whitespace and underscores with a single dash.
//! 4. Drop every character outside `[A-Za-z0-9._-]`.
//! 5. Collapse runs of `-`, `_` and `.` into a single dash.
//! 6. Lower-case and strip leading/trailing `-`, `_` and `.`.
//!
//! A non-root input that ends up empty is an error: a unit can never resolve
//! to an empty slug.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\s]+").expect("valid regex"));
static PRUNE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));
static MULTIPLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid regex"));

#[derive(Error, Debug, PartialEq)]
pub enum SlugError {
    #[error("slug for '{0}' is an empty string after processing")]
    Empty(String),
}

/// Slug generator carrying the site's character substitution map.
#[derive(Debug, Clone, Default)]
pub struct Slugifier {
    char_map: BTreeMap<String, String>,
}

impl Slugifier {
    pub fn new(char_map: BTreeMap<String, String>) -> Self {
        Self { char_map }
    }

    /// Slugify `text`.
    ///
    /// - `"Kings of Convenience - Know How (feat. Feist)"` → `"kings-of-convenience-know-how-feat-feist"`
    /// - `""` and `"/"` → `""` (root sentinel, not an error)
    /// - `"&**%&^%&$-"` → `Err(SlugError::Empty)`
    pub fn slugify(&self, text: &str) -> Result<String, SlugError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(String::new());
        }

        let mut mapped = trimmed.to_string();
        for (target, replacement) in &self.char_map {
            mapped = mapped.replace(target.as_str(), replacement);
        }

        let dashed = SPACES.replace_all(&mapped, "-");
        let pruned = PRUNE.replace_all(&dashed, "");
        let collapsed = MULTIPLE.replace_all(&pruned, "-");
        let slug = collapsed
            .to_lowercase()
            .trim_matches(|c| c == '-' || c == '_' || c == '.')
            .to_string();

        if slug.is_empty() {
            return Err(SlugError::Empty(trimmed.to_string()));
        }
        Ok(slug)
    }
}
