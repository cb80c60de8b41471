//! Packs: paginated pages grouping units under a shared URL.
//!
//! A pack pattern describes how to bucket an engine's units. Only its last
//! segment may reference a field, and the value found in that field on the
//! first unit picks the grouping strategy:
//!
//! | Last segment | Sample value | Strategy | One group per |
//! |--------------|--------------|----------|---------------|
//! | literal or none | - | all | pattern |
//! | `{field}` | text | single | distinct value |
//! | `{field}` | list | multiple | distinct element across all units |
//! | `{field:%Y/%m}` | datetime | datetime | distinct rendered tuple |
//!
//! Every group is then split into pages of `units_per_pack` units. Page 1
//! lives at the group's base permalist; later pages append the site's pack
//! marker and the page number (`blog/tag/rust/page/2`). Pages of a group are
//! chained with prev/next permalinks.
//!
//! The base URL and the pattern's literal segments are slugified the same
//! way unit permalinks are. Group values are used as is, so a value that is
//! not a single path component (`..`, `a/b`, empty) is an error.
//!
//! Group order follows the sorted order of the distinct values. Callers
//! should not depend on it.

use crate::config::PackPatterns;
use crate::page::{Page, UrlStyle, chain_permalinks, is_plain_component};
use crate::permalink::{self, Pattern, PermalinkError, Segment};
use crate::slug::Slugifier;
use crate::types::{FieldKind, FieldValue, format_datetime};
use crate::unit::Unit;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Pack pattern '{pattern}' is invalid: only the last segment may be a field reference")]
    InvalidPattern { pattern: String },
    #[error("Pack pattern '{pattern}': '{id}' has no '{field}' attribute")]
    MissingField {
        pattern: String,
        id: String,
        field: String,
    },
    #[error("Pack method for {kind} field '{field}' in pattern '{pattern}' has not been implemented")]
    UnsupportedValue {
        pattern: String,
        field: String,
        kind: FieldKind,
    },
    #[error("Invalid datetime format '{format}' in pack pattern '{pattern}'")]
    BadFormat { pattern: String, format: String },
    #[error("Pack pattern '{pattern}': '{id}' field '{field}' value '{value}' is not a single path segment")]
    UnsafeValue {
        pattern: String,
        id: String,
        field: String,
        value: String,
    },
    #[error(transparent)]
    Permalink(#[from] PermalinkError),
}

/// One page of a group.
#[derive(Debug, Clone)]
pub struct Pack<'a> {
    units: Vec<&'a Unit>,
    index: usize,
    title: Option<String>,
    permalist: Vec<String>,
    id: String,
    permalink_prev: Option<String>,
    permalink_next: Option<String>,
}

impl<'a> Pack<'a> {
    /// `index` is 1-based.
    pub fn new(
        units: Vec<&'a Unit>,
        index: usize,
        base_permalist: &[String],
        pack_url: &str,
        title: Option<String>,
    ) -> Self {
        let mut permalist: Vec<String> = base_permalist
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        if index > 1 {
            if !pack_url.is_empty() {
                permalist.push(pack_url.to_string());
            }
            permalist.push(index.to_string());
        }
        let id = format!("/{}", permalist.join("/"));
        tracing::debug!(pack = %id, "created");
        Self {
            units,
            index,
            title,
            permalist,
            id,
            permalink_prev: None,
            permalink_next: None,
        }
    }

    pub fn units(&self) -> &[&'a Unit] {
        &self.units
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn permalink_prev(&self) -> Option<&str> {
        self.permalink_prev.as_deref()
    }

    pub fn permalink_next(&self) -> Option<&str> {
        self.permalink_next.as_deref()
    }
}

impl Page for Pack<'_> {
    fn id(&self) -> &str {
        &self.id
    }

    fn permalist(&self) -> Result<&[String], PermalinkError> {
        Ok(&self.permalist)
    }

    fn set_neighbors(&mut self, prev: Option<String>, next: Option<String>) {
        self.permalink_prev = prev;
        self.permalink_next = next;
    }
}

/// Reject a pack pattern whose dynamic segment is not the last one.
pub fn validate_pattern(pattern: &Pattern) -> Result<(), PackError> {
    let segments = pattern.segments();
    let leading = segments.split_last().map(|(_, rest)| rest).unwrap_or_default();
    if leading.iter().any(Segment::is_dynamic) {
        return Err(PackError::InvalidPattern {
            pattern: pattern.as_str().to_string(),
        });
    }
    Ok(())
}

/// Grouping strategy, picked from the pattern and the sample value.
enum Strategy<'p> {
    All,
    Single(&'p str),
    Multiple(&'p str),
    DateTime(&'p str, &'p str),
}

/// Pagination settings shared by every group of an engine.
#[derive(Debug, Clone)]
pub struct Packer<'s> {
    pub units_per_pack: usize,
    /// Marker segment before the page number; empty for none.
    pub pack_url: &'s str,
    pub style: &'s UrlStyle,
    pub slugifier: &'s Slugifier,
}

impl<'s> Packer<'s> {
    /// Build every pack for every pattern.
    ///
    /// The result maps `"/"`-joined base URL and pattern segments to the
    /// ordered packs of that pattern. All patterns are validated before any
    /// pack is built. An empty `units` slice yields an empty map and a
    /// warning.
    pub fn build_packs<'a>(
        &self,
        units: &'a [Unit],
        base_url: &str,
        patterns: &PackPatterns,
    ) -> Result<BTreeMap<String, Vec<Pack<'a>>>, PackError> {
        let parsed = patterns
            .entries()
            .into_iter()
            .map(|(raw, title)| -> Result<_, PackError> {
                let pattern = Pattern::parse(raw)?;
                validate_pattern(&pattern)?;
                Ok((pattern, title))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if parsed.is_empty() {
            return Ok(BTreeMap::new());
        }

        if units.is_empty() {
            tracing::warn!(base_url, "no units to pack");
            return Ok(BTreeMap::new());
        }

        let base = permalink::base_segments(base_url, self.slugifier, base_url)?;

        let mut packs = BTreeMap::new();
        for (pattern, title) in &parsed {
            let title = *title;
            let key = base
                .iter()
                .cloned()
                .chain(pattern.segments().iter().map(|s| s.to_string()))
                .collect::<Vec<_>>()
                .join("/");

            let strategy = self.strategy(pattern, &units[0])?;
            let literals = match strategy {
                Strategy::All => pattern.segments(),
                _ => pattern.segments().split_last().map(|(_, rest)| rest).unwrap_or_default(),
            };
            let prefix = self.literal_permalist(&base, pattern, literals)?;

            let packed = match strategy {
                Strategy::All => {
                    let all: Vec<&Unit> = units.iter().collect();
                    let packed = self.paginate(all, prefix, title.map(str::to_string))?;
                    tracing::debug!(count = packed.len(), "created: all packs");
                    packed
                }
                Strategy::Single(field) => {
                    self.pack_single(units, pattern, field, &prefix, title)?
                }
                Strategy::Multiple(field) => {
                    self.pack_multiple(units, pattern, field, &prefix, title)?
                }
                Strategy::DateTime(field, format) => {
                    self.pack_datetime(units, pattern, field, format, &prefix, title)?
                }
            };
            packs.insert(key, packed);
        }
        Ok(packs)
    }

    /// `base` followed by the slugified `literals`.
    fn literal_permalist(
        &self,
        base: &[String],
        pattern: &Pattern,
        literals: &[Segment],
    ) -> Result<Vec<String>, PackError> {
        let mut permalist = base.to_vec();
        for literal in literals {
            let slug = self
                .slugifier
                .slugify(&literal.to_string())
                .map_err(|source| PermalinkError::Slug {
                    id: pattern.as_str().to_string(),
                    source,
                })?;
            if !slug.is_empty() {
                permalist.push(slug);
            }
        }
        Ok(permalist)
    }

    fn strategy<'p>(&self, pattern: &'p Pattern, sample: &Unit) -> Result<Strategy<'p>, PackError> {
        let Some(Segment::Field { name, format }) = pattern.segments().last() else {
            return Ok(Strategy::All);
        };
        let value = field_of(pattern, sample, name)?;
        match (value, format) {
            (FieldValue::Text(_), None) => Ok(Strategy::Single(name)),
            (FieldValue::List(_), None) => Ok(Strategy::Multiple(name)),
            (FieldValue::DateTime(_), Some(format)) => Ok(Strategy::DateTime(name, format)),
            (other, _) => Err(unsupported(pattern, name, other.kind())),
        }
    }

    fn pack_single<'a>(
        &self,
        units: &'a [Unit],
        pattern: &Pattern,
        field: &str,
        prefix: &[String],
        title: Option<&str>,
    ) -> Result<Vec<Pack<'a>>, PackError> {
        let values = units
            .iter()
            .map(|u| -> Result<_, PackError> {
                match field_of(pattern, u, field)? {
                    FieldValue::Text(value) => {
                        check_group_value(pattern, u, field, value)?;
                        Ok(value.as_str())
                    }
                    other => Err(unsupported(pattern, field, other.kind())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let distinct: BTreeSet<&str> = values.iter().copied().collect();

        let mut packed = Vec::new();
        for item in distinct {
            let matches: Vec<&Unit> = units
                .iter()
                .zip(&values)
                .filter(|(_, v)| **v == item)
                .map(|(u, _)| u)
                .collect();
            let group_base = group_permalist(prefix, &[item]);
            let title = title.map(|t| t.replacen("%s", item, 1));
            packed.extend(self.paginate(matches, group_base, title)?);
        }
        tracing::debug!(count = packed.len(), field, "created: single packs");
        Ok(packed)
    }

    fn pack_multiple<'a>(
        &self,
        units: &'a [Unit],
        pattern: &Pattern,
        field: &str,
        prefix: &[String],
        title: Option<&str>,
    ) -> Result<Vec<Pack<'a>>, PackError> {
        let lists = units
            .iter()
            .map(|u| -> Result<_, PackError> {
                match field_of(pattern, u, field)? {
                    FieldValue::List(items) => {
                        for item in items {
                            check_group_value(pattern, u, field, item)?;
                        }
                        Ok(items.as_slice())
                    }
                    other => Err(unsupported(pattern, field, other.kind())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let distinct: BTreeSet<&str> = lists.iter().flat_map(|l| l.iter().map(String::as_str)).collect();

        let mut packed = Vec::new();
        for item in distinct {
            let matches: Vec<&Unit> = units
                .iter()
                .zip(&lists)
                .filter(|(_, list)| list.iter().any(|v| v == item))
                .map(|(u, _)| u)
                .collect();
            let group_base = group_permalist(prefix, &[item]);
            let title = title.map(|t| t.replacen("%s", item, 1));
            packed.extend(self.paginate(matches, group_base, title)?);
        }
        tracing::debug!(count = packed.len(), field, "created: multiple packs");
        Ok(packed)
    }

    fn pack_datetime<'a>(
        &self,
        units: &'a [Unit],
        pattern: &Pattern,
        field: &str,
        format: &str,
        prefix: &[String],
        title: Option<&str>,
    ) -> Result<Vec<Pack<'a>>, PackError> {
        let bad_format = |format: &str| PackError::BadFormat {
            pattern: pattern.as_str().to_string(),
            format: format.to_string(),
        };
        let tokens: Vec<&str> = format.trim_matches('/').split('/').collect();

        // Each unit's datetime rendered once per format token.
        let tuples = units
            .iter()
            .map(|u| -> Result<Vec<String>, PackError> {
                let dt = match field_of(pattern, u, field)? {
                    FieldValue::DateTime(dt) => dt,
                    other => return Err(unsupported(pattern, field, other.kind())),
                };
                tokens
                    .iter()
                    .map(|token| format_datetime(dt, token).map_err(|_| bad_format(format)))
                    .collect::<Result<Vec<String>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let distinct: BTreeSet<&Vec<String>> = tuples.iter().collect();

        let mut packed = Vec::new();
        let mut assigned = 0;
        for item in distinct {
            let matches: Vec<&Unit> = units
                .iter()
                .zip(&tuples)
                .filter(|(_, tuple)| *tuple == item)
                .map(|(u, _)| u)
                .collect();
            assigned += matches.len();

            let title = match (title, matches[0].get(field)) {
                (Some(t), Some(FieldValue::DateTime(dt))) => {
                    Some(format_datetime(dt, t).map_err(|_| bad_format(t))?)
                }
                _ => None,
            };
            let segments: Vec<&str> = item.iter().map(String::as_str).collect();
            let group_base = group_permalist(prefix, &segments);
            packed.extend(self.paginate(matches, group_base, title)?);
        }
        debug_assert_eq!(assigned, units.len(), "each unit belongs to exactly one datetime group");
        tracing::debug!(count = packed.len(), field, "created: datetime packs");
        Ok(packed)
    }

    /// Split `units` into pages of `units_per_pack`, the last page taking the
    /// remainder, and chain the pages when there is more than one.
    pub fn paginate<'a>(
        &self,
        units: Vec<&'a Unit>,
        base_permalist: Vec<String>,
        title: Option<String>,
    ) -> Result<Vec<Pack<'a>>, PackError> {
        let mut packs: Vec<Pack<'a>> = units
            .chunks(self.units_per_pack.max(1))
            .enumerate()
            .map(|(i, chunk)| {
                Pack::new(
                    chunk.to_vec(),
                    i + 1,
                    &base_permalist,
                    self.pack_url,
                    title.clone(),
                )
            })
            .collect();
        if packs.len() > 1 {
            chain_permalinks(&mut packs, self.style)?;
            tracing::debug!("done: chaining packs");
        }
        Ok(packs)
    }
}

/// The slugified base and literal prefix, then the group's own segments in
/// place of the final field reference.
fn group_permalist(prefix: &[String], group: &[&str]) -> Vec<String> {
    prefix
        .iter()
        .cloned()
        .chain(group.iter().map(|s| s.to_string()))
        .collect()
}

/// A group value becomes one output directory, so it must be exactly one
/// normal path component.
fn check_group_value(pattern: &Pattern, unit: &Unit, field: &str, value: &str) -> Result<(), PackError> {
    if is_plain_component(value) {
        return Ok(());
    }
    Err(PackError::UnsafeValue {
        pattern: pattern.as_str().to_string(),
        id: unit.id().to_string(),
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn field_of<'u>(pattern: &Pattern, unit: &'u Unit, field: &str) -> Result<&'u FieldValue, PackError> {
    unit.get(field).ok_or_else(|| PackError::MissingField {
        pattern: pattern.as_str().to_string(),
        id: unit.id().to_string(),
        field: field.to_string(),
    })
}

fn unsupported(pattern: &Pattern, field: &str, kind: FieldKind) -> PackError {
    PackError::UnsupportedValue {
        pattern: pattern.as_str().to_string(),
        field: field.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, SiteSection};
    use crate::test_helpers::{make_unit, make_units};
    use crate::unit::UnitOptions;
    use std::sync::Arc;

    fn style() -> UrlStyle {
        UrlStyle {
            index_html_only: true,
            site_url: "http://example.com".to_string(),
        }
    }

    fn build<'a>(
        units: &'a [Unit],
        per_pack: usize,
        patterns: &[&str],
        style: &UrlStyle,
    ) -> Result<BTreeMap<String, Vec<Pack<'a>>>, PackError> {
        let packer = Packer {
            units_per_pack: per_pack,
            pack_url: "page",
            style,
            slugifier: &Slugifier::default(),
        };
        let patterns = PackPatterns::List(patterns.iter().map(|s| s.to_string()).collect());
        packer.build_packs(units, "/blog", &patterns)
    }

    fn unit_ids(pack: &Pack) -> Vec<String> {
        pack.units().iter().map(|u| u.id().to_string()).collect()
    }

    fn find<'p, 'a>(packs: &'p [Pack<'a>], permalink: &str) -> &'p Pack<'a> {
        packs
            .iter()
            .find(|p| p.permalink(&style()).unwrap() == permalink)
            .unwrap_or_else(|| {
                let links: Vec<String> = packs.iter().map(|p| p.permalink(&style()).unwrap()).collect();
                panic!("pack '{permalink}' not found. Available: {links:?}")
            })
    }

    // =========================================================================
    // Pattern validation
    // =========================================================================

    #[test]
    fn dynamic_segment_must_be_last() {
        let pattern = Pattern::parse("{category}/archive").unwrap();
        assert!(matches!(
            validate_pattern(&pattern),
            Err(PackError::InvalidPattern { .. })
        ));
        assert!(validate_pattern(&Pattern::parse("archive/{category}").unwrap()).is_ok());
        assert!(validate_pattern(&Pattern::parse("").unwrap()).is_ok());
    }

    #[test]
    fn invalid_pattern_rejected_before_building() {
        let units = make_units(3);
        let err = build(&units, 2, &["", "{category}/archive"], &style()).unwrap_err();
        assert!(matches!(err, PackError::InvalidPattern { .. }));
    }

    #[test]
    fn invalid_pattern_rejected_even_without_units() {
        let err = build(&[], 2, &["{a}/{b}"], &style()).unwrap_err();
        assert!(matches!(err, PackError::InvalidPattern { .. }));
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    #[test]
    fn seven_units_in_packs_of_three() {
        let units = make_units(7);
        let packs = build(&units, 3, &[""], &style()).unwrap();
        let all = &packs["blog"];

        let sizes: Vec<usize> = all.iter().map(|p| p.units().len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        let indices: Vec<usize> = all.iter().map(Pack::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn later_pages_get_marker_and_number() {
        let units = make_units(7);
        let packs = build(&units, 3, &[""], &style()).unwrap();
        let all = &packs["blog"];
        assert_eq!(all[0].permalist().unwrap(), &["blog"]);
        assert_eq!(all[1].permalist().unwrap(), &["blog", "page", "2"]);
        assert_eq!(all[2].permalink(&style()).unwrap(), "/blog/page/3/");
    }

    #[test]
    fn empty_pack_url_omits_marker() {
        let units = make_units(4);
        let packer = Packer {
            units_per_pack: 2,
            pack_url: "",
            style: &style(),
            slugifier: &Slugifier::default(),
        };
        let packs = packer
            .build_packs(&units, "blog", &PackPatterns::List(vec![String::new()]))
            .unwrap();
        assert_eq!(packs["blog"][1].permalist().unwrap(), &["blog", "2"]);
    }

    #[test]
    fn paginate_exact_multiple_has_no_partial_page() {
        let units = make_units(6);
        let packs = build(&units, 3, &[""], &style()).unwrap();
        let sizes: Vec<usize> = packs["blog"].iter().map(|p| p.units().len()).collect();
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn three_pages_are_chained() {
        let units = make_units(7);
        let packs = build(&units, 3, &[""], &style()).unwrap();
        let all = &packs["blog"];
        let links: Vec<String> = all.iter().map(|p| p.permalink(&style()).unwrap()).collect();

        assert_eq!(all[0].permalink_prev(), None);
        assert_eq!(all[2].permalink_next(), None);
        assert_eq!(all[1].permalink_prev(), Some(links[0].as_str()));
        assert_eq!(all[1].permalink_next(), Some(links[2].as_str()));
    }

    #[test]
    fn single_page_is_not_chained() {
        let units = make_units(2);
        let packs = build(&units, 5, &[""], &style()).unwrap();
        let only = &packs["blog"][0];
        assert_eq!(only.permalink_prev(), None);
        assert_eq!(only.permalink_next(), None);
    }

    // =========================================================================
    // Strategies
    // =========================================================================

    #[test]
    fn empty_units_yield_empty_map() {
        let packs = build(&[], 3, &["", "tag/{tags}"], &style()).unwrap();
        assert!(packs.is_empty());
    }

    #[test]
    fn all_strategy_with_literal_pattern() {
        let units = make_units(3);
        let packs = build(&units, 10, &["archive"], &style()).unwrap();
        let archive = &packs["blog/archive"];
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].units().len(), 3);
        assert_eq!(archive[0].permalist().unwrap(), &["blog", "archive"]);
    }

    #[test]
    fn single_strategy_groups_by_value() {
        let units = vec![
            make_unit("a.md", "title: A\nauthor: alice"),
            make_unit("b.md", "title: B\nauthor: bob"),
            make_unit("c.md", "title: C\nauthor: alice"),
        ];
        let packs = build(&units, 10, &["by/{author}"], &style()).unwrap();
        let by = &packs["blog/by/{author}"];
        assert_eq!(by.len(), 2);
        assert_eq!(unit_ids(find(by, "/blog/by/alice/")), vec!["a.md", "c.md"]);
        assert_eq!(unit_ids(find(by, "/blog/by/bob/")), vec!["b.md"]);
    }

    #[test]
    fn multiple_strategy_membership() {
        let units = vec![
            make_unit("first.md", "title: First\ntags: a, b"),
            make_unit("second.md", "title: Second\ntags: b"),
        ];
        let packs = build(&units, 10, &["tag/{tags}"], &style()).unwrap();
        let tagged = &packs["blog/tag/{tags}"];
        assert_eq!(tagged.len(), 2);
        assert_eq!(unit_ids(find(tagged, "/blog/tag/a/")), vec!["first.md"]);
        assert_eq!(
            unit_ids(find(tagged, "/blog/tag/b/")),
            vec!["first.md", "second.md"]
        );
    }

    #[test]
    fn multiple_strategy_paginates_each_group() {
        let units: Vec<Unit> = (0..5)
            .map(|i| make_unit(&format!("{i}.md"), &format!("title: T{i}\ntags: x")))
            .collect();
        let packs = build(&units, 2, &["tag/{tags}"], &style()).unwrap();
        let tagged = &packs["blog/tag/{tags}"];
        let sizes: Vec<usize> = tagged.iter().map(|p| p.units().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(tagged[2].permalist().unwrap(), &["blog", "tag", "x", "page", "3"]);
    }

    #[test]
    fn datetime_strategy_groups_by_rendered_tuple() {
        let units = vec![
            make_unit("a.md", "title: A\ntime: 2009/10/04 08:00"),
            make_unit("b.md", "title: B\ntime: 2009/10/20 08:00"),
            make_unit("c.md", "title: C\ntime: 2010/03/01 08:00"),
        ];
        let packs = build(&units, 10, &["{time:%Y/%m}"], &style()).unwrap();
        let by_month = &packs["blog/{time:%Y/%m}"];
        assert_eq!(by_month.len(), 2);
        assert_eq!(
            by_month[0].permalist().unwrap(),
            &["blog", "2009", "10"]
        );
        assert_eq!(unit_ids(&by_month[0]), vec!["a.md", "b.md"]);
        assert_eq!(unit_ids(find(by_month, "/blog/2010/03/")), vec!["c.md"]);
    }

    #[test]
    fn datetime_title_uses_strftime() {
        let units = vec![make_unit("a.md", "title: A\ntime: 2009/10/04 08:00")];
        let packer = Packer {
            units_per_pack: 10,
            pack_url: "page",
            style: &style(),
            slugifier: &Slugifier::default(),
        };
        let mut titled = BTreeMap::new();
        titled.insert("{time:%Y}".to_string(), "Posts from %Y".to_string());
        let packs = packer
            .build_packs(&units, "blog", &PackPatterns::Titled(titled))
            .unwrap();
        assert_eq!(packs["blog/{time:%Y}"][0].title(), Some("Posts from 2009"));
    }

    #[test]
    fn value_title_substitutes_group() {
        let units = vec![make_unit("a.md", "title: A\ntags: rust")];
        let packer = Packer {
            units_per_pack: 10,
            pack_url: "page",
            style: &style(),
            slugifier: &Slugifier::default(),
        };
        let mut titled = BTreeMap::new();
        titled.insert("tag/{tags}".to_string(), "Tagged %s".to_string());
        titled.insert(String::new(), "Everything".to_string());
        let packs = packer
            .build_packs(&units, "blog", &PackPatterns::Titled(titled))
            .unwrap();
        assert_eq!(packs["blog/tag/{tags}"][0].title(), Some("Tagged rust"));
        assert_eq!(packs["blog"][0].title(), Some("Everything"));
    }

    #[test]
    fn untitled_packs_have_no_title() {
        let units = make_units(1);
        let packs = build(&units, 10, &[""], &style()).unwrap();
        assert_eq!(packs["blog"][0].title(), None);
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn field_missing_on_sample_is_error() {
        let units = make_units(2);
        let err = build(&units, 10, &["series/{series}"], &style()).unwrap_err();
        assert!(matches!(err, PackError::MissingField { ref field, .. } if field == "series"));
    }

    #[test]
    fn field_missing_on_later_unit_is_error() {
        let units = vec![
            make_unit("a.md", "title: A\nauthor: alice"),
            make_unit("b.md", "title: B"),
        ];
        let err = build(&units, 10, &["by/{author}"], &style()).unwrap_err();
        assert!(matches!(err, PackError::MissingField { ref id, .. } if id == "b.md"));
    }

    #[test]
    fn format_on_text_field_is_unsupported() {
        let units = vec![make_unit("a.md", "title: A\nauthor: alice")];
        let err = build(&units, 10, &["{author:%Y}"], &style()).unwrap_err();
        assert!(matches!(
            err,
            PackError::UnsupportedValue { kind: FieldKind::Text, .. }
        ));
    }

    #[test]
    fn datetime_without_format_is_unsupported() {
        let units = vec![make_unit("a.md", "title: A\ntime: 2009/10/04 08:00")];
        let err = build(&units, 10, &["{time}"], &style()).unwrap_err();
        assert!(err.to_string().contains("datetime"));
    }

    #[test]
    fn list_value_leaving_output_dir_is_rejected() {
        let units = vec![make_unit("a.md", "title: A\ntags: rust, ../../../escaped")];
        let err = build(&units, 10, &["tag/{tags}"], &style()).unwrap_err();
        assert!(matches!(
            err,
            PackError::UnsafeValue { ref id, ref field, ref value, .. }
                if id == "a.md" && field == "tags" && value == "../../../escaped"
        ));
    }

    #[test]
    fn absolute_text_value_is_rejected() {
        let units = vec![
            make_unit("a.md", "title: A\nauthor: alice"),
            make_unit("b.md", "title: B\nauthor: /etc/passwd"),
        ];
        let err = build(&units, 10, &["by/{author}"], &style()).unwrap_err();
        assert!(matches!(err, PackError::UnsafeValue { ref id, .. } if id == "b.md"));
        assert!(err.to_string().contains("not a single path segment"));
    }

    #[test]
    fn dot_values_are_rejected() {
        for value in [".", ".."] {
            let units = vec![make_unit("a.md", &format!("title: A\nauthor: {value}"))];
            let err = build(&units, 10, &["by/{author}"], &style()).unwrap_err();
            assert!(matches!(err, PackError::UnsafeValue { .. }), "{value}: {err}");
        }
    }

    // =========================================================================
    // Slugified base and literals
    // =========================================================================

    #[test]
    fn base_url_and_literals_are_slugified_like_units() {
        let config = EngineConfig {
            url: "/My Blog".to_string(),
            ..EngineConfig::default()
        };
        let options = Arc::new(UnitOptions::new(&config, &SiteSection::default()).unwrap());
        let units = vec![Unit::parse("hello.md", "---\ntitle: Hello\n---\n", options).unwrap()];
        let packer = Packer {
            units_per_pack: 10,
            pack_url: "page",
            style: &style(),
            slugifier: &Slugifier::default(),
        };
        let patterns = PackPatterns::List(vec!["Tag Archive/{title}".to_string()]);
        let packs = packer.build_packs(&units, &config.url, &patterns).unwrap();

        let archive = &packs["my-blog/Tag Archive/{title}"];
        assert_eq!(
            archive[0].permalink(&style()).unwrap(),
            "/my-blog/tag-archive/Hello/"
        );
        assert_eq!(units[0].permalink(&style()).unwrap(), "/my-blog/hello/");
    }

    #[test]
    fn all_pack_literals_use_char_map() {
        let units = make_units(2);
        let slugifier = Slugifier::new(BTreeMap::from([("Ü".to_string(), "Ue".to_string())]));
        let packer = Packer {
            units_per_pack: 10,
            pack_url: "page",
            style: &style(),
            slugifier: &slugifier,
        };
        let patterns = PackPatterns::List(vec!["Übersicht".to_string()]);
        let packs = packer.build_packs(&units, "/blog", &patterns).unwrap();
        assert_eq!(packs["blog/Übersicht"][0].permalist().unwrap(), &["blog", "uebersicht"]);
    }

    // =========================================================================
    // Idempotence
    // =========================================================================

    #[test]
    fn rebuilding_yields_identical_packs() {
        let units = vec![
            make_unit("a.md", "title: A\ntags: x, y\ntime: 2009/10/04 08:00"),
            make_unit("b.md", "title: B\ntags: y\ntime: 2010/01/01 08:00"),
            make_unit("c.md", "title: C\ntags: z\ntime: 2009/10/05 08:00"),
        ];
        let patterns = ["", "tag/{tags}", "{time:%Y/%m}"];
        let summarize = |packs: &BTreeMap<String, Vec<Pack>>| -> Vec<(String, String, Vec<String>)> {
            packs
                .iter()
                .flat_map(|(key, list)| {
                    list.iter().map(move |p| {
                        (key.clone(), p.permalink(&style()).unwrap(), unit_ids(p))
                    })
                })
                .collect()
        };
        let first = build(&units, 1, &patterns, &style()).unwrap();
        let second = build(&units, 1, &patterns, &style()).unwrap();
        assert_eq!(summarize(&first), summarize(&second));
    }
}
