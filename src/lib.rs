//! # Simple Press
//!
//! A minimal static site generator for posts, pages, and paginated archives.
//! Content is a directory of text files, each starting with a header block of
//! `field: value` lines. Engines configured in `config.toml` turn one content
//! directory each into pages and into packs: paginated index pages, grouped
//! by a header field when the pack pattern ends in a field.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      contents/  →  Manifest         (files → sorted, chained units)
//! 2. Generate  Manifest   →  site/            (units + packs → HTML)
//! ```
//!
//! The scan manifest serializes to JSON (`simple-press scan`) so the parsed
//! fields, slugs, and neighbor links can be inspected before anything is
//! written. Packs are not part of the manifest: they borrow the units and are
//! built per engine during generate.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: loads config and every engine into a [`scan::Manifest`] |
//! | [`generate`] | Stage 2: writes units, packs, extra pages, and assets; also `check` |
//! | [`engine`] | One content type: discovery, parallel parsing, sorting, chaining |
//! | [`unit`] | Content units: header parsing, typed fields, slug, lazy permalist |
//! | [`pack`] | Grouping and pagination of units into packs |
//! | [`permalink`] | Permalink pattern parsing and resolution against unit fields |
//! | [`page`] | The `Page` contract: permalink, absolute URL, output path, chaining |
//! | [`slug`] | Text → URL slug |
//! | [`render`] | The `Renderer` seam and the built-in Maud renderer |
//! | [`config`] | `config.toml` loading, stock defaults, validation |
//! | [`types`] | Typed field values shared by units, permalinks, and packs |
//! | [`output`] | CLI output formatting |
//! | [`serve`] | Development HTTP server for the output directory |
//!
//! # Design Decisions
//!
//! ## Typed Fields
//!
//! Header values are converted once, at parse time, into [`types::FieldValue`]:
//! text, a sorted deduplicated list, or a datetime. Permalink resolution and
//! pack grouping dispatch on that type instead of re-parsing strings, so an
//! unsupported combination (a datetime format on a text or list field, a
//! datetime pack without a format) is a typed error naming the field. A list
//! in a unit permalink is not an error: its items are joined with `, ` and
//! slugified into one segment.
//!
//! ## Packs Borrow Units
//!
//! A [`pack::Pack`] holds `&Unit` references. Packs live for one generate
//! pass and never outlive the engine, so there is no shared ownership and no
//! copying of unit content.
//!
//! ## No Silent Overwrites
//!
//! Two pages resolving to the same output path is fatal. Output files are
//! opened with `create_new`, and `check` runs the same collision detection
//! without writing.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. All interpolation is escaped; only rendered markdown
//! bodies are inserted raw. The generate stage depends on the
//! [`render::Renderer`] trait, not on Maud.

pub mod config;
pub mod engine;
pub mod generate;
pub mod output;
pub mod pack;
pub mod page;
pub mod permalink;
pub mod render;
pub mod scan;
pub mod serve;
pub mod slug;
pub mod types;
pub mod unit;

#[cfg(test)]
pub(crate) mod test_helpers;
