//! Shared test utilities for the simple-press test suite.
//!
//! Provides unit builders with stock engine options and a fixture project
//! writer for tests that exercise the full scan/generate pipeline.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let unit = make_unit("a.md", "title: A\ntags: x, y");
//! let units = make_units(7);
//!
//! let tmp = setup_project();
//! let manifest = scan(tmp.path()).unwrap();
//! let blog = find_engine(&manifest, "blog");
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::{EngineConfig, SiteSection};
use crate::engine::Engine;
use crate::scan::Manifest;
use crate::unit::{Unit, UnitOptions};

// =========================================================================
// Units
// =========================================================================

pub fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Unit options built from the stock engine and site defaults.
pub fn unit_options() -> UnitOptions {
    UnitOptions::new(&EngineConfig::default(), &SiteSection::default()).unwrap()
}

/// Parse a unit from header lines (no delimiters) with stock options.
pub fn make_unit(id: &str, header: &str) -> Unit {
    Unit::parse(id, &format!("---\n{header}\n---\n"), Arc::new(unit_options()))
        .unwrap_or_else(|e| panic!("fixture unit '{id}' failed to parse: {e}"))
}

/// `n` units titled `Unit 0..n`, one day apart starting 2009/10/01.
pub fn make_units(n: usize) -> Vec<Unit> {
    (0..n)
        .map(|i| {
            make_unit(
                &format!("unit-{i:02}.md"),
                &format!("title: Unit {i}\ntime: 2009/10/{:02} 08:00", i + 1),
            )
        })
        .collect()
}

// =========================================================================
// Fixture project
// =========================================================================

pub const FIXTURE_CONFIG: &str = r#"
[site]
title = "Fixture Site"
url = "http://example.com"

[engines.blog]
url = "/blog"
permalink = "{time:%Y/%m}/{slug}"
sort_key = "-time"
units_per_pack = 2
packs = ["", "tag/{tags}"]

[engines.pages]
url = "/"
permalink = "{slug}"
"#;

/// Write a small project (config, assets, three posts, two pages) to a temp
/// directory and return it.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("config.toml"), FIXTURE_CONFIG).unwrap();

    write_file(root, "assets/style.css", "body { margin: 0; }");
    write_file(
        root,
        "contents/blog/first.md",
        "---\ntitle: First Post\ntime: 2009/10/04 08:00\ntags: rust, web\n---\n\nHello *world*.\n",
    );
    write_file(
        root,
        "contents/blog/second.md",
        "---\ntitle: Second Post\ntime: 2009/11/01 08:00\ntags: rust\n---\n\nMore.\n",
    );
    write_file(
        root,
        "contents/blog/third.md",
        "---\ntitle: Third Post\ntime: 2010/01/15 08:00\ntags: web\n---\n\nLast.\n",
    );
    write_file(
        root,
        "contents/pages/about.md",
        "---\ntitle: About\n---\n\nAbout this site.\n",
    );
    write_file(
        root,
        "contents/pages/home.md",
        "---\ntitle: Home\nslug: /\n---\n\nWelcome.\n",
    );
    tmp
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an engine by name. Panics if not found.
pub fn find_engine<'a>(manifest: &'a Manifest, name: &str) -> &'a Engine {
    manifest
        .engines
        .iter()
        .find(|e| e.name() == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = manifest.engines.iter().map(Engine::name).collect();
            panic!("engine '{name}' not found. Available: {names:?}")
        })
}

/// Find a unit by title within an engine. Panics if not found.
pub fn find_unit<'a>(engine: &'a Engine, title: &str) -> &'a Unit {
    engine
        .units()
        .iter()
        .find(|u| u.title() == Some(title))
        .unwrap_or_else(|| {
            let titles: Vec<&str> = engine.units().iter().filter_map(Unit::title).collect();
            panic!("unit '{title}' not found. Available: {titles:?}")
        })
}

/// Titles of all units of an engine, in engine order.
pub fn unit_titles(engine: &Engine) -> Vec<&str> {
    engine.units().iter().filter_map(Unit::title).collect()
}
