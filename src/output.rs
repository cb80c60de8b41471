//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every unit is shown
//! by its positional index and title, with the source file and permalink as
//! indented context lines. That makes scan output read as a content
//! inventory while still tracing each unit back to its file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Engines
//! 001 blog (3 units)
//!     Source: contents/blog/
//!     001 Third Post
//!         Source: contents/blog/third.md
//!         Permalink: /blog/2010/01/third-post/
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Generate / Check
//!
//! ```text
//! 001 blog (3 units)
//!     blog: 2 packs
//!     blog/tag/{tags}: 2 packs
//!
//! Extra pages
//!     404 → 404.html
//!
//! Generated 3 units, 4 packs, 1 extra page
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O beyond existence checks on the source tree.

use crate::generate::{EngineReport, GenerateReport};
use crate::page::Page;
use crate::scan::Manifest;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Format an engine header: positional index + name + unit count.
///
/// ```text
/// 001 blog (3 units)
/// ```
fn entity_header(index: usize, name: &str, units: usize) -> String {
    format!("{} {} ({})", format_index(index), name, plural(units, "unit"))
}

/// Format a unit line: titled units show the title, untitled the file name
/// in parens.
///
/// ```text
/// 001 The Sunset        // titled
/// 001 (home.md)         // untitled, the file IS the identity
/// ```
fn unit_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

/// `path` relative to `root` when possible.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing every engine and its units in engine
/// order.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let style = manifest.style();

    lines.push("Engines".to_string());
    if manifest.engines.is_empty() {
        lines.push("    All engines are off".to_string());
    }
    for (i, engine) in manifest.engines.iter().enumerate() {
        lines.push(entity_header(i + 1, engine.name(), engine.units().len()));
        lines.push(format!(
            "{}Source: {}/",
            indent(1),
            relative(engine.content_dir(), source_root)
        ));

        for (j, unit) in engine.units().iter().enumerate() {
            let path = Path::new(unit.id());
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| unit.id().to_string());
            lines.push(format!(
                "{}{}",
                indent(1),
                unit_line(j + 1, unit.title(), &filename)
            ));
            lines.push(format!("{}Source: {}", indent(2), relative(path, source_root)));
            match unit.permalink(&style) {
                Ok(link) => lines.push(format!("{}Permalink: {}", indent(2), link)),
                Err(e) => lines.push(format!("{}Permalink error: {}", indent(2), e)),
            }
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join("config.toml").exists() {
        lines.push(format!("{}config.toml", indent(1)));
    }
    let assets_dir = &manifest.config.site.assets_dir;
    if source_root.join(assets_dir).is_dir() {
        lines.push(format!("{}{}/", indent(1), assets_dir));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate / check output
// ============================================================================

fn engine_lines(index: usize, engine: &EngineReport, lines: &mut Vec<String>) {
    lines.push(entity_header(index, &engine.name, engine.units_written));
    for (key, count) in &engine.packs {
        lines.push(format!("{}{}: {}", indent(1), key, plural(*count, "pack")));
    }
}

fn summary(engines: &[EngineReport], extra_pages: usize) -> String {
    let units: usize = engines.iter().map(|e| e.units_written).sum();
    let packs: usize = engines
        .iter()
        .flat_map(|e| e.packs.iter().map(|(_, n)| n))
        .sum();
    let mut summary = format!("{}, {}", plural(units, "unit"), plural(packs, "pack"));
    if extra_pages > 0 {
        summary.push_str(&format!(", {}", plural(extra_pages, "extra page")));
    }
    summary
}

/// Format generate stage output: per engine the unit count and the packs
/// written per group, then extra pages and a summary line.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    if report.engines.is_empty() {
        return vec!["All engines are off".to_string()];
    }

    let mut lines = Vec::new();
    for (i, engine) in report.engines.iter().enumerate() {
        engine_lines(i + 1, engine, &mut lines);
    }

    if !report.extra_pages.is_empty() {
        lines.push(String::new());
        lines.push("Extra pages".to_string());
        for id in &report.extra_pages {
            lines.push(format!("{}{} → {}.html", indent(1), id, id));
        }
    }

    lines.push(String::new());
    let mut done = format!(
        "Generated {}",
        summary(&report.engines, report.extra_pages.len())
    );
    if report.assets_copied > 0 {
        done.push_str(&format!(", copied {}", plural(report.assets_copied, "asset")));
    }
    lines.push(done);
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

/// Format check output: the same per-engine breakdown as generate, nothing
/// written.
pub fn format_check_output(engines: &[EngineReport]) -> Vec<String> {
    if engines.is_empty() {
        return vec!["All engines are off".to_string()];
    }
    let mut lines = Vec::new();
    for (i, engine) in engines.iter().enumerate() {
        engine_lines(i + 1, engine, &mut lines);
    }
    lines.push(String::new());
    lines.push(format!("OK: {}", summary(engines, 0)));
    lines
}

pub fn print_check_output(engines: &[EngineReport]) {
    for line in format_check_output(engines) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
