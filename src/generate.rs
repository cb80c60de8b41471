//! Static site generation.
//!
//! Stage 2 of the build. Takes the scanned [`Manifest`] and writes every page
//! through a [`Renderer`]:
//!
//! 1. The output directory is cleared and the assets directory copied in.
//! 2. Per engine, every unit is rendered with the engine's `unit_template`,
//!    then its packs are built and rendered with `pack_template`.
//! 3. Each `site.extra_pages` template id is rendered to `<output>/<id>.html`.
//!
//! ## Output Structure
//!
//! ```text
//! site/
//! ├── index.html                   # unit with `slug: /`, or the root pack
//! ├── style.css                    # copied from assets/
//! ├── about/index.html             # unit, index_html_only = true
//! └── blog/
//!     ├── index.html               # pack 1 of pattern ""
//!     ├── page/2/index.html        # pack 2 (site.pack_url = "page")
//!     ├── tag/rust/index.html      # pack of pattern "tag/{tags}"
//!     └── 2009/10/hello/index.html # unit
//! ```
//!
//! No page ever overwrites another: two pages resolving to the same output
//! path abort the run with [`GenerateError::Exists`].

use crate::engine::Engine;
use crate::pack::PackError;
use crate::page::{Page, UrlStyle};
use crate::permalink::PermalinkError;
use crate::render::{PageRef, RenderContext, RenderError, Renderer};
use crate::scan::{self, Manifest, ScanError};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Refusing to overwrite existing file: {}", .0.display())]
    Exists(PathBuf),
    #[error("Output directory {} contains the source directory", .0.display())]
    OutputContainsSource(PathBuf),
    #[error("Failed to copy assets from '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Pack error: {0}")]
    Pack(#[from] PackError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Permalink error: {0}")]
    Permalink(#[from] PermalinkError),
}

/// What one generate run wrote.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub engines: Vec<EngineReport>,
    pub extra_pages: Vec<String>,
    pub assets_copied: usize,
}

impl GenerateReport {
    pub fn pages_written(&self) -> usize {
        self.engines
            .iter()
            .map(|e| e.units_written + e.packs.iter().map(|(_, n)| n).sum::<usize>())
            .sum::<usize>()
            + self.extra_pages.len()
    }
}

#[derive(Debug)]
pub struct EngineReport {
    pub name: String,
    pub units_written: usize,
    /// Pack group key and the number of pack pages written for it.
    pub packs: Vec<(String, usize)>,
}

/// Scan `source_root` and generate the site into `output_dir`.
pub fn build(
    source_root: &Path,
    output_dir: &Path,
    renderer: &dyn Renderer,
) -> Result<(Manifest, GenerateReport), GenerateError> {
    let manifest = scan::scan(source_root)?;
    let report = generate(&manifest, source_root, output_dir, renderer)?;
    Ok((manifest, report))
}

pub fn generate(
    manifest: &Manifest,
    source_root: &Path,
    output_dir: &Path,
    renderer: &dyn Renderer,
) -> Result<GenerateReport, GenerateError> {
    if manifest.engines.is_empty() {
        tracing::warn!("All engines are off");
        return Ok(GenerateReport::default());
    }

    let site = &manifest.config.site;
    let style = manifest.style();
    let assets_copied = prepare_output(&source_root.join(&site.assets_dir), source_root, output_dir)?;

    let mut report = GenerateReport {
        assets_copied,
        ..GenerateReport::default()
    };
    for engine in &manifest.engines {
        report
            .engines
            .push(write_engine(engine, manifest, &style, output_dir, renderer)?);
    }

    let ctx = RenderContext {
        site,
        engine: None,
        style: &style,
    };
    for id in &site.extra_pages {
        let text = renderer.render(id, PageRef::Standalone(id), &ctx)?;
        write_output(&output_dir.join(format!("{id}.html")), &text)?;
        report.extra_pages.push(id.clone());
    }

    tracing::debug!(pages = report.pages_written(), "done: generating site");
    Ok(report)
}

fn write_engine(
    engine: &Engine,
    manifest: &Manifest,
    style: &UrlStyle,
    output_dir: &Path,
    renderer: &dyn Renderer,
) -> Result<EngineReport, GenerateError> {
    let config = engine.config();
    let ctx = RenderContext {
        site: &manifest.config.site,
        engine: Some(config),
        style,
    };

    for unit in engine.units() {
        let text = renderer.render(&config.unit_template, PageRef::Unit(unit), &ctx)?;
        write_output(&unit.output_path(output_dir, style)?, &text)?;
    }
    tracing::debug!(engine = engine.name(), "done: writing units");

    let groups = engine.packs(&manifest.config.site.pack_url, style)?;
    let mut packs = Vec::with_capacity(groups.len());
    for (key, group) in &groups {
        for pack in group {
            let text = renderer.render(&config.pack_template, PageRef::Pack(pack), &ctx)?;
            write_output(&pack.output_path(output_dir, style)?, &text)?;
        }
        packs.push((key.clone(), group.len()));
    }
    tracing::debug!(engine = engine.name(), "done: writing packs");

    Ok(EngineReport {
        name: engine.name().to_string(),
        units_written: engine.units().len(),
        packs,
    })
}

/// Resolve every page a generate run would write, without writing anything.
///
/// Fails with the same permalink and pack errors as [`generate`], and with
/// [`GenerateError::Exists`] when two pages resolve to the same output path.
/// Templates are not rendered.
pub fn check(manifest: &Manifest) -> Result<Vec<EngineReport>, GenerateError> {
    let style = manifest.style();
    let site = &manifest.config.site;
    let root = Path::new("");
    let mut claimed = HashSet::new();

    let mut reports = Vec::with_capacity(manifest.engines.len());
    for engine in &manifest.engines {
        for unit in engine.units() {
            claim(&mut claimed, unit.output_path(root, &style)?)?;
        }
        let groups = engine.packs(&site.pack_url, &style)?;
        let mut packs = Vec::with_capacity(groups.len());
        for (key, group) in &groups {
            for pack in group {
                claim(&mut claimed, pack.output_path(root, &style)?)?;
            }
            packs.push((key.clone(), group.len()));
        }
        reports.push(EngineReport {
            name: engine.name().to_string(),
            units_written: engine.units().len(),
            packs,
        });
    }
    for id in &site.extra_pages {
        claim(&mut claimed, PathBuf::from(format!("{id}.html")))?;
    }
    Ok(reports)
}

fn claim(claimed: &mut HashSet<PathBuf>, path: PathBuf) -> Result<(), GenerateError> {
    if claimed.contains(&path) {
        return Err(GenerateError::Exists(path));
    }
    claimed.insert(path);
    Ok(())
}

/// Write `text` to `path`, creating parent directories. Never overwrites.
pub fn write_output(path: &Path, text: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(GenerateError::Exists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(text.as_bytes())?;
    tracing::debug!(path = %path.display(), "written");
    Ok(())
}

/// Clear `output_dir` and copy `assets_dir` into it. Returns the number of
/// files copied; a missing assets directory copies nothing.
fn prepare_output(
    assets_dir: &Path,
    source_root: &Path,
    output_dir: &Path,
) -> Result<usize, GenerateError> {
    if output_dir.exists() {
        let out = output_dir.canonicalize()?;
        if source_root.canonicalize()?.starts_with(&out) {
            return Err(GenerateError::OutputContainsSource(out));
        }
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    if !assets_dir.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(assets_dir) {
        let entry = entry.map_err(|source| GenerateError::Walk {
            path: assets_dir.to_path_buf(),
            source,
        })?;
        let Ok(rel) = entry.path().strip_prefix(assets_dir) else {
            continue;
        };
        let dst = output_dir.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dst)?;
            copied += 1;
        }
    }
    tracing::debug!(count = copied, "done: copying assets");
    Ok(copied)
}
