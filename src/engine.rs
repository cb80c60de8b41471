//! Engines: one content type each (posts, pages, ...).
//!
//! An engine owns the units found under its content directory. Loading
//! parses every file in parallel; preparing sorts the units by the engine's
//! `sort_key` and chains their prev/next permalinks. Packs are built on
//! demand because they borrow the engine's units.

use crate::config::{EngineConfig, SiteSection};
use crate::pack::{Pack, PackError, Packer};
use crate::page::{UrlStyle, chain_permalinks};
use crate::scan::ScanError;
use crate::slug::Slugifier;
use crate::unit::{Unit, UnitOptions, sort_units};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Debug, Serialize)]
pub struct Engine {
    name: String,
    content_dir: PathBuf,
    #[serde(skip)]
    config: EngineConfig,
    #[serde(skip)]
    slugifier: Slugifier,
    units: Vec<Unit>,
}

impl Engine {
    /// Parse every unit file under `<content_root>/<content_dir>`.
    ///
    /// Files are discovered in sorted path order and parsed in parallel; the
    /// resulting order is the sorted path order. A missing directory yields
    /// an engine with no units.
    pub fn load(
        name: &str,
        config: &EngineConfig,
        site: &SiteSection,
        content_root: &Path,
    ) -> Result<Self, ScanError> {
        let content_dir = content_root.join(config.content_dir_or(name));
        let options = Arc::new(UnitOptions::new(config, site)?);

        let paths = discover_units(&content_dir)?;
        let units = paths
            .par_iter()
            .map(|path| Unit::from_file(path, Arc::clone(&options)))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(engine = name, count = units.len(), "created: units");

        Ok(Self {
            name: name.to_string(),
            content_dir,
            config: config.clone(),
            slugifier: options.slugifier.clone(),
            units,
        })
    }

    /// Sort units (when a sort key is configured) and chain their permalinks.
    pub fn prepare(&mut self, style: &UrlStyle) -> Result<(), ScanError> {
        if let Some(sort_key) = &self.config.sort_key {
            sort_units(&mut self.units, sort_key)?;
        }
        chain_permalinks(&mut self.units, style)?;
        tracing::debug!(engine = %self.name, "done: chaining units");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Build this engine's packs, keyed by base URL plus pattern.
    pub fn packs<'a>(
        &'a self,
        pack_url: &str,
        style: &UrlStyle,
    ) -> Result<BTreeMap<String, Vec<Pack<'a>>>, PackError> {
        let packer = Packer {
            units_per_pack: self.config.units_per_pack,
            pack_url,
            style,
            slugifier: &self.slugifier,
        };
        packer.build_packs(&self.units, &self.config.url, &self.config.packs)
    }
}

/// Regular files under `dir`, sorted by path. Hidden entries are skipped.
fn discover_units(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "content directory not found");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
