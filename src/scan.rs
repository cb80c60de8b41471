//! Content scanning and manifest generation.
//!
//! Stage 1 of the build. Loads `config.toml`, then loads and prepares every
//! configured engine, producing a [`Manifest`] the generate stage consumes.
//! The manifest serializes to JSON for inspection (`simple-press scan`).
//!
//! ## Directory Structure
//!
//! ```text
//! project/                  # --source
//! ├── config.toml
//! ├── assets/
//! └── contents/             # site.content_dir
//!     ├── blog/             # engines.blog (content_dir defaults to the name)
//!     │   ├── hello.md
//!     │   └── 2010/
//!     │       └── older.md  # nested directories are walked
//!     └── pages/
//!         └── about.md
//! ```
//!
//! ## Validation
//!
//! Scanning fails on the first invalid unit, so a successful scan means:
//! - every unit header parsed and passed the protected/required checks
//! - every unit has a non-empty slug (or the explicit root slug)
//! - every unit permalink resolved, since units are chained after sorting

use crate::config::{self, ConfigError, SiteConfig};
use crate::engine::Engine;
use crate::page::UrlStyle;
use crate::permalink::PermalinkError;
use crate::unit::ContentError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("Permalink error: {0}")]
    Permalink(#[from] PermalinkError),
}

/// Manifest output from the scan stage.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub config: SiteConfig,
    pub engines: Vec<Engine>,
}

impl Manifest {
    pub fn style(&self) -> UrlStyle {
        UrlStyle::from_site(&self.config.site)
    }

    /// Total number of units across all engines.
    pub fn unit_count(&self) -> usize {
        self.engines.iter().map(|e| e.units().len()).sum()
    }
}

/// Load config and every configured engine under `root`.
pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    let config = config::load_config(root)?;
    let content_root = root.join(&config.site.content_dir);
    let style = UrlStyle::from_site(&config.site);

    let mut engines = Vec::with_capacity(config.engines.len());
    for (name, engine_config) in &config.engines {
        let mut engine = Engine::load(name, engine_config, &config.site, &content_root)?;
        engine.prepare(&style)?;
        engines.push(engine);
    }

    Ok(Manifest { config, engines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn scan_finds_all_engines() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let names: Vec<&str> = manifest.engines.iter().map(Engine::name).collect();
        assert_eq!(names, vec!["blog", "pages"]);
        assert_eq!(manifest.unit_count(), 5);
    }

    #[test]
    fn blog_units_sorted_newest_first() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let blog = find_engine(&manifest, "blog");
        assert_eq!(
            unit_titles(blog),
            vec!["Third Post", "Second Post", "First Post"]
        );
    }

    #[test]
    fn blog_units_are_chained() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let blog = find_engine(&manifest, "blog");
        let second = find_unit(blog, "Second Post");
        assert_eq!(second.permalink_prev(), Some("/blog/2010/01/third-post/"));
        assert_eq!(second.permalink_next(), Some("/blog/2009/10/first-post/"));
    }

    #[test]
    fn root_page_resolves_to_site_root() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let pages = find_engine(&manifest, "pages");
        let home = find_unit(pages, "Home");
        assert!(home.permalist().unwrap().is_empty());
        assert_eq!(home.permalink(&manifest.style()).unwrap(), "/");
    }

    #[test]
    fn unsorted_engine_keeps_path_order() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let pages = find_engine(&manifest, "pages");
        assert_eq!(unit_titles(pages), vec!["About", "Home"]);
    }

    #[test]
    fn no_config_means_no_engines() {
        let tmp = TempDir::new().unwrap();
        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.engines.is_empty());
        assert_eq!(manifest.config.site.title, "My Site");
    }

    #[test]
    fn invalid_unit_aborts_scan() {
        let tmp = setup_project();
        write_file(
            tmp.path(),
            "contents/blog/broken.md",
            "---\ntitle: Broken\ntime: yesterday\n---\n",
        );
        let err = scan(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::Content(_)));
        assert!(err.to_string().contains("broken.md"));
    }

    #[test]
    fn undated_post_fails_sort() {
        let tmp = setup_project();
        write_file(
            tmp.path(),
            "contents/blog/undated.md",
            "---\ntitle: Undated\n---\n",
        );
        assert!(matches!(
            scan(tmp.path()),
            Err(ScanError::Content(ContentError::SortKeyMissing { .. }))
        ));
    }

    #[test]
    fn manifest_serializes_units() {
        let tmp = setup_project();
        let manifest = scan(tmp.path()).unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        let blog = &json["engines"][0];
        assert_eq!(blog["name"], "blog");
        assert_eq!(blog["units"][0]["fields"]["title"], "Third Post");
        assert_eq!(blog["units"][0]["fields"]["tags"][0], "web");
        assert_eq!(json["config"]["site"]["title"], "Fixture Site");
    }
}
