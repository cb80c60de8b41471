//! The page contract shared by units and packs.
//!
//! Anything that is written to its own HTML file implements [`Page`]: it has
//! an id for error messages and a permalist (ordered URL segments). URLs and
//! output paths are derived from the permalist according to the site's
//! [`UrlStyle`]:
//!
//! | permalist | `index_html_only` | permalink | output path |
//! |-----------|-------------------|-----------|-------------|
//! | `["blog", "hello"]` | true | `/blog/hello/` | `blog/hello/index.html` |
//! | `["blog", "hello"]` | false | `/blog/hello.html` | `blog/hello.html` |
//! | `[]` | true | `/` | `index.html` |
//! | `[]` | false | `/index.html` | `index.html` |

use crate::config::SiteSection;
use crate::permalink::PermalinkError;
use std::path::{Component, Path, PathBuf};

/// How permalists turn into URLs and file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlStyle {
    pub index_html_only: bool,
    /// Absolute site URL used by [`Page::permalink_abs`].
    pub site_url: String,
}

impl UrlStyle {
    pub fn from_site(site: &SiteSection) -> Self {
        Self {
            index_html_only: site.index_html_only,
            site_url: site.url.clone(),
        }
    }
}

impl Default for UrlStyle {
    fn default() -> Self {
        Self::from_site(&SiteSection::default())
    }
}

pub trait Page {
    fn id(&self) -> &str;

    /// Ordered URL path segments. Never contains empty segments.
    fn permalist(&self) -> Result<&[String], PermalinkError>;

    fn set_neighbors(&mut self, prev: Option<String>, next: Option<String>);

    /// Site-relative URL, always starting with `/`.
    fn permalink(&self, style: &UrlStyle) -> Result<String, PermalinkError> {
        let permalist = self.permalist()?;
        Ok(match (permalist.is_empty(), style.index_html_only) {
            (true, true) => "/".to_string(),
            (true, false) => "/index.html".to_string(),
            (false, true) => format!("/{}/", permalist.join("/")),
            (false, false) => format!("/{}.html", permalist.join("/")),
        })
    }

    fn permalink_abs(&self, style: &UrlStyle) -> Result<String, PermalinkError> {
        let permalink = self.permalink(style)?;
        let abs = format!(
            "{}/{}",
            style.site_url.trim_end_matches('/'),
            permalink.trim_start_matches('/')
        );
        Ok(abs.trim_matches('/').to_string())
    }

    /// File this page is written to under `site_dir`. Every segment must be
    /// one normal path component, so the result never leaves `site_dir`.
    fn output_path(&self, site_dir: &Path, style: &UrlStyle) -> Result<PathBuf, PermalinkError> {
        let permalist = self.permalist()?;
        if let Some(segment) = permalist.iter().find(|s| !is_plain_component(s)) {
            return Err(PermalinkError::UnsafeSegment {
                id: self.id().to_string(),
                segment: segment.clone(),
            });
        }
        let mut path = site_dir.to_path_buf();
        match permalist.split_last() {
            None => path.push("index.html"),
            Some(_) if style.index_html_only => {
                path.extend(permalist);
                path.push("index.html");
            }
            Some((last, parents)) => {
                path.extend(parents);
                path.push(format!("{last}.html"));
            }
        }
        Ok(path)
    }
}

/// True when `segment` is exactly one normal path component.
pub(crate) fn is_plain_component(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains(['/', '\\'])
}

/// Link consecutive pages: every page but the first gets the previous page's
/// permalink, every page but the last gets the next page's.
pub fn chain_permalinks<P: Page>(pages: &mut [P], style: &UrlStyle) -> Result<(), PermalinkError> {
    let links = pages
        .iter()
        .map(|p| p.permalink(style))
        .collect::<Result<Vec<_>, _>>()?;
    for (i, page) in pages.iter_mut().enumerate() {
        let prev = i.checked_sub(1).map(|j| links[j].clone());
        let next = links.get(i + 1).cloned();
        page.set_neighbors(prev, next);
    }
    Ok(())
}
