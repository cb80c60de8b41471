//! Rendering: turning a unit or pack into output text.
//!
//! The generate stage only depends on the [`Renderer`] trait: given a
//! template id, a page, and the ambient site/engine config, produce a
//! string. [`HtmlRenderer`] is the built-in implementation, a small set of
//! [Maud](https://maud.lambda.xyz/) templates:
//!
//! | Template | Page | Content |
//! |----------|------|---------|
//! | `unit` | unit | title, display times, tags, markdown body, prev/next |
//! | `pack` | pack | title, unit list with links, prev/next |
//! | `404` | standalone | not-found page |
//!
//! Unit bodies are markdown, converted with `pulldown-cmark`. Everything
//! else is interpolated through Maud and escaped.

use crate::config::{EngineConfig, SiteSection};
use crate::pack::Pack;
use crate::page::{Page, UrlStyle};
use crate::permalink::PermalinkError;
use crate::types::{FieldValue, format_datetime};
use crate::unit::Unit;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use thiserror::Error;

const CSS: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No template '{template}' for {kind} pages")]
    UnknownTemplate {
        template: String,
        kind: &'static str,
    },
    #[error("Invalid display datetime format '{0}'")]
    BadFormat(String),
    #[error(transparent)]
    Permalink(#[from] PermalinkError),
}

/// The page handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub enum PageRef<'p> {
    Unit(&'p Unit),
    Pack(&'p Pack<'p>),
    /// A site-level page with no unit or pack behind it (`extra_pages`).
    Standalone(&'p str),
}

impl PageRef<'_> {
    fn kind(&self) -> &'static str {
        match self {
            PageRef::Unit(_) => "unit",
            PageRef::Pack(_) => "pack",
            PageRef::Standalone(_) => "standalone",
        }
    }
}

/// Read-only config view passed to every render call.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'c> {
    pub site: &'c SiteSection,
    /// The engine that owns the page; `None` for standalone pages.
    pub engine: Option<&'c EngineConfig>,
    pub style: &'c UrlStyle,
}

pub trait Renderer {
    fn render(
        &self,
        template: &str,
        page: PageRef<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError>;
}

/// Built-in HTML renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(
        &self,
        template: &str,
        page: PageRef<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError> {
        let markup = match (template, page) {
            ("unit", PageRef::Unit(unit)) => render_unit(unit, ctx)?,
            ("pack", PageRef::Pack(pack)) => render_pack(pack, ctx)?,
            ("404", _) => render_not_found(ctx),
            (other, page) => {
                return Err(RenderError::UnknownTemplate {
                    template: other.to_string(),
                    kind: page.kind(),
                });
            }
        };
        Ok(markup.into_string())
    }
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, site: &SiteSection, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | " (site.title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                header.site-header {
                    a href="/" { (site.title) }
                }
                (content)
            }
        }
    }
}

fn pager(prev: Option<&str>, next: Option<&str>) -> Markup {
    html! {
        @if prev.is_some() || next.is_some() {
            nav.pager {
                @if let Some(href) = prev {
                    a rel="prev" href=(href) { "← Newer" }
                } @else {
                    span {}
                }
                @if let Some(href) = next {
                    a rel="next" href=(href) { "Older →" }
                }
            }
        }
    }
}

fn markdown_to_html(text: &str) -> String {
    let parser = Parser::new(text);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

/// The unit's datetime fields formatted with the engine's display format.
fn display_times(unit: &Unit, engine: Option<&EngineConfig>) -> Result<Vec<String>, RenderError> {
    let Some(engine) = engine else {
        return Ok(Vec::new());
    };
    let format = &engine.display_datetime_format;
    engine
        .fields_as_datetime
        .iter()
        .filter_map(|field| unit.get(field).and_then(FieldValue::as_datetime))
        .map(|dt| format_datetime(dt, format).map_err(|_| RenderError::BadFormat(format.clone())))
        .collect()
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_unit(unit: &Unit, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
    let title = unit.title().unwrap_or(unit.slug());
    let times = display_times(unit, ctx.engine)?;
    let tags = unit.get("tags").and_then(FieldValue::as_list).unwrap_or_default();
    let body = markdown_to_html(unit.content());

    let content = html! {
        main.unit-page {
            article {
                h1 { (title) }
                @for time in &times {
                    p.meta { (time) }
                }
                @if !tags.is_empty() {
                    ul.tags {
                        @for tag in tags {
                            li { (tag) }
                        }
                    }
                }
                (PreEscaped(body))
            }
            (pager(unit.permalink_prev(), unit.permalink_next()))
        }
    };
    Ok(base_document(title, ctx.site, content))
}

fn render_pack(pack: &Pack<'_>, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
    let title = pack.title().unwrap_or(&ctx.site.title);

    let mut entries = Vec::with_capacity(pack.units().len());
    for unit in pack.units() {
        let href = unit.permalink(ctx.style)?;
        let time = display_times(unit, ctx.engine)?.into_iter().next();
        entries.push((unit.title().unwrap_or(unit.slug()), href, time));
    }

    let content = html! {
        main.pack-page {
            h1 { (title) }
            @if pack.index() > 1 {
                p.meta { "Page " (pack.index()) }
            }
            ul.pack-list {
                @for (unit_title, href, time) in &entries {
                    li {
                        a href=(href) { (unit_title) }
                        @if let Some(time) = time {
                            br;
                            span.meta { (time) }
                        }
                    }
                }
            }
            (pager(pack.permalink_prev(), pack.permalink_next()))
        }
    };
    Ok(base_document(title, ctx.site, content))
}

fn render_not_found(ctx: &RenderContext<'_>) -> Markup {
    let content = html! {
        main.not-found {
            h1 { "Page not found" }
            p { a href="/" { "Back to " (ctx.site.title) } }
        }
    };
    base_document("Not found", ctx.site, content)
}
