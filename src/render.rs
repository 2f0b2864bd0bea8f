//! HTML rendering of composed pages.
//!
//! Takes the plan produced by [`compose`] and turns each entry into markup
//! with one renderer per section type. Renderers read only their own
//! section's props plus the section id; the hero additionally reads the
//! document-level logo, social links, and meta title, because those are
//! drawn inside the hero block.
//!
//! ## Degradation Rules
//!
//! - Items missing their required fields are skipped.
//! - A links/gallery/news/video section with no usable items renders
//!   nothing in [`RenderMode::Published`]. In [`RenderMode::Preview`] it
//!   renders a placeholder so the owner can see where the block sits.
//! - A hero with no usable slides falls back to the configured default
//!   slides; a hero never renders empty.
//! - A video URL that does not resolve to a supported platform renders an
//!   inert placeholder in place of that one video.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! All interpolated content is escaped.

use crate::compose::{ComposedSection, Renderer, compose};
use crate::config::{self, EngineConfig};
use crate::document::{
    Background, GalleryProps, HeroLayout, HeroProps, HeroSlide, Item, LinksProps, NewsItem,
    NewsLayout, NewsProps, PageConfig, PageKind, SectionBody, SectionKind, VideoDisplay,
    VideoLayout, VideoProps,
};
use crate::store::{Backend, ConfigStore, StoreError};
use crate::video;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("page not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS_STATIC: &str = include_str!("../static/page.css");
const CAROUSEL_JS: &str = include_str!("../static/carousel.js");

/// Whether the page is shown to visitors or to its owner while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Published,
    Preview,
}

/// Everything renderers need besides the document itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub mode: RenderMode,
    pub default_hero_slides: Vec<String>,
    pub carousel_interval_ms: u64,
    pub grid_gap: String,
    pub css: String,
}

impl RenderContext {
    pub fn from_config(config: &EngineConfig, mode: RenderMode) -> Self {
        let color_css = config::generate_color_css(&config.colors);
        Self {
            mode,
            default_hero_slides: config.render.default_hero_slides.clone(),
            carousel_interval_ms: config.render.carousel_interval_ms,
            grid_gap: config.render.grid_gap.clone(),
            css: format!("{color_css}\n\n{CSS_STATIC}"),
        }
    }

    fn preview(&self) -> bool {
        self.mode == RenderMode::Preview
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Render the published page for `slug`. Needs no owner identity.
pub fn render_published<B: Backend>(
    store: &ConfigStore<B>,
    slug: &str,
    ctx: &RenderContext,
) -> Result<Markup, RenderError> {
    let page = store
        .get_published(slug)?
        .ok_or_else(|| RenderError::NotFound(slug.to_string()))?;
    Ok(render_page(&page, ctx))
}

/// Render an owner's current draft as a preview.
pub fn render_draft_preview<B: Backend>(
    store: &ConfigStore<B>,
    owner_id: &str,
    ctx: &RenderContext,
) -> Result<Markup, RenderError> {
    let draft = store
        .get_draft(owner_id)?
        .ok_or_else(|| RenderError::NotFound(owner_id.to_string()))?;
    Ok(render_page(&draft, ctx))
}

/// Render a full HTML document for the page.
pub fn render_page(page: &PageConfig, ctx: &RenderContext) -> Markup {
    let plan = compose(page);
    let grid_style = format!("gap: {};", ctx.grid_gap);
    let content = html! {
        @if ctx.preview() {
            div.draft-banner { "Draft preview. Visitors see the last published version." }
        }
        main.page-grid style=(grid_style) {
            @for entry in &plan {
                (render_section(entry, page, ctx))
            }
        }
        @if plan.iter().any(|e| e.renderer == Renderer::Hero) {
            script { (PreEscaped(CAROUSEL_JS)) }
        }
    };
    base_document(page, PageKind::Home, ctx, content)
}

/// Render the news list sub-page: every news item as a grid.
pub fn render_news_page(page: &PageConfig, ctx: &RenderContext) -> Markup {
    let items = news_items(page);

    let content = html! {
        main.news-page.news-grid {
            h1 { "News" }
            div.news-items {
                @for item in &items {
                    (news_tile(item))
                }
            }
        }
    };
    base_document(page, PageKind::NewsList, ctx, content)
}

/// Valid items of the page's news section, if that section is enabled.
/// The first news section in stored order is the one the page renders.
fn news_items(page: &PageConfig) -> Vec<&NewsItem> {
    match page.section(SectionKind::News) {
        Some(section) if section.enabled => match &section.body {
            SectionBody::News(props) => props.items.iter().filter(|i| i.is_valid()).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Render one composed section inside its grid cell.
///
/// Returns empty markup when the section has nothing to show.
pub fn render_section(entry: &ComposedSection<'_>, page: &PageConfig, ctx: &RenderContext) -> Markup {
    let id = entry.section.id.as_str();
    let inner = match (entry.renderer, &entry.section.body) {
        (Renderer::Hero, SectionBody::Hero(props)) => Some(render_hero(props, id, page, ctx)),
        (Renderer::Links, SectionBody::Links(props)) => render_links(props, id),
        (Renderer::Gallery, SectionBody::Gallery(props)) => render_gallery(props, id),
        (Renderer::News, SectionBody::News(props)) => render_news(props, id),
        (Renderer::Video, SectionBody::Video(props)) => render_video(props, id),
        _ => {
            tracing::warn!(section_id = id, "renderer does not match section body");
            None
        }
    };

    let inner = match inner {
        Some(markup) => markup,
        None if ctx.preview() => placeholder(entry),
        None => return html! {},
    };
    let cell_style = format!("grid-column: span {};", entry.col_span.get());
    html! {
        div.section-cell style=(cell_style) data-section-id=(id) {
            (inner)
        }
    }
}

// ============================================================================
// Static export
// ============================================================================

/// One published page written by [`export_published`].
#[derive(Debug, Clone)]
pub struct ExportedPage {
    pub slug: String,
    /// Relative to the export root.
    pub files: Vec<PathBuf>,
    /// Number of sections that made it into the render plan.
    pub sections: usize,
}

/// Render every published page to `<out_dir>/<slug>/index.html`.
///
/// Pages with an enabled news section holding items also get
/// `<slug>/news/index.html`. Pages are rendered in parallel.
pub fn export_published<B: Backend>(
    store: &ConfigStore<B>,
    out_dir: &Path,
    ctx: &RenderContext,
) -> Result<Vec<ExportedPage>, RenderError> {
    let pages = store.list_published()?;
    pages
        .par_iter()
        .map(|(slug, page)| export_page(slug, page, out_dir, ctx))
        .collect()
}

fn export_page(
    slug: &str,
    page: &PageConfig,
    out_dir: &Path,
    ctx: &RenderContext,
) -> Result<ExportedPage, RenderError> {
    let mut files = Vec::new();
    let index = Path::new(slug).join("index.html");
    write_markup(out_dir, &index, render_page(page, ctx))?;
    files.push(index);

    if !news_items(page).is_empty() {
        let news = Path::new(slug).join("news").join("index.html");
        write_markup(out_dir, &news, render_news_page(page, ctx))?;
        files.push(news);
    }

    tracing::debug!(slug, files = files.len(), "exported page");
    Ok(ExportedPage {
        slug: slug.to_string(),
        files,
        sections: compose(page).len(),
    })
}

fn write_markup(out_dir: &Path, rel: &Path, markup: Markup) -> Result<(), RenderError> {
    let path = out_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, markup.into_string())?;
    Ok(())
}

// ============================================================================
// Document shell
// ============================================================================

fn base_document(page: &PageConfig, kind: PageKind, ctx: &RenderContext, content: Markup) -> Markup {
    let meta = page.meta.clone().unwrap_or_default();
    let title = meta.title.unwrap_or_else(|| "Untitled page".to_string());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if let Some(desc) = &meta.description {
                    meta name="description" content=(desc);
                }
                @if ctx.preview() {
                    meta name="robots" content="noindex";
                }
                title { (title) }
                style { (PreEscaped(&ctx.css)) }
            }
            body style=(background_style(page.background_for(kind))) {
                (content)
            }
        }
    }
}

/// Inline CSS for a page background.
pub fn background_style(background: &Background) -> String {
    match background {
        Background::Color(hex) => format!("background-color: {hex};"),
        Background::Image(url) => format!("background-image: url(\"{}\");", url.replace('"', "%22")),
    }
}

fn placeholder(entry: &ComposedSection<'_>) -> Markup {
    html! {
        div.section-placeholder {
            "Empty " (entry.section.type_name()) " section. Add items in the editor."
        }
    }
}

// ============================================================================
// Section renderers
// ============================================================================

fn render_hero(props: &HeroProps, id: &str, page: &PageConfig, ctx: &RenderContext) -> Markup {
    let own: Vec<HeroSlide> = props.slides.iter().filter(|s| s.is_valid()).cloned().collect();
    let slides = if own.is_empty() {
        ctx.default_hero_slides
            .iter()
            .enumerate()
            .map(|(i, src)| HeroSlide {
                id: format!("default-{i}"),
                src: src.clone(),
                alt: None,
                href: None,
            })
            .collect()
    } else {
        own
    };

    let layout_class = match props.layout {
        HeroLayout::Centered => "hero-centered",
        HeroLayout::Left => "hero-left",
        HeroLayout::Fullscreen => "hero-fullscreen",
    };
    let interval = props.carousel.interval_ms.unwrap_or(ctx.carousel_interval_ms);
    let autoplay = if props.carousel.autoplay && slides.len() > 1 { "true" } else { "false" };
    let title = props
        .title
        .as_deref()
        .or_else(|| page.meta.as_ref().and_then(|m| m.title.as_deref()));
    let logo = page.logo.as_ref().and_then(|l| {
        let src = l.src.as_deref().filter(|s| !s.is_empty())?;
        let opacity = l.opacity.unwrap_or(1.0).clamp(0.0, 1.0);
        Some((src, l.alt.as_deref().unwrap_or(""), format!("opacity: {opacity};")))
    });
    let socials: Vec<_> = page
        .social_links
        .iter()
        .filter(|l| l.enabled && !l.url.is_empty())
        .collect();

    html! {
        section class={ "hero " (layout_class) } id=(id) data-autoplay=(autoplay) data-interval=(interval) {
            @if let Some((src, alt, style)) = &logo {
                img.hero-logo src=(src) alt=(alt) style=(style);
            }
            div.hero-slides {
                @for (i, slide) in slides.iter().enumerate() {
                    figure.hero-slide.active[i == 0] {
                        @let alt = slide.alt.as_deref().unwrap_or("");
                        @if let Some(href) = &slide.href {
                            a href=(href) { img src=(slide.src) alt=(alt); }
                        } @else {
                            img src=(slide.src) alt=(alt);
                        }
                    }
                }
            }
            @if title.is_some() || props.subtitle.is_some() {
                div.hero-text {
                    @if let Some(t) = title { h1 { (t) } }
                    @if let Some(sub) = &props.subtitle { p { (sub) } }
                }
            }
            @if !socials.is_empty() {
                ul.social-links {
                    @for link in &socials {
                        li {
                            a href=(link.url) target="_blank" rel="noopener" data-icon=[link.icon.as_deref()] {
                                (link.name)
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_links(props: &LinksProps, id: &str) -> Option<Markup> {
    let items: Vec<_> = props.items.iter().filter(|i| i.is_valid()).collect();
    if items.is_empty() {
        return None;
    }
    Some(html! {
        section.links id=(id) {
            @if let Some(title) = &props.title { h2 { (title) } }
            ul.link-list {
                @for item in &items {
                    @let label = if item.label.is_empty() { item.url.as_str() } else { item.label.as_str() };
                    li {
                        a.link-button href=(item.url) target="_blank" rel="noopener" data-icon=[item.icon.as_deref()] {
                            (label)
                        }
                    }
                }
            }
        }
    })
}

fn render_gallery(props: &GalleryProps, id: &str) -> Option<Markup> {
    let items: Vec<_> = props.items.iter().filter(|i| i.is_valid()).collect();
    if items.is_empty() {
        return None;
    }
    let columns = props.columns.unwrap_or(3).clamp(1, 6);
    let style = format!("--gallery-columns: {columns};");
    Some(html! {
        section.gallery id=(id) style=(style) {
            @if let Some(title) = &props.title { h2 { (title) } }
            div.gallery-grid {
                @for image in &items {
                    figure {
                        img src=(image.src) alt=(image.alt.as_deref().unwrap_or("")) loading="lazy";
                        @if let Some(caption) = &image.caption {
                            figcaption { (caption) }
                        }
                    }
                }
            }
        }
    })
}

fn render_news(props: &NewsProps, id: &str) -> Option<Markup> {
    let items: Vec<_> = props.items.iter().filter(|i| i.is_valid()).collect();
    if items.is_empty() {
        return None;
    }
    let layout_class = match props.layout {
        NewsLayout::Strip => "news-strip",
        NewsLayout::Grid => "news-grid",
    };
    Some(html! {
        section class={ "news " (layout_class) } id=(id) {
            @if let Some(title) = &props.title { h2 { (title) } }
            div.news-items {
                @for item in &items {
                    (news_tile(item))
                }
            }
        }
    })
}

fn news_tile(item: &NewsItem) -> Markup {
    html! {
        a.news-item href=(item.href) {
            img src=(item.src) alt=(item.title.as_deref().unwrap_or("")) loading="lazy";
            @if let Some(title) = &item.title { span.news-title { (title) } }
            @if let Some(date) = &item.date { time datetime=(date) { (date) } }
        }
    }
}

fn render_video(props: &VideoProps, id: &str) -> Option<Markup> {
    let items: Vec<_> = props.items.iter().filter(|i| i.is_valid()).collect();
    if items.is_empty() {
        return None;
    }
    let layout_class = match props.layout {
        VideoLayout::Single => "video-single",
        VideoLayout::Grid => "video-grid",
    };
    Some(html! {
        section class={ "video " (layout_class) } id=(id) {
            @if let Some(title) = &props.title { h2 { (title) } }
            div.video-items {
                @for item in &items {
                    @let label = item.title.as_deref().unwrap_or("Video");
                    @match video::resolve(&item.url) {
                        Some(resolved) => {
                            @match props.display {
                                VideoDisplay::Embed => {
                                    iframe.video-frame src=(resolved.embed_url()) title=(label)
                                        loading="lazy" allowfullscreen
                                        allow="accelerometer; encrypted-media; picture-in-picture" {}
                                }
                                VideoDisplay::Thumbnail => {
                                    a.video-thumb href=(resolved.watch_url()) target="_blank" rel="noopener" {
                                        @if let Some(thumb) = resolved.thumbnail_url() {
                                            img src=(thumb) alt=(label) loading="lazy";
                                        } @else {
                                            span { (label) " on " (resolved.platform.name()) }
                                        }
                                    }
                                }
                            }
                        }
                        None => {
                            div.video-unavailable data-item-id=(item.id) { "Video unavailable" }
                        }
                    }
                }
            }
        }
    })
}
