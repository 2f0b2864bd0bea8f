//! Page document model.
//!
//! A page is a single JSON document ([`PageConfig`]) holding a background,
//! an unordered bag of [`Section`]s, and a few document-level attachments
//! (logo, social links, meta). The same shape is stored in both the draft
//! and the published slot, so everything here is plain data: no I/O, no
//! rendering, no knowledge of who owns the page.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "background": { "type": "color", "value": "#101010" },
//!   "sections": [
//!     { "id": "hero-1717171717000", "type": "hero", "enabled": true, "order": 0,
//!       "props": { "slides": [{ "id": "slide-1", "src": "/a.jpg" }] } },
//!     { "id": "news-1717171717001", "type": "news", "enabled": false, "order": 2,
//!       "props": { "items": [], "layout": "strip" }, "layout": { "colSpan": 2 } }
//!   ],
//!   "socialLinks": [{ "id": "ig", "name": "Instagram", "url": "https://…", "enabled": true }],
//!   "meta": { "title": "My page" }
//! }
//! ```
//!
//! ## Schema Evolution
//!
//! Documents outlive the binary that wrote them. Every optional field is
//! `#[serde(default)]`, and unknown keys are ignored rather than rejected.
//! A section whose `type` this build does not know, or whose `props` no
//! longer decode, is kept as [`SectionBody::Opaque`] so it survives a
//! load/save round trip untouched; the composition step drops it from
//! rendered output.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Root document
// ============================================================================

/// The root page document. Identical shape for draft and published slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default)]
    pub background: Background,
    /// Stored order is not render order; see [`crate::compose`].
    ///
    /// Sections are reference-counted so an edit can replace one entry
    /// while every other entry stays pointer-identical to earlier snapshots.
    #[serde(default)]
    pub sections: Vec<Arc<Section>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub social_links: Vec<SocialLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// Background override for the blog list sub-page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_background: Option<Background>,
    /// Background override for the news list sub-page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_background: Option<Background>,
}

/// Sub-pages that may carry their own background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    BlogList,
    NewsList,
}

impl PageConfig {
    /// First section of the given type, in stored order.
    pub fn section(&self, kind: SectionKind) -> Option<&Arc<Section>> {
        self.sections.iter().find(|s| s.kind() == Some(kind))
    }

    pub fn section_by_id(&self, id: &str) -> Option<&Arc<Section>> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// Whether any section, item, or social link already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.sections
            .iter()
            .any(|s| s.id == id || s.body.item_ids().any(|item| item == id))
            || self.social_links.iter().any(|l| l.id == id)
    }

    /// Background for a sub-page, falling back to the page background.
    pub fn background_for(&self, kind: PageKind) -> &Background {
        let scoped = match kind {
            PageKind::Home => None,
            PageKind::BlogList => self.blog_background.as_ref(),
            PageKind::NewsList => self.news_background.as_ref(),
        };
        scoped.unwrap_or(&self.background)
    }

    /// Remove every item whose required fields are empty.
    ///
    /// Sections with nothing to strip are left pointer-identical. Returns
    /// the number of items removed. Applying this twice is the same as
    /// applying it once.
    pub fn strip_invalid_items(&mut self) -> usize {
        let mut removed = 0;
        for section in &mut self.sections {
            if section.body.invalid_item_count() == 0 {
                continue;
            }
            removed += Arc::make_mut(section).body.retain_valid_items();
        }
        removed
    }

    /// First invalid item left in the document, as `(section_id, item_id)`.
    pub fn first_invalid_item(&self) -> Option<(&str, &str)> {
        self.sections.iter().find_map(|s| {
            s.body
                .first_invalid_item_id()
                .map(|item| (s.id.as_str(), item))
        })
    }

    /// Content hash of the canonical JSON form.
    ///
    /// Two documents with the same revision serialize identically.
    pub fn revision(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

/// Page background: a solid color or an image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Background {
    Color(String),
    Image(String),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color("#ffffff".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// 0.0 (transparent) to 1.0 (opaque).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_enabled() -> bool {
    true
}

// ============================================================================
// Sections
// ============================================================================

/// The closed set of section types this build knows how to edit and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Hero,
    Links,
    Gallery,
    News,
    Video,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Hero,
        SectionKind::Links,
        SectionKind::Gallery,
        SectionKind::News,
        SectionKind::Video,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::Links => "links",
            SectionKind::Gallery => "gallery",
            SectionKind::News => "news",
            SectionKind::Video => "video",
        }
    }

    /// Whether a page holds at most one section of this type.
    ///
    /// Every current type is a singleton; the hook exists so a future
    /// multi-instance type only has to change this match.
    pub fn is_singleton(self) -> bool {
        match self {
            SectionKind::Hero
            | SectionKind::Links
            | SectionKind::Gallery
            | SectionKind::News
            | SectionKind::Video => true,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSectionKind(pub String);

impl fmt::Display for UnknownSectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section type '{}'", self.0)
    }
}

impl std::error::Error for UnknownSectionKind {}

impl FromStr for SectionKind {
    type Err = UnknownSectionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownSectionKind(s.to_string()))
    }
}

/// One content block of the page.
///
/// `id` and the section type are fixed at creation; everything else is
/// editable. Serialized as a flat `{id, type, enabled, order, props, layout}`
/// object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSection", into = "RawSection")]
pub struct Section {
    pub id: String,
    /// Disabled sections stay in the draft but never render.
    pub enabled: bool,
    /// Render position among non-hero sections. Not unique, not contiguous.
    pub order: i64,
    pub layout: Option<SectionLayout>,
    pub body: SectionBody,
}

impl Section {
    pub fn new(id: impl Into<String>, order: i64, body: SectionBody) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            order,
            layout: None,
            body,
        }
    }

    /// `None` for opaque sections.
    pub fn kind(&self) -> Option<SectionKind> {
        self.body.kind()
    }

    /// The `type` discriminant as stored, known or not.
    pub fn type_name(&self) -> &str {
        match &self.body {
            SectionBody::Opaque { kind, .. } => kind,
            body => body.kind().map(SectionKind::as_str).unwrap_or_default(),
        }
    }

    pub fn col_span(&self) -> Option<u8> {
        self.layout.as_ref().and_then(|l| l.col_span)
    }
}

/// Presentation hints shared by every section type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    /// Grid columns out of 4. Out-of-range values are clamped at compose time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u8>,
}

/// Type-specific payload of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Hero(HeroProps),
    Links(LinksProps),
    Gallery(GalleryProps),
    News(NewsProps),
    Video(VideoProps),
    /// A section this build cannot interpret, preserved verbatim.
    Opaque { kind: String, props: Value },
}

impl SectionBody {
    /// Empty props for a freshly created section.
    pub fn empty(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Hero => SectionBody::Hero(HeroProps::default()),
            SectionKind::Links => SectionBody::Links(LinksProps::default()),
            SectionKind::Gallery => SectionBody::Gallery(GalleryProps::default()),
            SectionKind::News => SectionBody::News(NewsProps::default()),
            SectionKind::Video => SectionBody::Video(VideoProps::default()),
        }
    }

    pub fn kind(&self) -> Option<SectionKind> {
        match self {
            SectionBody::Hero(_) => Some(SectionKind::Hero),
            SectionBody::Links(_) => Some(SectionKind::Links),
            SectionBody::Gallery(_) => Some(SectionKind::Gallery),
            SectionBody::News(_) => Some(SectionKind::News),
            SectionBody::Video(_) => Some(SectionKind::Video),
            SectionBody::Opaque { .. } => None,
        }
    }

    /// Decode `props` for a known type. Unknown types and undecodable
    /// props both come back as [`SectionBody::Opaque`].
    pub fn decode(kind: &str, props: Value) -> Self {
        let Ok(known) = kind.parse::<SectionKind>() else {
            return SectionBody::Opaque {
                kind: kind.to_string(),
                props,
            };
        };
        Self::try_decode(known, props.clone()).unwrap_or_else(|err| {
            tracing::warn!(section_type = kind, %err, "section props failed to decode, keeping as opaque");
            SectionBody::Opaque {
                kind: kind.to_string(),
                props,
            }
        })
    }

    /// Decode `props` as `kind`, reporting the error instead of falling
    /// back to opaque. `null` props decode as empty.
    pub fn try_decode(kind: SectionKind, props: Value) -> Result<Self, serde_json::Error> {
        let input = if props.is_null() {
            Value::Object(Default::default())
        } else {
            props
        };
        match kind {
            SectionKind::Hero => serde_json::from_value(input).map(SectionBody::Hero),
            SectionKind::Links => serde_json::from_value(input).map(SectionBody::Links),
            SectionKind::Gallery => serde_json::from_value(input).map(SectionBody::Gallery),
            SectionKind::News => serde_json::from_value(input).map(SectionBody::News),
            SectionKind::Video => serde_json::from_value(input).map(SectionBody::Video),
        }
    }

    /// Encode `props` back to JSON.
    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        match self {
            SectionBody::Hero(p) => serde_json::to_value(p),
            SectionBody::Links(p) => serde_json::to_value(p),
            SectionBody::Gallery(p) => serde_json::to_value(p),
            SectionBody::News(p) => serde_json::to_value(p),
            SectionBody::Video(p) => serde_json::to_value(p),
            SectionBody::Opaque { props, .. } => Ok(props.clone()),
        }
    }

    fn item_ids(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            SectionBody::Hero(p) => Box::new(p.slides.iter().map(Item::id)),
            SectionBody::Links(p) => Box::new(p.items.iter().map(Item::id)),
            SectionBody::Gallery(p) => Box::new(p.items.iter().map(Item::id)),
            SectionBody::News(p) => Box::new(p.items.iter().map(Item::id)),
            SectionBody::Video(p) => Box::new(p.items.iter().map(Item::id)),
            SectionBody::Opaque { .. } => Box::new(std::iter::empty()),
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_ids().count()
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.item_ids().any(|id| id == item_id)
    }

    fn invalid_item_count(&self) -> usize {
        match self {
            SectionBody::Hero(p) => count_invalid(&p.slides),
            SectionBody::Links(p) => count_invalid(&p.items),
            SectionBody::Gallery(p) => count_invalid(&p.items),
            SectionBody::News(p) => count_invalid(&p.items),
            SectionBody::Video(p) => count_invalid(&p.items),
            SectionBody::Opaque { .. } => 0,
        }
    }

    fn first_invalid_item_id(&self) -> Option<&str> {
        match self {
            SectionBody::Hero(p) => first_invalid(&p.slides),
            SectionBody::Links(p) => first_invalid(&p.items),
            SectionBody::Gallery(p) => first_invalid(&p.items),
            SectionBody::News(p) => first_invalid(&p.items),
            SectionBody::Video(p) => first_invalid(&p.items),
            SectionBody::Opaque { .. } => None,
        }
    }

    fn retain_valid_items(&mut self) -> usize {
        match self {
            SectionBody::Hero(p) => retain_valid(&mut p.slides),
            SectionBody::Links(p) => retain_valid(&mut p.items),
            SectionBody::Gallery(p) => retain_valid(&mut p.items),
            SectionBody::News(p) => retain_valid(&mut p.items),
            SectionBody::Video(p) => retain_valid(&mut p.items),
            SectionBody::Opaque { .. } => 0,
        }
    }

    /// Give every item with an empty or repeated id a new one from `fresh`,
    /// which is called with the item type's id prefix. Returns the number of
    /// ids assigned.
    pub fn assign_missing_item_ids(&mut self, mut fresh: impl FnMut(&str) -> String) -> usize {
        match self {
            SectionBody::Hero(p) => assign_ids(&mut p.slides, &mut fresh),
            SectionBody::Links(p) => assign_ids(&mut p.items, &mut fresh),
            SectionBody::Gallery(p) => assign_ids(&mut p.items, &mut fresh),
            SectionBody::News(p) => assign_ids(&mut p.items, &mut fresh),
            SectionBody::Video(p) => assign_ids(&mut p.items, &mut fresh),
            SectionBody::Opaque { .. } => 0,
        }
    }

    /// Remove the item with `item_id`. Returns whether anything was removed.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        match self {
            SectionBody::Hero(p) => remove_by_id(&mut p.slides, item_id),
            SectionBody::Links(p) => remove_by_id(&mut p.items, item_id),
            SectionBody::Gallery(p) => remove_by_id(&mut p.items, item_id),
            SectionBody::News(p) => remove_by_id(&mut p.items, item_id),
            SectionBody::Video(p) => remove_by_id(&mut p.items, item_id),
            SectionBody::Opaque { .. } => false,
        }
    }

    /// Whether this body holds no renderable items.
    pub fn is_empty(&self) -> bool {
        match self {
            SectionBody::Hero(p) => p.slides.is_empty(),
            SectionBody::Links(p) => p.items.is_empty(),
            SectionBody::Gallery(p) => p.items.is_empty(),
            SectionBody::News(p) => p.items.is_empty(),
            SectionBody::Video(p) => p.items.is_empty(),
            SectionBody::Opaque { .. } => true,
        }
    }
}

/// Sub-entity inside a section's `props` list.
pub trait Item {
    /// Prefix of generated ids, as in `"slide-1718000000000"`.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    /// Whether the required fields are filled in. Invalid items are allowed
    /// while editing and stripped before a draft is persisted.
    fn is_valid(&self) -> bool;
}

fn count_invalid<T: Item>(items: &[T]) -> usize {
    items.iter().filter(|i| !i.is_valid()).count()
}

fn first_invalid<T: Item>(items: &[T]) -> Option<&str> {
    items.iter().find(|i| !i.is_valid()).map(Item::id)
}

fn retain_valid<T: Item>(items: &mut Vec<T>) -> usize {
    let before = items.len();
    items.retain(Item::is_valid);
    before - items.len()
}

fn assign_ids<T: Item>(items: &mut [T], fresh: &mut impl FnMut(&str) -> String) -> usize {
    let taken: HashSet<String> = items.iter().map(|i| i.id().to_string()).collect();
    let mut seen = HashSet::new();
    let mut assigned = 0;
    for item in items.iter_mut() {
        if !item.id().is_empty() && seen.insert(item.id().to_string()) {
            continue;
        }
        let id = loop {
            let id = fresh(T::ID_PREFIX);
            if !taken.contains(&id) && !seen.contains(&id) {
                break id;
            }
        };
        seen.insert(id.clone());
        item.set_id(id);
        assigned += 1;
    }
    assigned
}

fn remove_by_id<T: Item>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|i| i.id() != id);
    items.len() != before
}

/// Flat on-disk form of a [`Section`].
#[derive(Serialize, Deserialize)]
struct RawSection {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    order: i64,
    #[serde(default)]
    props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<SectionLayout>,
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        Section {
            body: SectionBody::decode(&raw.kind, raw.props),
            id: raw.id,
            enabled: raw.enabled,
            order: raw.order,
            layout: raw.layout,
        }
    }
}

impl From<Section> for RawSection {
    fn from(section: Section) -> Self {
        RawSection {
            kind: section.type_name().to_string(),
            props: section.body.encode().unwrap_or_default(),
            id: section.id,
            enabled: section.enabled,
            order: section.order,
            layout: section.layout,
        }
    }
}

/// Deserialize a field, falling back to its default when the stored value
/// is not one this build understands (e.g. a layout name added later).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

// ============================================================================
// Hero
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroProps {
    #[serde(default)]
    pub slides: Vec<HeroSlide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub carousel: CarouselSettings,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: HeroLayout,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSlide {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Item for HeroSlide {
    const ID_PREFIX: &'static str = "slide";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn is_valid(&self) -> bool {
        !self.src.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSettings {
    #[serde(default = "default_enabled")]
    pub autoplay: bool,
    /// Milliseconds per slide. `None` uses the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            autoplay: true,
            interval_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroLayout {
    #[default]
    Centered,
    Left,
    Fullscreen,
}

// ============================================================================
// Links
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksProps {
    #[serde(default)]
    pub items: Vec<LinkItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Item for LinkItem {
    const ID_PREFIX: &'static str = "link";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn is_valid(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryProps {
    #[serde(default)]
    pub items: Vec<GalleryImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Thumbnail columns inside the section (1-6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Item for GalleryImage {
    const ID_PREFIX: &'static str = "image";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn is_valid(&self) -> bool {
        !self.src.trim().is_empty()
    }
}

// ============================================================================
// News
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsProps {
    #[serde(default)]
    pub items: Vec<NewsItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: NewsLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A news tile: an image that links somewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Item for NewsItem {
    const ID_PREFIX: &'static str = "news-item";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn is_valid(&self) -> bool {
        !self.src.trim().is_empty() && !self.href.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsLayout {
    #[default]
    Strip,
    Grid,
}

// ============================================================================
// Video
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProps {
    #[serde(default)]
    pub items: Vec<VideoItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: VideoLayout,
    #[serde(default, deserialize_with = "lenient")]
    pub display: VideoDisplay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    #[serde(default)]
    pub id: String,
    /// Watch/share URL on a supported platform.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Item for VideoItem {
    const ID_PREFIX: &'static str = "video-item";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn is_valid(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoLayout {
    #[default]
    Single,
    Grid,
}

/// Whether videos embed a player inline or show a linked thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDisplay {
    #[default]
    Embed,
    Thumbnail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn background_wire_format() {
        let bg = Background::Color("#123456".into());
        assert_eq!(
            serde_json::to_value(&bg).unwrap(),
            json!({"type": "color", "value": "#123456"})
        );
        let img: Background =
            serde_json::from_value(json!({"type": "image", "value": "/bg.jpg"})).unwrap();
        assert_eq!(img, Background::Image("/bg.jpg".into()));
    }

    #[test]
    fn section_decodes_known_type() {
        let section: Section = serde_json::from_value(json!({
            "id": "hero-1",
            "type": "hero",
            "enabled": true,
            "order": 3,
            "props": { "slides": [{ "id": "s1", "src": "/a.jpg" }], "title": "Hi" },
            "layout": { "colSpan": 2 }
        }))
        .unwrap();
        assert_eq!(section.kind(), Some(SectionKind::Hero));
        assert_eq!(section.order, 3);
        assert_eq!(section.col_span(), Some(2));
        let SectionBody::Hero(props) = &section.body else {
            panic!("expected hero body");
        };
        assert_eq!(props.slides[0].src, "/a.jpg");
        assert_eq!(props.title.as_deref(), Some("Hi"));
        assert!(props.carousel.autoplay);
    }

    #[test]
    fn missing_optional_fields_are_defaulted() {
        let section: Section = serde_json::from_value(json!({
            "id": "news-1",
            "type": "news"
        }))
        .unwrap();
        assert!(section.enabled);
        assert_eq!(section.order, 0);
        assert!(section.layout.is_none());
        assert_eq!(section.body, SectionBody::News(NewsProps::default()));
    }

    #[test]
    fn unknown_type_is_preserved_verbatim() {
        let raw = json!({
            "id": "shop-1",
            "type": "shop",
            "enabled": true,
            "order": 4,
            "props": { "products": [1, 2, 3] }
        });
        let section: Section = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(section.kind(), None);
        assert_eq!(section.type_name(), "shop");
        assert_eq!(serde_json::to_value(&section).unwrap(), raw);
    }

    #[test]
    fn malformed_props_become_opaque() {
        let section: Section = serde_json::from_value(json!({
            "id": "gallery-1",
            "type": "gallery",
            "props": { "items": "not a list" }
        }))
        .unwrap();
        assert_eq!(section.type_name(), "gallery");
        assert!(matches!(section.body, SectionBody::Opaque { .. }));
    }

    #[test]
    fn unknown_layout_value_falls_back_to_default() {
        let props: VideoProps =
            serde_json::from_value(json!({ "items": [], "layout": "mosaic", "display": "thumbnail" }))
                .unwrap();
        assert_eq!(props.layout, VideoLayout::Single);
        assert_eq!(props.display, VideoDisplay::Thumbnail);
    }

    #[test]
    fn unknown_root_keys_are_ignored() {
        let config: PageConfig = serde_json::from_value(json!({
            "background": { "type": "color", "value": "#000" },
            "sections": [],
            "futureFeature": { "enabled": true }
        }))
        .unwrap();
        assert!(config.sections.is_empty());
    }

    #[test]
    fn background_for_falls_back_to_root() {
        let mut config = PageConfig::default();
        config.news_background = Some(Background::Image("/news.jpg".into()));
        assert_eq!(
            config.background_for(PageKind::NewsList),
            &Background::Image("/news.jpg".into())
        );
        assert_eq!(config.background_for(PageKind::BlogList), &config.background);
        assert_eq!(config.background_for(PageKind::Home), &config.background);
    }

    #[test]
    fn news_item_needs_src_and_href() {
        let mut item = NewsItem {
            id: "n1".into(),
            src: "/n.jpg".into(),
            ..Default::default()
        };
        assert!(!item.is_valid());
        item.href = "https://example.com".into();
        assert!(item.is_valid());
    }

    #[test]
    fn strip_invalid_items_keeps_clean_sections_identical() {
        let clean = Arc::new(Section::new(
            "links-1",
            1,
            SectionBody::Links(LinksProps {
                items: vec![LinkItem {
                    id: "l1".into(),
                    label: "Site".into(),
                    url: "https://example.com".into(),
                    icon: None,
                }],
                title: None,
            }),
        ));
        let dirty = Arc::new(Section::new(
            "hero-1",
            0,
            SectionBody::Hero(HeroProps {
                slides: vec![
                    HeroSlide {
                        id: "s1".into(),
                        src: "".into(),
                        ..Default::default()
                    },
                    HeroSlide {
                        id: "s2".into(),
                        src: "/b.jpg".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
        ));
        let mut config = PageConfig {
            sections: vec![clean.clone(), dirty.clone()],
            ..Default::default()
        };

        assert_eq!(config.first_invalid_item(), Some(("hero-1", "s1")));
        assert_eq!(config.strip_invalid_items(), 1);
        assert!(Arc::ptr_eq(&config.sections[0], &clean));
        assert!(!Arc::ptr_eq(&config.sections[1], &dirty));
        assert_eq!(config.sections[1].body.item_count(), 1);
        assert_eq!(config.first_invalid_item(), None);
    }

    #[test]
    fn missing_and_repeated_item_ids_are_reassigned() {
        let mut body = SectionBody::decode(
            "links",
            json!({ "items": [
                { "id": "l1", "url": "https://a.example" },
                { "url": "https://b.example" },
                { "id": "l1", "url": "https://c.example" }
            ] }),
        );
        let mut n = 0;
        let assigned = body.assign_missing_item_ids(|prefix| {
            n += 1;
            format!("{prefix}-{n}")
        });
        assert_eq!(assigned, 2);
        let SectionBody::Links(props) = &body else {
            panic!("expected links body");
        };
        let ids: Vec<&str> = props.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "link-1", "link-2"]);
    }

    #[test]
    fn try_decode_reports_instead_of_falling_back() {
        assert!(SectionBody::try_decode(SectionKind::Hero, json!({ "slides": 5 })).is_err());
        assert_eq!(
            SectionBody::try_decode(SectionKind::Video, Value::Null).unwrap(),
            SectionBody::empty(SectionKind::Video)
        );
    }

    #[test]
    fn contains_id_sees_items_and_social_links() {
        let config = PageConfig {
            sections: vec![Arc::new(Section::new(
                "gallery-1",
                1,
                SectionBody::Gallery(GalleryProps {
                    items: vec![GalleryImage {
                        id: "img-1".into(),
                        src: "/g.jpg".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            ))],
            social_links: vec![SocialLink {
                id: "social-1".into(),
                name: "Mastodon".into(),
                url: "https://example.social/@me".into(),
                icon: None,
                enabled: true,
            }],
            ..Default::default()
        };
        assert!(config.contains_id("gallery-1"));
        assert!(config.contains_id("img-1"));
        assert!(config.contains_id("social-1"));
        assert!(!config.contains_id("hero-1"));
    }

    #[test]
    fn revision_tracks_content() {
        let a = PageConfig::default();
        let mut b = PageConfig::default();
        assert_eq!(a.revision().unwrap(), b.revision().unwrap());
        b.meta = Some(Meta {
            title: Some("Changed".into()),
            description: None,
        });
        assert_ne!(a.revision().unwrap(), b.revision().unwrap());
    }

    #[test]
    fn section_kind_parses_from_str() {
        assert_eq!("video".parse::<SectionKind>().unwrap(), SectionKind::Video);
        assert!("carousel".parse::<SectionKind>().is_err());
    }
}
