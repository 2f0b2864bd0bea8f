//! Draft editing session.
//!
//! An [`Editor`] holds one owner's draft in memory and applies edits to it
//! synchronously. Nothing reaches the store until the owner saves or
//! publishes.
//!
//! # Ensure, Then Edit
//!
//! Sections are created lazily. Type-specific operations that add or set
//! content first call [`Editor::ensure_section`], which returns the first
//! section of that type or creates one. Operations that target an existing
//! item look it up first, and a miss leaves the document untouched. Creation and the subsequent edit happen against the same
//! in-memory document inside one `&mut self` call, so there is no window in
//! which a caller holds a section the document does not contain.
//!
//! New sections get id `"{type}-{millis}"`, empty props, and
//! `order = max(existing) + 1`. A hero is always created with `order = 0`.
//!
//! # Copy-On-Write
//!
//! Sections are `Arc`-shared. An edit goes through [`Arc::make_mut`] on the
//! one section it touches, so a snapshot taken before the edit (for example
//! the document handed to a renderer) still shares every other section by
//! pointer. `Arc::ptr_eq` is a valid "did this section change" check.
//!
//! # Save And Publish
//!
//! ```text
//! Idle ──begin_save──► Saving ──finish_save──► Idle | Failed
//! Idle ──begin_publish──► Publishing ──finish_publish──► Idle | Failed
//! ```
//!
//! `begin_*` strips invalid items, snapshots the document, and refuses to
//! start while another request is in flight. Edits made between `begin_*`
//! and `finish_*` are not part of the snapshot; the editor stays dirty
//! until they are saved too. [`Editor::save_draft`] and [`Editor::publish`]
//! run both phases against the store in one call. Publishing always writes
//! the snapshot as the new draft first.

use crate::document::{
    Background, GalleryImage, HeroLayout, HeroSlide, Item, LinkItem, Logo, Meta, NewsItem, NewsLayout,
    PageConfig, PageKind, Section, SectionBody, SectionKind, SectionLayout, SocialLink,
    VideoDisplay, VideoItem, VideoLayout,
};
use crate::document::{GalleryProps, HeroProps, LinksProps, NewsProps, VideoProps};
use crate::store::{Backend, ConfigStore, StoreError};
use crate::upload::{AssetFile, AssetUploader, UploadError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("invalid document: {0}")]
    Validation(String),
    #[error("cannot start: {0} already in progress")]
    Busy(EditorStatus),
    #[error("section not found: {0}")]
    SectionNotFound(String),
    #[error("item '{item_id}' not found in section '{section_id}'")]
    ItemNotFound { section_id: String, item_id: String },
    #[error("patch does not fit {section_type} props: {reason}")]
    PropsMismatch { section_type: String, reason: String },
}

/// Save/publish affordance state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStatus {
    Idle,
    Saving,
    Publishing,
    /// Last request failed; local edits are kept and the action can be retried.
    Failed(String),
}

impl fmt::Display for EditorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorStatus::Idle => f.write_str("idle"),
            EditorStatus::Saving => f.write_str("save"),
            EditorStatus::Publishing => f.write_str("publish"),
            EditorStatus::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Direction for [`Editor::move_section`] and [`Editor::move_hero_slide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A write captured by `begin_save`/`begin_publish`, waiting for its result.
#[derive(Debug)]
#[must_use = "pass to finish_save/finish_publish once the request completes"]
pub struct PendingWrite {
    snapshot: PageConfig,
    revision: u64,
}

impl PendingWrite {
    /// The document as it was when the write started.
    pub fn document(&self) -> &PageConfig {
        &self.snapshot
    }
}

/// One owner's editing session.
pub struct Editor<'s, B> {
    store: &'s ConfigStore<B>,
    owner_id: String,
    document: PageConfig,
    revision: u64,
    saved_revision: u64,
    status: EditorStatus,
    last_saved_at: Option<DateTime<Utc>>,
    last_published_at: Option<DateTime<Utc>>,
    last_issued_ms: i64,
}

impl<'s, B: Backend> Editor<'s, B> {
    /// Open the owner's draft, creating the page on first access.
    pub fn open(store: &'s ConfigStore<B>, owner_id: &str, slug: &str) -> Result<Self, EditorError> {
        let slots = store.ensure(owner_id, slug)?;
        Ok(Self::with_document(store, owner_id, slots.draft))
    }

    /// Start a session from an already-loaded draft.
    pub fn with_document(store: &'s ConfigStore<B>, owner_id: &str, document: PageConfig) -> Self {
        Self {
            store,
            owner_id: owner_id.to_string(),
            document,
            revision: 0,
            saved_revision: 0,
            status: EditorStatus::Idle,
            last_saved_at: None,
            last_published_at: None,
            last_issued_ms: 0,
        }
    }

    pub fn document(&self) -> &PageConfig {
        &self.document
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Whether there are edits not yet written by a completed save.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn status(&self) -> &EditorStatus {
        &self.status
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn last_published_at(&self) -> Option<DateTime<Utc>> {
        self.last_published_at
    }

    /// Throw away local edits and reload the stored draft.
    pub fn reload(&mut self) -> Result<(), EditorError> {
        let draft = self
            .store
            .get_draft(&self.owner_id)?
            .ok_or_else(|| StoreError::NotFound(self.owner_id.clone()))?;
        self.document = draft;
        self.touch();
        self.saved_revision = self.revision;
        Ok(())
    }

    // ========================================================================
    // Section lookup and creation
    // ========================================================================

    /// First section of `kind`, if any.
    pub fn get_section(&self, kind: SectionKind) -> Option<&Arc<Section>> {
        self.document.section(kind)
    }

    /// First section of `kind`, created with empty props if absent.
    ///
    /// This is the only way sections come into existence.
    pub fn ensure_section(&mut self, kind: SectionKind) -> Arc<Section> {
        let index = self.ensure_index(kind);
        Arc::clone(&self.document.sections[index])
    }

    fn ensure_index(&mut self, kind: SectionKind) -> usize {
        if let Some(index) = self.document.sections.iter().position(|s| s.kind() == Some(kind)) {
            return index;
        }
        let order = match kind {
            SectionKind::Hero => 0,
            _ => self
                .document
                .sections
                .iter()
                .map(|s| s.order)
                .max()
                .map_or(0, |max| max + 1),
        };
        let id = self.fresh_id(kind.as_str());
        tracing::debug!(section_id = %id, order, "section created");
        self.document
            .sections
            .push(Arc::new(Section::new(id, order, SectionBody::empty(kind))));
        self.touch();
        self.document.sections.len() - 1
    }

    // ========================================================================
    // Generic section edits
    // ========================================================================

    /// Shallow-merge `patch` into the props of section `id`.
    ///
    /// Top-level keys of `patch` replace the same keys in the current props;
    /// other keys are kept. The merged props must decode as the section's
    /// stored type, otherwise nothing changes. A known-type section whose
    /// stored props were malformed is repaired by a patch that makes them
    /// decode. Items arriving without an id, or with one already used in the
    /// list, get a fresh id.
    pub fn update_section_props(&mut self, id: &str, patch: Value) -> Result<(), EditorError> {
        let index = self.index_of(id)?;
        let section = &self.document.sections[index];
        let type_name = section.type_name().to_string();
        let mismatch = |reason: String| EditorError::PropsMismatch {
            section_type: type_name.clone(),
            reason,
        };

        let Value::Object(patch) = patch else {
            return Err(mismatch("patch must be a JSON object".into()));
        };
        let mut props = match section
            .body
            .encode()
            .map_err(|e| mismatch(e.to_string()))?
        {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        props.extend(patch);

        let mut body = match type_name.parse::<SectionKind>() {
            Ok(kind) => SectionBody::try_decode(kind, Value::Object(props))
                .map_err(|e| mismatch(e.to_string()))?,
            Err(_) => SectionBody::Opaque {
                kind: type_name.clone(),
                props: Value::Object(props),
            },
        };
        let assigned = body.assign_missing_item_ids(|prefix| self.fresh_id(prefix));
        if assigned > 0 {
            tracing::debug!(section_id = id, assigned, "assigned ids to patched items");
        }
        Arc::make_mut(&mut self.document.sections[index]).body = body;
        self.touch();
        Ok(())
    }

    /// Flip `enabled`. Returns the new value.
    pub fn toggle_enabled(&mut self, id: &str) -> Result<bool, EditorError> {
        self.modify_section(id, |s| {
            s.enabled = !s.enabled;
            s.enabled
        })
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), EditorError> {
        self.modify_section(id, |s| s.enabled = enabled)
    }

    pub fn set_order(&mut self, id: &str, order: i64) -> Result<(), EditorError> {
        self.modify_section(id, |s| s.order = order)
    }

    /// Set the grid width (1-4). `None` restores the full-width default.
    pub fn set_col_span(&mut self, id: &str, col_span: Option<u8>) -> Result<(), EditorError> {
        if let Some(span) = col_span
            && !(1..=4).contains(&span)
        {
            return Err(EditorError::Validation(format!(
                "colSpan must be between 1 and 4, got {span}"
            )));
        }
        self.modify_section(id, |s| {
            s.layout = col_span.map(|span| SectionLayout {
                col_span: Some(span),
            });
        })
    }

    /// Swap a non-hero section with its neighbour in render order.
    ///
    /// Orders of the non-hero sections are renumbered `1..=n` where needed.
    /// Moving past either end is a no-op.
    pub fn move_section(&mut self, id: &str, direction: Direction) -> Result<(), EditorError> {
        self.index_of(id)?;
        let mut ranked: Vec<(usize, i64)> = self
            .document
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind() != Some(SectionKind::Hero))
            .map(|(i, s)| (i, s.order))
            .collect();
        ranked.sort_by_key(|&(_, order)| order);

        let Some(pos) = ranked
            .iter()
            .position(|&(i, _)| self.document.sections[i].id == id)
        else {
            return Ok(());
        };
        let neighbour = match direction {
            Direction::Up => pos.checked_sub(1),
            Direction::Down => Some(pos + 1).filter(|&n| n < ranked.len()),
        };
        let Some(neighbour) = neighbour else {
            return Ok(());
        };
        ranked.swap(pos, neighbour);

        for (rank, &(index, _)) in ranked.iter().enumerate() {
            let order = rank as i64 + 1;
            if self.document.sections[index].order != order {
                Arc::make_mut(&mut self.document.sections[index]).order = order;
            }
        }
        self.touch();
        Ok(())
    }

    pub fn delete_section(&mut self, id: &str) -> Result<(), EditorError> {
        let index = self.index_of(id)?;
        self.document.sections.remove(index);
        self.touch();
        Ok(())
    }

    /// Remove one item (slide, link, image, …) from a section.
    pub fn delete_item(&mut self, section_id: &str, item_id: &str) -> Result<(), EditorError> {
        let index = self.index_of(section_id)?;
        if !self.document.sections[index].body.contains_item(item_id) {
            return Err(EditorError::ItemNotFound {
                section_id: section_id.to_string(),
                item_id: item_id.to_string(),
            });
        }
        Arc::make_mut(&mut self.document.sections[index])
            .body
            .remove_item(item_id);
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Hero
    // ========================================================================

    pub fn add_hero_slide(&mut self, src: impl Into<String>, alt: Option<String>) -> Result<String, EditorError> {
        let id = self.fresh_id(HeroSlide::ID_PREFIX);
        let slide = HeroSlide {
            id: id.clone(),
            src: src.into(),
            alt,
            href: None,
        };
        self.edit_hero(|hero| hero.slides.push(slide))?;
        Ok(id)
    }

    pub fn set_hero_slide(
        &mut self,
        slide_id: &str,
        src: impl Into<String>,
        href: Option<String>,
    ) -> Result<(), EditorError> {
        self.require_item(SectionKind::Hero, slide_id)?;
        let src = src.into();
        self.edit_hero(|hero| {
            if let Some(slide) = hero.slides.iter_mut().find(|s| s.id == slide_id) {
                slide.src = src;
                slide.href = href;
            }
        })
    }

    /// Swap a slide with its neighbour. Moving past either end is a no-op.
    pub fn move_hero_slide(&mut self, slide_id: &str, direction: Direction) -> Result<(), EditorError> {
        self.require_item(SectionKind::Hero, slide_id)?;
        let Some(SectionBody::Hero(hero)) = self.get_section(SectionKind::Hero).map(|s| &s.body) else {
            return Ok(());
        };
        let Some(pos) = hero.slides.iter().position(|s| s.id == slide_id) else {
            return Ok(());
        };
        let target = match direction {
            Direction::Up => pos.checked_sub(1),
            Direction::Down => Some(pos + 1).filter(|&n| n < hero.slides.len()),
        };
        let Some(target) = target else {
            return Ok(());
        };
        self.edit_hero(|hero| hero.slides.swap(pos, target))
    }

    pub fn set_hero_text(&mut self, title: Option<String>, subtitle: Option<String>) -> Result<(), EditorError> {
        self.edit_hero(|hero| {
            hero.title = title;
            hero.subtitle = subtitle;
        })
    }

    pub fn set_carousel(&mut self, autoplay: bool, interval_ms: Option<u64>) -> Result<(), EditorError> {
        if interval_ms.is_some_and(|ms| ms < 500) {
            return Err(EditorError::Validation(
                "carousel interval must be at least 500ms".into(),
            ));
        }
        self.edit_hero(|hero| {
            hero.carousel.autoplay = autoplay;
            hero.carousel.interval_ms = interval_ms;
        })
    }

    pub fn set_hero_layout(&mut self, layout: HeroLayout) -> Result<(), EditorError> {
        self.edit_hero(|hero| hero.layout = layout)
    }

    // ========================================================================
    // Links
    // ========================================================================

    pub fn add_link(&mut self, label: impl Into<String>, url: impl Into<String>) -> Result<String, EditorError> {
        let id = self.fresh_id(LinkItem::ID_PREFIX);
        let item = LinkItem {
            id: id.clone(),
            label: label.into(),
            url: url.into(),
            icon: None,
        };
        self.edit_links(|links| links.items.push(item))?;
        Ok(id)
    }

    pub fn update_link(
        &mut self,
        item_id: &str,
        label: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.require_item(SectionKind::Links, item_id)?;
        let (label, url) = (label.into(), url.into());
        self.edit_links(|links| {
            if let Some(item) = links.items.iter_mut().find(|i| i.id == item_id) {
                item.label = label;
                item.url = url;
            }
        })
    }

    pub fn set_links_title(&mut self, title: Option<String>) -> Result<(), EditorError> {
        self.edit_links(|links| links.title = title)
    }

    // ========================================================================
    // Gallery
    // ========================================================================

    pub fn add_gallery_image(&mut self, src: impl Into<String>, alt: Option<String>) -> Result<String, EditorError> {
        let id = self.fresh_id(GalleryImage::ID_PREFIX);
        let image = GalleryImage {
            id: id.clone(),
            src: src.into(),
            alt,
            caption: None,
        };
        self.edit_gallery(|gallery| gallery.items.push(image))?;
        Ok(id)
    }

    pub fn set_gallery_caption(&mut self, item_id: &str, caption: Option<String>) -> Result<(), EditorError> {
        self.require_item(SectionKind::Gallery, item_id)?;
        self.edit_gallery(|gallery| {
            if let Some(image) = gallery.items.iter_mut().find(|i| i.id == item_id) {
                image.caption = caption;
            }
        })
    }

    pub fn set_gallery_columns(&mut self, columns: u8) -> Result<(), EditorError> {
        if !(1..=6).contains(&columns) {
            return Err(EditorError::Validation(format!(
                "gallery columns must be between 1 and 6, got {columns}"
            )));
        }
        self.edit_gallery(|gallery| gallery.columns = Some(columns))
    }

    // ========================================================================
    // News
    // ========================================================================

    pub fn add_news_item(
        &mut self,
        src: impl Into<String>,
        href: impl Into<String>,
        title: Option<String>,
    ) -> Result<String, EditorError> {
        let id = self.fresh_id(NewsItem::ID_PREFIX);
        let item = NewsItem {
            id: id.clone(),
            src: src.into(),
            href: href.into(),
            title,
            date: Some(Utc::now().format("%Y-%m-%d").to_string()),
        };
        self.edit_news(|news| news.items.push(item))?;
        Ok(id)
    }

    pub fn set_news_layout(&mut self, layout: NewsLayout) -> Result<(), EditorError> {
        self.edit_news(|news| news.layout = layout)
    }

    // ========================================================================
    // Video
    // ========================================================================

    pub fn add_video(&mut self, url: impl Into<String>, title: Option<String>) -> Result<String, EditorError> {
        let id = self.fresh_id(VideoItem::ID_PREFIX);
        let item = VideoItem {
            id: id.clone(),
            url: url.into(),
            title,
        };
        self.edit_video(|video| video.items.push(item))?;
        Ok(id)
    }

    pub fn set_video_layout(&mut self, layout: VideoLayout, display: VideoDisplay) -> Result<(), EditorError> {
        self.edit_video(|video| {
            video.layout = layout;
            video.display = display;
        })
    }

    // ========================================================================
    // Document-level fields
    // ========================================================================

    pub fn set_background(&mut self, background: Background) {
        self.document.background = background;
        self.touch();
    }

    /// Set or clear the background override of a sub-page.
    /// The home page has no override; use [`set_background`](Self::set_background).
    pub fn set_page_background(&mut self, kind: PageKind, background: Option<Background>) -> Result<(), EditorError> {
        match kind {
            PageKind::Home => {
                return Err(EditorError::Validation(
                    "the home page background is the page background".into(),
                ));
            }
            PageKind::BlogList => self.document.blog_background = background,
            PageKind::NewsList => self.document.news_background = background,
        }
        self.touch();
        Ok(())
    }

    pub fn set_logo(&mut self, logo: Option<Logo>) -> Result<(), EditorError> {
        if let Some(opacity) = logo.as_ref().and_then(|l| l.opacity)
            && !(0.0..=1.0).contains(&opacity)
        {
            return Err(EditorError::Validation(format!(
                "logo opacity must be between 0 and 1, got {opacity}"
            )));
        }
        self.document.logo = logo;
        self.touch();
        Ok(())
    }

    pub fn set_meta(&mut self, title: Option<String>, description: Option<String>) {
        self.document.meta = match (title, description) {
            (None, None) => None,
            (title, description) => Some(Meta { title, description }),
        };
        self.touch();
    }

    pub fn add_social_link(
        &mut self,
        name: impl Into<String>,
        url: impl Into<String>,
        icon: Option<String>,
    ) -> String {
        let id = self.fresh_id("social");
        self.document.social_links.push(SocialLink {
            id: id.clone(),
            name: name.into(),
            url: url.into(),
            icon,
            enabled: true,
        });
        self.touch();
        id
    }

    pub fn update_social_link(
        &mut self,
        id: &str,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<(), EditorError> {
        let link = self.social_link_mut(id)?;
        link.name = name.into();
        link.url = url.into();
        self.touch();
        Ok(())
    }

    /// Flip a social link's `enabled`. Returns the new value.
    pub fn toggle_social_link(&mut self, id: &str) -> Result<bool, EditorError> {
        let link = self.social_link_mut(id)?;
        link.enabled = !link.enabled;
        let enabled = link.enabled;
        self.touch();
        Ok(enabled)
    }

    pub fn remove_social_link(&mut self, id: &str) -> Result<(), EditorError> {
        let before = self.document.social_links.len();
        self.document.social_links.retain(|l| l.id != id);
        if self.document.social_links.len() == before {
            return Err(item_not_found("socialLinks", id));
        }
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Upload-backed edits
    // ========================================================================

    /// Upload an image and append it as a hero slide.
    ///
    /// A failed upload leaves the document untouched.
    pub fn upload_and_add_slide(
        &mut self,
        uploader: &impl AssetUploader,
        file: &AssetFile,
    ) -> Result<String, EditorError> {
        let asset = uploader.upload(file)?;
        self.add_hero_slide(asset.src, None)
    }

    pub fn upload_and_add_gallery_image(
        &mut self,
        uploader: &impl AssetUploader,
        file: &AssetFile,
    ) -> Result<String, EditorError> {
        let asset = uploader.upload(file)?;
        self.add_gallery_image(asset.src, None)
    }

    /// Upload an image and use it as the logo, keeping alt text and opacity.
    pub fn upload_logo(&mut self, uploader: &impl AssetUploader, file: &AssetFile) -> Result<(), EditorError> {
        let asset = uploader.upload(file)?;
        let mut logo = self.document.logo.clone().unwrap_or_default();
        logo.src = Some(asset.src);
        self.set_logo(Some(logo))
    }

    // ========================================================================
    // Save / publish
    // ========================================================================

    /// Strip invalid items and snapshot the document for a draft save.
    pub fn begin_save(&mut self) -> Result<PendingWrite, EditorError> {
        self.begin(EditorStatus::Saving)
    }

    /// Record the outcome of the write started by [`begin_save`](Self::begin_save).
    pub fn finish_save(&mut self, pending: PendingWrite, outcome: Result<(), StoreError>) -> Result<(), EditorError> {
        match outcome {
            Ok(()) => {
                self.mark_saved(pending.revision);
                self.status = EditorStatus::Idle;
                tracing::debug!(owner_id = %self.owner_id, dirty = self.is_dirty(), "draft saved");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Clean up and write the draft to the store.
    pub fn save_draft(&mut self) -> Result<(), EditorError> {
        let pending = self.begin_save()?;
        let outcome = self
            .store
            .set_draft(&self.owner_id, pending.document().clone());
        self.finish_save(pending, outcome)
    }

    /// Strip invalid items and snapshot the document for publishing.
    pub fn begin_publish(&mut self) -> Result<PendingWrite, EditorError> {
        self.begin(EditorStatus::Publishing)
    }

    /// Record the outcome of a publish started by [`begin_publish`](Self::begin_publish).
    ///
    /// `draft_saved` reports whether the snapshot reached the draft slot,
    /// which can be true even when the publish step itself failed.
    pub fn finish_publish(
        &mut self,
        pending: PendingWrite,
        draft_saved: bool,
        outcome: Result<(), StoreError>,
    ) -> Result<(), EditorError> {
        if draft_saved {
            self.mark_saved(pending.revision);
        }
        match outcome {
            Ok(()) => {
                self.last_published_at = Some(Utc::now());
                self.status = EditorStatus::Idle;
                tracing::info!(owner_id = %self.owner_id, "published");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Save the in-memory document as the draft, then publish it.
    pub fn publish(&mut self) -> Result<(), EditorError> {
        let pending = self.begin_publish()?;
        let store = self.store;
        let mut draft_saved = false;
        let outcome = store
            .set_draft(&self.owner_id, pending.document().clone())
            .and_then(|()| {
                draft_saved = true;
                store.publish(&self.owner_id)
            });
        self.finish_publish(pending, draft_saved, outcome)
    }

    fn begin(&mut self, next: EditorStatus) -> Result<PendingWrite, EditorError> {
        if matches!(self.status, EditorStatus::Saving | EditorStatus::Publishing) {
            return Err(EditorError::Busy(self.status.clone()));
        }
        let removed = self.document.strip_invalid_items();
        if removed > 0 {
            tracing::debug!(removed, "stripped incomplete items before save");
            self.touch();
        }
        if let Some((section_id, item_id)) = self.document.first_invalid_item() {
            return Err(EditorError::Validation(format!(
                "item '{item_id}' in section '{section_id}' is incomplete"
            )));
        }
        self.status = next;
        Ok(PendingWrite {
            snapshot: self.document.clone(),
            revision: self.revision,
        })
    }

    fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = self.saved_revision.max(revision);
        self.last_saved_at = Some(Utc::now());
    }

    fn fail(&mut self, err: StoreError) -> EditorError {
        tracing::warn!(owner_id = %self.owner_id, %err, "write failed, local edits kept");
        self.status = EditorStatus::Failed(err.to_string());
        EditorError::Store(err)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// `"{prefix}-{millis}"`, unique within the document and this session.
    fn fresh_id(&mut self, prefix: &str) -> String {
        let mut millis = Utc::now().timestamp_millis().max(self.last_issued_ms + 1);
        loop {
            let id = format!("{prefix}-{millis}");
            if !self.document.contains_id(&id) {
                self.last_issued_ms = millis;
                return id;
            }
            millis += 1;
        }
    }

    /// Fails unless the first section of `kind` holds `item_id`. Runs before
    /// any edit, so a miss neither creates a section nor marks the editor
    /// dirty.
    fn require_item(&self, kind: SectionKind, item_id: &str) -> Result<(), EditorError> {
        match self.document.section(kind) {
            Some(section) if section.body.contains_item(item_id) => Ok(()),
            Some(section) => Err(item_not_found(&section.id, item_id)),
            None => Err(item_not_found(kind.as_str(), item_id)),
        }
    }

    fn index_of(&self, id: &str) -> Result<usize, EditorError> {
        self.document
            .position_of(id)
            .ok_or_else(|| EditorError::SectionNotFound(id.to_string()))
    }

    fn modify_section<T>(&mut self, id: &str, f: impl FnOnce(&mut Section) -> T) -> Result<T, EditorError> {
        let index = self.index_of(id)?;
        let out = f(Arc::make_mut(&mut self.document.sections[index]));
        self.touch();
        Ok(out)
    }

    /// Ensure a section of `kind` and edit its body in place.
    fn edit_kind<T>(
        &mut self,
        kind: SectionKind,
        f: impl FnOnce(&mut SectionBody) -> Option<T>,
    ) -> Result<T, EditorError> {
        let index = self.ensure_index(kind);
        if self.document.sections[index].kind() != Some(kind) {
            return Err(EditorError::PropsMismatch {
                section_type: kind.to_string(),
                reason: "section body has a different type".into(),
            });
        }
        let section = Arc::make_mut(&mut self.document.sections[index]);
        let out = f(&mut section.body).ok_or_else(|| EditorError::PropsMismatch {
            section_type: kind.to_string(),
            reason: "section body has a different type".into(),
        })?;
        self.touch();
        Ok(out)
    }

    fn edit_hero<T>(&mut self, f: impl FnOnce(&mut HeroProps) -> T) -> Result<T, EditorError> {
        self.edit_kind(SectionKind::Hero, |body| match body {
            SectionBody::Hero(props) => Some(f(props)),
            _ => None,
        })
    }

    fn edit_links<T>(&mut self, f: impl FnOnce(&mut LinksProps) -> T) -> Result<T, EditorError> {
        self.edit_kind(SectionKind::Links, |body| match body {
            SectionBody::Links(props) => Some(f(props)),
            _ => None,
        })
    }

    fn edit_gallery<T>(&mut self, f: impl FnOnce(&mut GalleryProps) -> T) -> Result<T, EditorError> {
        self.edit_kind(SectionKind::Gallery, |body| match body {
            SectionBody::Gallery(props) => Some(f(props)),
            _ => None,
        })
    }

    fn edit_news<T>(&mut self, f: impl FnOnce(&mut NewsProps) -> T) -> Result<T, EditorError> {
        self.edit_kind(SectionKind::News, |body| match body {
            SectionBody::News(props) => Some(f(props)),
            _ => None,
        })
    }

    fn edit_video<T>(&mut self, f: impl FnOnce(&mut VideoProps) -> T) -> Result<T, EditorError> {
        self.edit_kind(SectionKind::Video, |body| match body {
            SectionBody::Video(props) => Some(f(props)),
            _ => None,
        })
    }

    fn social_link_mut(&mut self, id: &str) -> Result<&mut SocialLink, EditorError> {
        self.document
            .social_links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| item_not_found("socialLinks", id))
    }
}

fn item_not_found(section_id: &str, item_id: &str) -> EditorError {
    EditorError::ItemNotFound {
        section_id: section_id.to_string(),
        item_id: item_id.to_string(),
    }
}
