//! Composition: from a page document to an ordered render plan.
//!
//! Stored section order carries no meaning. What visitors see is derived
//! here, in four steps:
//!
//! ```text
//! sections ─► dedupe singletons ─► drop disabled/opaque ─► stable sort ─► attach renderer + span
//! ```
//!
//! - **Dedupe**: each section type is a singleton. If a document somehow
//!   holds two sections of one type, the one earlier in stored order wins,
//!   whether or not it is enabled, and the rest are dropped with a warning.
//!   This is the same section the editor addresses by type.
//! - **Sort**: the hero always comes first. Everything else sorts by
//!   `order` ascending; ties keep their stored relative position.
//! - **Dispatch**: the renderer is picked by an exhaustive match over
//!   [`SectionKind`], so a new section type does not compile until it is
//!   handled here. Sections of a type this build does not know are skipped.
//!
//! Composition never fails. Malformed content is a rendering concern and
//! degrades to an empty block there.

use crate::document::{PageConfig, Section, SectionKind};
use std::collections::HashSet;

/// Which section renderer draws a composed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Hero,
    Links,
    Gallery,
    News,
    Video,
}

impl Renderer {
    pub fn for_kind(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Hero => Renderer::Hero,
            SectionKind::Links => Renderer::Links,
            SectionKind::Gallery => Renderer::Gallery,
            SectionKind::News => Renderer::News,
            SectionKind::Video => Renderer::Video,
        }
    }
}

/// Width of a section in the 4-column page grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ColSpan(u8);

impl ColSpan {
    pub const COLUMNS: u8 = 4;
    pub const FULL: ColSpan = ColSpan(Self::COLUMNS);

    /// Clamp a stored value into `1..=4`.
    pub fn new(raw: u8) -> Self {
        ColSpan(raw.clamp(1, Self::COLUMNS))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ColSpan {
    fn default() -> Self {
        ColSpan::FULL
    }
}

/// One entry of the render plan.
#[derive(Debug, Clone, Copy)]
pub struct ComposedSection<'a> {
    pub section: &'a Section,
    pub renderer: Renderer,
    pub col_span: ColSpan,
}

/// Build the ordered render plan for a document.
pub fn compose(config: &PageConfig) -> Vec<ComposedSection<'_>> {
    let mut seen = HashSet::new();
    let mut plan: Vec<ComposedSection<'_>> = Vec::with_capacity(config.sections.len());

    for section in &config.sections {
        let Some(kind) = section.kind() else {
            tracing::warn!(
                section_id = %section.id,
                section_type = section.type_name(),
                "no renderer for section, skipping"
            );
            continue;
        };
        if kind.is_singleton() && !seen.insert(kind) {
            tracing::warn!(
                section_id = %section.id,
                section_type = %kind,
                "duplicate singleton section, skipping"
            );
            continue;
        }
        if !section.enabled {
            continue;
        }
        let col_span = match kind {
            SectionKind::Hero => ColSpan::FULL,
            _ => section.col_span().map(ColSpan::new).unwrap_or_default(),
        };
        plan.push(ComposedSection {
            section,
            renderer: Renderer::for_kind(kind),
            col_span,
        });
    }

    // sort_by_key is stable: equal keys keep stored order
    plan.sort_by_key(|entry| match entry.renderer {
        Renderer::Hero => (0, 0),
        _ => (1, entry.section.order),
    });
    plan
}
