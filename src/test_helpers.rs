//! Shared test utilities for the pagekit test suite.
//!
//! Provides document builders, lookup helpers, and a store backend whose
//! writes can be switched off to exercise failure paths.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let config = page(vec![
//!     section(SectionKind::Hero, "h", 0, true),
//!     with_body("l", 1, SectionBody::Links(LinksProps::default())),
//! ]);
//! let hero = find_section(&config, "h");
//! assert_eq!(hero.order, 0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::document::{PageConfig, Section, SectionBody, SectionKind};
use crate::store::{Backend, MemoryBackend, PageRecord, StoreError};

// =========================================================================
// Document builders
// =========================================================================

/// A document with the given sections and every other field defaulted.
pub fn page(sections: Vec<Arc<Section>>) -> PageConfig {
    PageConfig {
        sections,
        ..Default::default()
    }
}

/// A section of `kind` with empty props.
pub fn section(kind: SectionKind, id: &str, order: i64, enabled: bool) -> Arc<Section> {
    let mut section = Section::new(id, order, SectionBody::empty(kind));
    section.enabled = enabled;
    Arc::new(section)
}

/// An enabled section with the given body.
pub fn with_body(id: &str, order: i64, body: SectionBody) -> Arc<Section> {
    Arc::new(Section::new(id, order, body))
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a section by id. Panics if not found.
pub fn find_section<'a>(config: &'a PageConfig, id: &str) -> &'a Section {
    config.section_by_id(id).unwrap_or_else(|| {
        let ids: Vec<&str> = config.sections.iter().map(|s| s.id.as_str()).collect();
        panic!("section '{id}' not found. Available: {ids:?}")
    })
}

// =========================================================================
// Backends
// =========================================================================

/// In-memory backend whose writes fail while `fail_writes(true)` is set.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
}

impl FlakyBackend {
    pub fn fail_writes(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

impl Backend for FlakyBackend {
    fn load(&self, owner_id: &str) -> Result<Option<PageRecord>, StoreError> {
        self.inner.load(owner_id)
    }

    fn load_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, StoreError> {
        self.inner.load_by_slug(slug)
    }

    fn save(&self, record: &PageRecord) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("backend unavailable")));
        }
        self.inner.save(record)
    }

    fn list(&self) -> Result<Vec<PageRecord>, StoreError> {
        self.inner.list()
    }
}
