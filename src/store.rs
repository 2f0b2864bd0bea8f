//! Draft/published page store.
//!
//! Every page owner has exactly one [`PageRecord`] holding two slots:
//!
//! ```text
//! owner_id ──► draft      (owner-only, freely overwritten)
//! slug     ──► published  (public, replaced only by publish)
//! ```
//!
//! [`ConfigStore`] is the service the rest of the crate talks to. It layers
//! the slot semantics (ensure-on-first-access, wholesale overwrite, publish
//! as a snapshot copy) over a [`Backend`], which is a plain keyed record
//! store. Two backends ship: [`MemoryBackend`] for tests and embedding, and
//! [`FileBackend`], which keeps one pretty-printed JSON file per owner.
//!
//! ## Write Serialization
//!
//! Both slots live in one record, so every write is a read-modify-write of
//! that record. Writes for the same owner are serialized through a
//! per-owner lock; this is what makes `publish` a single untorn
//! draft → published copy. Creating a page also takes one store-wide lock,
//! so two owners cannot both claim a free slug. Reads take no lock.

use crate::document::PageConfig;
use crate::templates::SeedTemplate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("page not found: {0}")]
    NotFound(String),
    #[error("no draft to publish for owner {0}")]
    NoDraft(String),
    #[error("slug '{slug}' is already used by another page")]
    SlugTaken { slug: String },
    #[error("invalid key '{0}': must be non-empty and contain only [A-Za-z0-9_-]")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Both slots of one page, plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub owner_id: String,
    /// Public identifier; the published slot is looked up by this.
    pub slug: String,
    pub draft: PageConfig,
    pub published: PageConfig,
    pub created_at: DateTime<Utc>,
    /// Last write to either slot.
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// The two slots returned by [`ConfigStore::ensure`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlots {
    pub draft: PageConfig,
    pub published: PageConfig,
}

/// Keyed record persistence.
///
/// Implementations store records verbatim and know nothing about slots.
pub trait Backend: Send + Sync {
    fn load(&self, owner_id: &str) -> Result<Option<PageRecord>, StoreError>;
    fn load_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, StoreError>;
    fn save(&self, record: &PageRecord) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<PageRecord>, StoreError>;
}

/// Draft/published slot service over a [`Backend`].
pub struct ConfigStore<B> {
    backend: B,
    seed: SeedTemplate,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Held across the slug check and the first save of a new page.
    create_lock: Mutex<()>,
}

impl<B: Backend> ConfigStore<B> {
    pub fn new(backend: B, seed: SeedTemplate) -> Self {
        Self {
            backend,
            seed,
            write_locks: Mutex::new(HashMap::new()),
            create_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create both slots from the seed template if this owner has no page
    /// yet; otherwise return the existing slots unchanged.
    pub fn ensure(&self, owner_id: &str, slug: &str) -> Result<PageSlots, StoreError> {
        validate_key(owner_id)?;
        validate_key(slug)?;
        let lock = self.owner_lock(owner_id)?;
        let _guard = lock.lock()?;

        if let Some(record) = self.backend.load(owner_id)? {
            return Ok(PageSlots {
                draft: record.draft,
                published: record.published,
            });
        }
        let _create = self.create_lock.lock()?;
        if self.backend.load_by_slug(slug)?.is_some() {
            return Err(StoreError::SlugTaken {
                slug: slug.to_string(),
            });
        }

        let seed = self.seed.build();
        let now = Utc::now();
        let record = PageRecord {
            owner_id: owner_id.to_string(),
            slug: slug.to_string(),
            draft: seed.clone(),
            published: seed,
            created_at: now,
            updated_at: now,
            published_at: None,
        };
        self.backend.save(&record)?;
        tracing::info!(owner_id, slug, template = ?self.seed, "page created");

        Ok(PageSlots {
            draft: record.draft,
            published: record.published,
        })
    }

    pub fn get_draft(&self, owner_id: &str) -> Result<Option<PageConfig>, StoreError> {
        Ok(self.backend.load(owner_id)?.map(|r| r.draft))
    }

    /// Public read path: needs only the slug.
    pub fn get_published(&self, slug: &str) -> Result<Option<PageConfig>, StoreError> {
        Ok(self.backend.load_by_slug(slug)?.map(|r| r.published))
    }

    /// Like [`get_published`](Self::get_published), but a missing page is
    /// a [`StoreError::NotFound`].
    pub fn require_published(&self, slug: &str) -> Result<PageConfig, StoreError> {
        self.get_published(slug)?
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    pub fn record(&self, owner_id: &str) -> Result<Option<PageRecord>, StoreError> {
        self.backend.load(owner_id)
    }

    /// Overwrite the draft slot wholesale.
    pub fn set_draft(&self, owner_id: &str, config: PageConfig) -> Result<(), StoreError> {
        let lock = self.owner_lock(owner_id)?;
        let _guard = lock.lock()?;

        let mut record = self
            .backend
            .load(owner_id)?
            .ok_or_else(|| StoreError::NotFound(owner_id.to_string()))?;
        record.draft = config;
        record.updated_at = Utc::now();
        self.backend.save(&record)?;
        tracing::debug!(owner_id, "draft saved");
        Ok(())
    }

    /// Copy the current draft over the published slot.
    pub fn publish(&self, owner_id: &str) -> Result<(), StoreError> {
        let lock = self.owner_lock(owner_id)?;
        let _guard = lock.lock()?;

        let mut record = self
            .backend
            .load(owner_id)?
            .ok_or_else(|| StoreError::NoDraft(owner_id.to_string()))?;
        record.published = record.draft.clone();
        let now = Utc::now();
        record.updated_at = now;
        record.published_at = Some(now);
        self.backend.save(&record)?;
        tracing::info!(owner_id, slug = %record.slug, "page published");
        Ok(())
    }

    /// `(slug, published)` for every page, sorted by slug.
    pub fn list_published(&self) -> Result<Vec<(String, PageConfig)>, StoreError> {
        let mut pages: Vec<_> = self
            .backend
            .list()?
            .into_iter()
            .map(|r| (r.slug, r.published))
            .collect();
        pages.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pages)
    }

    fn owner_lock(&self, owner_id: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self.write_locks.lock()?;
        Ok(locks.entry(owner_id.to_string()).or_default().clone())
    }
}

/// Owner ids and slugs double as file names in [`FileBackend`].
fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, PageRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn load(&self, owner_id: &str) -> Result<Option<PageRecord>, StoreError> {
        Ok(self.records.lock()?.get(owner_id).cloned())
    }

    fn load_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, StoreError> {
        Ok(self
            .records
            .lock()?
            .values()
            .find(|r| r.slug == slug)
            .cloned())
    }

    fn save(&self, record: &PageRecord) -> Result<(), StoreError> {
        self.records
            .lock()?
            .insert(record.owner_id.clone(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<PageRecord>, StoreError> {
        Ok(self.records.lock()?.values().cloned().collect())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// One JSON file per owner under `<root>/pages/`.
///
/// Files are written to a sibling temp file and renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    fn record_path(&self, owner_id: &str) -> PathBuf {
        self.pages_dir().join(format!("{owner_id}.json"))
    }

    fn read_record(path: &Path) -> Result<PageRecord, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Backend for FileBackend {
    fn load(&self, owner_id: &str) -> Result<Option<PageRecord>, StoreError> {
        validate_key(owner_id)?;
        let path = self.record_path(owner_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    /// Scans every record. Unreadable records belonging to other pages are
    /// skipped by [`list`](Backend::list), so they cannot hide this one.
    fn load_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, StoreError> {
        Ok(self.list()?.into_iter().find(|r| r.slug == slug))
    }

    fn save(&self, record: &PageRecord) -> Result<(), StoreError> {
        validate_key(&record.owner_id)?;
        fs::create_dir_all(self.pages_dir())?;
        let path = self.record_path(&record.owner_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<PageRecord>, StoreError> {
        let dir = self.pages_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read_record(path) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable page record");
                }
            }
        }
        Ok(records)
    }
}
