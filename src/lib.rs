//! # Pagekit
//!
//! A page configuration engine for single-owner personal pages. The owner
//! assembles a page from a fixed catalogue of blocks (hero carousel, link
//! list, image gallery, news strip, embedded video), edits a draft, and
//! publishes a snapshot that visitors see while editing continues.
//!
//! # Architecture: Document, Plan, Markup
//!
//! Everything revolves around one JSON document per page, the
//! [`PageConfig`](document::PageConfig). Each page has two slots holding
//! one: the **draft** (keyed by owner) and the **published** copy (keyed by
//! public slug).
//!
//! ```text
//! editor ──save──► draft slot ──publish (copy)──► published slot
//!                                                     │
//!                               compose ◄─────────────┘
//!                                  │
//!                          render plan ──render──► HTML
//! ```
//!
//! - **Editing** mutates an in-memory draft synchronously. Only save and
//!   publish touch the store.
//! - **Composition** is a pure function from document to an ordered list of
//!   `(section, renderer, span)`. It never fails.
//! - **Rendering** turns the plan into a full HTML page. Empty or malformed
//!   content degrades to nothing rather than an error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | The page document: sections, typed props, background, logo, social links, meta |
//! | [`templates`] | Seed documents for new pages (`demo`, `empty`) |
//! | [`store`] | Draft/published slots per page, behind a pluggable persistence [`Backend`](store::Backend) |
//! | [`compose`] | Document → ordered render plan: hero pinning, disabled filtering, singleton resolution |
//! | [`render`] | Render plan → HTML with Maud, plus static export of all published pages |
//! | [`video`] | YouTube/Vimeo URL resolution for the video section |
//! | [`editor`] | Editing session: lazy section creation, typed and JSON-patch edits, save/publish state machine |
//! | [`upload`] | Asset upload boundary and a content-addressed local implementation |
//! | [`config`] | `config.toml` loading, validation, merging, and color CSS generation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Publish Is a Copy
//!
//! Publishing copies the draft into the published slot verbatim. There is
//! no diffing, merging, or per-section publish. What was saved is exactly
//! what visitors get, and a later draft save cannot leak into the live page.
//!
//! ## Order Is Derived, Not Stored
//!
//! The position of a section in the stored array means nothing. The hero
//! always renders first; everything else sorts by its `order` field, with
//! ties kept in stored order. This lets a client append sections without
//! rewriting the array and keeps the render order a pure function of the
//! document.
//!
//! ## Unknown Content Survives
//!
//! A section whose type this build does not know, or whose props do not
//! decode, is kept verbatim and written back unchanged on save. It is simply
//! not rendered. Documents written by a newer version are never damaged by
//! an older one.
//!
//! ## Copy-On-Write Sections
//!
//! Sections are `Arc`-shared and edited through `Arc::make_mut`, so cloning
//! a document is cheap and an edit to one section leaves every other section
//! pointer-identical to any earlier snapshot.

pub mod compose;
pub mod config;
pub mod document;
pub mod editor;
pub mod output;
pub mod render;
pub mod store;
pub mod templates;
pub mod upload;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;
