//! End-to-end scenarios through the public API.
//!
//! Each test drives the store, editor, and composition engine together the
//! way a client would, against the in-memory backend.
//!
//! Run with: `cargo test --test scenarios`

use pagekit::compose::compose;
use pagekit::document::{
    HeroSlide, PageConfig, Section, SectionBody, SectionKind,
};
use pagekit::editor::{Editor, EditorError};
use pagekit::render::{self, RenderContext, RenderMode};
use pagekit::store::{ConfigStore, MemoryBackend, StoreError};
use pagekit::templates::{SeedTemplate, demo_template, empty_template};
use serde_json::json;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store(seed: SeedTemplate) -> ConfigStore<MemoryBackend> {
    ConfigStore::new(MemoryBackend::new(), seed)
}

fn section(kind: SectionKind, id: &str, order: i64, enabled: bool) -> Arc<Section> {
    let mut section = Section::new(id, order, SectionBody::empty(kind));
    section.enabled = enabled;
    Arc::new(section)
}

fn document(sections: Vec<Arc<Section>>) -> PageConfig {
    PageConfig {
        sections,
        ..Default::default()
    }
}

fn composed_ids(config: &PageConfig) -> Vec<String> {
    compose(config)
        .iter()
        .map(|c| c.section.id.clone())
        .collect()
}

fn hero_slides(config: &PageConfig) -> Vec<HeroSlide> {
    match &config.section(SectionKind::Hero).expect("hero section").body {
        SectionBody::Hero(props) => props.slides.clone(),
        other => panic!("expected hero body, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Editing and publishing
// ---------------------------------------------------------------------------

#[test]
fn first_hero_slide_survives_save() {
    let store = store(SeedTemplate::Empty);
    let mut editor = Editor::open(&store, "owner1", "alice").unwrap();
    assert_eq!(editor.document(), &empty_template());

    let hero_id = editor.ensure_section(SectionKind::Hero).id.clone();
    editor
        .update_section_props(&hero_id, json!({ "slides": [{ "src": "/a.jpg" }] }))
        .unwrap();
    editor.save_draft().unwrap();

    let draft = store.get_draft("owner1").unwrap().unwrap();
    let heroes: Vec<_> = draft
        .sections
        .iter()
        .filter(|s| s.kind() == Some(SectionKind::Hero))
        .collect();
    assert_eq!(heroes.len(), 1);
    let slides = hero_slides(&draft);
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].src, "/a.jpg");
    assert!(slides[0].id.starts_with("slide-"));
}

#[test]
fn hero_first_and_disabled_excluded() {
    let config = document(vec![
        section(SectionKind::Hero, "hero", 5, true),
        section(SectionKind::Gallery, "gallery", 1, true),
        section(SectionKind::News, "news", 2, false),
    ]);
    assert_eq!(composed_ids(&config), vec!["hero", "gallery"]);
}

#[test]
fn draft_save_does_not_leak_into_published() {
    let store = store(SeedTemplate::Empty);
    store.ensure("owner1", "alice").unwrap();

    let d1 = document(vec![section(SectionKind::Links, "links", 1, true)]);
    let d2 = document(vec![section(SectionKind::Gallery, "gallery", 1, true)]);

    store.set_draft("owner1", d1.clone()).unwrap();
    store.publish("owner1").unwrap();
    store.set_draft("owner1", d2.clone()).unwrap();

    assert_eq!(store.get_published("alice").unwrap().unwrap(), d1);
    assert_eq!(store.get_draft("owner1").unwrap().unwrap(), d2);
}

#[test]
fn empty_slide_is_stripped_on_save() {
    let store = store(SeedTemplate::Empty);
    let mut editor = Editor::open(&store, "owner1", "alice").unwrap();
    editor.add_hero_slide("/keep.jpg", None).unwrap();
    let blank = editor.add_hero_slide("", None).unwrap();

    editor.save_draft().unwrap();

    let slides = hero_slides(&store.get_draft("owner1").unwrap().unwrap());
    assert_eq!(slides.len(), 1);
    assert!(slides.iter().all(|s| s.id != blank));
    assert_eq!(slides[0].src, "/keep.jpg");
}

// ---------------------------------------------------------------------------
// Fixed-input checks (randomized versions live in properties.rs)
// ---------------------------------------------------------------------------

#[test]
fn disabled_sections_stay_in_draft() {
    let store = store(SeedTemplate::Demo);
    let mut editor = Editor::open(&store, "owner1", "alice").unwrap();
    let gallery_id = editor.get_section(SectionKind::Gallery).unwrap().id.clone();
    editor.toggle_enabled(&gallery_id).unwrap();
    editor.save_draft().unwrap();

    let draft = store.get_draft("owner1").unwrap().unwrap();
    let stored = draft.section_by_id(&gallery_id).unwrap();
    assert!(!stored.enabled);
    assert!(stored.body.item_count() > 0);
    assert!(!composed_ids(&draft).contains(&gallery_id));
}

#[test]
fn publish_is_an_exact_snapshot() {
    let store = store(SeedTemplate::Demo);
    store.ensure("owner1", "alice").unwrap();

    let mut draft = empty_template();
    draft.sections.push(section(SectionKind::Video, "video", 3, false));
    draft.sections.push(Arc::new(
        serde_json::from_value(json!({
            "id": "shop-1", "type": "shop", "order": 1, "props": { "sku": [1, 2] }
        }))
        .unwrap(),
    ));
    store.set_draft("owner1", draft.clone()).unwrap();
    store.publish("owner1").unwrap();

    assert_eq!(store.get_published("alice").unwrap().unwrap(), draft);
    assert_ne!(draft, demo_template());
}

#[test]
fn ensure_hero_twice_equals_once() {
    let store = store(SeedTemplate::Empty);
    let mut once = Editor::open(&store, "owner1", "alice").unwrap();
    once.ensure_section(SectionKind::Hero);
    let after_once = once.document().clone();
    once.ensure_section(SectionKind::Hero);

    assert_eq!(once.document(), &after_once);
    assert_eq!(
        once.document()
            .sections
            .iter()
            .filter(|s| s.kind() == Some(SectionKind::Hero))
            .count(),
        1
    );
}

// ---------------------------------------------------------------------------
// Full round trips
// ---------------------------------------------------------------------------

#[test]
fn edit_publish_render_round_trip() {
    let store = store(SeedTemplate::Empty);
    let mut editor = Editor::open(&store, "owner1", "alice").unwrap();
    editor.add_hero_slide("/hero.jpg", Some("Me".into())).unwrap();
    editor.set_hero_text(Some("Alice".into()), None).unwrap();
    editor.add_link("Blog", "https://blog.example").unwrap();
    editor.publish().unwrap();

    let ctx = RenderContext::from_config(&Default::default(), RenderMode::Published);
    let html = render::render_published(&store, "alice", &ctx)
        .unwrap()
        .into_string();
    assert!(html.contains("/hero.jpg"));
    assert!(html.contains("https://blog.example"));
    assert!(!html.contains("draft-banner"));

    // Keep editing; the public page does not move until the next publish.
    editor.add_link("Shop", "https://shop.example").unwrap();
    editor.save_draft().unwrap();
    let html = render::render_published(&store, "alice", &ctx)
        .unwrap()
        .into_string();
    assert!(!html.contains("https://shop.example"));

    let preview_ctx = RenderContext::from_config(&Default::default(), RenderMode::Preview);
    let preview = render::render_draft_preview(&store, "owner1", &preview_ctx)
        .unwrap()
        .into_string();
    assert!(preview.contains("https://shop.example"));
}

#[test]
fn unknown_sections_round_trip_through_the_editor() {
    let store = store(SeedTemplate::Empty);
    store.ensure("owner1", "alice").unwrap();
    let raw = json!({
        "background": { "type": "color", "value": "#fff" },
        "sections": [
            { "id": "shop-1", "type": "shop", "enabled": true, "order": 2, "props": { "x": 1 } },
            { "id": "links-1", "type": "links", "enabled": true, "order": 1, "props": { "items": [] } }
        ]
    });
    let draft: PageConfig = serde_json::from_value(raw).unwrap();
    store.set_draft("owner1", draft).unwrap();

    let mut editor = Editor::open(&store, "owner1", "alice").unwrap();
    editor.add_link("A", "https://a.example").unwrap();
    editor.save_draft().unwrap();

    let saved = serde_json::to_value(store.get_draft("owner1").unwrap().unwrap()).unwrap();
    let shop = saved["sections"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "shop-1")
        .unwrap();
    assert_eq!(shop["type"], "shop");
    assert_eq!(shop["props"], json!({ "x": 1 }));
}

#[test]
fn publish_without_record_is_an_error() {
    let store = store(SeedTemplate::Empty);
    let mut editor = Editor::with_document(&store, "ghost", empty_template());
    let err = editor.publish().unwrap_err();
    assert!(matches!(err, EditorError::Store(StoreError::NotFound(_))));
    assert!(matches!(
        store.publish("ghost"),
        Err(StoreError::NoDraft(_))
    ));
}
