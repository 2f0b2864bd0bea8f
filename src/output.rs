//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the visitor will see, not with how the document
//! is stored. Sections are listed in render order with a positional index,
//! their type, and their id; stored `order` values and item counts follow
//! as indented context lines. Sections that exist in the document but will
//! not render are listed separately under `Hidden` with the reason.
//!
//! # Output Format
//!
//! ## Layout
//!
//! ```text
//! Layout
//! 001 hero hero-seed (span 4)
//!     Slides: 1
//! 002 links links-seed (span 4)
//!     Order: 1
//!     Items: 2
//!
//! Hidden
//!     news-seed news (disabled)
//!     shop-1 shop (unsupported type)
//! ```
//!
//! ## Show
//!
//! ```text
//! alice (owner owner1)
//!     Created: 2026-05-01 09:30 UTC
//!     Updated: 2026-05-02 18:04 UTC
//!     Published: 2026-05-02 18:04 UTC
//!     Draft: 3f9a0c21 (matches published)
//! ```
//!
//! ## Export
//!
//! ```text
//! alice → alice/index.html
//!     alice/news/index.html
//! bob → bob/index.html
//!
//! Exported 2 pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::compose::compose;
use crate::document::{PageConfig, Section, SectionBody};
use crate::render::ExportedPage;
use crate::store::PageRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a section header: positional index, type, id, grid span.
///
/// ```text
/// 001 hero hero-seed (span 4)
/// ```
fn section_header(index: usize, section: &Section, span: u8) -> String {
    format!(
        "{} {} {} (span {})",
        format_index(index),
        section.type_name(),
        section.id,
        span
    )
}

/// Item count line, labelled by what the section holds.
fn item_line(body: &SectionBody) -> Option<String> {
    let label = match body {
        SectionBody::Hero(_) => "Slides",
        SectionBody::Links(_) | SectionBody::News(_) => "Items",
        SectionBody::Gallery(_) => "Images",
        SectionBody::Video(_) => "Videos",
        SectionBody::Opaque { .. } => return None,
    };
    Some(format!("{}: {}", label, body.item_count()))
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// First 8 hex digits of a revision hash.
fn short_revision(revision: &str) -> &str {
    revision.get(..8).unwrap_or(revision)
}

// ============================================================================
// Layout
// ============================================================================

/// Format the render plan of a document, then everything that will not render.
pub fn format_layout(config: &PageConfig) -> Vec<String> {
    let plan = compose(config);
    let mut lines = vec!["Layout".to_string()];

    if plan.is_empty() {
        lines.push(format!("{}(nothing to render)", indent(1)));
    }
    for (i, entry) in plan.iter().enumerate() {
        lines.push(section_header(i + 1, entry.section, entry.col_span.get()));
        if !matches!(entry.section.body, SectionBody::Hero(_)) {
            lines.push(format!("{}Order: {}", indent(1), entry.section.order));
        }
        if let Some(items) = item_line(&entry.section.body) {
            lines.push(format!("{}{}", indent(1), items));
        }
    }

    let shown: HashSet<*const Section> = plan.iter().map(|e| e.section as *const Section).collect();
    let hidden: Vec<&Arc<Section>> = config
        .sections
        .iter()
        .filter(|s| !shown.contains(&Arc::as_ptr(*s)))
        .collect();
    if !hidden.is_empty() {
        lines.push(String::new());
        lines.push("Hidden".to_string());
        for section in hidden {
            let reason = if section.kind().is_none() {
                "unsupported type"
            } else if !section.enabled {
                "disabled"
            } else {
                "duplicate"
            };
            lines.push(format!(
                "{}{} {} ({})",
                indent(1),
                section.id,
                section.type_name(),
                reason
            ));
        }
    }

    lines
}

/// Print layout output to stdout.
pub fn print_layout(config: &PageConfig) {
    for line in format_layout(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Show
// ============================================================================

/// Format a page record: identity, timestamps, and draft/published status.
pub fn format_record(record: &PageRecord) -> Vec<String> {
    let mut lines = vec![format!("{} (owner {})", record.slug, record.owner_id)];
    lines.push(format!("{}Created: {}", indent(1), format_time(record.created_at)));
    lines.push(format!("{}Updated: {}", indent(1), format_time(record.updated_at)));
    let published = record
        .published_at
        .map(format_time)
        .unwrap_or_else(|| "never".to_string());
    lines.push(format!("{}Published: {}", indent(1), published));

    let draft = record.draft.revision().ok();
    let live = record.published.revision().ok();
    let status = match (&draft, &live) {
        (Some(d), Some(p)) if d == p => "matches published",
        (Some(_), Some(_)) => "unpublished changes",
        _ => "revision unavailable",
    };
    let draft = draft.as_deref().map(short_revision).unwrap_or("?");
    lines.push(format!("{}Draft: {} ({})", indent(1), draft, status));
    lines
}

/// Print record output to stdout.
pub fn print_record(record: &PageRecord) {
    for line in format_record(record) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format export results, sorted by slug.
pub fn format_export(pages: &[ExportedPage]) -> Vec<String> {
    let mut sorted: Vec<&ExportedPage> = pages.iter().collect();
    sorted.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut lines = Vec::new();
    for page in &sorted {
        let mut files = page.files.iter();
        match files.next() {
            Some(first) => lines.push(format!("{} → {}", page.slug, first.display())),
            None => lines.push(page.slug.clone()),
        }
        for file in files {
            lines.push(format!("{}{}", indent(1), file.display()));
        }
    }

    lines.push(String::new());
    let noun = if sorted.len() == 1 { "page" } else { "pages" };
    lines.push(format!("Exported {} {}", sorted.len(), noun));
    lines
}

/// Print export output to stdout.
pub fn print_export(pages: &[ExportedPage]) {
    for line in format_export(pages) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LinkItem, LinksProps, SectionKind};
    use crate::templates::demo_template;
    use crate::test_helpers::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn short_revision_handles_short_input() {
        assert_eq!(short_revision("abcdef0123456789"), "abcdef01");
        assert_eq!(short_revision("abc"), "abc");
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn layout_lists_sections_in_render_order() {
        let links = with_body(
            "l",
            3,
            SectionBody::Links(LinksProps {
                items: vec![LinkItem {
                    id: "a".into(),
                    label: "A".into(),
                    url: "https://a.example".into(),
                    icon: None,
                }],
                title: None,
            }),
        );
        let config = page(vec![links, section(SectionKind::Hero, "h", 9, true)]);
        let lines = format_layout(&config);
        assert_eq!(
            lines,
            vec![
                "Layout",
                "001 hero h (span 4)",
                "    Slides: 0",
                "002 links l (span 4)",
                "    Order: 3",
                "    Items: 1",
            ]
        );
    }

    #[test]
    fn layout_reports_hidden_sections() {
        let mut config = page(vec![
            section(SectionKind::News, "n", 1, false),
            section(SectionKind::Video, "v1", 2, true),
            section(SectionKind::Video, "v2", 3, true),
        ]);
        config.sections.push(Arc::new(
            serde_json::from_value(json!({ "id": "shop-1", "type": "shop", "order": 4 })).unwrap(),
        ));
        let lines = format_layout(&config);
        let hidden = lines.iter().position(|l| l == "Hidden").unwrap();
        assert_eq!(
            &lines[hidden + 1..],
            &[
                "    n news (disabled)",
                "    v2 video (duplicate)",
                "    shop-1 shop (unsupported type)",
            ]
        );
    }

    #[test]
    fn layout_of_empty_document() {
        let lines = format_layout(&PageConfig::default());
        assert_eq!(lines, vec!["Layout", "    (nothing to render)"]);
    }

    // =========================================================================
    // Show
    // =========================================================================

    fn record(draft: PageConfig, published: PageConfig) -> PageRecord {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        PageRecord {
            owner_id: "owner1".into(),
            slug: "alice".into(),
            draft,
            published,
            created_at: at,
            updated_at: at,
            published_at: None,
        }
    }

    #[test]
    fn record_matching_published() {
        let lines = format_record(&record(demo_template(), demo_template()));
        assert_eq!(lines[0], "alice (owner owner1)");
        assert_eq!(lines[1], "    Created: 2026-05-01 09:30 UTC");
        assert_eq!(lines[3], "    Published: never");
        assert!(lines[4].ends_with("(matches published)"));
    }

    #[test]
    fn record_with_unpublished_changes() {
        let lines = format_record(&record(PageConfig::default(), demo_template()));
        assert!(lines[4].ends_with("(unpublished changes)"));
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn export_lines_sorted_by_slug() {
        let pages = vec![
            ExportedPage {
                slug: "bob".into(),
                files: vec![PathBuf::from("bob/index.html")],
                sections: 1,
            },
            ExportedPage {
                slug: "alice".into(),
                files: vec![
                    PathBuf::from("alice/index.html"),
                    PathBuf::from("alice/news/index.html"),
                ],
                sections: 5,
            },
        ];
        assert_eq!(
            format_export(&pages),
            vec![
                "alice → alice/index.html",
                "    alice/news/index.html",
                "bob → bob/index.html",
                "",
                "Exported 2 pages",
            ]
        );
    }
}
