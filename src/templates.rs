//! Seed documents for brand-new pages.
//!
//! A page's draft and published slots are created together on first access
//! and both start from one of these. The demo template fills every section
//! type with placeholder content so a new owner sees what the page can do;
//! the empty template is a blank canvas. Section ids in templates use a
//! fixed `"{type}-seed"` form because they are written exactly once per page.

use crate::document::{
    Background, CarouselSettings, GalleryImage, GalleryProps, HeroLayout, HeroProps, HeroSlide,
    LinkItem, LinksProps, Meta, NewsItem, NewsLayout, NewsProps, PageConfig, Section,
    SectionBody, SectionLayout, SocialLink, VideoDisplay, VideoItem, VideoLayout, VideoProps,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which template seeds a new page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeedTemplate {
    #[default]
    Demo,
    Empty,
}

impl SeedTemplate {
    pub fn build(self) -> PageConfig {
        match self {
            SeedTemplate::Demo => demo_template(),
            SeedTemplate::Empty => empty_template(),
        }
    }
}

/// Blank page: white background, no sections.
pub fn empty_template() -> PageConfig {
    PageConfig {
        background: Background::Color("#ffffff".to_string()),
        ..PageConfig::default()
    }
}

/// Demo page with one section of every type.
pub fn demo_template() -> PageConfig {
    let hero = Section::new(
        "hero-seed",
        0,
        SectionBody::Hero(HeroProps {
            slides: vec![
                demo_slide(1, "Morning light over the bay"),
                demo_slide(2, "Studio, late afternoon"),
                demo_slide(3, "Back at the workbench"),
            ],
            title: Some("Your name here".to_string()),
            subtitle: Some("A short line about what you do".to_string()),
            carousel: CarouselSettings {
                autoplay: true,
                interval_ms: Some(5000),
            },
            layout: HeroLayout::Centered,
        }),
    );

    let links = Section::new(
        "links-seed",
        1,
        SectionBody::Links(LinksProps {
            title: Some("Find me elsewhere".to_string()),
            items: vec![
                LinkItem {
                    id: "link-seed-1".to_string(),
                    label: "Portfolio".to_string(),
                    url: "https://example.com/portfolio".to_string(),
                    icon: None,
                },
                LinkItem {
                    id: "link-seed-2".to_string(),
                    label: "Newsletter".to_string(),
                    url: "https://example.com/newsletter".to_string(),
                    icon: Some("mail".to_string()),
                },
            ],
        }),
    );

    let mut gallery = Section::new(
        "gallery-seed",
        2,
        SectionBody::Gallery(GalleryProps {
            title: Some("Recent work".to_string()),
            columns: Some(3),
            items: (1..=6)
                .map(|n| GalleryImage {
                    id: format!("gallery-seed-{n}"),
                    src: format!("/static/demo/gallery-{n}.jpg"),
                    alt: Some(format!("Demo image {n}")),
                    caption: None,
                })
                .collect(),
        }),
    );
    gallery.layout = Some(SectionLayout { col_span: Some(4) });

    let mut news = Section::new(
        "news-seed",
        3,
        SectionBody::News(NewsProps {
            title: Some("News".to_string()),
            layout: NewsLayout::Strip,
            items: vec![NewsItem {
                id: "news-seed-1".to_string(),
                src: "/static/demo/news-1.jpg".to_string(),
                href: "https://example.com/blog/hello".to_string(),
                title: Some("Hello, world".to_string()),
                date: None,
            }],
        }),
    );
    news.layout = Some(SectionLayout { col_span: Some(2) });

    let mut video = Section::new(
        "video-seed",
        4,
        SectionBody::Video(VideoProps {
            title: Some("Watch".to_string()),
            layout: VideoLayout::Single,
            display: VideoDisplay::Embed,
            items: vec![VideoItem {
                id: "video-seed-1".to_string(),
                url: "https://www.youtube.com/watch?v=aqz-KE-bpKQ".to_string(),
                title: Some("Showreel".to_string()),
            }],
        }),
    );
    video.layout = Some(SectionLayout { col_span: Some(2) });

    PageConfig {
        background: Background::Color("#f6f4ef".to_string()),
        sections: [hero, links, gallery, news, video]
            .into_iter()
            .map(Arc::new)
            .collect(),
        logo: None,
        social_links: vec![
            SocialLink {
                id: "social-seed-1".to_string(),
                name: "Instagram".to_string(),
                url: "https://instagram.com/".to_string(),
                icon: Some("instagram".to_string()),
                enabled: true,
            },
            SocialLink {
                id: "social-seed-2".to_string(),
                name: "YouTube".to_string(),
                url: "https://youtube.com/".to_string(),
                icon: Some("youtube".to_string()),
                enabled: true,
            },
        ],
        meta: Some(Meta {
            title: Some("My page".to_string()),
            description: Some("Built with pagekit".to_string()),
        }),
        blog_background: None,
        news_background: None,
    }
}

fn demo_slide(n: u32, alt: &str) -> HeroSlide {
    HeroSlide {
        id: format!("slide-seed-{n}"),
        src: format!("/static/demo/hero-{n}.jpg"),
        alt: Some(alt.to_string()),
        href: None,
    }
}
