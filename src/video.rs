//! Video URL resolution.
//!
//! Video items store whatever URL the owner pasted. Before rendering, each
//! URL is resolved to a platform and a video id so the renderer can build
//! an embed or a thumbnail. Two platforms are supported:
//!
//! | Platform | Accepted forms |
//! |----------|----------------|
//! | YouTube  | `youtube.com/watch?v=ID`, `youtu.be/ID`, `/embed/ID`, `/shorts/ID`, `/live/ID`, `youtube-nocookie.com/embed/ID` |
//! | Vimeo    | `vimeo.com/ID`, `vimeo.com/ID/HASH`, `vimeo.com/channels/NAME/ID`, `player.vimeo.com/video/ID` |
//!
//! A missing scheme is tolerated (`youtu.be/abc` works). Anything else
//! resolves to `None`, and the renderer shows an inert placeholder.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPlatform {
    YouTube,
    Vimeo,
}

impl VideoPlatform {
    pub fn name(self) -> &'static str {
        match self {
            VideoPlatform::YouTube => "YouTube",
            VideoPlatform::Vimeo => "Vimeo",
        }
    }
}

/// A video URL pinned to a platform and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub platform: VideoPlatform,
    pub id: String,
    /// Vimeo privacy hash for unlisted videos.
    pub hash: Option<String>,
}

impl ResolvedVideo {
    /// URL for an `<iframe>` player.
    pub fn embed_url(&self) -> String {
        match self.platform {
            VideoPlatform::YouTube => format!("https://www.youtube-nocookie.com/embed/{}", self.id),
            VideoPlatform::Vimeo => match &self.hash {
                Some(h) => format!("https://player.vimeo.com/video/{}?h={}", self.id, h),
                None => format!("https://player.vimeo.com/video/{}", self.id),
            },
        }
    }

    /// Canonical watch page.
    pub fn watch_url(&self) -> String {
        match self.platform {
            VideoPlatform::YouTube => format!("https://www.youtube.com/watch?v={}", self.id),
            VideoPlatform::Vimeo => match &self.hash {
                Some(h) => format!("https://vimeo.com/{}/{}", self.id, h),
                None => format!("https://vimeo.com/{}", self.id),
            },
        }
    }

    /// Still image, where the platform exposes one at a predictable URL.
    pub fn thumbnail_url(&self) -> Option<String> {
        match self.platform {
            VideoPlatform::YouTube => Some(format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", self.id)),
            VideoPlatform::Vimeo => None,
        }
    }
}

/// Resolve a pasted video URL.
pub fn resolve(input: &str) -> Option<ResolvedVideo> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match host {
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => youtube_from_path(&url, &segments),
        "youtu.be" => segments.first().and_then(|id| youtube(id)),
        "vimeo.com" | "player.vimeo.com" => vimeo_from_path(&segments),
        _ => None,
    }
}

fn youtube_from_path(url: &Url, segments: &[&str]) -> Option<ResolvedVideo> {
    match segments {
        ["watch"] => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .and_then(|(_, v)| youtube(&v)),
        ["embed" | "shorts" | "live" | "v", id, ..] => youtube(id),
        _ => None,
    }
}

fn youtube(id: &str) -> Option<ResolvedVideo> {
    let valid = id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| ResolvedVideo {
        platform: VideoPlatform::YouTube,
        id: id.to_string(),
        hash: None,
    })
}

fn vimeo_from_path(segments: &[&str]) -> Option<ResolvedVideo> {
    let pos = segments.iter().position(|s| is_numeric(s))?;
    let hash = segments
        .get(pos + 1)
        .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|h| h.to_string());
    Some(ResolvedVideo {
        platform: VideoPlatform::Vimeo,
        id: segments[pos].to_string(),
        hash,
    })
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
