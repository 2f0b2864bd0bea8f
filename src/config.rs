//! Engine configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user file is deep-merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! store_dir = ".pagekit"          # Where page records live (file backend)
//!
//! [seed]
//! template = "demo"               # "demo" or "empty" for brand-new pages
//!
//! [render]
//! default_hero_slides = ["/static/hero-default.jpg"]
//! carousel_interval_ms = 5000     # Fallback slide interval
//! grid_gap = "1.5rem"             # Gap between sections in the page grid
//!
//! [uploads]
//! dir = "uploads"                 # Local upload directory
//! public_prefix = "/uploads"      # URL prefix stored in documents
//! max_bytes = 10485760            # Reject larger uploads
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#000000"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#ffffff"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::templates::SeedTemplate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root directory of the file-backed page store.
    pub store_dir: String,
    /// Template used when a page is created on first access.
    pub seed: SeedConfig,
    /// Rendering fallbacks and grid settings.
    pub render: RenderConfig,
    /// Local upload settings.
    pub uploads: UploadsConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_dir: ".pagekit".to_string(),
            seed: SeedConfig::default(),
            render: RenderConfig::default(),
            uploads: UploadsConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.default_hero_slides.is_empty() {
            return Err(ConfigError::Validation(
                "render.default_hero_slides must not be empty".into(),
            ));
        }
        if self.render.carousel_interval_ms < 500 {
            return Err(ConfigError::Validation(
                "render.carousel_interval_ms must be at least 500".into(),
            ));
        }
        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "uploads.max_bytes must be non-zero".into(),
            ));
        }
        if !self.uploads.public_prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "uploads.public_prefix must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    pub template: SeedTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Slides shown when a hero has none of its own.
    pub default_hero_slides: Vec<String>,
    /// Slide interval used when a hero does not set one.
    pub carousel_interval_ms: u64,
    /// Gap between sections in the page grid (CSS value).
    pub grid_gap: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_hero_slides: vec!["/static/hero-default.jpg".to_string()],
            carousel_interval_ms: 5000,
            grid_gap: "1.5rem".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Directory uploaded files are written to.
    pub dir: String,
    /// URL prefix under which `dir` is served.
    pub public_prefix: String,
    /// Largest accepted upload, in bytes.
    pub max_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            public_prefix: "/uploads".to_string(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Captions, dates, placeholder text.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// [`EngineConfig::default`] as a TOML table, the base every config file is
/// layered over.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::default()).expect("default config must serialize")
}

/// Layer `overrides` over `defaults`.
///
/// Sections such as `[render]` or `[colors.dark]` are merged key by key, so
/// a config file that sets only `render.grid_gap` keeps the stock hero
/// slides. Any other value, arrays included, replaces the default outright.
pub fn merge_toml(defaults: toml::Value, overrides: toml::Value) -> toml::Value {
    match (defaults, overrides) {
        (toml::Value::Table(mut merged), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                let value = match merged.remove(&key) {
                    Some(default) => merge_toml(default, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, replacement) => replacement,
    }
}

/// Parse `config.toml` if there is one. A missing file means "all defaults".
fn read_config_file(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(path)?)?))
}

/// Apply the file's overrides to the stock table and check the result.
/// Unknown keys fail here through `deny_unknown_fields`.
pub fn resolve_config(
    defaults: toml::Value,
    overrides: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overrides {
        Some(overrides) => merge_toml(defaults, overrides),
        None => defaults,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Engine settings for one CLI run: stock defaults with `path` layered on top.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let config = resolve_config(stock_defaults_value(), read_config_file(path)?)?;
    tracing::debug!(path = %path.display(), store_dir = %config.store_dir, "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pagekit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Root directory of the file-backed page store.
store_dir = ".pagekit"

# ---------------------------------------------------------------------------
# New pages
# ---------------------------------------------------------------------------
[seed]
# Template used the first time a page is opened: "demo" or "empty".
template = "demo"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Slides shown when a hero section has none of its own.
default_hero_slides = ["/static/hero-default.jpg"]

# Slide interval for heroes that do not set one (milliseconds, >= 500).
carousel_interval_ms = 5000

# Gap between sections in the page grid (CSS value).
grid_gap = "1.5rem"

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[uploads]
# Directory uploaded files are written to.
dir = "uploads"

# URL prefix under which the upload directory is served.
public_prefix = "/uploads"

# Largest accepted upload, in bytes.
max_bytes = 10485760

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Captions, dates, placeholders
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"
"##
}

/// `--color-*` custom properties for the page shell: the light scheme on
/// `:root`, the dark one behind `prefers-color-scheme: dark`.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    fn vars(scheme: &ColorScheme, indent: &str) -> String {
        [
            ("bg", &scheme.background),
            ("text", &scheme.text),
            ("text-muted", &scheme.text_muted),
            ("border", &scheme.border),
            ("link", &scheme.link),
            ("link-hover", &scheme.link_hover),
        ]
        .iter()
        .map(|(name, value)| format!("{indent}--color-{name}: {value};"))
        .collect::<Vec<_>>()
        .join("\n")
    }

    format!(
        ":root {{\n{}\n}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}\n    }}\n}}",
        vars(&colors.light, "    "),
        vars(&colors.dark, "        "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.store_dir, ".pagekit");
        assert_eq!(config.seed.template, SeedTemplate::Demo);
        assert_eq!(config.render.carousel_interval_ms, 5000);
        assert_eq!(config.uploads.public_prefix, "/uploads");
        assert_eq!(config.colors.light.background, "#ffffff");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[seed]
template = "empty"

[colors.light]
background = "#fafafa"
"##;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.seed.template, SeedTemplate::Empty);
        assert_eq!(config.colors.light.background, "#fafafa");
        // Defaults preserved
        assert_eq!(config.colors.light.text, "#111111");
        assert_eq!(config.store_dir, ".pagekit");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.store_dir, ".pagekit");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
store_dir = "/var/lib/pagekit"

[render]
default_hero_slides = ["/a.jpg", "/b.jpg"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.store_dir, "/var/lib/pagekit");
        assert_eq!(config.render.default_hero_slides.len(), 2);
        assert_eq!(config.render.carousel_interval_ms, 5000);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("[uploads]\nmax_byte = 5\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_template_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("[seed]\ntemplate = \"fancy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fff"
text = "#000"
"##,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fafafa"
"##,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let light = merged.get("colors").unwrap().get("light").unwrap();
        assert_eq!(light.get("background").unwrap().as_str(), Some("#fafafa"));
        assert_eq!(light.get("text").unwrap().as_str(), Some("#000"));
    }

    #[test]
    fn merge_toml_array_replaces_wholesale() {
        let base: toml::Value = toml::from_str(r#"slides = ["/a.jpg", "/b.jpg"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"slides = ["/c.jpg"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("slides").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn validate_rejects_empty_default_slides() {
        let mut config = EngineConfig::default();
        config.render.default_hero_slides.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_interval() {
        let mut config = EngineConfig::default();
        config.render.carousel_interval_ms = 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("carousel_interval_ms"));
    }

    #[test]
    fn validate_rejects_relative_public_prefix() {
        let mut config = EngineConfig::default();
        config.uploads.public_prefix = "uploads".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[uploads]\nmax_bytes = 0\n").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: EngineConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = EngineConfig::default();
        assert_eq!(config.store_dir, defaults.store_dir);
        assert_eq!(config.render.default_hero_slides, defaults.render.default_hero_slides);
        assert_eq!(config.uploads.max_bytes, defaults.uploads.max_bytes);
        assert_eq!(config.colors.dark.link, defaults.colors.dark.link);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for key in ["store_dir", "seed", "render", "uploads", "colors"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn generate_css_uses_both_schemes() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.background = "#1a1a1a".to_string();
        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0;"));
        assert!(css.contains("--color-bg: #1a1a1a;"));
        assert!(css.contains("--color-link-hover:"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }
}
