//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file is sparse:
//! it is merged over the stock defaults, so a site only lists what differs.
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! name = "Field Notes"          # Short name (manifest, opensearch)
//! title = "Field Notes"         # Full title for <title> and feeds
//! description = ""
//! domain = "notes.example.com"  # Required. Bare host, no scheme
//! twitter_id = "notes"          # Author handle, rendered as "@notes"
//! author_name = ""
//! email = ""
//! analytics_id = ""             # Omitted from pages in debug builds
//! cover_images = false         # Entry pages point og:image at /covers/{slug}.png
//! comments = false
//!
//! [build]
//! content = "posts/*.md"        # Glob of source documents
//! output = "public"
//! images = "images"             # Feed image lookup, relative to assets (or output)
//! assets = ""                   # Optional directory copied into output
//! entries_per_page = 10
//! locale = "en_US"
//! debug = false
//! stylesheet = ""               # Optional; its hash versions the CSS URL
//!
//! [features]
//! skip_feeds = false
//! skip_json = false
//! skip_images = false
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! [`Settings`] is the read-only, template-facing view derived once from the
//! loaded config.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
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

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Identity and branding.
    pub site: SiteSection,
    /// Input and output locations, paging, locale.
    pub build: BuildConfig,
    /// Output toggles.
    pub features: FeaturesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain = self.site.domain.trim();
        if domain.is_empty() {
            return Err(ConfigError::Validation("site.domain must be set".into()));
        }
        if domain.contains("://") || domain.contains('/') {
            return Err(ConfigError::Validation(
                "site.domain must be a bare host name, without scheme or path".into(),
            ));
        }
        if self.build.entries_per_page == 0 {
            return Err(ConfigError::Validation(
                "build.entries_per_page must be greater than zero".into(),
            ));
        }
        if self.build.content.trim().is_empty() {
            return Err(ConfigError::Validation(
                "build.content must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub name: String,
    pub title: String,
    pub description: String,
    /// Bare host the site is served from, e.g. `notes.example.com`.
    pub domain: String,
    pub twitter_id: String,
    pub author_name: String,
    pub email: String,
    pub analytics_id: String,
    pub cover_images: bool,
    pub comments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Glob selecting the source documents.
    pub content: String,
    pub output: String,
    /// Directory holding feed images, relative to `assets` when set, else
    /// to `output`.
    pub images: String,
    /// Static files copied verbatim into `output`. Empty disables the copy.
    pub assets: String,
    pub entries_per_page: usize,
    pub locale: String,
    /// Debug builds drop analytics and stylesheet versioning.
    pub debug: bool,
    pub stylesheet: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content: "posts/*.md".to_string(),
            output: "public".to_string(),
            images: "images".to_string(),
            assets: String::new(),
            entries_per_page: 10,
            locale: "en_US".to_string(),
            debug: false,
            stylesheet: String::new(),
        }
    }
}

impl BuildConfig {
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output)
    }

    /// Where feed images are measured. Assets are copied only after the
    /// corpus validates, so with an assets directory the images are read from
    /// their source rather than from the output.
    pub fn image_dir(&self) -> PathBuf {
        self.assets_dir()
            .unwrap_or_else(|| self.output_dir())
            .join(&self.images)
    }

    pub fn assets_dir(&self) -> Option<PathBuf> {
        (!self.assets.trim().is_empty()).then(|| PathBuf::from(&self.assets))
    }

    /// Resolve `content`, `output`, `assets` and `stylesheet` against `root`.
    /// Absolute values are left as they are.
    pub fn rebase(&mut self, root: &Path) {
        let join = |value: &str| root.join(value).to_string_lossy().into_owned();
        self.content = join(&self.content);
        self.output = join(&self.output);
        if !self.assets.trim().is_empty() {
            self.assets = join(&self.assets);
        }
        if !self.stylesheet.is_empty() {
            self.stylesheet = join(&self.stylesheet);
        }
    }

    /// Entries per listing page. Zero is rejected by [`SiteConfig::validate`].
    pub fn page_size(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.entries_per_page).ok_or_else(|| {
            ConfigError::Validation("build.entries_per_page must be greater than zero".into())
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    pub skip_feeds: bool,
    pub skip_json: bool,
    /// Skip measuring feed images; feed entries then carry no enclosures.
    pub skip_images: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel ingestion workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Settings
// =============================================================================

/// Template-facing site settings, derived once per build and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub site_name: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    /// `@handle`, or empty.
    pub author: String,
    pub author_name: String,
    pub email: String,
    pub ga_id: String,
    /// Entry pages advertise `/covers/{slug}.png` as their social card.
    pub cover_images: bool,
    pub comments: bool,
    /// Short content hash appended to the stylesheet URL; empty when unversioned.
    pub styles_id: String,
    pub locale: String,
    pub debug: bool,
    pub skip_feeds: bool,
    pub skip_json: bool,
    pub skip_images: bool,
}

impl Settings {
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        let site = &config.site;
        let build = &config.build;
        let styles_id = if build.debug || build.stylesheet.is_empty() {
            String::new()
        } else {
            styles_id(&fs::read(&build.stylesheet)?)
        };

        Ok(Self {
            site_name: site.name.clone(),
            title: site.title.clone(),
            description: site.description.clone(),
            domain: site.domain.trim().to_string(),
            author: if site.twitter_id.is_empty() {
                String::new()
            } else {
                format!("@{}", site.twitter_id.trim_start_matches('@'))
            },
            author_name: site.author_name.clone(),
            email: site.email.clone(),
            ga_id: site.analytics_id.clone(),
            cover_images: site.cover_images,
            comments: site.comments,
            styles_id,
            locale: build.locale.clone(),
            debug: build.debug,
            skip_feeds: config.features.skip_feeds,
            skip_json: config.features.skip_json,
            skip_images: config.features.skip_images,
        })
    }

    /// Absolute URL of a site path.
    pub fn url(&self, path: &str) -> String {
        format!("https://{}/{}", self.domain, path.trim_start_matches('/'))
    }

    /// BCP 47 language tag for the `lang` attribute (`en_US` → `en-US`).
    pub fn lang(&self) -> String {
        self.locale.replace('_', "-")
    }
}

/// First four hex digits of the SHA-256 of the stylesheet.
pub fn styles_id(stylesheet: &[u8]) -> String {
    format!("{:x}", Sha256::digest(stylesheet))
        .chars()
        .take(4)
        .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config file at `path`, merged over stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Press Configuration
# ==========================
# Values shown below are the defaults. Only `site.domain` is required.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Short name, used by the web app manifest and the search descriptor.
name = ""

# Full title for pages and feeds.
title = ""

description = ""

# Bare host the site is served from (no scheme, no path), e.g. "notes.example.com".
domain = ""

# Author handle without "@".
twitter_id = ""

author_name = ""
email = ""

# Analytics property id. Left out of pages in debug builds.
analytics_id = ""

# Advertise /covers/{slug}.png as each entry's social card image. The images
# are not generated by the build; ship them in the assets directory.
cover_images = false

# Add a comments section to entry pages.
comments = false

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Glob selecting the markdown sources.
content = "posts/*.md"

# Output directory. Files in it are overwritten.
output = "public"

# Directory with the images referenced by posts, relative to the assets
# directory when one is set, else to the output directory. Feed enclosures
# are measured from these files.
images = "images"

# Directory copied verbatim into the output before building. Empty disables.
assets = ""

entries_per_page = 10
locale = "en_US"

# Debug builds drop analytics and stylesheet versioning.
debug = false

# Stylesheet whose content hash versions the CSS URL. Empty disables.
stylesheet = ""

# ---------------------------------------------------------------------------
# Features
# ---------------------------------------------------------------------------
[features]
skip_feeds = false
skip_json = false

# Do not measure feed images; feeds are then written without enclosures.
skip_images = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel ingestion workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
