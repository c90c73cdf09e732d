//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    /// URL segment under which per-article assets are published
    pub asset_dir: String,
    pub tag_dir: String,
    /// Glob patterns (relative to the content dir) that are never loaded
    #[serde(default)]
    pub exclude: Vec<String>,

    // Date / Time format (chrono strftime syntax)
    /// Format `published_at` must parse under
    pub date_format: String,
    /// Format used when showing dates to readers
    pub display_date_format: String,

    // Feed
    pub feed_limit: usize,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),
            asset_dir: "assets".to_string(),
            tag_dir: "tags".to_string(),
            exclude: Vec::new(),

            date_format: "%Y-%m-%d".to_string(),
            display_date_format: "%B %-d, %Y".to_string(),

            feed_limit: 20,

            highlight: HighlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Whether an article slug would be empty or land on a generated directory
    pub fn is_reserved_slug(&self, slug: &str) -> bool {
        let first_segment = |dir: &str| {
            dir.trim_matches('/')
                .split('/')
                .next()
                .unwrap_or("")
                .to_string()
        };
        slug.is_empty()
            || slug == first_segment(&self.tag_dir)
            || slug == first_segment(&self.asset_dir)
    }

    /// Compile the `exclude` globs
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {}", p))
            })
            .collect()
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub line_number: bool,
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            line_number: true,
            theme: "base16-ocean.dark".to_string(),
        }
    }
}
