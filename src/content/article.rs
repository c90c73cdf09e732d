//! Article model

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{ArticleMeta, CoverImage};

/// A parsed, validated article. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// URL-safe identifier derived from the file name
    pub slug: String,

    pub title: String,

    /// Publication date, the default ordering key
    pub published_at: NaiveDate,

    /// Summary used in listings, empty when not given
    pub description: String,

    pub tags: BTreeSet<String>,

    pub cover_image: Option<CoverImage>,

    /// Canonical URL for SEO metadata
    pub canonical_url: Option<String>,

    /// Raw markdown after the front-matter block
    pub body: String,

    /// Source file path
    pub source: PathBuf,

    /// Directory that relative asset references resolve against
    pub asset_dir: PathBuf,
}

impl Article {
    /// Assemble an article from validated metadata and its source location
    pub fn new(meta: ArticleMeta, body: &str, source: &Path) -> Self {
        let (slug, asset_dir) = slug_for(source);
        Self {
            slug,
            title: meta.title,
            published_at: meta.published_at,
            description: meta.description,
            tags: meta.tags,
            cover_image: meta.cover_image,
            canonical_url: meta.canonical_url,
            body: body.to_string(),
            source: source.to_path_buf(),
            asset_dir,
        }
    }

    /// Whether the article carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Derive the slug and asset directory for a source file.
///
/// `posts/hello-world.md` gives `hello-world`, assets next to the file.
/// `posts/hello-world/index.md` gives `hello-world`, assets in that directory.
fn slug_for(source: &Path) -> (String, PathBuf) {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");

    let name = if stem.eq_ignore_ascii_case("index") {
        parent
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(stem)
    } else {
        stem
    };

    (slug::slugify(name), parent.to_path_buf())
}

/// URL slug of a tag listing. Tags differing only in case or punctuation
/// share one.
pub fn tag_slug(tag: &str) -> String {
    slug::slugify(tag)
}
