//! Content loader - discovers, parses and validates articles

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{
    Article, ArticleMeta, BuildFailure, Collection, ContentError, Diagnostic, FrontMatter,
};
use crate::Blog;

/// Loads articles from the content directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Result<Self> {
        let exclude = blog.config.exclude_patterns()?;
        Ok(Self { blog, exclude })
    }

    /// Every markdown document under the content directory, in path order
    pub fn discover(&self) -> Vec<PathBuf> {
        let content_dir = &self.blog.content_dir;
        if !content_dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", content_dir);
            return Vec::new();
        }

        let mut paths = Vec::new();
        let walker = WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }
            if self.is_excluded(path) {
                tracing::debug!("Excluded: {:?}", path);
                continue;
            }
            paths.push(path.to_path_buf());
        }

        paths
    }

    /// Load a single article from a file
    pub fn load_article(&self, path: &Path) -> Result<Article, ContentError> {
        let content = fs::read_to_string(path)?;
        let article = parse_article(&content, path, &self.blog.config.date_format)?;
        if self.blog.config.is_reserved_slug(&article.slug) {
            return Err(ContentError::ReservedSlug(article.slug));
        }
        Ok(article)
    }

    /// Load every article and index them.
    ///
    /// A bad document does not stop the others from loading; all failures
    /// are collected and returned together.
    pub fn load(&self) -> Result<Collection, BuildFailure> {
        let mut articles = Vec::new();
        let mut diagnostics = Vec::new();

        for path in self.discover() {
            match self.load_article(&path) {
                Ok(article) => {
                    tracing::debug!("Loaded {:?} as {}", path, article.slug);
                    articles.push(article);
                }
                Err(error) => diagnostics.push(Diagnostic::new(self.display_path(&path), error)),
            }
        }

        for conflict in Collection::conflicts(&articles) {
            let path = match &conflict {
                ContentError::DuplicateSlug { second, .. } => self.display_path(second),
                ContentError::TagCollision { path, .. } => self.display_path(path),
                _ => self.display_path(&self.blog.content_dir),
            };
            diagnostics.push(Diagnostic::new(path, conflict));
        }
        if !diagnostics.is_empty() {
            return Err(BuildFailure { diagnostics });
        }

        let collection = Collection::build(articles).map_err(|error| BuildFailure {
            diagnostics: vec![Diagnostic::new(self.display_path(&self.blog.content_dir), error)],
        })?;
        tracing::info!("Loaded {} articles", collection.len());
        Ok(collection)
    }

    /// Path relative to the site root, for messages
    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.blog.base_dir)
            .unwrap_or(path)
            .to_path_buf()
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.blog.content_dir) else {
            return false;
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };
        self.exclude
            .iter()
            .any(|p| p.matches_path_with(relative, options))
    }
}

/// Parse and validate one document
pub fn parse_article(content: &str, path: &Path, date_format: &str) -> Result<Article, ContentError> {
    let (fm, body) = FrontMatter::parse(content)?;
    let meta = ArticleMeta::validate(fm, date_format)?;
    Ok(Article::new(meta, body, path))
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// Dot-files and `_`-prefixed entries (e.g. `_drafts`) are never content
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') || s.starts_with('_'))
        .unwrap_or(false)
}
