//! Renderer adapter - maps articles onto the view models templates consume
//!
//! Field mapping and path resolution only. Markdown conversion is delegated
//! to a [`MarkupRenderer`].

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{tag_slug, Article, MarkdownRenderer, MarkupRenderer};
use crate::helpers::{
    date_iso, encode_segment, format_date, full_url_for, is_absolute_url, normalize_relative,
    reading_time, url_for,
};

/// What the view is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Summary card in an index or tag listing (excerpt only)
    Listing,
    /// The full article page
    Page,
}

/// A tag with the URL of its listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagLink {
    pub name: String,
    pub path: String,
}

/// Cover image with its URL resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverView {
    pub url: String,
    pub author: Option<String>,
    pub link: Option<String>,
}

/// Everything the presentation layer needs to show an article
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Site-relative URL (`/blog/hello/`)
    pub path: String,
    /// Absolute URL
    pub permalink: String,
    /// ISO date (`2021-02-01`)
    pub date: String,
    /// Human-readable date
    pub date_display: String,
    pub tags: Vec<TagLink>,
    pub cover: Option<CoverView>,
    pub canonical_url: Option<String>,
    /// Minutes
    pub reading_time: usize,
    /// Rendered text before `<!-- more -->`, if the article has one
    pub excerpt: Option<String>,
    /// Rendered body, only for [`RenderTarget::Page`]
    pub content: Option<String>,
}

/// An asset an article references, for copying into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// File on disk
    pub source: PathBuf,
    /// Path below the output root, `/`-separated, not URL-encoded
    pub url_path: String,
}

/// Builds [`ArticleView`]s for one site
pub struct ArticleRenderer {
    config: SiteConfig,
    markup: Box<dyn MarkupRenderer>,
}

impl ArticleRenderer {
    /// Renderer using the built-in markdown collaborator
    pub fn new(config: &SiteConfig) -> Self {
        Self::with_markup(
            config,
            Box::new(MarkdownRenderer::with_options(&config.highlight)),
        )
    }

    pub fn with_markup(config: &SiteConfig, markup: Box<dyn MarkupRenderer>) -> Self {
        Self {
            config: config.clone(),
            markup,
        }
    }

    /// Build the view of `article` for `target`
    pub fn view(&self, article: &Article, target: RenderTarget) -> Result<ArticleView> {
        let (excerpt_md, full_md) = MarkdownRenderer::split_excerpt(&article.body);

        let excerpt = excerpt_md.map(|md| self.markup.render(md)).transpose()?;
        let content = match target {
            RenderTarget::Page => Some(self.markup.render(&full_md)?),
            RenderTarget::Listing => None,
        };

        let path = self.article_path(&article.slug);
        Ok(ArticleView {
            slug: article.slug.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            permalink: full_url_for(&self.config, &path),
            path,
            date: date_iso(&article.published_at),
            date_display: format_date(&article.published_at, &self.config.display_date_format),
            tags: article.tags.iter().map(|t| self.tag_link(t)).collect(),
            cover: self.cover(article),
            canonical_url: article.canonical_url.clone(),
            reading_time: reading_time(&full_md),
            excerpt,
            content,
        })
    }

    /// Views of several articles at once
    pub fn views<'a>(
        &self,
        articles: impl IntoIterator<Item = &'a Article>,
        target: RenderTarget,
    ) -> Result<Vec<ArticleView>> {
        articles
            .into_iter()
            .map(|a| self.view(a, target))
            .collect()
    }

    /// Site-relative URL of an article page
    pub fn article_path(&self, slug: &str) -> String {
        url_for(&self.config, &format!("{}/", slug))
    }

    /// Output-relative directory of a tag listing (`tags/rust`)
    pub fn tag_dir(&self, tag: &str) -> String {
        format!(
            "{}/{}",
            self.config.tag_dir.trim_matches('/'),
            tag_slug(tag)
        )
    }

    pub fn tag_link(&self, tag: &str) -> TagLink {
        TagLink {
            name: tag.to_string(),
            path: url_for(&self.config, &format!("{}/", self.tag_dir(tag))),
        }
    }

    /// Resolve the cover image URL.
    ///
    /// Absolute URLs pass through, `/`-rooted paths are site-relative and
    /// anything else lives in the article's asset directory.
    pub fn cover(&self, article: &Article) -> Option<CoverView> {
        let cover = article.cover_image.as_ref()?;

        let url = if is_absolute_url(&cover.path) {
            cover.path.clone()
        } else if cover.path.starts_with('/') {
            url_for(&self.config, &encode_path(&cover.path))
        } else {
            let asset = self.local_asset(article, &cover.path)?;
            url_for(&self.config, &encode_path(&asset.url_path))
        };

        Some(CoverView {
            url,
            author: cover.author.clone(),
            link: cover.link.clone(),
        })
    }

    /// Files the asset pipeline must publish for `article`
    pub fn assets(&self, article: &Article) -> Vec<AssetRef> {
        article
            .cover_image
            .as_ref()
            .filter(|c| !is_absolute_url(&c.path) && !c.path.starts_with('/'))
            .and_then(|c| self.local_asset(article, &c.path))
            .into_iter()
            .collect()
    }

    fn local_asset(&self, article: &Article, reference: &str) -> Option<AssetRef> {
        let Some(relative) = normalize_relative(reference).filter(|r| !r.is_empty()) else {
            tracing::warn!(
                "Asset {:?} of {:?} escapes its asset directory, ignoring",
                reference,
                article.source
            );
            return None;
        };

        Some(AssetRef {
            source: article.asset_dir.join(&relative),
            url_path: format!(
                "{}/{}/{}",
                self.config.asset_dir.trim_matches('/'),
                article.slug,
                relative
            ),
        })
    }
}

fn encode_path(path: &str) -> String {
    path.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}
