//! Front-matter validation
//!
//! Maps the loosely-typed [`FrontMatter`] onto [`ArticleMeta`], the fixed
//! schema the rest of the pipeline works with.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::{tag_slug, ContentError, FrontMatter};

/// Cover image reference with optional attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverImage {
    /// Path relative to the article's asset directory (or a URL)
    pub path: String,
    pub author: Option<String>,
    pub link: Option<String>,
}

/// Validated article metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: String,
    pub published_at: NaiveDate,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub cover_image: Option<CoverImage>,
    pub canonical_url: Option<String>,
}

impl ArticleMeta {
    /// Validate raw front-matter.
    ///
    /// Every absent required key is reported in a single `MissingField`.
    /// `published_at` must parse under `date_format`.
    pub fn validate(fm: FrontMatter, date_format: &str) -> Result<Self, ContentError> {
        let title = non_blank(fm.title);
        let published_at = non_blank(fm.published_at);

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if published_at.is_none() {
            missing.push("published_at");
        }
        let (Some(title), Some(published_at)) = (title, published_at) else {
            return Err(ContentError::MissingField(missing));
        };

        let published_at = NaiveDate::parse_from_str(&published_at, date_format).map_err(|_| {
            ContentError::InvalidDate {
                value: published_at.clone(),
                format: date_format.to_string(),
            }
        })?;

        let tags = normalize_tags(fm.tags)?;

        let cover_image = match non_blank(fm.cover_image) {
            Some(path) => Some(CoverImage {
                path,
                author: non_blank(fm.cover_image_author),
                link: non_blank(fm.cover_image_link),
            }),
            None => {
                if fm.cover_image_author.is_some() || fm.cover_image_link.is_some() {
                    tracing::warn!(
                        "Cover attribution without cover_image in {:?}, ignoring",
                        title
                    );
                }
                None
            }
        };

        let canonical_url = non_blank(fm.canonical_url);
        if let Some(url) = &canonical_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                tracing::warn!("canonical_url {:?} of {:?} is not absolute", url, title);
            }
        }

        Ok(Self {
            title,
            published_at,
            description: non_blank(fm.description).unwrap_or_default(),
            tags,
            cover_image,
            canonical_url,
        })
    }

    /// Convert back to raw front-matter, e.g. for scaffolding new documents
    pub fn to_front_matter(&self, date_format: &str) -> FrontMatter {
        let cover = self.cover_image.as_ref();
        FrontMatter {
            title: Some(self.title.clone()),
            published_at: Some(self.published_at.format(date_format).to_string()),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            tags: self.tags.iter().cloned().collect(),
            cover_image: cover.map(|c| c.path.clone()),
            cover_image_author: cover.and_then(|c| c.author.clone()),
            cover_image_link: cover.and_then(|c| c.link.clone()),
            canonical_url: self.canonical_url.clone(),
        }
    }
}

/// Trim, drop blank entries and deduplicate.
///
/// A `tags` key whose every entry is blank is an error, and so is a tag
/// with no characters left to build its URL from.
fn normalize_tags(raw: Vec<String>) -> Result<BTreeSet<String>, ContentError> {
    let given = !raw.is_empty();
    let mut tags = BTreeSet::new();
    for tag in raw {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag_slug(tag).is_empty() {
            return Err(ContentError::InvalidTag {
                tag: tag.to_string(),
                reason: "it has no characters usable in a URL",
            });
        }
        tags.insert(tag.to_string());
    }
    if given && tags.is_empty() {
        return Err(ContentError::InvalidTag {
            tag: String::new(),
            reason: "every entry is blank",
        });
    }
    Ok(tags)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
