//! Scaffold a new article

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::content::ArticleMeta;
use crate::Blog;

/// Create `content/<slug>.md`, or `content/<slug>/index.md` with `bundle`,
/// dated today
pub fn create_article(
    blog: &Blog,
    title: &str,
    slug: Option<&str>,
    bundle: bool,
) -> Result<PathBuf> {
    let today = chrono::Local::now().date_naive();
    create_article_on(blog, title, slug, bundle, today)
}

fn create_article_on(
    blog: &Blog,
    title: &str,
    slug: Option<&str>,
    bundle: bool,
    date: chrono::NaiveDate,
) -> Result<PathBuf> {
    if title.trim().is_empty() {
        anyhow::bail!("Title must not be empty");
    }
    let slug = slug::slugify(slug.unwrap_or(title));
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from {:?}", title);
    }
    if blog.config.is_reserved_slug(&slug) {
        anyhow::bail!("Slug {:?} is used by generated pages, pick another", slug);
    }

    let flat = blog.content_dir.join(format!("{}.md", slug));
    let bundled = blog.content_dir.join(&slug).join("index.md");
    // either layout would claim the same slug
    for existing in [&flat, &bundled] {
        if existing.exists() {
            anyhow::bail!("File already exists: {:?}", existing);
        }
    }

    let meta = ArticleMeta {
        title: title.trim().to_string(),
        published_at: date,
        description: String::new(),
        tags: BTreeSet::new(),
        cover_image: None,
        canonical_url: None,
    };
    let content = meta
        .to_front_matter(&blog.config.date_format)
        .to_document("")?;

    let file_path = if bundle { bundled } else { flat };
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::parse_article;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()
    }

    #[test]
    fn test_new_article_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        let path = create_article_on(&blog, "Hello, World!", None, false, date()).unwrap();
        assert_eq!(path, blog.content_dir.join("hello-world.md"));

        let content = fs::read_to_string(&path).unwrap();
        let article = parse_article(&content, &path, "%Y-%m-%d").unwrap();
        assert_eq!(article.slug, "hello-world");
        assert_eq!(article.title, "Hello, World!");
        assert_eq!(article.published_at, date());
        assert!(article.tags.is_empty());
    }

    #[test]
    fn test_new_bundle_with_slug() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        let path = create_article_on(&blog, "Anything", Some("My Trip"), true, date()).unwrap();
        assert_eq!(path, blog.content_dir.join("my-trip/index.md"));
    }

    #[test]
    fn test_new_refuses_reserved_slug() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let err = create_article_on(&blog, "Tags", None, false, date()).unwrap_err();
        assert!(err.to_string().contains("generated pages"));
        assert!(create_article_on(&blog, "Anything", Some("assets"), true, date()).is_err());
        assert!(!blog.content_dir.exists());
    }

    #[test]
    fn test_new_refuses_existing_slug() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        create_article_on(&blog, "Hello", None, true, date()).unwrap();
        assert!(create_article_on(&blog, "Hello", None, false, date()).is_err());
        assert!(create_article_on(&blog, "   ", None, false, date()).is_err());
    }
}
