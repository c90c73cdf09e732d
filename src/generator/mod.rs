//! Generator module - writes the static site for a collection

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::content::Collection;
use crate::helpers::{date_xml, full_url_for};
use crate::render::RenderTarget;
use crate::templates::SitePages;
use crate::Blog;

/// Prefix of the sibling directories used while swapping output
pub const STAGING_PREFIX: &str = ".blogdex-";

/// What a generation run produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateStats {
    pub articles: usize,
    pub tags: usize,
    pub assets: usize,
}

/// Static site generator using the built-in templates
pub struct Generator {
    blog: Blog,
    pages: SitePages,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            pages: SitePages::new(&blog.config)?,
        })
    }

    /// Generate the entire site.
    ///
    /// Pages are written into a staging directory next to the public
    /// directory, which replaces the old output only once everything has
    /// been written. A failed run leaves the previous output untouched.
    pub fn generate(&self, collection: &Collection) -> Result<GenerateStats> {
        self.blog.check_public_dir()?;
        let parent = self.output_parent();
        fs::create_dir_all(parent)?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)?;
        let stats = self.write_site(staging.path(), collection)?;
        self.swap_in(staging.path())?;

        Ok(stats)
    }

    fn write_site(&self, out: &Path, collection: &Collection) -> Result<GenerateStats> {
        let mut stats = GenerateStats::default();

        write(out, "index.html", &self.pages.index(collection)?)?;

        for article in collection.all() {
            let html = self.pages.article(collection, &article.slug)?;
            write(out, &format!("{}/index.html", article.slug), &html)?;
            stats.articles += 1;
        }

        let tag_root = self.blog.config.tag_dir.trim_matches('/');
        write(out, &format!("{}/index.html", tag_root), &self.pages.tags(collection)?)?;
        for tag in collection.tags() {
            let dir = self.pages.articles().tag_dir(tag.name);
            write(out, &format!("{}/index.html", dir), &self.pages.tag(collection, tag.name)?)?;
            stats.tags += 1;
        }

        write(out, "404.html", &self.pages.not_found("")?)?;

        stats.assets = self.copy_assets(out, collection)?;

        self.generate_atom_feed(out, collection)?;
        self.generate_search_index(out, collection)?;

        Ok(stats)
    }

    fn output_parent(&self) -> &Path {
        self.blog
            .public_dir
            .parent()
            .unwrap_or(self.blog.base_dir.as_path())
    }

    /// Replace the public directory with a fully written `staging` tree
    fn swap_in(&self, staging: &Path) -> Result<()> {
        let public = &self.blog.public_dir;
        // the old tree is moved aside and deleted with `trash`
        let trash = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(self.output_parent())?;
        let previous = trash.path().join("previous");

        let moved = public.exists();
        if moved {
            fs::rename(public, &previous)?;
        }
        if let Err(e) = fs::rename(staging, public) {
            if moved {
                if let Err(restore) = fs::rename(&previous, public) {
                    tracing::error!("Could not restore {:?}: {}", public, restore);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Copy every referenced cover image into the public directory
    fn copy_assets(&self, out: &Path, collection: &Collection) -> Result<usize> {
        let mut copied = 0;
        for article in collection.all() {
            for asset in self.pages.articles().assets(article) {
                if !asset.source.is_file() {
                    tracing::warn!(
                        "Asset {:?} referenced by {} does not exist",
                        asset.source,
                        article.slug
                    );
                    continue;
                }
                let dest = out.join(Path::new(&asset.url_path));
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&asset.source, &dest)?;
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Generate the Atom feed
    fn generate_atom_feed(&self, out: &Path, collection: &Collection) -> Result<()> {
        let config = &self.blog.config;
        let home = full_url_for(config, "/");
        let updated = collection
            .all()
            .first()
            .map(|a| date_xml(&a.published_at))
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string());

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, "atom.xml")
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", home));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}</id>\n", home));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for article in collection.all().iter().take(config.feed_limit) {
            let view = self.pages.articles().view(article, RenderTarget::Page)?;
            let link = view.canonical_url.as_deref().unwrap_or(&view.permalink);
            let published = date_xml(&article.published_at);

            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&view.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", escape_xml(link)));
            feed.push_str(&format!("    <id>{}</id>\n", escape_xml(&view.permalink)));
            feed.push_str(&format!("    <published>{}</published>\n", published));
            feed.push_str(&format!("    <updated>{}</updated>\n", published));
            if !view.description.is_empty() {
                feed.push_str(&format!(
                    "    <summary>{}</summary>\n",
                    escape_xml(&view.description)
                ));
            }
            for tag in &view.tags {
                feed.push_str(&format!(
                    "    <category term=\"{}\"/>\n",
                    escape_xml(&tag.name)
                ));
            }
            let content = view.excerpt.or(view.content).unwrap_or_default();
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content).replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        write(out, "atom.xml", &feed)?;
        tracing::info!("Generated atom.xml");

        Ok(())
    }

    /// Generate search index (JSON)
    fn generate_search_index(&self, out: &Path, collection: &Collection) -> Result<()> {
        let search_data: Vec<serde_json::Value> = collection
            .all()
            .iter()
            .map(|a| {
                serde_json::json!({
                    "title": a.title,
                    "url": self.pages.articles().article_path(&a.slug),
                    "date": a.published_at.format("%Y-%m-%d").to_string(),
                    "description": a.description,
                    "tags": a.tags,
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&search_data)?;
        write(out, "search.json", &json)?;
        tracing::info!("Generated search.json");

        Ok(())
    }
}

/// Write a file below the output directory
fn write(out: &Path, relative: &str, content: &str) -> Result<()> {
    let path = out.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
