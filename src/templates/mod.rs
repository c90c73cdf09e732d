//! Built-in templates using the Tera template engine
//!
//! The default theme is embedded in the binary so a site needs nothing but
//! `_config.yml` and its content directory.

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::url_for;
use crate::content::{html_escape, Article, Collection};
use crate::render::{ArticleRenderer, ArticleView, RenderTarget};

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
}

/// Template renderer with the embedded default theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Views carry pre-rendered HTML; text is escaped in the templates with
        // `| escape`, attribute values with `| attr`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("index.html", include_str!("default/index.html")),
            ("article.html", include_str!("default/article.html")),
            ("tags.html", include_str!("default/tags.html")),
            ("tag_single.html", include_str!("default/tag_single.html")),
            ("404.html", include_str!("default/404.html")),
            (
                "partials/card.html",
                include_str!("default/partials/card.html"),
            ),
        ])?;

        tera.register_filter("attr", attr_filter);
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape a value for a quoted attribute, leaving `/` readable
fn attr_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("attr", "value", String, value);
    Ok(tera::Value::String(html_escape(&s)))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(HTML_TAG.replace_all(&s, "").into_owned()))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub root: String,
    pub feed_url: String,
    pub tags_url: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: url_for(config, "/"),
            feed_url: url_for(config, "atom.xml"),
            tags_url: url_for(config, &format!("{}/", config.tag_dir.trim_matches('/'))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub path: String,
    pub count: usize,
}

/// Builds template contexts and renders the pages of a site.
///
/// Shared by the static generator and the development server so both
/// produce identical HTML.
pub struct SitePages {
    templates: TemplateRenderer,
    articles: ArticleRenderer,
    site: SiteData,
}

impl SitePages {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            articles: ArticleRenderer::new(config),
            site: SiteData::from_config(config),
        })
    }

    pub fn articles(&self) -> &ArticleRenderer {
        &self.articles
    }

    fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }

    /// Home page: every article, newest first
    pub fn index(&self, collection: &Collection) -> Result<String> {
        let views = self
            .articles
            .views(collection.all(), RenderTarget::Listing)?;
        let mut context = self.context();
        context.insert("articles", &views);
        self.templates.render("index.html", &context)
    }

    /// A single article page
    pub fn article(&self, collection: &Collection, slug: &str) -> Result<String> {
        let article = collection.by_slug(slug)?;
        let view: ArticleView = self
            .articles
            .view(article, RenderTarget::Page)?;
        let (newer, older) = collection.neighbors(slug);
        let nav = |a: Option<&Article>| {
            a.map(|a| NavLink {
                title: a.title.clone(),
                path: self.articles.article_path(&a.slug),
            })
        };

        let mut context = self.context();
        context.insert("article", &view);
        context.insert("newer", &nav(newer));
        context.insert("older", &nav(older));
        self.templates.render("article.html", &context)
    }

    /// Tag cloud
    pub fn tags(&self, collection: &Collection) -> Result<String> {
        let tags: Vec<TagSummary> = collection
            .tags()
            .into_iter()
            .map(|t| TagSummary {
                name: t.name.to_string(),
                path: self.articles.tag_link(t.name).path,
                count: t.count,
            })
            .collect();
        let mut context = self.context();
        context.insert("tags", &tags);
        self.templates.render("tags.html", &context)
    }

    /// Listing of one tag
    pub fn tag(&self, collection: &Collection, tag: &str) -> Result<String> {
        let views = self
            .articles
            .views(collection.by_tag(tag), RenderTarget::Listing)?;
        let mut context = self.context();
        context.insert("tag", tag);
        context.insert("articles", &views);
        self.templates.render("tag_single.html", &context)
    }

    /// Page-not-found
    pub fn not_found(&self, path: &str) -> Result<String> {
        let mut context = self.context();
        context.insert("missing", path);
        self.templates.render("404.html", &context)
    }
}
