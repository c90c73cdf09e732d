//! blogdex: a static blog generator built around a validated content collection
//!
//! Markdown documents with YAML front matter are discovered, parsed,
//! validated and indexed into a [`content::Collection`] that the generator
//! and the development server render from.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod render;
pub mod server;
pub mod templates;
pub mod watch;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A blog site rooted at one directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content (markdown) directory
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the site in `base_dir`, reading `_config.yml` if there is one
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Fail if clearing the public directory would delete site sources
    pub fn check_public_dir(&self) -> Result<()> {
        let public = &self.public_dir;
        if public == &self.base_dir
            || self.content_dir.starts_with(public)
            || self.config_path().starts_with(public)
        {
            anyhow::bail!("Refusing to clear {:?}: it contains the site sources", public);
        }
        Ok(())
    }

    /// Run the content pipeline.
    ///
    /// Document errors come back as a [`content::BuildFailure`] inside the
    /// `anyhow::Error`.
    pub fn load_collection(&self) -> Result<content::Collection> {
        let loader = content::loader::ContentLoader::new(self)?;
        Ok(loader.load()?)
    }

    /// Load the collection and write the static site
    pub fn build(&self) -> Result<generator::GenerateStats> {
        commands::build::run(self)
    }

    /// Remove the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Scaffold a new article, returning its path
    pub fn new_article(&self, title: &str, slug: Option<&str>, bundle: bool) -> Result<PathBuf> {
        commands::new::create_article(self, title, slug, bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_blog_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.content_dir, dir.path().join("content"));
        assert_eq!(blog.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_blog_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Notes\ncontent_dir: posts\npublic_dir: dist\n",
        )
        .unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Notes");
        assert_eq!(blog.content_dir, dir.path().join("posts"));
        assert_eq!(blog.public_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_load_collection_failure_is_downcastable() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("content/bad.md"), "no front matter").unwrap();

        let err = Blog::new(dir.path()).unwrap().load_collection().unwrap_err();
        let failure = err.downcast_ref::<content::BuildFailure>().unwrap();
        assert_eq!(failure.diagnostics.len(), 1);
    }
}
