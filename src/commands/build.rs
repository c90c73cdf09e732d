//! Build the static site

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

use crate::content::{handle, Collection};
use crate::generator::{GenerateStats, Generator};
use crate::watch::Rebuilder;
use crate::Blog;

/// Load, validate and generate once
pub fn run(blog: &Blog) -> Result<GenerateStats> {
    let collection = blog.load_collection()?;
    generate(blog, &collection)
}

fn generate(blog: &Blog, collection: &Collection) -> Result<GenerateStats> {
    let start = Instant::now();
    let stats = Generator::new(blog)?.generate(collection)?;
    tracing::info!(
        "Generated {} articles, {} tags and {} assets in {:.2}s",
        stats.articles,
        stats.tags,
        stats.assets,
        start.elapsed().as_secs_f64()
    );
    Ok(stats)
}

/// Build, then rebuild whenever content or `_config.yml` changes
pub async fn watch(blog: &Blog) -> Result<()> {
    let collection = blog.load_collection()?;
    generate(blog, &collection)?;
    let handle = handle::init(collection)?;

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");
    let rebuilder = Arc::new(Rebuilder::new(blog, handle, true));
    tokio::task::spawn_blocking(move || rebuilder.watch()).await??;

    Ok(())
}
