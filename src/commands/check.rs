//! Validate content without writing anything

use anyhow::Result;

use crate::Blog;

/// Load every article and report all problems at once.
///
/// Returns the number of valid articles; any content error fails the whole
/// check with a [`crate::content::BuildFailure`].
pub fn run(blog: &Blog) -> Result<usize> {
    let collection = blog.load_collection()?;
    let tags = collection.tags().len();
    println!("{} articles, {} tags: all valid", collection.len(), tags);
    Ok(collection.len())
}
