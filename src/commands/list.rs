//! List site content

use anyhow::Result;

use crate::content::Collection;
use crate::helpers::date_iso;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let collection = blog.load_collection()?;
    for line in lines(&collection, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// Output lines for `content_type`
pub fn lines(collection: &Collection, content_type: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    match content_type {
        "article" | "articles" | "post" | "posts" => {
            out.push(format!("Articles ({}):", collection.len()));
            for article in collection.all() {
                out.push(format!(
                    "  {} - {} [{}]",
                    date_iso(&article.published_at),
                    article.title,
                    article.slug
                ));
            }
        }
        "tag" | "tags" => {
            let tags = collection.tags();
            out.push(format!("Tags ({}):", tags.len()));
            for tag in tags {
                out.push(format!("  {} ({})", tag.name, tag.count));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: articles, tags", content_type);
        }
    }
    Ok(out)
}
