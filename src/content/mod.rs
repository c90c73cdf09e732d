//! Content module - turns markdown documents into a queryable collection
//!
//! The pipeline is `discover -> parse front-matter -> validate -> index`.
//! It runs synchronously to completion before the result is published.

mod article;
pub mod collection;
mod error;
mod frontmatter;
pub mod handle;
pub mod loader;
mod markdown;
mod meta;

pub use article::{tag_slug, Article};
pub use collection::{Collection, TagCount};
pub use error::{BuildFailure, ContentError, Diagnostic};
pub use frontmatter::FrontMatter;
pub use handle::CollectionHandle;
pub use markdown::{html_escape, MarkdownRenderer, MarkupRenderer};
pub use meta::{ArticleMeta, CoverImage};
