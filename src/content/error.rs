//! Content pipeline errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning documents into a collection
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("missing required field(s): {}", .0.join(", "))]
    MissingField(Vec<&'static str>),

    #[error("invalid date {value:?} (expected format {format:?})")]
    InvalidDate { value: String, format: String },

    #[error("duplicate slug {slug:?}: {} and {}", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: &'static str },

    #[error("tags {first:?} and {second:?} share the URL slug {slug:?}")]
    TagCollision {
        slug: String,
        first: String,
        second: String,
        /// Article that introduced `second`
        path: PathBuf,
    },

    #[error("slug {0:?} is empty or taken by a generated page")]
    ReservedSlug(String),

    #[error("article not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failure tied to the file that caused it
#[derive(Debug)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub error: ContentError,
}

impl Diagnostic {
    pub fn new(path: impl Into<PathBuf>, error: ContentError) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// A rejected build: every diagnostic collected across the batch
#[derive(Error, Debug)]
pub struct BuildFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} content error(s) rejected the build",
            self.diagnostics.len()
        )?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_lists_all() {
        let err = ContentError::MissingField(vec!["title", "published_at"]);
        assert_eq!(
            err.to_string(),
            "missing required field(s): title, published_at"
        );
    }

    #[test]
    fn test_duplicate_slug_names_both_paths() {
        let err = ContentError::DuplicateSlug {
            slug: "hello".to_string(),
            first: PathBuf::from("content/hello.md"),
            second: PathBuf::from("content/hello/index.md"),
        };
        let msg = err.to_string();
        assert!(msg.contains("content/hello.md"));
        assert!(msg.contains("content/hello/index.md"));
    }

    #[test]
    fn test_build_failure_lists_diagnostics() {
        let failure = BuildFailure {
            diagnostics: vec![
                Diagnostic::new(
                    "content/a.md",
                    ContentError::MalformedDocument("no closing marker".into()),
                ),
                Diagnostic::new("content/b.md", ContentError::MissingField(vec!["title"])),
            ],
        };
        let msg = failure.to_string();
        assert!(msg.starts_with("2 content error(s)"));
        assert!(msg.contains("content/a.md: malformed document"));
        assert!(msg.contains("content/b.md: missing required field(s): title"));
    }
}
