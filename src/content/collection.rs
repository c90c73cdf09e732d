//! Collection index - the ordered, queryable set of articles

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::{tag_slug, Article, ContentError};

/// All articles of one build, ordered newest first.
///
/// Built in one go from a batch of articles and never mutated afterwards.
/// Rebuilds produce a fresh `Collection` that replaces this one wholesale.
#[derive(Debug, Default)]
pub struct Collection {
    articles: Vec<Article>,
    by_slug: HashMap<String, usize>,
}

/// A tag and the number of articles carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount<'a> {
    pub name: &'a str,
    pub count: usize,
}

/// Newest first; equal dates fall back to slug order
fn compare_articles(a: &Article, b: &Article) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.slug.cmp(&b.slug))
}

impl Collection {
    /// Build the index, rejecting the batch on the first slug or tag clash
    pub fn build(mut articles: Vec<Article>) -> Result<Self, ContentError> {
        if let Some(conflict) = Self::conflicts(&articles).into_iter().next() {
            return Err(conflict);
        }

        articles.sort_by(compare_articles);

        let by_slug = articles
            .iter()
            .enumerate()
            .map(|(i, a)| (a.slug.clone(), i))
            .collect();

        Ok(Self { articles, by_slug })
    }

    /// Every clash in a batch, in input order.
    ///
    /// Two articles may not share a slug, and two differently spelled tags
    /// may not map onto the same tag page (`Rust` and `rust`).
    pub fn conflicts(articles: &[Article]) -> Vec<ContentError> {
        let mut conflicts = Vec::new();
        let mut seen: HashMap<&str, &Article> = HashMap::with_capacity(articles.len());
        let mut tag_pages: HashMap<String, &str> = HashMap::new();

        for article in articles {
            if let Some(first) = seen.insert(article.slug.as_str(), article) {
                conflicts.push(ContentError::DuplicateSlug {
                    slug: article.slug.clone(),
                    first: first.source.clone(),
                    second: article.source.clone(),
                });
                // keep reporting against the first owner
                seen.insert(first.slug.as_str(), first);
            }

            for tag in &article.tags {
                let slug = tag_slug(tag);
                match tag_pages.get(&slug) {
                    Some(&first) if first != tag.as_str() => {
                        conflicts.push(ContentError::TagCollision {
                            slug,
                            first: first.to_string(),
                            second: tag.clone(),
                            path: article.source.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        tag_pages.insert(slug, tag);
                    }
                }
            }
        }
        conflicts
    }

    /// The tag whose page lives at `slug`
    pub fn tag_for_slug(&self, slug: &str) -> Option<&str> {
        self.articles
            .iter()
            .flat_map(|a| a.tags.iter())
            .find(|t| tag_slug(t) == slug)
            .map(String::as_str)
    }

    /// Every article, newest first
    pub fn all(&self) -> &[Article] {
        &self.articles
    }

    /// Articles carrying `tag`, in the same order as [`Collection::all`]
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Article> + 'a {
        self.articles.iter().filter(move |a| a.has_tag(tag))
    }

    /// Look up a single article
    pub fn by_slug(&self, slug: &str) -> Result<&Article, ContentError> {
        self.by_slug
            .get(slug)
            .map(|&i| &self.articles[i])
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))
    }

    /// The (newer, older) neighbours of an article, for prev/next links
    pub fn neighbors(&self, slug: &str) -> (Option<&Article>, Option<&Article>) {
        match self.by_slug.get(slug) {
            Some(&i) => (
                i.checked_sub(1).map(|j| &self.articles[j]),
                self.articles.get(i + 1),
            ),
            None => (None, None),
        }
    }

    /// Every tag with its article count, most used first
    pub fn tags(&self) -> Vec<TagCount<'_>> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for article in &self.articles {
            for tag in &article.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<_> = counts
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        // BTreeMap already gave name order; a stable sort keeps it for ties
        tags.sort_by(|a, b| b.count.cmp(&a.count));
        tags
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::ArticleMeta;
    use chrono::NaiveDate;
    use std::path::Path;

    pub(crate) fn article(slug: &str, date: &str, tags: &[&str]) -> Article {
        let meta = ArticleMeta {
            title: format!("Title of {}", slug),
            published_at: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            cover_image: None,
            canonical_url: None,
        };
        Article::new(meta, "body", &Path::new("content").join(format!("{}.md", slug)))
    }

    fn slugs<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Vec<&'a str> {
        articles.into_iter().map(|a| a.slug.as_str()).collect()
    }

    #[test]
    fn test_all_is_newest_first() {
        let collection = Collection::build(vec![
            article("january", "2021-01-01", &[]),
            article("march", "2021-03-01", &[]),
            article("february", "2021-02-01", &[]),
        ])
        .unwrap();

        assert_eq!(slugs(collection.all()), vec!["march", "february", "january"]);
    }

    #[test]
    fn test_same_day_ordered_by_slug() {
        let collection = Collection::build(vec![
            article("c", "2021-05-05", &[]),
            article("a", "2021-05-05", &[]),
            article("z", "2020-01-01", &[]),
            article("b", "2021-05-05", &[]),
        ])
        .unwrap();

        assert_eq!(slugs(collection.all()), vec!["a", "b", "c", "z"]);
        for pair in collection.all().windows(2) {
            assert!(pair[0].published_at >= pair[1].published_at);
            if pair[0].published_at == pair[1].published_at {
                assert!(pair[0].slug < pair[1].slug);
            }
        }
    }

    #[test]
    fn test_by_tag_is_ordered_subset_of_all() {
        let collection = Collection::build(vec![
            article("one", "2021-01-01", &["rust"]),
            article("two", "2021-02-01", &["web"]),
            article("three", "2021-03-01", &["rust", "web"]),
            article("four", "2021-04-01", &["rust"]),
        ])
        .unwrap();

        let expected: Vec<_> = collection
            .all()
            .iter()
            .filter(|a| a.tags.contains("rust"))
            .map(|a| a.slug.as_str())
            .collect();
        assert_eq!(slugs(collection.by_tag("rust")), expected);
        assert_eq!(expected, vec!["four", "three", "one"]);
        assert_eq!(collection.by_tag("missing").count(), 0);
    }

    #[test]
    fn test_by_slug_round_trips() {
        let collection = Collection::build(vec![
            article("one", "2021-01-01", &[]),
            article("two", "2021-02-01", &[]),
        ])
        .unwrap();

        for a in collection.all() {
            assert_eq!(collection.by_slug(&a.slug).unwrap(), a);
        }
        assert!(matches!(
            collection.by_slug("nope"),
            Err(ContentError::NotFound(ref s)) if s == "nope"
        ));
    }

    #[test]
    fn test_duplicate_slug_names_both_sources() {
        let mut bundle = article("hello", "2021-01-01", &[]);
        bundle.source = Path::new("content/hello/index.md").to_path_buf();

        let err = Collection::build(vec![article("hello", "2021-02-01", &[]), bundle]).unwrap_err();
        match err {
            ContentError::DuplicateSlug {
                slug,
                first,
                second,
            } => {
                assert_eq!(slug, "hello");
                assert_eq!(first, Path::new("content/hello.md"));
                assert_eq!(second, Path::new("content/hello/index.md"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_every_duplicate_is_reported() {
        let p = |s: &str| Path::new(s).to_path_buf();
        let mut bundle = article("hello", "2021-01-01", &[]);
        bundle.source = Path::new("content/hello/index.md").to_path_buf();
        let mut third = article("hello", "2021-01-03", &[]);
        third.source = Path::new("content/nested/hello.md").to_path_buf();

        let conflicts = Collection::conflicts(&[
            article("hello", "2021-02-01", &[]),
            article("world", "2021-02-01", &[]),
            bundle,
            article("world", "2021-02-02", &[]),
            third,
        ]);
        let pairs: Vec<_> = conflicts
            .iter()
            .map(|c| match c {
                ContentError::DuplicateSlug { slug, first, second } => {
                    (slug.as_str(), first.clone(), second.clone())
                }
                other => panic!("unexpected error: {other:?}"),
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("hello", p("content/hello.md"), p("content/hello/index.md")),
                ("world", p("content/world.md"), p("content/world.md")),
                ("hello", p("content/hello.md"), p("content/nested/hello.md")),
            ]
        );
    }

    #[test]
    fn test_tags_sharing_a_page_are_rejected() {
        let articles = vec![
            article("one", "2021-01-01", &["Rust"]),
            article("two", "2021-01-02", &["rust", "web"]),
        ];
        let conflicts = Collection::conflicts(&articles);
        assert_eq!(conflicts.len(), 1);
        match &conflicts[0] {
            ContentError::TagCollision {
                slug,
                first,
                second,
                path,
            } => {
                assert_eq!(slug, "rust");
                assert_eq!(first, "Rust");
                assert_eq!(second, "rust");
                assert_eq!(path, Path::new("content/two.md"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            Collection::build(articles),
            Err(ContentError::TagCollision { .. })
        ));
    }

    #[test]
    fn test_tag_for_slug() {
        let collection = Collection::build(vec![
            article("a", "2021-01-01", &["Web Dev", "rust"]),
            article("b", "2021-01-02", &["rust"]),
        ])
        .unwrap();
        assert_eq!(collection.tag_for_slug("web-dev"), Some("Web Dev"));
        assert_eq!(collection.tag_for_slug("rust"), Some("rust"));
        assert_eq!(collection.tag_for_slug("Web Dev"), None);
        assert_eq!(collection.tag_for_slug("go"), None);
    }

    #[test]
    fn test_neighbors() {
        let collection = Collection::build(vec![
            article("old", "2021-01-01", &[]),
            article("mid", "2021-02-01", &[]),
            article("new", "2021-03-01", &[]),
        ])
        .unwrap();

        let (newer, older) = collection.neighbors("mid");
        assert_eq!(newer.map(|a| a.slug.as_str()), Some("new"));
        assert_eq!(older.map(|a| a.slug.as_str()), Some("old"));

        let (newer, older) = collection.neighbors("new");
        assert!(newer.is_none());
        assert_eq!(older.map(|a| a.slug.as_str()), Some("mid"));

        assert_eq!(collection.neighbors("ghost"), (None, None));
    }

    #[test]
    fn test_tag_counts() {
        let collection = Collection::build(vec![
            article("a", "2021-01-01", &["rust", "web"]),
            article("b", "2021-01-02", &["rust"]),
            article("c", "2021-01-03", &["cli"]),
        ])
        .unwrap();

        let tags = collection.tags();
        assert_eq!(
            tags,
            vec![
                TagCount { name: "rust", count: 2 },
                TagCount { name: "cli", count: 1 },
                TagCount { name: "web", count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_collection() {
        let collection = Collection::build(Vec::new()).unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.len(), 0);
        assert!(collection.tags().is_empty());
    }
}
