//! Headless CMS access
//!
//! [`ContentSource`] is the seam between the site and its content. The
//! production implementation is [`PrismicClient`]; tests substitute scripted
//! sources.

pub mod error;
mod prismic;
pub mod types;

pub use error::{CmsError, Result};
pub use prismic::PrismicClient;
pub use types::{Predicate, Query};

use async_trait::async_trait;
use std::fmt;

use crate::content::{PostDetail, PostSummary};

/// Opaque continuation token: the URL of the next result page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of post summaries and the cursor to the page after it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostsPage {
    pub posts: Vec<PostSummary>,
    pub cursor: Option<Cursor>,
}

/// Documents are decoded one by one; one that cannot become a post is
/// logged and left out instead of failing the page
impl From<types::SearchResponse> for PostsPage {
    fn from(resp: types::SearchResponse) -> Self {
        let posts = resp
            .results
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                PostSummary::try_from(doc)
                    .map_err(|e| tracing::warn!("Skipping CMS document {}: {}", id, e))
                    .ok()
            })
            .collect();
        Self {
            posts,
            cursor: resp.next_page.filter(|s| !s.is_empty()).map(Cursor),
        }
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page
    async fn query(&self, query: &Query) -> Result<PostsPage>;

    /// Retrieve the page a cursor points at
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage>;

    /// Fetch one full post by its uid; `Ok(None)` when no document matches
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<PostDetail>>;
}

/// The list-view query: summary fields only, content body excluded
pub fn list_query(document_type: &str, page_size: u32, orderings: Option<String>) -> Query {
    Query::new(vec![Predicate::at("document.type", document_type)])
        .fetch(
            ["title", "author", "subtitle"]
                .iter()
                .map(|field| format!("{}.{}", document_type, field)),
        )
        .page_size(page_size)
        .orderings(orderings)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted content source for unit tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedSource {
        pub first: PostsPage,
        pub pages: HashMap<String, PostsPage>,
        /// Cursors whose next fetch fails once
        pub failing: Mutex<Vec<String>>,
        pub details: HashMap<String, PostDetail>,
        pub fetches: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn fail_once(&self, cursor: &str) {
            self.failing.lock().unwrap().push(cursor.to_string());
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for ScriptedSource {
        async fn query(&self, _query: &Query) -> Result<PostsPage> {
            Ok(self.first.clone())
        }

        async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            {
                let mut failing = self.failing.lock().unwrap();
                if let Some(pos) = failing.iter().position(|c| c == cursor.as_str()) {
                    failing.remove(pos);
                    return Err(CmsError::Status {
                        status: 503,
                        body: "unavailable".to_string(),
                    });
                }
            }
            self.pages
                .get(cursor.as_str())
                .cloned()
                .ok_or_else(|| CmsError::Decode(format!("unknown page {}", cursor)))
        }

        async fn get_by_uid(&self, _document_type: &str, uid: &str) -> Result<Option<PostDetail>> {
            Ok(self.details.get(uid).cloned())
        }
    }

    pub fn summary(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            publication: crate::cms::types::parse_cms_date("2021-03-15T12:00:00+0000"),
            title: format!("Post {}", id),
            subtitle: format!("About {}", id),
            author: "Joseph Oliveira".to_string(),
        }
    }

    pub fn page(ids: &[&str], cursor: Option<&str>) -> PostsPage {
        PostsPage {
            posts: ids.iter().map(|id| summary(id)).collect(),
            cursor: cursor.map(Cursor::new),
        }
    }
}
