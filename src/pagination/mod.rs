//! Incremental post list ("load more")
//!
//! A [`PostList`] starts from a first page fetched up front and grows one
//! page at a time. Posts are only ever appended, in retrieval order, and the
//! cursor only advances when a fetch succeeds, so a failed load can simply
//! be retried.
//!
//! `load_next` borrows the list mutably for its whole duration, which rules
//! out two overlapping loads on the same list. The list is modified only
//! after the fetch has resolved: dropping the future half way (a closed
//! connection, an abandoned prompt) leaves it exactly as it was.

use crate::cms::{ContentSource, Cursor, PostsPage, Result};
use crate::content::PostSummary;

/// Result of a successful [`PostList::load_next`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Appended(usize),
    /// There was no cursor; nothing was fetched
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostList {
    posts: Vec<PostSummary>,
    cursor: Option<Cursor>,
}

impl PostList {
    /// Seed the list from a server-fetched first page
    pub fn initialize(first_page: PostsPage) -> Self {
        Self {
            posts: first_page.posts,
            cursor: first_page.cursor,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Whether the "load more" affordance should be shown
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Fetch the page at the cursor, append it and advance the cursor.
    ///
    /// On error the list is left untouched and the error is returned.
    pub async fn load_next<S>(&mut self, source: &S) -> Result<LoadOutcome>
    where
        S: ContentSource + ?Sized,
    {
        let Some(cursor) = self.cursor.as_ref() else {
            tracing::debug!("load_next called with no cursor; ignoring");
            return Ok(LoadOutcome::Exhausted);
        };

        let page = source.fetch_page(cursor).await?;

        let appended = page.posts.len();
        self.posts.extend(page.posts);
        self.cursor = page.cursor;
        tracing::debug!(appended, total = self.posts.len(), more = self.has_more(), "Loaded next page");

        Ok(LoadOutcome::Appended(appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{page, ScriptedSource};
    use crate::cms::CmsError;

    /// Keep loading until the source runs out of pages
    async fn load_all(list: &mut PostList, source: &ScriptedSource) -> Result<usize> {
        let mut pages = 0;
        while let LoadOutcome::Appended(_) = list.load_next(source).await? {
            pages += 1;
        }
        Ok(pages)
    }

    fn ids(list: &PostList) -> Vec<&str> {
        list.posts().iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_next_appends_and_terminates() {
        let mut source = ScriptedSource::default();
        source.pages.insert("c1".into(), page(&["C"], None));

        let mut list = PostList::initialize(page(&["A", "B"], Some("c1")));
        assert!(list.has_more());

        let outcome = list.load_next(&source).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Appended(1));
        assert_eq!(ids(&list), vec!["A", "B", "C"]);
        assert!(list.cursor().is_none());
        assert!(!list.has_more());
    }

    #[tokio::test]
    async fn test_failure_leaves_state_unchanged() {
        let mut source = ScriptedSource::default();
        source.pages.insert("c1".into(), page(&["C"], None));
        source.fail_once("c1");

        let mut list = PostList::initialize(page(&["A", "B"], Some("c1")));
        let before = list.clone();

        let err = list.load_next(&source).await.unwrap_err();
        assert!(matches!(err, CmsError::Status { status: 503, .. }));
        assert_eq!(list, before);
        assert_eq!(list.cursor(), Some(&Cursor::new("c1")));
        assert!(list.has_more());

        // The cursor did not move, so a retry picks up the same page
        list.load_next(&source).await.unwrap();
        assert_eq!(ids(&list), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_no_fetch_without_cursor() {
        let source = ScriptedSource::default();
        let mut list = PostList::initialize(page(&["A"], None));

        assert_eq!(list.load_next(&source).await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(list.load_next(&source).await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(ids(&list), vec!["A"]);
    }

    #[tokio::test]
    async fn test_length_is_sum_of_pages_in_retrieval_order() {
        let mut source = ScriptedSource::default();
        source.pages.insert("c1".into(), page(&["C", "D", "E"], Some("c2")));
        source.pages.insert("c2".into(), page(&[], Some("c3")));
        source.pages.insert("c3".into(), page(&["F"], None));

        let mut list = PostList::initialize(page(&["A", "B"], Some("c1")));
        let pages = load_all(&mut list, &source).await.unwrap();

        assert_eq!(pages, 3);
        assert_eq!(list.len(), 2 + 3 + 0 + 1);
        assert_eq!(ids(&list), vec!["A", "B", "C", "D", "E", "F"]);
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_no_deduplication() {
        let mut source = ScriptedSource::default();
        source.pages.insert("c1".into(), page(&["B"], None));

        let mut list = PostList::initialize(page(&["A", "B"], Some("c1")));
        list.load_next(&source).await.unwrap();
        assert_eq!(ids(&list), vec!["A", "B", "B"]);
    }

    #[tokio::test]
    async fn test_dropped_load_leaves_state_unchanged() {
        let mut source = ScriptedSource::default();
        source.pages.insert("c1".into(), page(&["C"], None));

        let mut list = PostList::initialize(page(&["A", "B"], Some("c1")));
        let before = list.clone();
        {
            // Created but never polled to completion
            let fut = list.load_next(&source);
            drop(fut);
        }
        assert_eq!(list, before);
    }
}
