//! Generator module - writes the site as static HTML files
//!
//! Layout of the output directory:
//! - `index.html`: the first page of posts
//! - `page/{n}/index.html`: the list after `n - 1` "load more" steps
//! - `post/{slug}/index.html`: one page per post
//! - `imgs/logo.svg`

mod pages;

pub use pages::PageBuilder;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cms::{list_query, ContentSource};
use crate::helpers::is_safe_slug;
use crate::pagination::PostList;
use crate::templates::LOGO_SVG;
use crate::Spacetraveling;

/// Counts reported after a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub list_pages: usize,
    pub posts: usize,
    pub skipped: usize,
}

/// Static site generator
pub struct Generator {
    public_dir: PathBuf,
    pages: PageBuilder,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Spacetraveling) -> Result<Self> {
        Ok(Self {
            public_dir: site.public_dir.clone(),
            pages: PageBuilder::new(&site.config)?,
        })
    }

    /// Generate the entire site from a content source
    pub async fn generate<S>(&self, source: &S) -> Result<GenerateStats>
    where
        S: ContentSource + ?Sized,
    {
        fs::create_dir_all(&self.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;
        self.write_assets()?;

        let cms = &self.pages.config().cms;
        let first = source
            .query(&list_query(&cms.document_type, cms.page_size, cms.orderings.clone()))
            .await
            .context("Failed to query the first page of posts")?;

        let mut stats = GenerateStats::default();
        let mut list = PostList::initialize(first);

        // Each list page shows everything loaded so far
        loop {
            stats.list_pages += 1;
            self.generate_list_page(&list, stats.list_pages)?;

            if !list.has_more() {
                break;
            }
            list.load_next(source)
                .await
                .with_context(|| format!("Failed to load list page {}", stats.list_pages + 1))?;
        }

        for post in list.posts() {
            if !is_safe_slug(&post.id) {
                tracing::warn!("Skipping post with unusable uid {:?}", post.id);
                stats.skipped += 1;
                continue;
            }
            if self.generate_post_page(source, &post.id).await? {
                stats.posts += 1;
            } else {
                stats.skipped += 1;
            }
        }

        Ok(stats)
    }

    fn write_assets(&self) -> Result<()> {
        write_file(&self.public_dir.join("imgs/logo.svg"), LOGO_SVG)
    }

    fn generate_list_page(&self, list: &PostList, page: usize) -> Result<()> {
        let html = self.pages.list_page(list, page)?;

        let output_path = if page == 1 {
            self.public_dir.join("index.html")
        } else {
            self.public_dir.join(format!("page/{}/index.html", page))
        };
        write_file(&output_path, &html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Returns `false` when the post disappeared between listing and fetching
    async fn generate_post_page<S>(&self, source: &S, slug: &str) -> Result<bool>
    where
        S: ContentSource + ?Sized,
    {
        let document_type = &self.pages.config().cms.document_type;
        let Some(post) = source
            .get_by_uid(document_type, slug)
            .await
            .with_context(|| format!("Failed to fetch post {:?}", slug))?
        else {
            tracing::warn!("Post {:?} is listed but could not be found; skipping", slug);
            return Ok(false);
        };

        let html = self.pages.post_page(&post)?;
        let output_path = self.public_dir.join("post").join(slug).join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(true)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))
}
