//! List posts in the terminal, loading more on demand

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::cms::{list_query, ContentSource};
use crate::config::SiteConfig;
use crate::content::PostSummary;
use crate::helpers::{normalize_date, post_path, DateLocale};
use crate::i18n::I18n;
use crate::pagination::{LoadOutcome, PostList};
use crate::Spacetraveling;

/// List posts; with `all`, keep loading without prompting
pub async fn run(site: &Spacetraveling, all: bool) -> Result<()> {
    let source = site.content_source()?;
    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    let list = browse(source.as_ref(), &site.config, all, &mut input, &mut out).await?;
    tracing::debug!("Listed {} posts", list.len());
    Ok(())
}

/// Print the first page, then offer "load more" while a cursor remains.
///
/// A failed load is reported and offered again; the list is unchanged by
/// the failure so the retry fetches the same page. In `all` mode a failure
/// aborts instead.
pub async fn browse<S, R, W>(
    source: &S,
    config: &SiteConfig,
    all: bool,
    input: &mut R,
    out: &mut W,
) -> Result<PostList>
where
    S: ContentSource + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let i18n = I18n::new(&config.language)?;
    let tz = config.tz()?;
    let locale = config.date_locale();
    let first = source
        .query(&list_query(
            &config.cms.document_type,
            config.cms.page_size,
            config.cms.orderings.clone(),
        ))
        .await
        .context("Failed to query posts")?;

    let mut list = PostList::initialize(first);
    writeln!(out, "Posts:")?;
    for post in list.posts() {
        print_post(out, post, &tz, locale)?;
    }

    while list.has_more() {
        if !all {
            write!(out, "{} [Enter / q] ", i18n.get("load_more"))?;
            out.flush()?;

            let mut line = String::new();
            let read = input.read_line(&mut line).await?;
            if read == 0 || line.trim().eq_ignore_ascii_case("q") {
                return Ok(list);
            }
        }

        let shown = list.len();
        match list.load_next(source).await {
            Ok(LoadOutcome::Appended(_)) => {
                for post in &list.posts()[shown..] {
                    print_post(out, post, &tz, locale)?;
                }
            }
            Ok(LoadOutcome::Exhausted) => break,
            Err(e) if !all => {
                tracing::warn!("Error loading posts: {}", e);
                writeln!(out, "Error loading posts: {}", e)?;
            }
            Err(e) => return Err(e).context("Failed to load more posts"),
        }
    }

    writeln!(out, "({} posts)", list.len())?;
    Ok(list)
}

fn print_post<W: Write>(
    out: &mut W,
    post: &PostSummary,
    tz: &chrono_tz::Tz,
    locale: DateLocale,
) -> std::io::Result<()> {
    let date = post
        .publication
        .as_ref()
        .map(|ts| normalize_date(ts, tz, locale))
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        out,
        "  {:<11}  {} ({}) [{}]",
        date,
        post.title,
        post.author,
        post_path(&post.id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{page, ScriptedSource};

    fn config() -> SiteConfig {
        SiteConfig {
            timezone: "UTC".to_string(),
            ..SiteConfig::default()
        }
    }

    fn source() -> ScriptedSource {
        let mut source = ScriptedSource {
            first: page(&["a", "b"], Some("c1")),
            ..Default::default()
        };
        source.pages.insert("c1".into(), page(&["c"], None));
        source
    }

    #[tokio::test]
    async fn test_browse_retries_after_failure() {
        let source = source();
        source.fail_once("c1");

        let mut input: &[u8] = b"\n\n";
        let mut out = Vec::new();
        let list = browse(&source, &config(), false, &mut input, &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Error loading posts"));
        assert!(printed.contains("15 mar 2021"));
        assert!(printed.contains("[/post/c/]"));
        assert!(printed.contains("(3 posts)"));
        assert_eq!(list.len(), 3);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_browse_quit_keeps_cursor() {
        let source = source();
        let mut input: &[u8] = b"q\n";
        let mut out = Vec::new();
        let list = browse(&source, &config(), false, &mut input, &mut out)
            .await
            .unwrap();

        assert_eq!(list.len(), 2);
        assert!(list.has_more());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_browse_all_loads_everything() {
        let source = source();
        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        let list = browse(&source, &config(), true, &mut input, &mut out)
            .await
            .unwrap();

        assert_eq!(list.len(), 3);
        assert!(!list.has_more());
        let printed = String::from_utf8(out).unwrap();
        assert!(!printed.contains("Carregar mais posts"));
    }
}
