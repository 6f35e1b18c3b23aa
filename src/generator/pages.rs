//! Page rendering shared by static generation and the server

use anyhow::Result;
use chrono_tz::Tz;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{PostDetail, PostSummary};
use crate::helpers::{full_url_for, list_path, normalize_date, post_path, url_for, DateLocale};
use crate::i18n::I18n;
use crate::pagination::PostList;
use crate::templates::{
    truncate_chars, Labels, PostCard, PostView, SectionView, SiteData, TemplateRenderer,
};

/// Seconds before the loading page reloads itself
const LOADING_REFRESH_SECS: u64 = 2;

/// Turns posts into HTML pages
pub struct PageBuilder {
    config: SiteConfig,
    renderer: TemplateRenderer,
    i18n: I18n,
    tz: Tz,
    locale: DateLocale,
}

impl PageBuilder {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            renderer: TemplateRenderer::new()?,
            i18n: I18n::new(&config.language)?,
            tz: config.tz()?,
            locale: config.date_locale(),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Display date for a publication timestamp, if there is one
    pub fn display_date(&self, publication: Option<&chrono::DateTime<chrono::Utc>>) -> Option<String> {
        publication.map(|ts| normalize_date(ts, &self.tz, self.locale))
    }

    fn site_data(&self) -> SiteData {
        SiteData {
            title: text(&self.config.title).into_owned(),
            description: attr(&self.config.description).into_owned(),
            lang: attr(self.i18n.language()).into_owned(),
            root: attr(&url_for(&self.config, "/")).into_owned(),
            logo_url: attr(&url_for(&self.config, "/imgs/logo.svg")).into_owned(),
        }
    }

    fn labels(&self) -> Labels {
        Labels {
            load_more: text(&self.i18n.get("load_more")).into_owned(),
            loading: text(&self.i18n.get("loading")).into_owned(),
            not_found_title: text(&self.i18n.get("not_found.title")).into_owned(),
            not_found_message: text(&self.i18n.get("not_found.message")).into_owned(),
            back: text(&self.i18n.get("not_found.back")).into_owned(),
        }
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data());
        context.insert("labels", &self.labels());
        context
    }

    pub fn post_card(&self, post: &PostSummary) -> PostCard {
        PostCard {
            path: attr(&url_for(&self.config, &post_path(&post.id))).into_owned(),
            title: text(&post.title).into_owned(),
            subtitle: text(&post.subtitle).into_owned(),
            author: text(&post.author).into_owned(),
            date: self.display_date(post.publication.as_ref()),
        }
    }

    pub fn post_view(&self, post: &PostDetail) -> PostView {
        PostView {
            title: text(&post.title).into_owned(),
            description: attr(&truncate_chars(&post.excerpt(), 150, "...")).into_owned(),
            author: text(&post.author).into_owned(),
            date: self.display_date(post.publication.as_ref()),
            reading_time: text(&self.i18n.get_count("reading_time", post.reading_minutes()))
                .into_owned(),
            banner_url: attr(&post.banner_url).into_owned(),
            sections: post
                .content
                .iter()
                .map(|block| SectionView {
                    heading: text(&block.heading).into_owned(),
                    html: block.body.as_html(),
                })
                .collect(),
        }
    }

    /// The list view after `page - 1` load-more steps
    pub fn list_page(&self, list: &PostList, page: usize) -> Result<String> {
        let cards: Vec<PostCard> = list.posts().iter().map(|p| self.post_card(p)).collect();

        let mut context = self.base_context();
        context.insert("posts", &cards);
        context.insert("has_more", &list.has_more());
        context.insert(
            "load_more_href",
            &attr(&url_for(&self.config, &list_path(page + 1))).into_owned(),
        );
        context.insert(
            "canonical_url",
            &attr(&full_url_for(&self.config, &list_path(page))).into_owned(),
        );

        self.renderer.render("index.html", &context)
    }

    pub fn post_page(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &self.post_view(post));
        context.insert(
            "canonical_url",
            &attr(&full_url_for(&self.config, &post_path(&post.id))).into_owned(),
        );
        self.renderer.render("post.html", &context)
    }

    /// Placeholder served while a post is still being resolved
    pub fn loading_page(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    pub fn not_found_page(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context())
    }
}
