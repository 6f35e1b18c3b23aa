//! Built-in templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off: every value
//! that reaches a template is escaped when its view struct is built.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Header logo, written to `imgs/logo.svg`
pub const LOGO_SVG: &str = include_str!("spacetraveling/imgs/logo.svg");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Truncate by character count, appending `omission` when shortened
pub fn truncate_chars(s: &str, length: usize, omission: &str) -> String {
    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(length).collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub lang: String,
    pub root: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub description: String,
    pub author: String,
    pub date: Option<String>,
    pub reading_time: String,
    pub banner_url: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub load_more: String,
    pub loading: String,
    pub not_found_title: String,
    pub not_found_message: String,
    pub back: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10, "..."), "short");
        assert_eq!(truncate_chars("Lorem ipsum dolor", 6, "..."), "Lorem...");
        assert_eq!(truncate_chars("ação rápida", 4, "…"), "ação…");
    }
}
