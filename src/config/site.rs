//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::helpers::DateLocale;

/// Environment variable overriding `cms.endpoint`
pub const ENV_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content source
    pub cms: CmsConfig,

    // Rendering
    /// Seconds a rendered page stays fresh before background revalidation
    pub revalidate_secs: u64,
    /// How long an unknown slug may resolve before the loading page is served
    pub fallback_timeout_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling.".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            cms: CmsConfig::default(),

            revalidate_secs: 3600,
            fallback_timeout_ms: 1500,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides on top of the file values
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                tracing::debug!("Using CMS endpoint from {}", ENV_ENDPOINT);
                self.cms.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            if !token.trim().is_empty() {
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Parsed IANA timezone used for display dates
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", self.timezone, e))
    }

    /// Month table used for display dates
    pub fn date_locale(&self) -> DateLocale {
        DateLocale::from_language(&self.language)
    }

    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API entry point, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    pub page_size: u32,
    /// Raw orderings expression, e.g. `[document.first_publication_date desc]`
    pub orderings: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 20,
            orderings: None,
        }
    }
}
