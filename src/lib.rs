//! spacetraveling: a blog front-end backed by a headless CMS
//!
//! Posts live in Prismic. The site can be written out as static files
//! ([`generator`]) or served on demand with periodic revalidation
//! ([`server`]). The home page lists posts incrementally through
//! [`pagination::PostList`].

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pagination;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentSource, PrismicClient};

/// The main application
#[derive(Clone)]
pub struct Spacetraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Spacetraveling {
    /// Create a new instance from a directory
    ///
    /// Reads `_config.yml` when present, then `.env.local` / `.env` and the
    /// `PRISMIC_*` environment variables.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        for env_file in [".env.local", ".env"] {
            let path = base_dir.join(env_file);
            if path.exists() {
                dotenvy::from_path(&path)
                    .with_context(|| format!("Failed to load {:?}", path))?;
                tracing::debug!("Loaded environment from {:?}", path);
            }
        }
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already built configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// The configured CMS client
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        if self.config.cms.endpoint.trim().is_empty() {
            anyhow::bail!(
                "No CMS endpoint configured. Set cms.endpoint in _config.yml or {}",
                config::ENV_ENDPOINT
            );
        }
        let client = PrismicClient::from_config(&self.config.cms)?;
        Ok(Arc::new(client))
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
