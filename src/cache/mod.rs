//! Render cache for on-demand pages
//!
//! Rendered pages are kept for a fixed revalidation window. After the window
//! a page is still served, and exactly one caller is told to refresh it in
//! the background; others keep receiving the stale copy until the refresh
//! lands.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A cached entry
#[derive(Debug, Clone)]
struct CacheEntry {
    html: String,
    rendered_at: Instant,
    /// A background refresh has been handed out and has not finished
    refreshing: bool,
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Fresh(String),
    /// Past its window. `refresh` is true for the single caller that should
    /// re-render it.
    Stale { html: String, refresh: bool },
    Miss,
}

/// Rendered HTML keyed by route path
#[derive(Debug)]
pub struct RenderCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    revalidate: Duration,
}

impl RenderCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            revalidate,
        }
    }

    pub fn lookup(&self, key: &str) -> Lookup {
        self.lookup_at(key, Instant::now())
    }

    fn lookup_at(&self, key: &str, now: Instant) -> Lookup {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = entries.get_mut(key) else {
            return Lookup::Miss;
        };

        if now.duration_since(entry.rendered_at) < self.revalidate {
            return Lookup::Fresh(entry.html.clone());
        }

        let refresh = !entry.refreshing;
        entry.refreshing = true;
        Lookup::Stale {
            html: entry.html.clone(),
            refresh,
        }
    }

    /// Store a freshly rendered page
    pub fn insert(&self, key: impl Into<String>, html: String) {
        self.insert_at(key.into(), html, Instant::now());
    }

    fn insert_at(&self, key: String, html: String, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!("Cached {}", key);
        entries.insert(
            key,
            CacheEntry {
                html,
                rendered_at: now,
                refreshing: false,
            },
        );
    }

    /// Drop a page, e.g. when its document was deleted
    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            tracing::debug!("Evicted {}", key);
        }
    }

    /// A refresh failed; keep serving the stale copy and allow another try
    pub fn refresh_failed(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get_mut(key) {
            entry.refreshing = false;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
