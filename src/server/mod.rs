//! HTTP server rendering pages on demand
//!
//! Pages are rendered from the CMS on first request and cached for
//! `revalidate_secs`; stale pages are served while a background task
//! re-renders them. A post nobody asked for yet is resolved on demand: if
//! that takes longer than `fallback_timeout_ms`, the visitor gets a loading
//! page that reloads itself, and the resolution keeps running.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, RenderCache};
use crate::cms::{list_query, ContentSource};
use crate::config::SiteConfig;
use crate::generator::PageBuilder;
use crate::helpers::{is_safe_slug, list_path, post_path};
use crate::pagination::PostList;
use crate::templates::LOGO_SVG;
use crate::Spacetraveling;

/// A page to render
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// List view after `n - 1` load-more steps
    List(usize),
    Post(String),
}

impl Target {
    fn key(&self) -> String {
        match self {
            Target::List(page) => list_path(*page),
            Target::Post(slug) => post_path(slug),
        }
    }
}

/// Outcome of rendering a target
#[derive(Debug, Clone)]
enum Resolution {
    Found(String),
    NotFound,
    Failed(String),
}

/// Server state
pub struct AppState {
    source: Arc<dyn ContentSource>,
    pages: PageBuilder,
    cache: RenderCache,
    /// In-flight renders by cache key, so concurrent misses share one fetch
    pending: Mutex<HashMap<String, watch::Receiver<Option<Resolution>>>>,
    fallback_timeout: Duration,
}

impl AppState {
    pub fn new(config: &SiteConfig, source: Arc<dyn ContentSource>) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            source,
            pages: PageBuilder::new(config)?,
            cache: RenderCache::new(config.revalidate()),
            pending: Mutex::new(HashMap::new()),
            fallback_timeout: config.fallback_timeout(),
        }))
    }

    /// Rendered page, or `None` when the target does not exist
    async fn render(&self, target: &Target) -> Result<Option<String>> {
        match target {
            Target::List(page) => self.render_list(*page).await,
            Target::Post(slug) => self.render_post(slug).await,
        }
    }

    async fn render_list(&self, page: usize) -> Result<Option<String>> {
        let cms = &self.pages.config().cms;
        let first = self
            .source
            .query(&list_query(&cms.document_type, cms.page_size, cms.orderings.clone()))
            .await?;

        let mut list = PostList::initialize(first);
        for _ in 1..page {
            if !list.has_more() {
                return Ok(None);
            }
            list.load_next(self.source.as_ref()).await?;
        }

        Ok(Some(self.pages.list_page(&list, page)?))
    }

    async fn render_post(&self, slug: &str) -> Result<Option<String>> {
        let document_type = &self.pages.config().cms.document_type;
        match self.source.get_by_uid(document_type, slug).await? {
            Some(post) => Ok(Some(self.pages.post_page(&post)?)),
            None => Ok(None),
        }
    }

    /// Start rendering `target` in the background, or join a render that
    /// is already running. Found pages are cached before waiters wake up.
    fn resolve_shared(self: &Arc<Self>, target: Target) -> watch::Receiver<Option<Resolution>> {
        let key = target.key();
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(rx) = pending.get(&key) {
            return rx.clone();
        }

        let (tx, rx) = watch::channel(None);
        pending.insert(key.clone(), rx.clone());
        drop(pending);

        let pending = PendingGuard {
            state: Arc::clone(self),
            key,
        };
        tokio::spawn(async move {
            let state = &pending.state;
            let resolution = match state.render(&target).await {
                Ok(Some(html)) => {
                    state.cache.insert(pending.key.clone(), html.clone());
                    Resolution::Found(html)
                }
                Ok(None) => Resolution::NotFound,
                Err(e) => {
                    tracing::error!("Failed to render {}: {:#}", pending.key, e);
                    Resolution::Failed(format!("{:#}", e))
                }
            };
            drop(pending);
            let _ = tx.send(Some(resolution));
        });

        rx
    }

    /// Re-render a stale page without blocking the request that noticed it
    fn spawn_refresh(self: &Arc<Self>, target: Target) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let key = target.key();
            tracing::debug!("Revalidating {}", key);
            match state.render(&target).await {
                Ok(Some(html)) => state.cache.insert(key, html),
                Ok(None) => state.cache.remove(&key),
                Err(e) => {
                    tracing::warn!("Revalidation of {} failed, serving stale copy: {:#}", key, e);
                    state.cache.refresh_failed(&key);
                }
            }
        });
    }

    fn not_found(&self) -> Response {
        match self.pages.not_found_page() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }

    fn loading(&self) -> Response {
        match self.pages.loading_page() {
            Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
            Err(_) => (StatusCode::ACCEPTED, "Loading...").into_response(),
        }
    }

    fn respond(&self, resolution: Resolution) -> Response {
        match resolution {
            Resolution::Found(html) => Html(html).into_response(),
            Resolution::NotFound => self.not_found(),
            Resolution::Failed(message) => (
                StatusCode::BAD_GATEWAY,
                format!("Failed to load content: {}", message),
            )
                .into_response(),
        }
    }
}

/// Removes an in-flight render from `pending` when the render task ends,
/// including when it panics
struct PendingGuard {
    state: Arc<AppState>,
    key: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.state
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    let root = state.pages.config().root.trim_end_matches('/').to_string();

    let routes = Router::new()
        .route("/", get(home_handler))
        .route("/page/:page", get(list_handler))
        .route("/page/:page/", get(list_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/imgs/logo.svg", get(logo_handler))
        .fallback(fallback_handler)
        .with_state(state);

    let app = if root.is_empty() {
        routes
    } else {
        Router::new().nest(&root, routes)
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(site: &Spacetraveling, ip: &str, port: u16) -> Result<()> {
    let source = site.content_source()?;
    let state = AppState::new(&site.config, source)?;
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn serve_cached(state: &Arc<AppState>, target: Target) -> Option<Response> {
    match state.cache.lookup(&target.key()) {
        Lookup::Fresh(html) => Some(Html(html).into_response()),
        Lookup::Stale { html, refresh } => {
            if refresh {
                state.spawn_refresh(target);
            }
            Some(Html(html).into_response())
        }
        Lookup::Miss => None,
    }
}

async fn list_response(state: Arc<AppState>, page: usize) -> Response {
    let target = Target::List(page);
    if let Some(response) = serve_cached(&state, target.clone()) {
        return response;
    }

    let mut rx = state.resolve_shared(target);
    let waited = rx
        .wait_for(|r| r.is_some())
        .await
        .map(|resolution| (*resolution).clone());
    match waited {
        Ok(resolution) => state.respond(resolution.unwrap_or(Resolution::NotFound)),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Render task failed").into_response(),
    }
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Response {
    list_response(state, 1).await
}

async fn list_handler(State(state): State<Arc<AppState>>, Path(page): Path<String>) -> Response {
    match page.parse::<usize>() {
        Ok(page) if page >= 1 => list_response(state, page).await,
        _ => state.not_found(),
    }
}

async fn post_handler(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    if !is_safe_slug(&slug) {
        return state.not_found();
    }

    let target = Target::Post(slug);
    if let Some(response) = serve_cached(&state, target.clone()) {
        return response;
    }

    let mut rx = state.resolve_shared(target);
    let waited = tokio::time::timeout(state.fallback_timeout, async {
        rx.wait_for(|r| r.is_some())
            .await
            .map(|resolution| (*resolution).clone())
    })
    .await;

    match waited {
        Ok(Ok(resolution)) => state.respond(resolution.unwrap_or(Resolution::NotFound)),
        Ok(Err(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "Render task failed").into_response(),
        Err(_) => {
            tracing::debug!("Post still resolving after {:?}; serving loading page", state.fallback_timeout);
            state.loading()
        }
    }
}

async fn logo_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], LOGO_SVG)
}

async fn fallback_handler(State(state): State<Arc<AppState>>) -> Response {
    state.not_found()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keys() {
        assert_eq!(Target::List(1).key(), "/");
        assert_eq!(Target::List(2).key(), "/page/2/");
        assert_eq!(Target::Post("hooks".into()).key(), "/post/hooks/");
    }
}
