//! Prismic REST API client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::{CmsError, Result};
use super::types::{ApiInfo, Predicate, Query, SearchResponse};
use super::{ContentSource, Cursor, PostsPage};
use crate::config::CmsConfig;
use crate::content::PostDetail;

pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|_| CmsError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CmsError::InvalidEndpoint(endpoint.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        Self::new(&config.endpoint, config.access_token.clone())
    }

    /// Current master ref; it changes on every publish so it is not cached
    async fn master_ref(&self) -> Result<String> {
        let mut req = self.client.get(self.endpoint.clone());
        if let Some(ref token) = self.access_token {
            req = req.query(&[("access_token", token)]);
        }
        let info: ApiInfo = self.send(req).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(CmsError::NoMasterRef)
    }

    async fn search(&self, query: &Query) -> Result<SearchResponse> {
        let reference = self.master_ref().await?;
        let url = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );

        let mut params = query.params();
        params.push(("ref", reference));
        if let Some(ref token) = self.access_token {
            params.push(("access_token", token.clone()));
        }

        tracing::debug!(q = %query.q(), "CMS search");
        self.send(self.client.get(&url).query(&params)).await
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// A cursor is only followed when it points back at the configured API
    fn validate_cursor(&self, cursor: &Cursor) -> Result<Url> {
        let invalid = |reason: &str| CmsError::InvalidCursor {
            cursor: cursor.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(cursor.as_str()).map_err(|_| invalid("not a URL"))?;
        if url.scheme() != self.endpoint.scheme() {
            return Err(invalid("scheme differs from the CMS endpoint"));
        }
        if url.host_str() != self.endpoint.host_str() || url.port() != self.endpoint.port() {
            return Err(invalid("host differs from the CMS endpoint"));
        }
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<PostsPage> {
        let resp = self.search(query).await?;
        tracing::debug!(
            results = resp.results.len(),
            total = ?resp.total_results_size,
            "CMS query returned"
        );
        Ok(PostsPage::from(resp))
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostsPage> {
        let url = self.validate_cursor(cursor)?;
        tracing::debug!(%url, "Fetching next CMS page");
        let has_token = url.query_pairs().any(|(key, _)| key == "access_token");
        let mut req = self.client.get(url);
        if let (Some(token), false) = (self.access_token.as_ref(), has_token) {
            req = req.query(&[("access_token", token)]);
        }
        let resp: SearchResponse = self.send(req).await?;
        Ok(PostsPage::from(resp))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<PostDetail>> {
        let query = Query::new(vec![Predicate::at(
            format!("my.{}.uid", document_type),
            uid,
        )])
        .page_size(1);

        let resp = self.search(&query).await?;
        match resp.results.into_iter().next() {
            Some(doc) => Ok(Some(PostDetail::try_from(doc)?)),
            None => Ok(None),
        }
    }
}
