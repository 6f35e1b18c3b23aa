//! Wire types of the Prismic REST API (v2)

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// `GET {endpoint}` response, only the parts we use
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// `GET {endpoint}/documents/search` response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Document>,
    pub next_page: Option<String>,
    #[serde(default)]
    pub total_results_size: Option<u64>,
}

/// A CMS document; `data` is decoded later into a post shape
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "de_cms_date")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Prismic emits `2021-03-25T19:25:28+0000`, which is not strict RFC 3339.
fn de_cms_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_cms_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

pub fn parse_cms_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match on a document path, e.g. `document.type` or `my.posts.uid`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, value)
            }
        }
    }
}

/// A search request: predicates plus field selection
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// Fields to fetch, e.g. `posts.title`; empty fetches everything
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub orderings: Option<String>,
}

impl Query {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            ..Default::default()
        }
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn orderings(mut self, orderings: Option<String>) -> Self {
        self.orderings = orderings;
        self
    }

    /// The `q` parameter, e.g. `[[at(document.type, "posts")]]`
    pub fn q(&self) -> String {
        let inner: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", inner)
    }

    /// Query-string pairs excluding `ref` and `access_token`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q())];
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(ref orderings) = self.orderings {
            params.push(("orderings", orderings.clone()));
        }
        params
    }
}
