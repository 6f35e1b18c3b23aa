//! Post models decoded from CMS documents

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::RichText;
use crate::cms::types::Document;
use crate::cms::CmsError;

/// Words per minute used for the reading-time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// A post as shown in the list view
///
/// Empty CMS text fields arrive as `null` and decode to empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    /// Document uid, used as the slug
    pub id: String,

    /// First publication date; absent for documents never published
    pub publication: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub id: String,
    pub publication: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    /// Sections in document order
    pub content: Vec<ContentBlock>,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: RichText,
}

#[derive(Deserialize)]
struct SummaryData {
    title: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
}

#[derive(Deserialize)]
struct DetailData {
    title: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
    banner: Option<Banner>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct Banner {
    url: Option<String>,
}

fn uid_of(doc: &Document) -> Result<String, CmsError> {
    doc.uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| CmsError::Decode(format!("document {} has no uid", doc.id)))
}

impl TryFrom<Document> for PostSummary {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, CmsError> {
        let id = uid_of(&doc)?;
        let data: SummaryData = serde_json::from_value(doc.data)
            .map_err(|e| CmsError::Decode(format!("document {}: {}", doc.id, e)))?;

        Ok(Self {
            title: data.title.unwrap_or_default(),
            author: data.author.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            publication: doc.first_publication_date,
            id,
        })
    }
}

impl TryFrom<Document> for PostDetail {
    type Error = CmsError;

    fn try_from(doc: Document) -> Result<Self, CmsError> {
        let id = uid_of(&doc)?;
        let data: DetailData = serde_json::from_value(doc.data)
            .map_err(|e| CmsError::Decode(format!("document {}: {}", doc.id, e)))?;

        Ok(Self {
            title: data.title.unwrap_or_default(),
            author: data.author.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            banner_url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            content: data.content,
            publication: doc.first_publication_date,
            id,
        })
    }
}

impl PostDetail {
    /// Words across every heading and body
    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|block| block.heading.split_whitespace().count() + block.body.word_count())
            .sum()
    }

    /// Estimated reading time in whole minutes, rounded up
    pub fn reading_minutes(&self) -> usize {
        self.word_count().div_ceil(WORDS_PER_MINUTE)
    }

    /// Plain-text opening of the body, used for meta descriptions
    pub fn excerpt(&self) -> String {
        if !self.subtitle.is_empty() {
            return self.subtitle.clone();
        }
        self.content
            .iter()
            .map(|block| block.body.as_text())
            .find(|text| !text.trim().is_empty())
            .unwrap_or_default()
    }
}
