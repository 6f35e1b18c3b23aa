use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed CMS response: {0}")]
    Decode(String),

    #[error("CMS API has no master ref")]
    NoMasterRef,

    #[error("Invalid CMS endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("Invalid pagination cursor {cursor:?}: {reason}")]
    InvalidCursor { cursor: String, reason: String },
}

impl From<serde_json::Error> for CmsError {
    fn from(e: serde_json::Error) -> Self {
        CmsError::Decode(e.to_string())
    }
}
