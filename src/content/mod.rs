//! Content module - post models and rich text rendering

mod post;
mod richtext;

pub use post::{ContentBlock, PostDetail, PostSummary, WORDS_PER_MINUTE};
pub use richtext::{Block, RichText, Span};
