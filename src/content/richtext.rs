//! Structured rich text (Prismic "StructuredText") and its HTML rendering

use serde::Deserialize;

/// An ordered sequence of rich-text blocks
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image blocks only
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// Inline formatting over `[start, end)`, offsets in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RichText {
    /// Render every block to HTML, grouping consecutive list items
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let list_tag = match block.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            match block.kind.as_str() {
                "paragraph" => {
                    html.push_str(&format!("<p>{}</p>", render_spans(&block.text, &block.spans)))
                }
                "preformatted" => html.push_str(&format!(
                    "<pre>{}</pre>",
                    html_escape::encode_text(&block.text)
                )),
                "list-item" | "o-list-item" => {
                    html.push_str(&format!("<li>{}</li>", render_spans(&block.text, &block.spans)))
                }
                "image" => {
                    let src = block.url.as_deref().unwrap_or_default();
                    let alt = block.alt.as_deref().unwrap_or_default();
                    html.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                        html_escape::encode_double_quoted_attribute(src),
                        html_escape::encode_double_quoted_attribute(alt)
                    ));
                }
                kind => match heading_level(kind) {
                    Some(level) => html.push_str(&format!(
                        "<h{level}>{}</h{level}>",
                        render_spans(&block.text, &block.spans)
                    )),
                    None => tracing::debug!("Skipping unsupported rich text block: {}", kind),
                },
            }
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }

    /// Plain text, one block per line
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.0.iter().map(|b| b.text.split_whitespace().count()).sum()
    }
}

fn heading_level(kind: &str) -> Option<u8> {
    let level: u8 = kind.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let url = span.data.get("url").and_then(|u| u.as_str()).unwrap_or("#");
            let href = html_escape::encode_double_quoted_attribute(url);
            match span.data.get("target").and_then(|t| t.as_str()) {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    href,
                    html_escape::encode_double_quoted_attribute(target)
                ),
                None => format!(r#"<a href="{}">"#, href),
            }
        }
        "label" => {
            let label = span.data.get("label").and_then(|l| l.as_str()).unwrap_or("");
            format!(
                r#"<span class="{}">"#,
                html_escape::encode_double_quoted_attribute(label)
            )
        }
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn push_text(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("<br />"),
        _ => {
            let mut buf = [0u8; 4];
            out.push_str(&html_escape::encode_text(c.encode_utf8(&mut buf)));
        }
    }
}

/// Apply spans to `text`, keeping the emitted tags properly nested.
/// A span that closes while inner spans are still open closes them too and
/// reopens the survivors right after.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| s.end > s.start).collect();
    // Outer spans (earlier start, later end) open first
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut pos = 0usize;

    for c in text.chars() {
        advance(pos, &spans, &mut next, &mut stack, &mut out);
        push_text(&mut out, c);
        pos += c.len_utf16();
    }
    advance(pos, &spans, &mut next, &mut stack, &mut out);

    for span in stack.iter().rev() {
        out.push_str(close_tag(span));
    }

    out
}

/// Close spans ending at `pos`, then open spans starting there
fn advance<'a>(
    pos: usize,
    spans: &[&'a Span],
    next: &mut usize,
    stack: &mut Vec<&'a Span>,
    out: &mut String,
) {
    if let Some(lowest) = stack.iter().position(|s| s.end <= pos) {
        let closing: Vec<&Span> = stack.drain(lowest..).collect();
        for span in closing.iter().rev() {
            out.push_str(close_tag(span));
        }
        for span in closing {
            if span.end > pos {
                out.push_str(&open_tag(span));
                stack.push(span);
            }
        }
    }
    while *next < spans.len() && spans[*next].start <= pos {
        let span = spans[*next];
        if span.end > pos {
            out.push_str(&open_tag(span));
            stack.push(span);
        }
        *next += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich(json: serde_json::Value) -> RichText {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_paragraph_with_spans() {
        let text = rich(serde_json::json!([{
            "type": "paragraph",
            "text": "Hello bold world",
            "spans": [
                {"start": 6, "end": 10, "type": "strong"},
                {"start": 11, "end": 16, "type": "hyperlink", "data": {"link_type": "Web", "url": "https://example.com"}}
            ]
        }]));
        assert_eq!(
            text.as_html(),
            r#"<p>Hello <strong>bold</strong> <a href="https://example.com">world</a></p>"#
        );
    }

    #[test]
    fn test_escapes_text() {
        let text = rich(serde_json::json!([
            {"type": "paragraph", "text": "a < b & c\nnext", "spans": []}
        ]));
        assert_eq!(text.as_html(), "<p>a &lt; b &amp; c<br />next</p>");
    }

    #[test]
    fn test_groups_list_items() {
        let text = rich(serde_json::json!([
            {"type": "list-item", "text": "one", "spans": []},
            {"type": "list-item", "text": "two", "spans": []},
            {"type": "o-list-item", "text": "first", "spans": []},
            {"type": "heading2", "text": "Title", "spans": []}
        ]));
        assert_eq!(
            text.as_html(),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><h2>Title</h2>"
        );
    }

    #[test]
    fn test_overlapping_spans_stay_nested() {
        let text = rich(serde_json::json!([{
            "type": "paragraph",
            "text": "abcdef",
            "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]
        }]));
        assert_eq!(
            text.as_html(),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        // "🚀" is two UTF-16 units
        let text = rich(serde_json::json!([{
            "type": "paragraph",
            "text": "🚀 go",
            "spans": [{"start": 3, "end": 5, "type": "em"}]
        }]));
        assert_eq!(text.as_html(), "<p>🚀 <em>go</em></p>");
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let text = rich(serde_json::json!([
            {"type": "embed", "oembed": {}},
            {"type": "paragraph", "text": "kept", "spans": []}
        ]));
        assert_eq!(text.as_html(), "<p>kept</p>");
        assert_eq!(text.word_count(), 1);
    }
}
