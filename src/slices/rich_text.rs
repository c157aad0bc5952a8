// 📝 Rich text helpers - CMS rich text → plain text / escaped HTML
//
// Rich text arrives as `[{ "type": "paragraph", "text": "...", "spans": [...] }]`.
// A bare string is accepted anywhere rich text is expected.

use serde_json::Value;

/// Escape text for safe inclusion in HTML content or attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain text of a rich text field, blocks joined by newlines
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// True when a rich text field carries no visible text
pub fn is_empty(value: &Value) -> bool {
    as_text(value).trim().is_empty()
}

// ============================================================================
// HTML
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Escaped HTML for a rich text field
pub fn as_html(value: &Value) -> String {
    let blocks = match value {
        Value::String(s) if !s.is_empty() => return format!("<p>{}</p>", escape_html(s)),
        Value::Array(blocks) => blocks,
        _ => return String::new(),
    };

    let mut html = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks.iter().filter(|b| b.is_object()) {
        let block_type = block.get("type").and_then(Value::as_str).unwrap_or("paragraph");
        let text = block.get("text").and_then(Value::as_str).unwrap_or("");
        let spans = block
            .get("spans")
            .and_then(Value::as_array)
            .map(|s| parse_spans(s))
            .unwrap_or_default();
        let inner = render_spans(text, &spans);

        let list = match block_type {
            "list-item" => Some(ListKind::Unordered),
            "o-list-item" => Some(ListKind::Ordered),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list {
                html.push_str(&format!("</{}>", kind.tag()));
            }
            if let Some(kind) = list {
                html.push_str(&format!("<{}>", kind.tag()));
            }
            open_list = list;
        }

        match block_type {
            "list-item" | "o-list-item" => html.push_str(&format!("<li>{}</li>", inner)),
            "preformatted" => html.push_str(&format!("<pre>{}</pre>", inner)),
            t if heading_level(t).is_some() => {
                let level = heading_level(t).unwrap_or(2);
                html.push_str(&format!("<h{level}>{inner}</h{level}>"));
            }
            _ => {
                if !text.is_empty() {
                    html.push_str(&format!("<p>{}</p>", inner));
                }
            }
        }
    }

    if let Some(kind) = open_list {
        html.push_str(&format!("</{}>", kind.tag()));
    }

    html
}

fn heading_level(block_type: &str) -> Option<u8> {
    let level: u8 = block_type.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

// ============================================================================
// SPANS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum SpanKind {
    Strong,
    Em,
    Link(String),
}

#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    kind: SpanKind,
}

impl Span {
    fn open_tag(&self) -> String {
        match &self.kind {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Link(url) => format!("<a href=\"{}\">", escape_html(url)),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self.kind {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Link(_) => "</a>",
        }
    }
}

fn parse_spans(raw: &[Value]) -> Vec<Span> {
    raw.iter()
        .filter_map(|span| {
            let start = span.get("start")?.as_u64()? as usize;
            let end = span.get("end")?.as_u64()? as usize;
            let kind = match span.get("type")?.as_str()? {
                "strong" => SpanKind::Strong,
                "em" => SpanKind::Em,
                "hyperlink" => {
                    let url = span.get("data")?.get("url")?.as_str()?;
                    SpanKind::Link(url.to_string())
                }
                _ => return None,
            };
            (start < end).then_some(Span { start, end, kind })
        })
        .collect()
}

/// Apply spans (char offsets) to text. Overlapping spans are closed and
/// reopened so the output stays well-nested.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<Span> = spans
        .iter()
        .filter(|s| s.start < len)
        .map(|s| Span {
            end: s.end.min(len),
            ..s.clone()
        })
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::new();
    let mut stack: Vec<Span> = Vec::new();

    for i in 0..=len {
        if stack.iter().any(|s| s.end <= i) {
            let mut reopen = Vec::new();
            while let Some(span) = stack.pop() {
                out.push_str(span.close_tag());
                if span.end > i {
                    reopen.push(span);
                }
                if !stack.iter().any(|s| s.end <= i) {
                    break;
                }
            }
            for span in reopen.into_iter().rev() {
                out.push_str(&span.open_tag());
                stack.push(span);
            }
        }

        for span in spans.iter().filter(|s| s.start == i) {
            out.push_str(&span.open_tag());
            stack.push(span.clone());
        }

        if let Some(c) = chars.get(i) {
            out.push_str(&escape_html(&c.to_string()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_as_text() {
        let value = json!([
            { "type": "heading2", "text": "Title" },
            { "type": "paragraph", "text": "" },
            { "type": "paragraph", "text": "Body" }
        ]);
        assert_eq!(as_text(&value), "Title\nBody");
        assert_eq!(as_text(&json!("plain")), "plain");
        assert_eq!(as_text(&json!(null)), "");
        assert!(is_empty(&json!([{ "type": "paragraph", "text": "  " }])));
    }

    #[test]
    fn test_as_html_blocks_and_lists() {
        let value = json!([
            { "type": "heading1", "text": "Why switch" },
            { "type": "list-item", "text": "One" },
            { "type": "list-item", "text": "Two" },
            { "type": "o-list-item", "text": "First" },
            { "type": "paragraph", "text": "Done" }
        ]);

        assert_eq!(
            as_html(&value),
            "<h1>Why switch</h1><ul><li>One</li><li>Two</li></ul><ol><li>First</li></ol><p>Done</p>"
        );
    }

    #[test]
    fn test_as_html_plain_string_escaped() {
        assert_eq!(as_html(&json!("a < b")), "<p>a &lt; b</p>");
        assert_eq!(as_html(&json!(42)), "");
    }

    #[test]
    fn test_spans() {
        let value = json!([{
            "type": "paragraph",
            "text": "Move your money",
            "spans": [
                { "start": 0, "end": 4, "type": "strong" },
                { "start": 10, "end": 15, "type": "hyperlink", "data": { "url": "https://x.org/?a=1&b=2" } }
            ]
        }]);

        assert_eq!(
            as_html(&value),
            "<p><strong>Move</strong> your <a href=\"https://x.org/?a=1&amp;b=2\">money</a></p>"
        );
    }

    #[test]
    fn test_overlapping_spans_stay_nested() {
        let value = json!([{
            "type": "paragraph",
            "text": "abcd",
            "spans": [
                { "start": 0, "end": 2, "type": "strong" },
                { "start": 1, "end": 4, "type": "em" }
            ]
        }]);

        assert_eq!(
            as_html(&value),
            "<p><strong>a<em>b</em></strong><em>cd</em></p>"
        );
    }

    #[test]
    fn test_out_of_range_spans_ignored() {
        let value = json!([{
            "type": "paragraph",
            "text": "hi",
            "spans": [
                { "start": 5, "end": 9, "type": "strong" },
                { "start": 1, "end": 99, "type": "em" },
                { "start": 0, "end": 1, "type": "label" }
            ]
        }]);

        assert_eq!(as_html(&value), "<p>h<em>i</em></p>");
    }
}
