// 🎨 Slice renderers - one function per tag
//
// Every renderer is total: absent or malformed attributes fall back to
// empty/None fields. The only renderer that returns None on purpose is the
// table's "default" variant.

use super::node::{AccordionPanel, RenderedNode};
use super::registry::{Diagnostics, NestedRegistry};
use super::rich_text;
use super::slice::{slices_from_document, Attrs, Slice};
use serde_json::Value;

/// Table variant that is intentionally never rendered
pub const TABLE_NOOP_VARIATION: &str = "default";

/// Button style used when the slice has no variation
pub const DEFAULT_BUTTON_STYLE: &str = "primary";

/// Plain text of a field that may be a string or rich text
fn text_of(attrs: &Attrs<'_>, key: &str) -> Option<String> {
    let text = match attrs.get(key)? {
        Value::Number(n) => n.to_string(),
        other => rich_text::as_text(other),
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn html_of(attrs: &Attrs<'_>, key: &str) -> String {
    attrs.get(key).map(rich_text::as_html).unwrap_or_default()
}

// ============================================================================
// LEAF RENDERERS
// ============================================================================

pub fn text(slice: &Slice) -> Option<RenderedNode> {
    Some(RenderedNode::Text {
        html: html_of(&slice.primary(), "text"),
    })
}

pub fn image(slice: &Slice) -> Option<RenderedNode> {
    let primary = slice.primary();
    let image = primary.object("image");

    Some(RenderedNode::Image {
        url: image.and_then(|i| i.str("url")),
        alt: image.and_then(|i| i.str("alt")),
        caption: text_of(&primary, "caption"),
    })
}

pub fn button(slice: &Slice) -> Option<RenderedNode> {
    let primary = slice.primary();

    Some(RenderedNode::Button {
        label: text_of(&primary, "label").unwrap_or_default(),
        href: primary.link("link"),
        style: slice
            .variation()
            .unwrap_or(DEFAULT_BUTTON_STYLE)
            .to_string(),
    })
}

pub fn quote(slice: &Slice) -> Option<RenderedNode> {
    let primary = slice.primary();

    Some(RenderedNode::Quote {
        text: text_of(&primary, "quote").unwrap_or_default(),
        attribution: text_of(&primary, "attribution"),
    })
}

pub fn embed(slice: &Slice) -> Option<RenderedNode> {
    let embed = slice.primary().object("embed");

    Some(RenderedNode::Embed {
        provider: embed.and_then(|e| e.str("provider_name")),
        url: embed.and_then(|e| e.str("embed_url")),
        html: embed.and_then(|e| e.str("html")),
    })
}

/// Each item is a row; cells are read from keys in natural order
/// (`column_2` before `column_10`).
pub fn table(slice: &Slice) -> Option<RenderedNode> {
    if slice.variation() == Some(TABLE_NOOP_VARIATION) {
        return None;
    }

    let mut rows: Vec<Vec<String>> = slice
        .items()
        .map(|item| {
            let mut keys: Vec<&String> = item.keys().collect();
            keys.sort_by(|a, b| column_order(a).cmp(&column_order(b)));
            keys.into_iter()
                .map(|k| text_of(&item, k).unwrap_or_default())
                .collect::<Vec<String>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    let header = if slice.primary().bool("header") && !rows.is_empty() {
        Some(rows.remove(0))
    } else {
        None
    };

    Some(RenderedNode::Table { header, rows })
}

fn column_order(key: &str) -> (u64, String) {
    let index = key
        .rsplit('_')
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(u64::MAX);
    (index, key.to_string())
}

// ============================================================================
// ACCORDION
// ============================================================================

/// Accordion panels may link to further slices. They are rendered through
/// the restricted registry, which has no accordion entry, so nesting stops
/// after one level.
pub(crate) fn accordion(
    slice: &Slice,
    nested: &NestedRegistry,
    diagnostics: &mut Diagnostics,
) -> RenderedNode {
    let primary = slice.primary();

    let panels = slice
        .items()
        .map(|item| {
            let linked = item
                .get("slices")
                .map(slices_from_document)
                .unwrap_or_default();

            AccordionPanel {
                title: text_of(&item, "title").unwrap_or_default(),
                body_html: html_of(&item, "body"),
                content: nested.render_nested(&linked, diagnostics),
            }
        })
        .collect();

    RenderedNode::Accordion {
        title: text_of(&primary, "title"),
        panels,
    }
}

/// Value helper for callers building slices by hand
pub fn rich_paragraph(text: &str) -> Value {
    serde_json::json!([{ "type": "paragraph", "text": text, "spans": [] }])
}
