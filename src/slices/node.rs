// 🖼️ Rendered nodes - view model produced by the slice renderers

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedNode {
    Text {
        html: String,
    },
    Image {
        url: Option<String>,
        alt: Option<String>,
        caption: Option<String>,
    },
    Button {
        label: String,
        href: Option<String>,
        style: String,
    },
    Quote {
        text: String,
        attribution: Option<String>,
    },
    Embed {
        provider: Option<String>,
        url: Option<String>,
        html: Option<String>,
    },
    Table {
        header: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
    },
    Accordion {
        title: Option<String>,
        panels: Vec<AccordionPanel>,
    },
    /// Visible stand-in for a tag no renderer knows
    Unknown {
        tag: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccordionPanel {
    pub title: String,
    pub body_html: String,
    /// Linked slices, rendered without accordion support
    pub content: Vec<RenderedNode>,
}

impl RenderedNode {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderedNode::Text { .. } => "text",
            RenderedNode::Image { .. } => "image",
            RenderedNode::Button { .. } => "button",
            RenderedNode::Quote { .. } => "quote",
            RenderedNode::Embed { .. } => "embed",
            RenderedNode::Table { .. } => "table",
            RenderedNode::Accordion { .. } => "accordion",
            RenderedNode::Unknown { .. } => "unknown",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, RenderedNode::Unknown { .. })
    }
}
