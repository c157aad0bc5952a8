// 🗂️ Slice Registry - closed map from tag to renderer
//
// Two registries:
// - NestedRegistry: leaf tags only (no accordion)
// - SliceRegistry:  every leaf tag + accordion, whose panels render through
//                   the NestedRegistry
//
// LeafTag has no accordion variant, so the nested registry cannot hold an
// accordion renderer. Nesting depth is bounded by the types, not a counter.

use super::node::RenderedNode;
use super::renderers;
use super::slice::Slice;
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// TAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafTag {
    Text,
    Image,
    Button,
    Quote,
    Embed,
    Table,
}

impl LeafTag {
    pub const ALL: [LeafTag; 6] = [
        LeafTag::Text,
        LeafTag::Image,
        LeafTag::Button,
        LeafTag::Quote,
        LeafTag::Embed,
        LeafTag::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeafTag::Text => "text",
            LeafTag::Image => "image",
            LeafTag::Button => "button",
            LeafTag::Quote => "quote",
            LeafTag::Embed => "embed",
            LeafTag::Table => "table",
        }
    }
}

pub const ACCORDION_TAG: &str = "accordion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceTag {
    Accordion,
    Leaf(LeafTag),
}

impl SliceTag {
    /// Map a CMS tag string to a known tag
    pub fn parse(tag: &str) -> Option<SliceTag> {
        if tag == ACCORDION_TAG {
            return Some(SliceTag::Accordion);
        }
        LeafTag::ALL
            .iter()
            .find(|leaf| leaf.as_str() == tag)
            .map(|leaf| SliceTag::Leaf(*leaf))
    }
}

// ============================================================================
// OPTIONS & DIAGNOSTICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit warnings for unknown tags / dropped accordions (development only)
    pub dev_diagnostics: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            dev_diagnostics: cfg!(debug_assertions),
        }
    }
}

impl RenderOptions {
    pub fn development() -> Self {
        RenderOptions {
            dev_diagnostics: true,
        }
    }

    pub fn production() -> Self {
        RenderOptions {
            dev_diagnostics: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No renderer for this tag; a placeholder was emitted
    UnknownTag { tag: String, nested: bool },
    /// Accordion found inside accordion content; it was dropped
    NestedAccordionDropped,
}

/// Collects diagnostics when enabled; a no-op otherwise
#[derive(Debug)]
pub(crate) struct Diagnostics {
    enabled: bool,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    fn new(enabled: bool) -> Self {
        Diagnostics {
            enabled,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if !self.enabled {
            return;
        }
        match &diagnostic {
            Diagnostic::UnknownTag { tag, nested } => {
                tracing::warn!(tag = %tag, nested, "no renderer for slice tag, rendering placeholder");
            }
            Diagnostic::NestedAccordionDropped => {
                tracing::warn!("accordion inside accordion content was dropped");
            }
        }
        self.entries.push(diagnostic);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub nodes: Vec<RenderedNode>,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// NESTED (RESTRICTED) REGISTRY
// ============================================================================

pub type LeafRenderer = fn(&Slice) -> Option<RenderedNode>;

#[derive(Clone)]
pub struct NestedRegistry {
    renderers: HashMap<LeafTag, LeafRenderer>,
}

impl NestedRegistry {
    /// Registry with no renderers; every tag renders as a placeholder
    pub fn empty() -> Self {
        NestedRegistry {
            renderers: HashMap::new(),
        }
    }

    /// Registry with the built-in renderer for every leaf tag
    pub fn standard() -> Self {
        let mut registry = NestedRegistry::empty();
        registry.register(LeafTag::Text, renderers::text);
        registry.register(LeafTag::Image, renderers::image);
        registry.register(LeafTag::Button, renderers::button);
        registry.register(LeafTag::Quote, renderers::quote);
        registry.register(LeafTag::Embed, renderers::embed);
        registry.register(LeafTag::Table, renderers::table);
        registry
    }

    /// Install a renderer. One renderer per tag: the previous one is returned.
    pub fn register(&mut self, tag: LeafTag, renderer: LeafRenderer) -> Option<LeafRenderer> {
        self.renderers.insert(tag, renderer)
    }

    pub fn renderer(&self, tag: LeafTag) -> Option<LeafRenderer> {
        self.renderers.get(&tag).copied()
    }

    /// Registered tags in stable order
    pub fn tags(&self) -> Vec<LeafTag> {
        let mut tags: Vec<LeafTag> = self.renderers.keys().copied().collect();
        tags.sort();
        tags
    }

    fn render_leaf(
        &self,
        tag: LeafTag,
        slice: &Slice,
        nested: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<RenderedNode> {
        match self.renderer(tag) {
            Some(render) => render(slice),
            None => Some(placeholder(&slice.slice_type, nested, diagnostics)),
        }
    }

    /// Render accordion content: accordions are dropped, unknown tags become
    /// placeholders.
    pub(crate) fn render_nested(
        &self,
        slices: &[Slice],
        diagnostics: &mut Diagnostics,
    ) -> Vec<RenderedNode> {
        slices
            .iter()
            .filter_map(|slice| match SliceTag::parse(&slice.slice_type) {
                Some(SliceTag::Leaf(tag)) => self.render_leaf(tag, slice, true, diagnostics),
                Some(SliceTag::Accordion) => {
                    diagnostics.push(Diagnostic::NestedAccordionDropped);
                    None
                }
                None => Some(placeholder(&slice.slice_type, true, diagnostics)),
            })
            .collect()
    }
}

impl Default for NestedRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for NestedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

fn placeholder(tag: &str, nested: bool, diagnostics: &mut Diagnostics) -> RenderedNode {
    diagnostics.push(Diagnostic::UnknownTag {
        tag: tag.to_string(),
        nested,
    });
    RenderedNode::Unknown {
        tag: tag.to_string(),
    }
}

// ============================================================================
// FULL REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct SliceRegistry {
    leaves: NestedRegistry,
    options: RenderOptions,
}

impl SliceRegistry {
    pub fn new(options: RenderOptions) -> Self {
        SliceRegistry::with_leaves(NestedRegistry::standard(), options)
    }

    /// Full registry over a custom set of leaf renderers
    pub fn with_leaves(leaves: NestedRegistry, options: RenderOptions) -> Self {
        SliceRegistry { leaves, options }
    }

    /// The registry accordion content is rendered with
    pub fn restricted(&self) -> &NestedRegistry {
        &self.leaves
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Render slices in order. Placeholders replace unknown tags; the only
    /// slices that produce no node are table "default" variants.
    pub fn render(&self, slices: &[Slice]) -> Vec<RenderedNode> {
        self.render_report(slices).nodes
    }

    pub fn render_report(&self, slices: &[Slice]) -> RenderReport {
        let mut diagnostics = Diagnostics::new(self.options.dev_diagnostics);

        let nodes = slices
            .iter()
            .filter_map(|slice| match SliceTag::parse(&slice.slice_type) {
                Some(SliceTag::Accordion) => Some(renderers::accordion(
                    slice,
                    &self.leaves,
                    &mut diagnostics,
                )),
                Some(SliceTag::Leaf(tag)) => {
                    self.leaves.render_leaf(tag, slice, false, &mut diagnostics)
                }
                None => Some(placeholder(&slice.slice_type, false, &mut diagnostics)),
            })
            .collect();

        tracing::debug!(slices = slices.len(), "rendered slice zone");

        RenderReport {
            nodes,
            diagnostics: diagnostics.entries,
        }
    }
}

impl Default for SliceRegistry {
    fn default() -> Self {
        SliceRegistry::new(RenderOptions::default())
    }
}
