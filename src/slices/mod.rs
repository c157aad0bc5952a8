// 🧱 Content Slice Renderer
// CMS slice list → ordered rendered nodes, dispatched by tag

pub mod node;
pub mod registry;
pub mod renderers;
pub mod rich_text;
pub mod slice;

pub use node::{AccordionPanel, RenderedNode};
pub use registry::{
    Diagnostic, LeafRenderer, LeafTag, NestedRegistry, RenderOptions, RenderReport, SliceRegistry,
    SliceTag, ACCORDION_TAG,
};
pub use slice::{parse_slices, slices_from_document, Attrs, Slice};
