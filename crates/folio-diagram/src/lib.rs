//! Build-time diagram renderer.
//!
//! Renders mermaid flowchart descriptions to self-contained SVG so pages need
//! no client-side diagram script. Supports themes with automatic light/dark
//! switching, configurable edge curves and Iconify icon packs.

pub mod config;
pub mod flowchart;
pub mod icons;
pub mod layout;
pub mod renderer;
pub mod svg;
pub mod theme;

pub use config::{Curve, DiagramConfig, FlowchartConfig, MermaidConfig};
pub use icons::{DefaultIconSource, FetchError, IconPack, IconPackRef, IconRegistry, IconSource};
pub use renderer::{DiagramRenderer, RenderError, RenderedDiagram};
pub use theme::Theme;
