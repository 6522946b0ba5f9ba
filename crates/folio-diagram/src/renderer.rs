//! Diagram rendering entry point.

use crate::config::DiagramConfig;
use crate::flowchart;
use crate::icons::{IconLookupError, IconRegistry};
use crate::layout;
use crate::svg;

/// Errors that can occur while rendering a diagram.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    #[error("Diagram is empty")]
    Empty,

    #[error("Unsupported diagram type: {0}")]
    Unsupported(String),

    #[error("Diagram syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error(transparent)]
    Icon(#[from] IconLookupError),
}

/// A rendered diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiagram {
    /// Self-contained `<svg>` element
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

/// Renders diagram source to SVG with a fixed configuration and icon set.
#[derive(Debug, Clone, Default)]
pub struct DiagramRenderer {
    config: DiagramConfig,
    icons: IconRegistry,
}

impl DiagramRenderer {
    pub fn new(config: DiagramConfig, icons: IconRegistry) -> Self {
        Self { config, icons }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn icons(&self) -> &IconRegistry {
        &self.icons
    }

    /// Render one diagram. `id` becomes the SVG element id and scopes its styles,
    /// so it must be unique within a page.
    pub fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, RenderError> {
        let chart = flowchart::parse(source)?;

        for node in &chart.nodes {
            if let Some(reference) = &node.icon {
                self.icons.resolve(reference)?;
            }
        }

        let layout = layout::layout(&chart);
        let svg = svg::render(id, &chart, &layout, &self.config, &self.icons)?;

        tracing::debug!(
            "Rendered diagram {} ({} nodes, {} edges)",
            id,
            chart.nodes.len(),
            chart.edges.len()
        );

        Ok(RenderedDiagram {
            svg,
            width: layout.width,
            height: layout.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::IconPack;
    use crate::theme::Theme;
    use pretty_assertions::assert_eq;

    const HANDSHAKE: &str = r#"flowchart LR
  client[Client] -->|ClientHello + ML-KEM share| edge{{Edge proxy}}
  edge -->|hybrid handshake| origin[(Origin)]
  edge -.->|fallback| classic[Classic TLS]
"#;

    const DEVICE: &str = r#"flowchart TB
  subgraph device [Device]
    mcu[Microcontroller] --> kem[ML-KEM-512]
  end
  subgraph cloud [Cloud]
    gw[Gateway] ==> store[(Key store)]
  end
  kem -- encapsulate --> gw
"#;

    const PACK: &str = r#"{ "prefix": "hw", "icons": { "chip": { "body": "<path d=\"M0 0h16v16H0z\"/>" } } }"#;

    fn renderer(config: DiagramConfig) -> DiagramRenderer {
        DiagramRenderer::new(config, IconRegistry::new())
    }

    /// Everything outside the `<style>` element.
    fn geometry(svg: &str) -> String {
        let start = svg.find("<style>").unwrap();
        let end = svg.find("</style>").unwrap();
        format!("{}{}", &svg[..start], &svg[end..])
    }

    #[test]
    fn renders_article_diagrams() {
        let renderer = renderer(DiagramConfig::default());

        let first = renderer.render("diagram-12", HANDSHAKE).unwrap();
        assert!(first.svg.contains(r#"id="diagram-12""#));
        assert!(first.svg.contains("ClientHello + ML-KEM share"));
        assert!(first.width > first.height);

        let second = renderer.render("diagram-19", DEVICE).unwrap();
        assert!(second.svg.contains(r#"<g class="cluster" data-id="device">"#));
        assert!(second.svg.contains(r#"<g class="cluster" data-id="cloud">"#));
        assert!(second.svg.contains("edge-thick"));
        assert!(second.svg.contains(">encapsulate</text>"));
    }

    #[test]
    fn auto_theme_changes_only_styles() {
        let on = renderer(DiagramConfig::default())
            .render("d", DEVICE)
            .unwrap();
        let off = renderer(DiagramConfig {
            auto_theme: false,
            ..DiagramConfig::default()
        })
        .render("d", DEVICE)
        .unwrap();

        assert!(on.svg.contains("data-theme"));
        assert!(!off.svg.contains("data-theme"));
        assert_eq!(geometry(&on.svg), geometry(&off.svg));
        assert_eq!((on.width, on.height), (off.width, off.height));
    }

    #[test]
    fn theme_changes_only_styles() {
        let forest = renderer(DiagramConfig {
            theme: Theme::Forest,
            ..DiagramConfig::default()
        })
        .render("d", HANDSHAKE)
        .unwrap();
        let default = renderer(DiagramConfig::default())
            .render("d", HANDSHAKE)
            .unwrap();

        assert_ne!(forest.svg, default.svg);
        assert_eq!(geometry(&forest.svg), geometry(&default.svg));
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = renderer(DiagramConfig::default());
        assert_eq!(
            renderer.render("d", DEVICE).unwrap(),
            renderer.render("d", DEVICE).unwrap()
        );
    }

    #[test]
    fn reports_unsupported_and_invalid_sources() {
        let renderer = renderer(DiagramConfig::default());

        assert_eq!(
            renderer.render("d", "pie\n\"a\": 1").unwrap_err(),
            RenderError::Unsupported("pie".to_string())
        );
        assert!(matches!(
            renderer.render("d", "graph TD\nA -->"),
            Err(RenderError::Syntax { line: 2, .. })
        ));
        assert_eq!(renderer.render("d", "").unwrap_err(), RenderError::Empty);
    }

    #[test]
    fn embeds_icons() {
        let mut icons = IconRegistry::new();
        icons.insert("hw", IconPack::from_json(PACK).unwrap());
        let renderer = DiagramRenderer::new(DiagramConfig::default(), icons);

        let rendered = renderer
            .render("d", "graph TD\nA@{ icon: \"hw:chip\", label: \"MCU\" } --> B")
            .unwrap();

        assert!(rendered.svg.contains(r#"<svg class="node-icon""#));
        assert!(rendered.svg.contains("M0 0h16v16H0z"));
        assert!(rendered.svg.contains(">MCU</tspan>"));
    }

    #[test]
    fn unknown_icon_is_an_error() {
        let renderer = renderer(DiagramConfig::default());

        let err = renderer
            .render("d", "graph TD\nA@{ icon: \"hw:chip\" }")
            .unwrap_err();

        assert_eq!(
            err,
            RenderError::Icon(IconLookupError::UnknownPack("hw".to_string()))
        );
    }
}
