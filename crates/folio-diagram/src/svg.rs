//! SVG output for a laid-out flowchart.

use std::fmt::Write;

use crate::config::{CurveKind, DiagramConfig};
use crate::flowchart::{ArrowHead, Flowchart, Node, Shape, Stroke};
use crate::icons::IconRegistry;
use crate::layout::{label_size, EdgeRoute, Layout, NodeBox, ICON_SIZE, LINE_HEIGHT};
use crate::renderer::RenderError;
use crate::theme;

const CLUSTER_TITLE_OFFSET: f64 = 16.0;

/// Render a flowchart into a standalone `<svg>` element.
pub fn render(
    id: &str,
    chart: &Flowchart,
    layout: &Layout,
    config: &DiagramConfig,
    icons: &IconRegistry,
) -> Result<String, RenderError> {
    let mut out = String::new();
    let id_attr = escape_xml(id);

    let size = if config.flowchart_use_max_width() {
        format!(r#"width="100%" style="max-width: {}px;""#, num(layout.width))
    } else {
        format!(
            r#"width="{}" height="{}""#,
            num(layout.width),
            num(layout.height)
        )
    };

    let _ = write!(
        out,
        r#"<svg id="{id_attr}" class="folio-diagram flowchart" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" {size} role="img" aria-roledescription="flowchart-v2">"#,
        num(layout.width),
        num(layout.height),
    );

    let _ = write!(
        out,
        "<style>{}</style>",
        theme::stylesheet(id, config.theme, config.auto_theme)
    );
    out.push_str(&markers(&id_attr));

    out.push_str(r#"<g class="subgraphs">"#);
    for (subgraph, cluster) in chart.subgraphs.iter().zip(&layout.clusters) {
        let Some(rect) = cluster else { continue };
        let _ = write!(
            out,
            r#"<g class="cluster" data-id="{}"><rect class="cluster-shape" x="{}" y="{}" width="{}" height="{}" rx="4"/><text class="cluster-label" x="{}" y="{}" text-anchor="middle" dominant-baseline="central">{}</text></g>"#,
            escape_xml(&subgraph.id),
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height),
            num(rect.x + rect.width / 2.0),
            num(rect.y + CLUSTER_TITLE_OFFSET),
            escape_xml(&subgraph.title),
        );
    }
    out.push_str("</g>");

    let curve = config.mermaid_config.flowchart.curve.kind();
    let vertical = chart.direction.is_vertical();

    out.push_str(r#"<g class="edges">"#);
    for (edge, route) in chart.edges.iter().zip(&layout.edges) {
        if edge.stroke == Stroke::Invisible || route.points.is_empty() {
            continue;
        }

        let mut class = String::from("edge-path");
        match edge.stroke {
            Stroke::Thick => class.push_str(" edge-thick"),
            Stroke::Dotted => class.push_str(" edge-dotted"),
            _ => {}
        }

        let _ = write!(
            out,
            r#"<path class="{class}" data-from="{}" data-to="{}" d="{}"{}{}/>"#,
            escape_xml(&edge.from),
            escape_xml(&edge.to),
            path_data(route, curve, vertical),
            marker_attr("marker-start", &id_attr, edge.tail),
            marker_attr("marker-end", &id_attr, edge.head),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="edge-labels">"#);
    for (edge, route) in chart.edges.iter().zip(&layout.edges) {
        if edge.stroke == Stroke::Invisible {
            continue;
        }
        let (Some(text), Some((x, y))) = (&edge.label, route.label) else {
            continue;
        };
        let (w, h) = label_size(text);
        let _ = write!(
            out,
            r#"<g class="edge-label-group"><rect class="edge-label-bg" x="{}" y="{}" width="{}" height="{}" rx="2"/><text class="edge-label" x="{}" y="{}" text-anchor="middle" dominant-baseline="central">{}</text></g>"#,
            num(x - w / 2.0),
            num(y - h / 2.0),
            num(w),
            num(h),
            num(x),
            num(y),
            escape_xml(text),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for (node, b) in chart.nodes.iter().zip(&layout.nodes) {
        let mut class = String::from("node");
        for c in &node.classes {
            class.push(' ');
            class.push_str(c);
        }
        let style = chart
            .node_style(node)
            .map(|s| format!(r#" style="{}""#, escape_xml(&s)))
            .unwrap_or_default();

        let _ = write!(
            out,
            r#"<g class="{}" data-id="{}">"#,
            escape_xml(&class),
            escape_xml(&node.id)
        );

        match &node.icon {
            Some(reference) => {
                let icon = icons.resolve(reference)?;
                let top = b.y - b.height / 2.0 + 10.0;
                let _ = write!(
                    out,
                    r#"<svg class="node-icon" x="{}" y="{}" width="{}" height="{}" viewBox="0 0 {} {}"{style}>{}</svg>"#,
                    num(b.x - ICON_SIZE / 2.0),
                    num(top),
                    num(ICON_SIZE),
                    num(ICON_SIZE),
                    icon.width,
                    icon.height,
                    icon.body,
                );
                out.push_str(&label_text(node, b.x, top + ICON_SIZE + 4.0 + LINE_HEIGHT / 2.0));
            }
            None => {
                out.push_str(&shape(node.shape, b, &style));
                let first = b.y - (node.label.len().saturating_sub(1)) as f64 * LINE_HEIGHT / 2.0;
                out.push_str(&label_text(node, b.x, first));
            }
        }

        out.push_str("</g>");
    }
    out.push_str("</g>");

    out.push_str("</svg>");
    Ok(out)
}

fn markers(id: &str) -> String {
    format!(
        r#"<defs><marker id="{id}-arrow" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path class="marker" d="M0,0L10,5L0,10z"/></marker><marker id="{id}-circle" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><circle class="marker" cx="5" cy="5" r="4"/></marker><marker id="{id}-cross" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path class="marker" d="M1,1L9,9M1,9L9,1" stroke-width="2"/></marker></defs>"#
    )
}

fn marker_attr(attr: &str, id: &str, head: ArrowHead) -> String {
    let name = match head {
        ArrowHead::None => return String::new(),
        ArrowHead::Arrow => "arrow",
        ArrowHead::Circle => "circle",
        ArrowHead::Cross => "cross",
    };
    format!(r#" {attr}="url(#{id}-{name})""#)
}

fn label_text(node: &Node, x: f64, first_line: f64) -> String {
    if node.label.is_empty() {
        return String::new();
    }

    let mut out = format!(
        r#"<text class="node-label" x="{}" y="{}" text-anchor="middle" dominant-baseline="central">"#,
        num(x),
        num(first_line)
    );
    for (i, line) in node.label.iter().enumerate() {
        let _ = write!(
            out,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            num(x),
            num(first_line + i as f64 * LINE_HEIGHT),
            escape_xml(line)
        );
    }
    out.push_str("</text>");
    out
}

/// Outline element for a node shape.
fn shape(shape: Shape, b: &NodeBox, style: &str) -> String {
    let (l, t) = (b.x - b.width / 2.0, b.y - b.height / 2.0);
    let (r, bot) = (l + b.width, t + b.height);
    let (w, h) = (b.width, b.height);

    let rect = |rx: f64| {
        format!(
            r#"<rect class="node-shape" x="{}" y="{}" width="{}" height="{}" rx="{}"{style}/>"#,
            num(l),
            num(t),
            num(w),
            num(h),
            num(rx)
        )
    };
    let polygon = |points: &[(f64, f64)]| {
        let points: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
            .collect();
        format!(
            r#"<polygon class="node-shape" points="{}"{style}/>"#,
            points.join(" ")
        )
    };

    match shape {
        Shape::Rect => rect(0.0),
        Shape::Round => rect(5.0),
        Shape::Stadium => rect(h / 2.0),
        Shape::Subroutine => format!(
            r#"{}<path class="node-shape" d="M{},{}V{}M{},{}V{}"{style}/>"#,
            rect(0.0),
            num(l + 8.0),
            num(t),
            num(bot),
            num(r - 8.0),
            num(t),
            num(bot)
        ),
        Shape::Cylinder => {
            let rx = w / 2.0;
            let ry = 8.0;
            format!(
                r#"<path class="node-shape" d="M{},{}a{},{} 0 0 0 {},0a{},{} 0 0 0 -{},0v{}a{},{} 0 0 0 {},0v-{}"{style}/>"#,
                num(l),
                num(t + ry),
                num(rx),
                num(ry),
                num(w),
                num(rx),
                num(ry),
                num(w),
                num(h - 2.0 * ry),
                num(rx),
                num(ry),
                num(w),
                num(h - 2.0 * ry),
            )
        }
        Shape::Circle => format!(
            r#"<circle class="node-shape" cx="{}" cy="{}" r="{}"{style}/>"#,
            num(b.x),
            num(b.y),
            num(w / 2.0)
        ),
        Shape::Asymmetric => polygon(&[(l, t), (r, t), (r, bot), (l, bot), (l + 12.0, b.y)]),
        Shape::Rhombus => polygon(&[(b.x, t), (r, b.y), (b.x, bot), (l, b.y)]),
        Shape::Hexagon => {
            let inset = h / 4.0;
            polygon(&[
                (l + inset, t),
                (r - inset, t),
                (r, b.y),
                (r - inset, bot),
                (l + inset, bot),
                (l, b.y),
            ])
        }
    }
}

/// `d` attribute for an edge route.
fn path_data(route: &EdgeRoute, curve: CurveKind, vertical: bool) -> String {
    let points = &route.points;
    let mut d = format!("M{},{}", num(points[0].0), num(points[0].1));

    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        match curve {
            CurveKind::Straight => {
                let _ = write!(d, "L{},{}", num(x1), num(y1));
            }
            CurveKind::Smooth => {
                let (c1, c2) = if vertical {
                    let my = (y1 - y0) / 2.0;
                    ((x0, y0 + my), (x1, y1 - my))
                } else {
                    let mx = (x1 - x0) / 2.0;
                    ((x0 + mx, y0), (x1 - mx, y1))
                };
                let _ = write!(
                    d,
                    "C{},{} {},{} {},{}",
                    num(c1.0),
                    num(c1.1),
                    num(c2.0),
                    num(c2.1),
                    num(x1),
                    num(y1)
                );
            }
            CurveKind::Step => {
                if vertical {
                    let my = (y0 + y1) / 2.0;
                    let _ = write!(d, "V{}H{}V{}", num(my), num(x1), num(y1));
                } else {
                    let mx = (x0 + x1) / 2.0;
                    let _ = write!(d, "H{}V{}H{}", num(mx), num(y1), num(x1));
                }
            }
            CurveKind::StepBefore => {
                let _ = write!(d, "V{}H{}", num(y1), num(x1));
            }
            CurveKind::StepAfter => {
                let _ = write!(d, "H{}V{}", num(x1), num(y1));
            }
        }
    }

    d
}

/// Format a coordinate with at most two decimals.
fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape text for XML content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Curve;
    use crate::flowchart::parse;
    use crate::layout::layout;

    fn render_source(source: &str, config: &DiagramConfig) -> String {
        let chart = parse(source).unwrap();
        let layout = layout(&chart);
        render("d1", &chart, &layout, config, &IconRegistry::new()).unwrap()
    }

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }

    #[test]
    fn renders_structure() {
        let svg = render_source(
            "graph TD\nA[Start] -->|go| B{Check}\nB -.-> C((Done))",
            &DiagramConfig::default(),
        );

        assert!(svg.starts_with(r#"<svg id="d1" class="folio-diagram flowchart""#));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"width="100%""#));
        assert!(svg.contains("<polygon class=\"node-shape\""));
        assert!(svg.contains("<circle class=\"node-shape\""));
        assert!(svg.contains(">Start</tspan>"));
        assert!(svg.contains(">go</text>"));
        assert!(svg.contains("edge-path edge-dotted"));
        assert!(svg.contains(r#"marker-end="url(#d1-arrow)""#));
        assert_eq!(svg.matches(r#"<g class="node""#).count(), 3);
    }

    #[test]
    fn fixed_size_without_max_width() {
        let mut config = DiagramConfig::default();
        config.mermaid_config.use_max_width = false;

        let svg = render_source("graph TD\nA --> B", &config);
        assert!(!svg.contains("max-width"));
        assert!(svg.contains(r#" height=""#));
    }

    #[test]
    fn escapes_labels() {
        let svg = render_source(
            "graph TD\nA[\"a < b & c\"] -->|x > y| B",
            &DiagramConfig::default(),
        );
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("x &gt; y"));
    }

    #[test]
    fn invisible_edges_are_not_drawn() {
        let svg = render_source("graph LR\nA ~~~ B", &DiagramConfig::default());
        assert!(!svg.contains(r#"<path class="edge-path"#));
        assert!(svg.contains(r#"data-id="B""#));
    }

    #[test]
    fn curve_styles() {
        let route = EdgeRoute {
            points: vec![(0.0, 0.0), (10.0, 20.0)],
            label: None,
        };
        assert_eq!(path_data(&route, CurveKind::Straight, true), "M0,0L10,20");
        assert_eq!(path_data(&route, CurveKind::Smooth, true), "M0,0C0,10 10,10 10,20");
        assert_eq!(path_data(&route, CurveKind::Step, true), "M0,0V10H10V20");
        assert_eq!(path_data(&route, CurveKind::StepBefore, true), "M0,0V20H10");
        assert_eq!(path_data(&route, CurveKind::StepAfter, true), "M0,0H10V20");
    }

    #[test]
    fn configured_curve_is_used() {
        let mut config = DiagramConfig::default();
        config.mermaid_config.flowchart.curve = Curve::Linear;
        let svg = render_source("graph TD\nA --> B", &config);

        let path = &svg[svg.find(r#"class="edge-path""#).unwrap()..];
        let start = path.find(r#" d=""#).unwrap() + 4;
        let d = &path[start..start + path[start..].find('"').unwrap()];
        assert!(d.contains('L'));
        assert!(!d.contains('C'));
    }
}
