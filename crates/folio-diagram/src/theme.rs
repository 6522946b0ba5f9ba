//! Diagram color themes.
//!
//! Each theme resolves to a palette of CSS custom properties scoped to one SVG.
//! Shapes reference the properties, so switching palettes never changes geometry.

use serde::Deserialize;

/// Built-in diagram themes.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
    Base,
}

/// Colors used by a rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub text: &'static str,
    pub edge: &'static str,
    pub cluster_fill: &'static str,
    pub cluster_stroke: &'static str,
    pub label_background: &'static str,
    pub icon: &'static str,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Forest => "forest",
            Theme::Neutral => "neutral",
            Theme::Base => "base",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Theme used for the opposite color scheme when automatic switching is on.
    pub fn counterpart(self) -> Theme {
        if self.is_dark() {
            Theme::Default
        } else {
            Theme::Dark
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Default => Palette {
                node_fill: "#ECECFF",
                node_stroke: "#9370DB",
                text: "#333333",
                edge: "#333333",
                cluster_fill: "#ffffde",
                cluster_stroke: "#aaaa33",
                label_background: "rgba(232,232,232,0.8)",
                icon: "#333333",
            },
            Theme::Dark => Palette {
                node_fill: "#1f2020",
                node_stroke: "#81B1DB",
                text: "#cccccc",
                edge: "#d3d3d3",
                cluster_fill: "#2c2c3a",
                cluster_stroke: "rgba(255,255,255,0.25)",
                label_background: "#585858",
                icon: "#e0e0e0",
            },
            Theme::Forest => Palette {
                node_fill: "#cde498",
                node_stroke: "#13540c",
                text: "#000000",
                edge: "#008000",
                cluster_fill: "#cdffb2",
                cluster_stroke: "#6eaa49",
                label_background: "#e8e8e8",
                icon: "#13540c",
            },
            Theme::Neutral => Palette {
                node_fill: "#eeeeee",
                node_stroke: "#999999",
                text: "#333333",
                edge: "#666666",
                cluster_fill: "#f4f4f4",
                cluster_stroke: "#666666",
                label_background: "#ffffff",
                icon: "#333333",
            },
            Theme::Base => Palette {
                node_fill: "#fff4dd",
                node_stroke: "#9d8a4f",
                text: "#333333",
                edge: "#333333",
                cluster_fill: "#fffcf5",
                cluster_stroke: "#c9b07a",
                label_background: "#fff4dd",
                icon: "#333333",
            },
        }
    }
}

impl Palette {
    /// Custom property declarations for this palette.
    fn declarations(&self) -> String {
        format!(
            "--fd-node-fill:{};--fd-node-stroke:{};--fd-text:{};--fd-edge:{};\
             --fd-cluster-fill:{};--fd-cluster-stroke:{};--fd-label-bg:{};--fd-icon:{};",
            self.node_fill,
            self.node_stroke,
            self.text,
            self.edge,
            self.cluster_fill,
            self.cluster_stroke,
            self.label_background,
            self.icon
        )
    }
}

/// Build the `<style>` body for a diagram with the given SVG id.
///
/// With `auto_theme` the counterpart palette is declared under the matching
/// `[data-theme]` ancestor selector.
pub fn stylesheet(id: &str, theme: Theme, auto_theme: bool) -> String {
    let mut css = String::new();

    css.push_str(&format!("#{id}{{{}}}", theme.palette().declarations()));

    if auto_theme {
        let other = theme.counterpart();
        let mode = if other.is_dark() { "dark" } else { "light" };
        css.push_str(&format!(
            "[data-theme=\"{mode}\"] #{id}{{{}}}",
            other.palette().declarations()
        ));
    }

    css.push_str(&format!(
        "#{id}{{font-family:\"trebuchet ms\",verdana,arial,sans-serif;font-size:14px;fill:var(--fd-text);}}\
         #{id} .node-shape{{fill:var(--fd-node-fill);stroke:var(--fd-node-stroke);stroke-width:1px;}}\
         #{id} .node-label{{fill:var(--fd-text);}}\
         #{id} .node-icon{{color:var(--fd-icon);}}\
         #{id} .edge-path{{fill:none;stroke:var(--fd-edge);stroke-width:2px;}}\
         #{id} .edge-thick{{stroke-width:3.5px;}}\
         #{id} .edge-dotted{{stroke-dasharray:3;}}\
         #{id} .marker{{fill:var(--fd-edge);stroke:var(--fd-edge);}}\
         #{id} .edge-label-bg{{fill:var(--fd-label-bg);}}\
         #{id} .edge-label{{fill:var(--fd-text);}}\
         #{id} .cluster-shape{{fill:var(--fd-cluster-fill);stroke:var(--fd-cluster-stroke);stroke-width:1px;}}\
         #{id} .cluster-label{{fill:var(--fd-text);font-weight:600;}}"
    ));

    css
}
