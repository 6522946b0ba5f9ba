//! Diagram rendering configuration.
//!
//! Field names follow the `[mermaid]` table of `folio.toml`, which mirrors the
//! usual mermaid integration options (`theme`, `autoTheme`, `mermaidConfig`,
//! `iconPacks`).

use serde::Deserialize;

use crate::icons::IconPackRef;
use crate::theme::Theme;

/// Top-level diagram configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagramConfig {
    /// Theme applied to every diagram
    #[serde(default)]
    pub theme: Theme,

    /// Emit an alternate palette selected by the page's `data-theme` attribute
    #[serde(default = "default_true")]
    pub auto_theme: bool,

    /// Options passed through to the renderer
    #[serde(default)]
    pub mermaid_config: MermaidConfig,

    /// Icon packs loaded before rendering
    #[serde(default)]
    pub icon_packs: Vec<IconPackRef>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            auto_theme: true,
            mermaid_config: MermaidConfig::default(),
            icon_packs: Vec::new(),
        }
    }
}

impl DiagramConfig {
    /// Whether flowcharts scale down to their container instead of using a fixed size.
    pub fn flowchart_use_max_width(&self) -> bool {
        self.mermaid_config
            .flowchart
            .use_max_width
            .unwrap_or(self.mermaid_config.use_max_width)
    }
}

/// Renderer options shared by all diagram kinds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MermaidConfig {
    #[serde(default = "default_true")]
    pub use_max_width: bool,

    #[serde(default)]
    pub flowchart: FlowchartConfig,
}

impl Default for MermaidConfig {
    fn default() -> Self {
        Self {
            use_max_width: true,
            flowchart: FlowchartConfig::default(),
        }
    }
}

/// Flowchart-specific options.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartConfig {
    /// Edge interpolation
    #[serde(default)]
    pub curve: Curve,

    /// Overrides `mermaidConfig.useMaxWidth` for flowcharts
    #[serde(default)]
    pub use_max_width: Option<bool>,
}

/// Edge interpolation style, named after the d3 curve factories.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Curve {
    #[default]
    Basis,
    BumpX,
    BumpY,
    Cardinal,
    CatmullRom,
    Linear,
    MonotoneX,
    MonotoneY,
    Natural,
    Step,
    StepBefore,
    StepAfter,
}

/// How a curve family draws a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Smooth,
    Straight,
    Step,
    StepBefore,
    StepAfter,
}

impl Curve {
    pub fn kind(self) -> CurveKind {
        match self {
            Curve::Linear => CurveKind::Straight,
            Curve::Step => CurveKind::Step,
            Curve::StepBefore => CurveKind::StepBefore,
            Curve::StepAfter => CurveKind::StepAfter,
            _ => CurveKind::Smooth,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_table() {
        let config: DiagramConfig = toml::from_str(
            r#"
theme = "forest"
autoTheme = false

[mermaidConfig]
useMaxWidth = false

[mermaidConfig.flowchart]
curve = "stepBefore"
useMaxWidth = true

[[iconPacks]]
name = "logos"
loader = "https://unpkg.com/@iconify-json/logos@1/icons.json"
"#,
        )
        .unwrap();

        assert_eq!(config.theme, Theme::Forest);
        assert!(!config.auto_theme);
        assert!(!config.mermaid_config.use_max_width);
        assert_eq!(config.mermaid_config.flowchart.curve, Curve::StepBefore);
        assert!(config.flowchart_use_max_width());
        assert_eq!(config.icon_packs.len(), 1);
        assert_eq!(config.icon_packs[0].name, "logos");
    }

    #[test]
    fn defaults_when_empty() {
        let config: DiagramConfig = toml::from_str("").unwrap();
        assert_eq!(config, DiagramConfig::default());
        assert!(config.auto_theme);
        assert!(config.flowchart_use_max_width());
        assert_eq!(config.mermaid_config.flowchart.curve, Curve::Basis);
    }

    #[test]
    fn flowchart_width_falls_back_to_global() {
        let config: DiagramConfig =
            toml::from_str("[mermaidConfig]\nuseMaxWidth = false\n").unwrap();
        assert!(!config.flowchart_use_max_width());
    }

    #[test]
    fn rejects_unknown_curve() {
        let result: Result<DiagramConfig, _> =
            toml::from_str("[mermaidConfig.flowchart]\ncurve = \"zigzag\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn curve_families() {
        assert_eq!(Curve::Basis.kind(), CurveKind::Smooth);
        assert_eq!(Curve::MonotoneX.kind(), CurveKind::Smooth);
        assert_eq!(Curve::Linear.kind(), CurveKind::Straight);
        assert_eq!(Curve::StepAfter.kind(), CurveKind::StepAfter);
    }
}
