//! Utility-class stylesheet generation.
//!
//! Scans generated HTML for class names and emits a rule for every name that
//! matches a known utility. Variants `sm:`, `md:` and `lg:` wrap the rule in a
//! min-width media query; `dark:` scopes it under `[data-theme="dark"]`.
//! Unknown names are ignored, so component classes can share the attribute.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]*)""#).expect("Invalid class regex"));

const BREAKPOINTS: [(&str, &str); 3] = [("sm", "640px"), ("md", "768px"), ("lg", "1024px")];

const COLORS: [(&str, &str); 6] = [
    ("fg", "var(--fg)"),
    ("muted", "var(--muted)"),
    ("accent", "var(--accent)"),
    ("bg", "var(--bg)"),
    ("surface", "var(--surface)"),
    ("border", "var(--border)"),
];

/// Collect every class name used in `html`.
pub fn collect_classes(html: &str, into: &mut BTreeSet<String>) {
    for caps in CLASS_RE.captures_iter(html) {
        into.extend(caps[1].split_whitespace().map(str::to_string));
    }
}

/// A parsed class name: optional breakpoint, optional dark variant, utility.
struct Variant<'a> {
    breakpoint: Option<usize>,
    dark: bool,
    utility: &'a str,
}

fn parse_variant(class: &str) -> Option<Variant<'_>> {
    let mut parts: Vec<&str> = class.split(':').collect();
    let utility = parts.pop()?;
    let mut variant = Variant {
        breakpoint: None,
        dark: false,
        utility,
    };

    for prefix in parts {
        match prefix {
            "dark" if !variant.dark => variant.dark = true,
            _ => {
                let index = BREAKPOINTS.iter().position(|(name, _)| *name == prefix)?;
                if variant.breakpoint.is_some() {
                    return None;
                }
                variant.breakpoint = Some(index);
            }
        }
    }

    Some(variant)
}

/// Generate utility rules for the given class names.
///
/// Rules without a breakpoint come first, then each breakpoint in ascending
/// order, so wider screens override narrower ones.
pub fn generate(classes: &BTreeSet<String>) -> String {
    let mut groups: Vec<String> = vec![String::new(); BREAKPOINTS.len() + 1];

    for class in classes {
        let Some(variant) = parse_variant(class) else {
            continue;
        };
        let Some(declarations) = declarations(variant.utility) else {
            continue;
        };

        let mut selector = format!(".{}", escape_class(class));
        if variant.dark {
            selector = format!("[data-theme=\"dark\"] {}", selector);
        }

        let group = variant.breakpoint.map_or(0, |i| i + 1);
        groups[group].push_str(&format!("{} {{ {} }}\n", selector, declarations));
    }

    let mut css = String::new();
    for (index, rules) in groups.iter().enumerate() {
        if rules.is_empty() {
            continue;
        }
        if index == 0 {
            css.push_str(rules);
        } else {
            let (_, width) = BREAKPOINTS[index - 1];
            css.push_str(&format!("@media (min-width: {}) {{\n{}}}\n", width, rules));
        }
    }
    css
}

/// Escape characters that are not valid in a class selector.
fn escape_class(class: &str) -> String {
    let mut out = String::with_capacity(class.len());
    for c in class.chars() {
        if matches!(c, ':' | '/' | '.' | '[' | ']' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Spacing scale step to a length: `4` is `1rem`.
fn spacing(value: &str) -> Option<String> {
    if value == "0" {
        return Some("0".to_string());
    }
    if value == "px" {
        return Some("1px".to_string());
    }
    let steps: f64 = value.parse().ok()?;
    if !(0.0..=96.0).contains(&steps) || (steps * 2.0).fract() != 0.0 {
        return None;
    }
    Some(format!("{}rem", steps * 0.25))
}

fn color(name: &str) -> Option<&'static str> {
    COLORS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// CSS declarations for a utility name.
fn declarations(utility: &str) -> Option<String> {
    let fixed = match utility {
        "block" => "display: block",
        "inline" => "display: inline",
        "inline-block" => "display: inline-block",
        "flex" => "display: flex",
        "inline-flex" => "display: inline-flex",
        "grid" => "display: grid",
        "hidden" => "display: none",
        "flex-row" => "flex-direction: row",
        "flex-col" => "flex-direction: column",
        "flex-wrap" => "flex-wrap: wrap",
        "flex-1" => "flex: 1 1 0%",
        "items-start" => "align-items: flex-start",
        "items-center" => "align-items: center",
        "items-end" => "align-items: flex-end",
        "justify-start" => "justify-content: flex-start",
        "justify-center" => "justify-content: center",
        "justify-between" => "justify-content: space-between",
        "justify-end" => "justify-content: flex-end",
        "mx-auto" => "margin-left: auto; margin-right: auto",
        "my-auto" => "margin-top: auto; margin-bottom: auto",
        "w-full" => "width: 100%",
        "w-auto" => "width: auto",
        "h-auto" => "height: auto",
        "h-full" => "height: 100%",
        "min-h-screen" => "min-height: 100vh",
        "max-w-prose" => "max-width: 65ch",
        "max-w-none" => "max-width: none",
        "text-left" => "text-align: left",
        "text-center" => "text-align: center",
        "text-right" => "text-align: right",
        "font-normal" => "font-weight: 400",
        "font-medium" => "font-weight: 500",
        "font-semibold" => "font-weight: 600",
        "font-bold" => "font-weight: 700",
        "italic" => "font-style: italic",
        "uppercase" => "text-transform: uppercase",
        "tracking-wide" => "letter-spacing: 0.025em",
        "underline" => "text-decoration-line: underline",
        "no-underline" => "text-decoration-line: none",
        "list-none" => "list-style-type: none",
        "rounded-none" => "border-radius: 0",
        "rounded" => "border-radius: 0.25rem",
        "rounded-md" => "border-radius: 0.375rem",
        "rounded-lg" => "border-radius: 0.5rem",
        "rounded-full" => "border-radius: 9999px",
        "border" => "border: 1px solid var(--border)",
        "shadow" => "box-shadow: 0 1px 3px rgb(0 0 0 / 0.1), 0 1px 2px rgb(0 0 0 / 0.06)",
        "overflow-x-auto" => "overflow-x: auto",
        _ => "",
    };
    if !fixed.is_empty() {
        return Some(fixed.to_string());
    }

    if let Some(size) = utility.strip_prefix("text-") {
        let font = match size {
            "xs" => Some(("0.75rem", "1rem")),
            "sm" => Some(("0.875rem", "1.25rem")),
            "base" => Some(("1rem", "1.5rem")),
            "lg" => Some(("1.125rem", "1.75rem")),
            "xl" => Some(("1.25rem", "1.75rem")),
            "2xl" => Some(("1.5rem", "2rem")),
            "3xl" => Some(("1.875rem", "2.25rem")),
            "4xl" => Some(("2.25rem", "2.5rem")),
            "5xl" => Some(("3rem", "1")),
            _ => None,
        };
        if let Some((size, line)) = font {
            return Some(format!("font-size: {}; line-height: {}", size, line));
        }
        return color(size).map(|c| format!("color: {}", c));
    }

    if let Some(name) = utility.strip_prefix("bg-") {
        return color(name).map(|c| format!("background-color: {}", c));
    }

    if let Some(name) = utility.strip_prefix("border-") {
        return color(name).map(|c| format!("border-color: {}", c));
    }

    if let Some(width) = utility.strip_prefix("max-w-") {
        let rem = match width {
            "sm" => "24rem",
            "md" => "28rem",
            "lg" => "32rem",
            "xl" => "36rem",
            "2xl" => "42rem",
            "3xl" => "48rem",
            "4xl" => "56rem",
            "5xl" => "64rem",
            _ => return None,
        };
        return Some(format!("max-width: {}", rem));
    }

    if let Some(columns) = utility.strip_prefix("grid-cols-") {
        let n: u8 = columns.parse().ok().filter(|n| (1..=12).contains(n))?;
        return Some(format!(
            "grid-template-columns: repeat({}, minmax(0, 1fr))",
            n
        ));
    }

    if let Some(fraction) = utility.strip_prefix("w-") {
        let (num, den) = fraction.split_once('/')?;
        let (num, den): (f64, f64) = (num.parse().ok()?, den.parse().ok()?);
        if den == 0.0 || num > den {
            return None;
        }
        let percent = (num / den * 100.0 * 1e4).round() / 1e4;
        return Some(format!("width: {}%", percent));
    }

    spacing_declarations(utility)
}

fn spacing_declarations(utility: &str) -> Option<String> {
    const PROPERTIES: [(&str, &[&str]); 15] = [
        ("mx", &["margin-left", "margin-right"]),
        ("my", &["margin-top", "margin-bottom"]),
        ("mt", &["margin-top"]),
        ("mr", &["margin-right"]),
        ("mb", &["margin-bottom"]),
        ("ml", &["margin-left"]),
        ("m", &["margin"]),
        ("px", &["padding-left", "padding-right"]),
        ("py", &["padding-top", "padding-bottom"]),
        ("pt", &["padding-top"]),
        ("pr", &["padding-right"]),
        ("pb", &["padding-bottom"]),
        ("pl", &["padding-left"]),
        ("p", &["padding"]),
        ("gap", &["gap"]),
    ];

    let (prefix, value) = utility.split_once('-')?;
    let (_, properties) = PROPERTIES.iter().find(|(p, _)| *p == prefix)?;
    let length = spacing(value)?;

    Some(
        properties
            .iter()
            .map(|property| format!("{}: {}", property, length))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classes(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collects_classes_from_html() {
        let mut set = BTreeSet::new();
        collect_classes(
            r#"<div class="mx-auto  px-4"><p class="text-sm px-4">x</p><span class="">y</span></div>"#,
            &mut set,
        );
        assert_eq!(set, classes(&["mx-auto", "px-4", "text-sm"]));
    }

    #[test]
    fn spacing_scale() {
        assert_eq!(
            declarations("px-4").as_deref(),
            Some("padding-left: 1rem; padding-right: 1rem")
        );
        assert_eq!(declarations("mt-0").as_deref(), Some("margin-top: 0"));
        assert_eq!(declarations("gap-2.5").as_deref(), Some("gap: 0.625rem"));
        assert_eq!(declarations("m-px").as_deref(), Some("margin: 1px"));
        assert_eq!(declarations("p-banana"), None);
    }

    #[test]
    fn typography_and_color() {
        assert_eq!(
            declarations("text-sm").as_deref(),
            Some("font-size: 0.875rem; line-height: 1.25rem")
        );
        assert_eq!(declarations("text-muted").as_deref(), Some("color: var(--muted)"));
        assert_eq!(declarations("text-purple"), None);
        assert_eq!(
            declarations("bg-surface").as_deref(),
            Some("background-color: var(--surface)")
        );
    }

    #[test]
    fn fractions_and_grid() {
        assert_eq!(declarations("w-1/2").as_deref(), Some("width: 50%"));
        assert_eq!(declarations("w-1/3").as_deref(), Some("width: 33.3333%"));
        assert_eq!(
            declarations("grid-cols-3").as_deref(),
            Some("grid-template-columns: repeat(3, minmax(0, 1fr))")
        );
        assert_eq!(declarations("grid-cols-13"), None);
    }

    #[test]
    fn unknown_classes_are_ignored() {
        let css = generate(&classes(&["prose", "site-header", "hover:underline", "xl:flex"]));
        assert_eq!(css, "");
    }

    #[test]
    fn variants_and_ordering() {
        let css = generate(&classes(&["md:text-4xl", "dark:bg-surface", "flex", "sm:w-1/2"]));

        assert_eq!(
            css,
            "[data-theme=\"dark\"] .dark\\:bg-surface { background-color: var(--surface) }\n\
             .flex { display: flex }\n\
             @media (min-width: 640px) {\n.sm\\:w-1\\/2 { width: 50% }\n}\n\
             @media (min-width: 768px) {\n.md\\:text-4xl { font-size: 2.25rem; line-height: 2.5rem }\n}\n"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let set = classes(&["px-4", "md:py-12", "text-center", "dark:text-fg"]);
        assert_eq!(generate(&set), generate(&set));
    }
}
