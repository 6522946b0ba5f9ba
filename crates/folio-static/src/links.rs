//! Internal link checking.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:href|src)="([^"]*)""#).expect("Invalid link regex"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|(amp|quot|apos|lt|gt));")
        .expect("Invalid entity regex")
});

/// Root-relative `href`/`src` targets in a page, in order of first use.
///
/// Attribute values are unescaped first; templates emit `/` as `&#x2f;`.
pub fn internal_links(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LINK_RE
        .captures_iter(html)
        .map(|caps| unescape_attr(&caps[1]))
        .filter(|link| link.starts_with('/') && !link.starts_with("//"))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Decode the character references an HTML attribute value can carry.
fn unescape_attr(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &regex::Captures| {
            let code = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec), _) => dec.as_str().parse().ok(),
                (_, _, Some(name)) => Some(u32::from(match name.as_str() {
                    "amp" => '&',
                    "quot" => '"',
                    "apos" => '\'',
                    "lt" => '<',
                    _ => '>',
                })),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Known link targets: generated routes plus files present in the output tree.
#[derive(Debug, Default)]
pub struct LinkIndex {
    base_url: String,
    routes: HashSet<String>,
    files: HashSet<String>,
}

impl LinkIndex {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Register a route path such as `/blog/post/`.
    pub fn add_route(&mut self, path: &str) {
        self.routes.insert(path.to_string());
    }

    /// Register a file path relative to the output root, such as `assets/main.css`.
    pub fn add_file(&mut self, path: &str) {
        self.files.insert(format!("/{}", path.trim_start_matches('/')));
    }

    /// Whether a root-relative link resolves to something in the output.
    pub fn resolves(&self, link: &str) -> bool {
        let path = link.split(['#', '?']).next().unwrap_or(link);
        let path = path.strip_prefix(self.base_url.as_str()).unwrap_or(path);
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        if self.routes.contains(&path) || self.files.contains(&path) {
            return true;
        }
        if !path.ends_with('/') && self.routes.contains(&format!("{}/", path)) {
            return true;
        }
        path.strip_suffix("index.html")
            .is_some_and(|dir| self.routes.contains(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_relative_links() {
        let html = r#"<a href="/blog/">x</a><img src="/hero.png"><a href="https://x.test/">y</a>
<a href="//cdn.test/a.js">z</a><a href="/blog/">again</a><a href="post/">rel</a>"#;

        assert_eq!(internal_links(html), vec!["/blog/", "/hero.png"]);
    }

    #[test]
    fn unescapes_template_attributes() {
        let html = r#"<img src="&#x2f;img&#x2f;hero.png"><a href="&#x2f;blog&#x2f;?a=1&amp;b=2">x</a>
<a href="&#47;&#47;cdn.test&#x2f;a.js">cdn</a><a href="&#x2F;">home</a>"#;

        assert_eq!(
            internal_links(html),
            vec!["/img/hero.png", "/blog/?a=1&b=2", "/"]
        );
    }

    #[test]
    fn keeps_unknown_entities() {
        assert_eq!(unescape_attr("&nbsp;&#x2f;"), "&nbsp;/");
    }

    #[test]
    fn resolves_routes_and_files() {
        let mut index = LinkIndex::new("/");
        index.add_route("/");
        index.add_route("/blog/post/");
        index.add_file("assets/main.css");

        assert!(index.resolves("/"));
        assert!(index.resolves("/blog/post/"));
        assert!(index.resolves("/blog/post"));
        assert!(index.resolves("/blog/post/#setup"));
        assert!(index.resolves("/blog/post/index.html"));
        assert!(index.resolves("/assets/main.css?v=1"));
        assert!(!index.resolves("/blog/missing/"));
        assert!(!index.resolves("/hero.png"));
    }

    #[test]
    fn strips_base_url() {
        let mut index = LinkIndex::new("/docs/");
        index.add_route("/post/");
        index.add_file("assets/main.js");

        assert!(index.resolves("/docs/post/"));
        assert!(index.resolves("/docs/assets/main.js"));
        assert!(!index.resolves("/docs/other/"));
    }
}
