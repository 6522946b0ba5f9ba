//! Asset pipeline for CSS and JavaScript processing.

use std::collections::BTreeSet;

use crate::utilities;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main stylesheet: base rules followed by the utility rules
    /// for every class in `classes`.
    pub fn generate_css(classes: &BTreeSet<String>) -> String {
        let mut css = String::from(BASE_CSS);
        css.push_str("\n/* Utilities */\n");
        css.push_str(&utilities::generate(classes));
        css
    }

    /// Generate the main JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const BASE_CSS: &str = r#"/* folio base theme */

:root {
  --bg: #ffffff;
  --fg: #1f2328;
  --muted: #59636e;
  --accent: #2337ff;
  --surface: #f6f8fa;
  --border: #d1d9e0;
  --code-bg: #f6f8fa;
  --font-sans: system-ui, -apple-system, "Segoe UI", sans-serif;
  --font-mono: ui-monospace, "SF Mono", Menlo, monospace;
  color-scheme: light;
}

[data-theme="dark"] {
  --bg: #0d1117;
  --fg: #e6edf3;
  --muted: #9198a1;
  --accent: #7c8cff;
  --surface: #151b23;
  --border: #3d444d;
  --code-bg: #151b23;
  color-scheme: dark;
}

*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: var(--font-sans);
  background: var(--bg);
  color: var(--fg);
  line-height: 1.7;
}

a {
  color: var(--accent);
}

img {
  max-width: 100%;
  height: auto;
}

/* Header */
.site-header {
  border-bottom: 1px solid var(--border);
}

.site-title {
  color: var(--fg);
}

.nav-list {
  list-style: none;
  margin: 0;
  padding: 0;
}

.nav-item a {
  color: var(--muted);
  text-decoration: none;
}

.nav-item.active a,
.nav-item a:hover {
  color: var(--fg);
}

.theme-toggle {
  background: none;
  border: 1px solid var(--border);
  color: var(--fg);
  cursor: pointer;
  font-size: 1rem;
}

.site-footer {
  border-top: 1px solid var(--border);
}

/* Article */
.tags {
  list-style: none;
  padding: 0;
}

.tag {
  background: var(--surface);
  border: 1px solid var(--border);
  color: var(--muted);
}

.toc {
  border-left: 2px solid var(--border);
  padding-left: 1rem;
}

.toc ul {
  list-style: none;
  margin: 0;
  padding: 0;
}

.toc a {
  color: var(--muted);
  text-decoration: none;
}

.toc a:hover {
  color: var(--fg);
}

.toc-level-3 {
  padding-left: 1rem;
}

.toc-level-4 {
  padding-left: 2rem;
}

.prose h1,
.prose h2,
.prose h3,
.prose h4 {
  line-height: 1.3;
  margin: 2rem 0 1rem;
}

.prose p,
.prose ul,
.prose ol,
.prose table {
  margin: 0 0 1.25rem;
}

.prose blockquote {
  margin: 0 0 1.25rem;
  padding-left: 1rem;
  border-left: 3px solid var(--border);
  color: var(--muted);
}

.prose table {
  border-collapse: collapse;
  width: 100%;
}

.prose th,
.prose td {
  border: 1px solid var(--border);
  padding: 0.4rem 0.75rem;
}

.prose code {
  font-family: var(--font-mono);
  font-size: 0.875em;
  background: var(--code-bg);
  padding: 0.125rem 0.375rem;
  border-radius: 0.25rem;
}

/* Code blocks */
.code-block {
  margin: 0 0 1.5rem;
  position: relative;
}

.code-block figcaption {
  font-family: var(--font-mono);
  font-size: 0.8rem;
  color: var(--muted);
  padding: 0.25rem 0.75rem;
  border: 1px solid var(--border);
  border-bottom: none;
  border-radius: 0.5rem 0.5rem 0 0;
  background: var(--surface);
}

.code-block pre {
  margin: 0;
  padding: 1rem;
  overflow-x: auto;
  background: var(--code-bg);
  border: 1px solid var(--border);
  border-radius: 0.5rem;
}

.code-block figcaption + pre {
  border-radius: 0 0 0.5rem 0.5rem;
}

.code-block pre code {
  background: none;
  padding: 0;
}

.copy-btn {
  position: absolute;
  top: 0.5rem;
  right: 0.5rem;
  padding: 0.125rem 0.5rem;
  font-size: 0.75rem;
  background: var(--surface);
  color: var(--muted);
  border: 1px solid var(--border);
  border-radius: 0.25rem;
  cursor: pointer;
}

/* Diagrams */
.diagram {
  margin: 0 0 1.5rem;
  overflow-x: auto;
  text-align: center;
}

.diagram svg {
  height: auto;
}
"#;

const DEFAULT_JS: &str = r#"// folio runtime
(function () {
  'use strict';

  var root = document.documentElement;

  // Theme toggle; the initial theme is set inline in <head>
  document.querySelectorAll('[data-theme-toggle]').forEach(function (button) {
    button.addEventListener('click', function () {
      var next = root.getAttribute('data-theme') === 'dark' ? 'light' : 'dark';
      root.setAttribute('data-theme', next);
      try {
        localStorage.setItem('theme', next);
      } catch (err) {}
    });
  });

  // Follow the system scheme until the reader picks one
  var media = window.matchMedia('(prefers-color-scheme: dark)');
  media.addEventListener('change', function (event) {
    if (!localStorage.getItem('theme')) {
      root.setAttribute('data-theme', event.matches ? 'dark' : 'light');
    }
  });

  // Copy button for code blocks
  document.querySelectorAll('.code-block').forEach(function (figure) {
    var pre = figure.querySelector('pre');
    if (!pre || figure.querySelector('.copy-btn')) return;

    var btn = document.createElement('button');
    btn.className = 'copy-btn';
    btn.type = 'button';
    btn.textContent = 'Copy';

    btn.addEventListener('click', async function () {
      try {
        await navigator.clipboard.writeText(pre.textContent || '');
        btn.textContent = 'Copied!';
      } catch (err) {
        btn.textContent = 'Error';
      }
      setTimeout(function () { btn.textContent = 'Copy'; }, 2000);
    });

    figure.appendChild(btn);
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_css_with_utilities() {
        let classes: BTreeSet<String> = ["px-4", "md:text-4xl", "not-a-utility"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let css = AssetPipeline::generate_css(&classes);

        assert!(css.contains(":root"));
        assert!(css.contains("[data-theme=\"dark\"] {"));
        assert!(css.contains(".px-4 { padding-left: 1rem; padding-right: 1rem }"));
        assert!(css.contains("@media (min-width: 768px)"));
        assert!(!css.contains("not-a-utility"));
    }

    #[test]
    fn generates_js() {
        let js = AssetPipeline::generate_js();
        assert!(js.contains("data-theme-toggle"));
        assert!(js.contains("prefers-color-scheme"));
        assert!(js.contains("clipboard"));
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.button {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
    }

    #[test]
    fn minifies_generated_css() {
        let classes: BTreeSet<String> = ["sm:w-1/2", "dark:text-fg", "gap-2.5"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let minified = AssetPipeline::minify_css(&AssetPipeline::generate_css(&classes)).unwrap();

        assert!(minified.contains("w-1"));
        assert!(minified.contains("@media"));
        assert!(!minified.contains("/* folio"));
    }
}
