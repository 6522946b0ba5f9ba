//! `folio.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_diagram::DiagramConfig;
use folio_static::BuildConfig;
use serde::Deserialize;

/// Configuration file structure (folio.toml).
#[derive(Debug, Deserialize, Default)]
pub struct FolioConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub mermaid: DiagramConfig,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Absolute origin used in the sitemap and feed
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Paths to CSS stylesheets to include
    #[serde(default)]
    pub styles: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            url: default_url(),
            base_url: default_base_url(),
            styles: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_dir")]
    pub dir: String,
    #[serde(default = "default_public_dir")]
    pub public: String,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            public: default_public_dir(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_true")]
    pub minify: bool,
    #[serde(default = "default_true")]
    pub sitemap: bool,
    #[serde(default = "default_true")]
    pub feed: bool,
    #[serde(default)]
    pub strict_links: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: true,
            sitemap: true,
            feed: true,
            strict_links: false,
        }
    }
}

fn default_title() -> String {
    "My Blog".to_string()
}
fn default_url() -> String {
    "http://localhost:4000".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_content_dir() -> String {
    "content".to_string()
}
fn default_public_dir() -> String {
    "public".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_true() -> bool {
    true
}

impl FolioConfig {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: FolioConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Builder configuration with directories resolved against `root`.
    pub fn into_build_config(self, root: &Path) -> BuildConfig {
        let resolve = |dir: &str| -> PathBuf {
            let dir = PathBuf::from(dir);
            if dir.is_absolute() {
                dir
            } else {
                root.join(dir)
            }
        };

        let mut base_url = self.site.base_url;
        if !base_url.starts_with('/') {
            base_url.insert(0, '/');
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        BuildConfig {
            content_dir: resolve(&self.content.dir),
            public_dir: resolve(&self.content.public),
            output_dir: resolve(&self.content.output),
            minify: self.build.minify,
            base_url,
            site_url: self.site.url,
            title: self.site.title,
            description: self.site.description,
            styles: self
                .site
                .styles
                .iter()
                .map(|s| resolve(s).to_string_lossy().into_owned())
                .collect(),
            sitemap: self.build.sitemap,
            feed: self.build.feed,
            strict_links: self.build.strict_links,
            diagrams: self.mermaid,
        }
    }
}

/// Directory the config file lives in; relative paths in it resolve from here.
pub fn config_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_diagram::{Curve, Theme};
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = FolioConfig::load(&temp.path().join("folio.toml")).unwrap();

        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.content.dir, "content");
        assert!(config.build.minify);
        assert!(config.mermaid.auto_theme);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        assert!(FolioConfig::load(&path).is_err());
    }

    #[test]
    fn parses_full_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Field Notes"
url = "https://example.com"
base_url = "blog"

[content]
output = "public_html"

[build]
minify = false
strict_links = true

[mermaid]
theme = "dark"
autoTheme = false

[mermaid.mermaidConfig.flowchart]
curve = "linear"
useMaxWidth = false

[[mermaid.iconPacks]]
name = "logos"
loader = "https://unpkg.com/@iconify-json/logos@1/icons.json"
"#,
        )
        .unwrap();

        let config = FolioConfig::load(&path).unwrap();
        assert_eq!(config.mermaid.theme, Theme::Dark);
        assert_eq!(config.mermaid.mermaid_config.flowchart.curve, Curve::Linear);
        assert_eq!(config.mermaid.icon_packs.len(), 1);

        let build = config.into_build_config(temp.path());
        assert_eq!(build.base_url, "/blog/");
        assert_eq!(build.output_dir, temp.path().join("public_html"));
        assert_eq!(build.content_dir, temp.path().join("content"));
        assert!(!build.minify);
        assert!(build.strict_links);
        assert!(!build.diagrams.auto_theme);
        assert!(!build.diagrams.flowchart_use_max_width());
    }

    #[test]
    fn resolves_config_root() {
        assert_eq!(config_root(Path::new("folio.toml")), PathBuf::from("."));
        assert_eq!(
            config_root(Path::new("site/folio.toml")),
            PathBuf::from("site")
        );
    }
}
