//! Static site builder.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use folio_diagram::{
    DefaultIconSource, DiagramConfig, DiagramRenderer, FetchError, IconRegistry, IconSource,
    RenderError,
};
use folio_mdx::{parse_mdx, ParseError};

use crate::article::{sort_newest_first, Article};
use crate::assets::AssetPipeline;
use crate::feed::{build_feed, FeedInfo};
use crate::links::{internal_links, LinkIndex};
use crate::render::render_body;
use crate::routes::{route_for, Route};
use crate::sitemap::{robots_txt, Sitemap};
use crate::templates::{ArticleContext, IndexContext, NavItem, SiteContext, TemplateEngine};
use crate::utilities::collect_classes;

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source content directory
    pub content_dir: PathBuf,

    /// Files copied verbatim into the output root
    pub public_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Minify CSS output
    pub minify: bool,

    /// Base path the site is served under
    pub base_url: String,

    /// Absolute site origin used in the sitemap and feed
    pub site_url: String,

    /// Site title
    pub title: String,

    /// Site description
    pub description: String,

    /// Paths to CSS stylesheets to include
    pub styles: Vec<String>,

    /// Write sitemap.xml and robots.txt
    pub sitemap: bool,

    /// Write rss.xml
    pub feed: bool,

    /// Fail the build on links to missing pages or files
    pub strict_links: bool,

    /// Diagram rendering options
    pub diagrams: DiagramConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            public_dir: PathBuf::from("public"),
            output_dir: PathBuf::from("dist"),
            minify: true,
            base_url: "/".to_string(),
            site_url: "http://localhost:4000".to_string(),
            title: "My Blog".to_string(),
            description: String::new(),
            styles: vec![],
            sitemap: true,
            feed: true,
            strict_links: false,
            diagrams: DiagramConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Absolute URL of the site root including the base path.
    fn absolute_base(&self) -> String {
        format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            self.base_url.trim_start_matches('/')
        )
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of HTML pages written
    pub pages: usize,

    /// Number of articles parsed
    pub articles: usize,

    /// Number of diagrams rendered
    pub diagrams: usize,

    /// Number of entries in sitemap.xml
    pub sitemap_entries: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to render diagram in {path} at line {line}: {source}")]
    Render {
        path: String,
        line: usize,
        #[source]
        source: RenderError,
    },

    #[error("No route can be derived from content file name: {0}")]
    InvalidPath(String),

    #[error("{first} and {second} both map to route {route}")]
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },

    #[error("Broken link to {target} in {page}")]
    BrokenReference { page: String, target: String },

    #[error("Failed to render template: {0}")]
    Template(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Refusing to clear output directory {0}: it contains the content or public directory")]
    UnsafeOutput(String),
}

impl BuildError {
    fn write(path: &Path, e: impl std::fmt::Display) -> Self {
        BuildError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }

    fn read(path: &Path, e: impl std::fmt::Display) -> Self {
        BuildError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

/// A rendered HTML page ready to be written.
#[derive(Debug)]
struct RenderedPage {
    route: Route,
    html: String,
    /// Content file it came from, or `None` for the generated listing
    source: Option<PathBuf>,
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Build the static site, fetching icon packs over the network or from disk.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        self.build_with(&DefaultIconSource::new()).await
    }

    /// Build the static site, loading icon packs from `icon_source`.
    pub async fn build_with<S: IconSource>(
        &self,
        icon_source: &S,
    ) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let icons = IconRegistry::load(&self.config.diagrams.icon_packs, icon_source).await?;
        let renderer = DiagramRenderer::new(self.config.diagrams.clone(), icons);

        let articles = self.discover_articles()?;
        tracing::info!("Found {} articles", articles.len());

        let nav = self.build_navigation(&articles);
        let site = self.site_context(nav);

        // Render articles in parallel
        let results: Vec<Result<RenderedPage, BuildError>> = articles
            .par_iter()
            .map(|article| self.render_article(article, &renderer, &site))
            .collect();

        let mut pages = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        if !articles.iter().any(|a| a.route == Route::root()) {
            pages.push(self.render_index(&articles, &site)?);
        }

        self.check_links(&pages)?;

        // Everything rendered; replace the previous output wholesale
        self.clean_output()?;
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::write(&self.config.output_dir, e))?;

        for page in &pages {
            let path = self.config.output_dir.join(&page.route.output);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;
            }
            fs::write(&path, &page.html).map_err(|e| BuildError::write(&path, e))?;
        }

        self.copy_public()?;
        self.generate_assets(&pages)?;

        let mut newest: Vec<&Article> = articles.iter().collect();
        sort_newest_first(&mut newest);

        let sitemap_entries = if self.config.sitemap {
            self.generate_sitemap(&newest)?
        } else {
            0
        };

        if self.config.feed {
            self.generate_feed(&newest)?;
        }

        let diagrams = articles.iter().map(|a| a.doc.diagrams.len()).sum();
        let duration = start.elapsed();

        Ok(BuildResult {
            pages: pages.len(),
            articles: articles.len(),
            diagrams,
            sitemap_entries,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Discover and parse all content files, rejecting duplicate routes.
    fn discover_articles(&self) -> Result<Vec<Article>, BuildError> {
        let content_dir = &self.config.content_dir;

        if !content_dir.exists() {
            return Err(BuildError::read(content_dir, "content directory not found"));
        }

        let mut articles = Vec::new();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| walk_error(e, content_dir))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "mdx" && ext != "md" {
                continue;
            }

            let content = fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;

            let doc = parse_mdx(&content).map_err(|source| BuildError::Parse {
                path: path.display().to_string(),
                source,
            })?;

            let relative = path.strip_prefix(content_dir).unwrap_or(path).to_path_buf();

            let route = route_for(&relative)
                .ok_or_else(|| BuildError::InvalidPath(path.display().to_string()))?;

            if let Some(first) = claimed.get(&route.path) {
                return Err(BuildError::DuplicateRoute {
                    route: route.path,
                    first: first.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            claimed.insert(route.path.clone(), path.to_path_buf());

            tracing::debug!("{} -> {}", relative.display(), route.path);

            articles.push(Article {
                source: path.to_path_buf(),
                relative,
                route,
                doc,
            });
        }

        Ok(articles)
    }

    /// Header navigation: home plus one entry per top-level section.
    fn build_navigation(&self, articles: &[Article]) -> Vec<NavItem> {
        let base = &self.config.base_url;
        let mut nav = vec![NavItem {
            title: "Home".to_string(),
            path: base.clone(),
            active: false,
        }];

        let sections: BTreeSet<&str> = articles
            .iter()
            .filter_map(|a| {
                let path = a.route.path.trim_matches('/');
                path.split_once('/').map(|(section, _)| section)
            })
            .collect();

        for section in sections {
            let route = format!("/{}/", section);
            // Sections only link somewhere when an index page exists
            if articles.iter().any(|a| a.route.path == route) {
                nav.push(NavItem {
                    title: capitalize(section),
                    path: format!("{}{}/", base, section),
                    active: false,
                });
            }
        }

        nav
    }

    fn site_context(&self, nav: Vec<NavItem>) -> SiteContext {
        let base = &self.config.base_url;

        SiteContext {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            base_url: base.clone(),
            styles: self
                .config
                .styles
                .iter()
                .map(|s| format!("{}assets/{}", base, style_filename(s)))
                .collect(),
            nav,
            feed: self.config.feed.then(|| format!("{}rss.xml", base)),
        }
    }

    /// Render a single article page.
    fn render_article(
        &self,
        article: &Article,
        renderer: &DiagramRenderer,
        site: &SiteContext,
    ) -> Result<RenderedPage, BuildError> {
        let content = render_body(&article.doc, renderer).map_err(|e| BuildError::Render {
            path: article.source.display().to_string(),
            line: e.line,
            source: e.source,
        })?;

        let url = article.route.url(&self.config.base_url);
        let mut site = site.clone();
        for item in &mut site.nav {
            item.active = item.path != self.config.base_url && url.starts_with(&item.path);
        }

        let context = ArticleContext {
            site,
            article: article.view(&self.config.base_url),
            content,
            toc: article.toc(),
        };

        let html = self
            .templates
            .render_article(&context)
            .map_err(|e: minijinja::Error| BuildError::Template(e.to_string()))?;

        Ok(RenderedPage {
            route: article.route.clone(),
            html,
            source: Some(article.source.clone()),
        })
    }

    /// Render the home page listing, newest first.
    fn render_index(
        &self,
        articles: &[Article],
        site: &SiteContext,
    ) -> Result<RenderedPage, BuildError> {
        let mut newest: Vec<&Article> = articles.iter().collect();
        sort_newest_first(&mut newest);

        let context = IndexContext {
            site: site.clone(),
            articles: newest
                .iter()
                .map(|a| a.view(&self.config.base_url))
                .collect(),
        };

        let html = self
            .templates
            .render_index(&context)
            .map_err(|e: minijinja::Error| BuildError::Template(e.to_string()))?;

        Ok(RenderedPage {
            route: Route::root(),
            html,
            source: None,
        })
    }

    /// Check root-relative links against generated routes and output files.
    fn check_links(&self, pages: &[RenderedPage]) -> Result<(), BuildError> {
        let mut index = LinkIndex::new(&self.config.base_url);

        for page in pages {
            index.add_route(&page.route.path);
        }
        for file in ["assets/main.css", "assets/main.js"] {
            index.add_file(file);
        }
        if self.config.sitemap {
            index.add_file("sitemap.xml");
            index.add_file("robots.txt");
        }
        if self.config.feed {
            index.add_file("rss.xml");
        }
        for style in &self.config.styles {
            index.add_file(&format!("assets/{}", style_filename(style)));
        }
        for file in public_files(&self.config.public_dir)? {
            index.add_file(&file);
        }

        for page in pages {
            let page_name = page
                .source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| page.route.path.clone());

            for target in internal_links(&page.html) {
                if index.resolves(&target) {
                    continue;
                }
                if self.config.strict_links {
                    return Err(BuildError::BrokenReference {
                        page: page_name,
                        target,
                    });
                }
                tracing::warn!("Broken link to {} in {}", target, page_name);
            }
        }

        Ok(())
    }

    /// Remove the previous build so deleted articles leave no stale pages.
    fn clean_output(&self) -> Result<(), BuildError> {
        let output = &self.config.output_dir;
        if !output.exists() {
            return Ok(());
        }

        if is_within(&self.config.content_dir, output) || is_within(&self.config.public_dir, output)
        {
            return Err(BuildError::UnsafeOutput(output.display().to_string()));
        }

        fs::remove_dir_all(output).map_err(|e| BuildError::write(output, e))?;
        tracing::debug!("Cleared {}", output.display());
        Ok(())
    }

    /// Copy the public directory into the output root.
    fn copy_public(&self) -> Result<(), BuildError> {
        let public = &self.config.public_dir;
        if !public.is_dir() {
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(public) {
            let entry = entry.map_err(|e| walk_error(e, public))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(public).unwrap_or(path);
            let target = self.config.output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;
            }
            fs::copy(path, &target).map_err(|e| BuildError::write(&target, e))?;
            copied += 1;
        }

        tracing::info!("Copied {} public files", copied);
        Ok(())
    }

    /// Generate static assets.
    fn generate_assets(&self, pages: &[RenderedPage]) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");
        fs::create_dir_all(&assets_dir).map_err(|e| BuildError::write(&assets_dir, e))?;

        let mut classes = BTreeSet::new();
        for page in pages {
            collect_classes(&page.html, &mut classes);
        }

        // Generate main CSS
        let css = AssetPipeline::generate_css(&classes);
        let css = if self.config.minify {
            AssetPipeline::minify_css(&css).unwrap_or_else(|e| {
                tracing::warn!("Skipping CSS minification: {}", e);
                css
            })
        } else {
            css
        };
        let css_path = assets_dir.join("main.css");
        fs::write(&css_path, css).map_err(|e| BuildError::write(&css_path, e))?;

        let js_path = assets_dir.join("main.js");
        fs::write(&js_path, AssetPipeline::generate_js())
            .map_err(|e| BuildError::write(&js_path, e))?;

        // Copy configured stylesheets
        for style_path in &self.config.styles {
            let source_path = PathBuf::from(style_path);
            if source_path.exists() {
                let content = fs::read_to_string(&source_path)
                    .map_err(|e| BuildError::read(&source_path, e))?;
                let target = assets_dir.join(style_filename(style_path));
                fs::write(&target, content).map_err(|e| BuildError::write(&target, e))?;
                tracing::info!("Copied stylesheet from {}", style_path);
            } else {
                tracing::warn!("Stylesheet not found: {}", style_path);
            }
        }

        Ok(())
    }

    /// Write sitemap.xml and robots.txt, returning the number of entries.
    fn generate_sitemap(&self, articles: &[&Article]) -> Result<usize, BuildError> {
        let site_url = self.config.absolute_base();
        let sitemap = Sitemap::from_articles(articles, &site_url);
        let entries = sitemap.len();

        let path = self.config.output_dir.join("sitemap.xml");
        fs::write(&path, sitemap.into_xml()).map_err(|e| BuildError::write(&path, e))?;

        let path = self.config.output_dir.join("robots.txt");
        fs::write(&path, robots_txt(&site_url)).map_err(|e| BuildError::write(&path, e))?;

        Ok(entries)
    }

    /// Write rss.xml.
    fn generate_feed(&self, articles: &[&Article]) -> Result<(), BuildError> {
        let site_url = self.config.absolute_base();
        let xml = build_feed(
            &FeedInfo {
                title: &self.config.title,
                description: &self.config.description,
                site_url: &site_url,
            },
            articles,
        );

        let path = self.config.output_dir.join("rss.xml");
        fs::write(&path, xml).map_err(|e| BuildError::write(&path, e))
    }
}

/// Files under the public directory as output-relative paths with `/` separators.
fn public_files(public: &Path) -> Result<Vec<String>, BuildError> {
    if !public.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(public) {
        let entry = entry.map_err(|e| walk_error(e, public))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(public) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
    }

    Ok(files)
}

fn walk_error(e: walkdir::Error, root: &Path) -> BuildError {
    let path = e.path().unwrap_or(root).to_path_buf();
    BuildError::read(&path, e)
}

/// Whether `inner` is `outer` or lies beneath it.
fn is_within(inner: &Path, outer: &Path) -> bool {
    match (inner.canonicalize(), outer.canonicalize()) {
        (Ok(inner), Ok(outer)) => inner.starts_with(outer),
        _ => false,
    }
}

fn style_filename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("style.css")
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
