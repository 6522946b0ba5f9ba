//! Template engine for rendering blog pages.

use minijinja::{context, Environment};
use serde::Serialize;

/// A header navigation item.
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// Whether this is the active section
    pub active: bool,
}

/// A table of contents entry.
#[derive(Debug, Clone, Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Site-wide values shared by every page.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    pub title: String,
    pub description: String,
    pub base_url: String,
    /// Stylesheet URLs included after the generated stylesheet
    pub styles: Vec<String>,
    pub nav: Vec<NavItem>,
    /// Feed URL when a feed is generated
    pub feed: Option<String>,
}

/// An article as presented to templates.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub author: Option<String>,
    /// ISO date for `<time datetime>`
    pub pub_date: String,
    /// Human-readable date, e.g. `Jul 8, 2022`
    pub pub_date_display: String,
    pub updated_date: Option<String>,
    pub updated_date_display: Option<String>,
    pub hero_image: Option<String>,
    pub tags: Vec<String>,
}

/// Context for rendering an article page.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleContext {
    pub site: SiteContext,
    pub article: ArticleView,
    /// Rendered body HTML
    pub content: String,
    pub toc: Vec<TocEntry>,
}

/// Context for rendering the article listing.
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    pub site: SiteContext,
    /// Articles, newest first
    pub articles: Vec<ArticleView>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        for (name, source) in [
            ("base.html", BASE_TEMPLATE),
            ("article.html", ARTICLE_TEMPLATE),
            ("index.html", INDEX_TEMPLATE),
            ("nav.html", NAV_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("Built-in template failed to compile");
        }

        Self { env }
    }

    /// Render an article page.
    pub fn render_article(&self, ctx: &ArticleContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("article.html")?;

        tmpl.render(context! {
            site => &ctx.site,
            title => &ctx.article.title,
            description => &ctx.article.description,
            article => &ctx.article,
            content => &ctx.content,
            toc => &ctx.toc,
        })
    }

    /// Render the article listing page.
    pub fn render_index(&self, ctx: &IndexContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        tmpl.render(context! {
            site => &ctx.site,
            title => &ctx.site.title,
            description => &ctx.site.description,
            articles => &ctx.articles,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if title != site.title %}{{ title }} | {% endif %}{{ site.title }}</title>
  {% if description %}<meta name="description" content="{{ description }}">
  {% endif %}<meta name="generator" content="folio">
  {% if site.feed %}<link rel="alternate" type="application/rss+xml" title="{{ site.title }}" href="{{ site.feed }}">
  {% endif %}<link rel="stylesheet" href="{{ site.base_url }}assets/main.css">
  {% for style in site.styles %}<link rel="stylesheet" href="{{ style }}">
  {% endfor %}<script>
    (function () {
      var stored = localStorage.getItem('theme');
      var dark = stored ? stored === 'dark' : window.matchMedia('(prefers-color-scheme: dark)').matches;
      document.documentElement.setAttribute('data-theme', dark ? 'dark' : 'light');
    })();
  </script>
</head>
<body class="min-h-screen">
  <header class="site-header">
    {% include "nav.html" %}
  </header>
  <main class="mx-auto max-w-3xl px-4 py-8 md:py-12">
    {% block content %}{% endblock %}
  </main>
  <footer class="site-footer mx-auto max-w-3xl px-4 py-8 text-sm text-muted text-center">
    {{ site.title }}{% if site.feed %} &middot; <a href="{{ site.feed }}">RSS</a>{% endif %}
  </footer>
  <script src="{{ site.base_url }}assets/main.js"></script>
</body>
</html>"##;

const ARTICLE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="article">
  {% if article.hero_image %}
  <img class="hero-image w-full rounded-lg mb-6" src="{{ article.hero_image }}" alt="">
  {% endif %}
  <header class="article-header mb-8 text-center">
    <p class="text-sm text-muted mb-2">
      <time datetime="{{ article.pub_date }}">{{ article.pub_date_display }}</time>
      {% if article.updated_date %}<span class="updated"> &middot; Updated <time datetime="{{ article.updated_date }}">{{ article.updated_date_display }}</time></span>{% endif %}
      {% if article.author %}<span class="author"> &middot; {{ article.author }}</span>{% endif %}
    </p>
    <h1 class="text-3xl md:text-4xl font-bold">{{ article.title }}</h1>
    {% if article.tags %}
    <ul class="tags flex flex-wrap gap-2 mt-4 justify-center">
      {% for tag in article.tags %}<li class="tag text-xs rounded-full px-3 py-1">{{ tag }}</li>
      {% endfor %}
    </ul>
    {% endif %}
  </header>

  {% if toc | length > 1 %}
  <nav class="toc mb-8" aria-label="Table of contents">
    <h2 class="text-sm font-semibold mb-2">On this page</h2>
    <ul>
    {% for entry in toc %}
      <li class="toc-level-{{ entry.level }}"><a href="#{{ entry.id }}">{{ entry.title }}</a></li>
    {% endfor %}
    </ul>
  </nav>
  {% endif %}

  <div class="prose">
    {{ content | safe }}
  </div>
</article>
{% endblock %}"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<section class="listing">
  <h1 class="text-3xl font-bold mb-2">{{ site.title }}</h1>
  {% if site.description %}<p class="text-muted mb-8">{{ site.description }}</p>{% endif %}
  <ul class="grid gap-8">
  {% for article in articles %}
    <li class="listing-item">
      <a class="block no-underline" href="{{ article.url }}">
        {% if article.hero_image %}<img class="w-full rounded-lg mb-3" src="{{ article.hero_image }}" alt="">{% endif %}
        <h2 class="text-xl font-semibold">{{ article.title }}</h2>
        <p class="text-sm text-muted"><time datetime="{{ article.pub_date }}">{{ article.pub_date_display }}</time></p>
      </a>
      {% if article.description %}<p class="mt-2">{{ article.description }}</p>{% endif %}
    </li>
  {% endfor %}
  </ul>
</section>
{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<nav class="flex items-center justify-between mx-auto max-w-3xl px-4 py-4">
  <a href="{{ site.base_url }}" class="site-title font-bold text-lg no-underline">{{ site.title }}</a>
  <div class="flex items-center gap-4">
    <ul class="nav-list flex gap-4">
    {% for item in site.nav %}
      <li class="nav-item{% if item.active %} active{% endif %}"><a href="{{ item.path }}">{{ item.title }}</a></li>
    {% endfor %}
    </ul>
    <button class="theme-toggle rounded-md px-2 py-1" type="button" data-theme-toggle aria-label="Toggle dark mode">&#9680;</button>
  </div>
</nav>"##;
