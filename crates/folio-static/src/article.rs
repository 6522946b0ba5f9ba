//! Parsed articles and their presentation.

use std::path::PathBuf;

use chrono::NaiveDate;
use folio_mdx::ParsedDoc;

use crate::routes::Route;
use crate::templates::{ArticleView, TocEntry};

/// A content file that parsed successfully, with its route.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Source file path
    pub source: PathBuf,

    /// Path relative to the content directory
    pub relative: PathBuf,

    pub route: Route,

    pub doc: ParsedDoc,
}

impl Article {
    pub fn title(&self) -> &str {
        &self.doc.meta.title
    }

    pub fn pub_date(&self) -> NaiveDate {
        self.doc.meta.pub_date
    }

    /// Template view with URLs resolved against `base_url`.
    pub fn view(&self, base_url: &str) -> ArticleView {
        let meta = &self.doc.meta;

        ArticleView {
            title: meta.title.clone(),
            description: meta.description.clone(),
            url: self.route.url(base_url),
            author: meta.author.clone(),
            pub_date: meta.pub_date.to_string(),
            pub_date_display: display_date(meta.pub_date),
            updated_date: meta.updated_date.map(|d| d.to_string()),
            updated_date_display: meta.updated_date.map(display_date),
            hero_image: meta.hero_image.as_deref().map(|h| asset_url(h, base_url)),
            tags: meta.tags.clone(),
        }
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        self.doc
            .toc
            .iter()
            .map(|e| TocEntry {
                title: e.title.clone(),
                id: e.id.clone(),
                level: e.level,
            })
            .collect()
    }
}

/// Newest first; ties broken by source path so the order is stable.
pub fn sort_newest_first(articles: &mut [&Article]) {
    articles.sort_by(|a, b| {
        b.pub_date()
            .cmp(&a.pub_date())
            .then_with(|| a.relative.cmp(&b.relative))
    });
}

/// `Jul 8, 2022`
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Root-relative references get the base URL; absolute and relative ones are kept.
pub fn asset_url(reference: &str, base_url: &str) -> String {
    match reference.strip_prefix('/') {
        Some(path) if !reference.starts_with("//") => {
            format!("{}/{}", base_url.trim_end_matches('/'), path)
        }
        _ => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::route_for;
    use folio_mdx::parse_mdx;
    use std::path::Path;

    fn article(path: &str, source: &str) -> Article {
        Article {
            source: PathBuf::from("content").join(path),
            relative: PathBuf::from(path),
            route: route_for(Path::new(path)).unwrap(),
            doc: parse_mdx(source).unwrap(),
        }
    }

    #[test]
    fn builds_view() {
        let a = article(
            "blog/first.mdx",
            "---\ntitle: First\npubDate: 2022-07-08\nheroImage: /hero.png\ntags: [pqc, edge]\n---\nBody\n",
        );

        let view = a.view("/site/");
        assert_eq!(view.url, "/site/blog/first/");
        assert_eq!(view.pub_date, "2022-07-08");
        assert_eq!(view.pub_date_display, "Jul 8, 2022");
        assert_eq!(view.hero_image.as_deref(), Some("/site/hero.png"));
        assert_eq!(view.tags, vec!["pqc", "edge"]);
    }

    #[test]
    fn sorts_newest_first() {
        let old = article("a.mdx", "---\ntitle: A\npubDate: 2021-01-01\n---\n");
        let new = article("b.mdx", "---\ntitle: B\npubDate: 2023-01-01\n---\n");
        let same = article("c.mdx", "---\ntitle: C\npubDate: 2023-01-01\n---\n");

        let mut list = vec![&old, &same, &new];
        sort_newest_first(&mut list);

        let titles: Vec<&str> = list.iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["B", "C", "A"]);
    }

    #[test]
    fn resolves_asset_urls() {
        assert_eq!(asset_url("/img/a.png", "/"), "/img/a.png");
        assert_eq!(asset_url("https://cdn.test/a.png", "/blog/"), "https://cdn.test/a.png");
        assert_eq!(asset_url("//cdn.test/a.png", "/blog/"), "//cdn.test/a.png");
        assert_eq!(asset_url("img/a.png", "/blog/"), "img/a.png");
    }
}
