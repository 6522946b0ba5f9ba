//! Sitemap generation.
//!
//! Lists every article route for search engine indexing:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/blog/post/</loc>
//!     <lastmod>2024-03-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::article::Article;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Sitemap data structure
#[derive(Debug, Default)]
pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
#[derive(Debug)]
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (YYYY-MM-DD)
    lastmod: String,
}

impl Sitemap {
    /// One entry per article, in the given order. `site_url` is the absolute
    /// site origin plus base path.
    pub fn from_articles(articles: &[&Article], site_url: &str) -> Self {
        let urls = articles
            .iter()
            .map(|article| UrlEntry {
                loc: article.route.url(site_url),
                lastmod: article.doc.meta.last_modified().to_string(),
            })
            .collect();

        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Generate sitemap XML string.
    pub fn into_xml(self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 128);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// `robots.txt` pointing crawlers at the sitemap.
pub fn robots_txt(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml\n",
        site_url.trim_end_matches('/')
    )
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::route_for;
    use folio_mdx::parse_mdx;
    use std::path::{Path, PathBuf};

    fn article(path: &str, front: &str) -> Article {
        Article {
            source: PathBuf::from(path),
            relative: PathBuf::from(path),
            route: route_for(Path::new(path)).unwrap(),
            doc: parse_mdx(&format!("---\n{front}\n---\nBody\n")).unwrap(),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = Sitemap::from_articles(&[], "https://example.com").into_xml();

        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_one_entry_per_article() {
        let a = article("blog/first.mdx", "title: First\npubDate: 2024-01-01");
        let b = article(
            "blog/second.mdx",
            "title: Second\npubDate: 2024-02-01\nupdatedDate: 2024-05-05",
        );
        let c = article("about.md", "title: About\npubDate: 2023-06-01");

        let sitemap = Sitemap::from_articles(&[&a, &b, &c], "https://example.com/");
        assert_eq!(sitemap.len(), 3);

        let xml = sitemap.into_xml();
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains("<loc>https://example.com/blog/first/</loc>"));
        assert!(xml.contains("<loc>https://example.com/about/</loc>"));
        assert!(xml.contains("<lastmod>2024-01-01</lastmod>"));
        assert!(xml.contains("<lastmod>2024-05-05</lastmod>"));
    }

    #[test]
    fn test_sitemap_under_base_path() {
        let a = article("post.mdx", "title: Post\npubDate: 2024-01-01");
        let xml = Sitemap::from_articles(&[&a], "https://example.com/blog/").into_xml();

        assert!(xml.contains("<loc>https://example.com/blog/post/</loc>"));
    }

    #[test]
    fn test_sitemap_xml_structure() {
        let a = article("post.mdx", "title: Post\npubDate: 2024-01-01");
        let xml = Sitemap::from_articles(&[&a], "https://example.com").into_xml();

        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert!(lines[1].starts_with("<urlset"));
        assert_eq!(lines.last().map(|l| l.trim()), Some("</urlset>"));
    }

    #[test]
    fn test_robots() {
        assert_eq!(
            robots_txt("https://example.com/"),
            "User-agent: *\nAllow: /\nSitemap: https://example.com/sitemap.xml\n"
        );
    }
}
