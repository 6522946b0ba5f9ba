//! RSS feed generation.

use chrono::{NaiveDate, NaiveTime};
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder};

use crate::article::Article;

/// Channel-level feed metadata.
#[derive(Debug, Clone)]
pub struct FeedInfo<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Absolute site origin plus base path
    pub site_url: &'a str,
}

/// Build an RSS 2.0 document with one item per article, in the given order.
pub fn build_feed(info: &FeedInfo<'_>, articles: &[&Article]) -> String {
    let items: Vec<rss::Item> = articles
        .iter()
        .map(|article| article_item(article, info.site_url))
        .collect();

    let channel = ChannelBuilder::default()
        .title(info.title)
        .link(format!("{}/", info.site_url.trim_end_matches('/')))
        .description(info.description)
        .generator("folio".to_string())
        .items(items)
        .build();

    channel.to_string()
}

fn article_item(article: &Article, site_url: &str) -> rss::Item {
    let meta = &article.doc.meta;
    let link = article.route.url(site_url);

    let categories = meta
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
        .collect::<Vec<_>>();

    // RSS authors are email addresses; a bare name is left out
    let author = meta.author.clone().filter(|a| a.contains('@'));

    ItemBuilder::default()
        .title(meta.title.clone())
        .link(Some(link.clone()))
        .guid(GuidBuilder::default().permalink(true).value(link).build())
        .description(meta.description.clone())
        .pub_date(rfc2822(meta.pub_date))
        .author(author)
        .categories(categories)
        .build()
}

fn rfc2822(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
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

    fn info() -> FeedInfo<'static> {
        FeedInfo {
            title: "Field Notes",
            description: "Edge security notes",
            site_url: "https://example.com",
        }
    }

    #[test]
    fn formats_dates() {
        let date = NaiveDate::from_ymd_opt(2022, 7, 8).unwrap();
        assert_eq!(rfc2822(date), "Fri, 8 Jul 2022 00:00:00 +0000");
    }

    #[test]
    fn builds_channel_with_items() {
        let a = article(
            "adaptive-pqc.mdx",
            "title: Adaptive PQC\ndescription: KEM switching\npubDate: 2024-03-01\nauthor: Ana Ortiz\ntags: [pqc, edge]",
        );
        let b = article("notes.md", "title: Notes & Links\npubDate: 2024-01-01");

        let xml = build_feed(&info(), &[&a, &b]);
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();

        assert_eq!(channel.title(), "Field Notes");
        assert_eq!(channel.link(), "https://example.com/");
        assert_eq!(channel.items().len(), 2);

        let first = &channel.items()[0];
        assert_eq!(first.title(), Some("Adaptive PQC"));
        assert_eq!(first.link(), Some("https://example.com/adaptive-pqc/"));
        assert_eq!(first.description(), Some("KEM switching"));
        assert_eq!(first.author(), None);
        let tags: Vec<&str> = first.categories().iter().map(|c| c.name()).collect();
        assert_eq!(tags, vec!["pqc", "edge"]);

        assert_eq!(channel.items()[1].title(), Some("Notes & Links"));
    }

    #[test]
    fn keeps_email_authors() {
        let a = article(
            "post.mdx",
            "title: Post\npubDate: 2024-03-01\nauthor: ana@example.com (Ana)",
        );

        let xml = build_feed(&info(), &[&a]);
        assert!(xml.contains("<author>ana@example.com (Ana)</author>"));
    }
}
