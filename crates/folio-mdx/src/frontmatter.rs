//! Front-matter extraction and parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Typed article metadata parsed from a content file's front-matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    /// Article title (required)
    pub title: String,

    /// Summary used for listings, SEO and the feed
    pub description: Option<String>,

    /// Publish date (required)
    pub pub_date: NaiveDate,

    /// Last significant update
    pub updated_date: Option<NaiveDate>,

    /// Author display name
    pub author: Option<String>,

    /// Hero image reference, usually a path under the public directory
    pub hero_image: Option<String>,

    /// Tags, in the order they were written
    pub tags: Vec<String>,
}

impl ArticleMeta {
    /// Date the article last changed: the update date when present, else the publish date.
    pub fn last_modified(&self) -> NaiveDate {
        self.updated_date.unwrap_or(self.pub_date)
    }
}

/// Front-matter as written, before required fields are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrontmatter {
    title: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    updated_date: Option<String>,
    author: Option<String>,
    hero_image: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl RawFrontmatter {
    fn into_meta(self) -> Result<ArticleMeta, FrontmatterError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(FrontmatterError::MissingField("title"))?;

        let pub_date = self
            .pub_date
            .filter(|d| !d.trim().is_empty())
            .ok_or(FrontmatterError::MissingField("pubDate"))?;
        let pub_date = parse_date(&pub_date).ok_or(FrontmatterError::InvalidDate {
            field: "pubDate",
            value: pub_date,
        })?;

        let updated_date = match self.updated_date {
            Some(raw) => Some(parse_date(&raw).ok_or(FrontmatterError::InvalidDate {
                field: "updatedDate",
                value: raw,
            })?),
            None => None,
        };

        Ok(ArticleMeta {
            title,
            description: self.description,
            pub_date,
            updated_date,
            author: self.author,
            hero_image: self.hero_image,
            tags: self.tags,
        })
    }
}

/// Extract and validate front-matter from a content file.
///
/// Returns the parsed metadata and the remaining content after the front-matter block.
pub fn parse_frontmatter(source: &str) -> Result<(ArticleMeta, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Err(FrontmatterError::Missing);
    }

    // Find the closing ---
    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    // An empty block still has to report which field is missing
    let raw: RawFrontmatter = if yaml_content.is_empty() {
        RawFrontmatter::default()
    } else {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    Ok((raw.into_meta()?, remaining.trim_start()))
}

/// Parse a front-matter date.
///
/// Accepts `2024-05-01`, RFC 3339 timestamps, `2024-05-01T10:00:00`,
/// `May 01 2024` and `May 1, 2024`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    ["%B %d %Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Errors that can occur when parsing front-matter.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FrontmatterError {
    #[error("Missing front-matter block - content must start with ---")]
    Missing,

    #[error("Unclosed front-matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front-matter: {0}")]
    InvalidYaml(String),

    #[error("Missing required front-matter field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date in front-matter field {field}: {value}")]
    InvalidDate { field: &'static str, value: String },
}
