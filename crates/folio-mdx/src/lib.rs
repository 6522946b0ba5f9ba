//! MDX parser with front-matter, code block and diagram extraction.
//!
//! This crate parses article source files: YAML front-matter into a typed
//! [`ArticleMeta`], fenced code samples, `mermaid` diagram blocks and a table
//! of contents.

pub mod codeblock;
pub mod frontmatter;
pub mod parser;
pub mod slug;

pub use codeblock::{CodeBlock, DiagramBlock, Language};
pub use frontmatter::{parse_date, parse_frontmatter, ArticleMeta, FrontmatterError};
pub use parser::{markdown_options, parse_mdx, ParseError, ParsedDoc, TocEntry};
pub use slug::slugify;
