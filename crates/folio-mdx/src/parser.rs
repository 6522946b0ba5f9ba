//! MDX document parser.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::codeblock::{extract_title, CodeBlock, DiagramBlock, Language};
use crate::frontmatter::{parse_frontmatter, ArticleMeta, FrontmatterError};
use crate::slug::slugify;

/// A parsed MDX document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDoc {
    /// Parsed front-matter
    pub meta: ArticleMeta,

    /// Markdown content (without front-matter or MDX import/export lines)
    pub content: String,

    /// Extracted code samples
    pub code_blocks: Vec<CodeBlock>,

    /// Extracted diagram descriptions
    pub diagrams: Vec<DiagramBlock>,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID, unique within the document
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing MDX.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("Front-matter error: {0}")]
    Frontmatter(#[from] FrontmatterError),

    #[error("Unclosed code fence opened at line {line}")]
    UnclosedFence { line: usize },
}

/// Markdown extensions enabled for every article.
///
/// Rendering must use the same options as parsing so heading anchors line up with the TOC.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Parse an MDX document.
///
/// Extracts front-matter, code blocks and diagram blocks, and generates a table of contents.
pub fn parse_mdx(source: &str) -> Result<ParsedDoc, ParseError> {
    let (meta, body) = parse_frontmatter(source)?;

    // Lines consumed by the front-matter block, so block lines refer to the source file
    let line_offset = source[..source.len() - body.len()].matches('\n').count();

    let content = strip_esm(body, line_offset)?;

    let mut code_blocks = Vec::new();
    let mut diagrams = Vec::new();
    let mut toc = Vec::new();
    let mut anchors: HashMap<String, usize> = HashMap::new();

    let mut current_code: Option<(String, usize, String)> = None; // (info, line, source)
    let mut current_heading: Option<(u8, String)> = None; // (level, text)

    for (event, range) in Parser::new_ext(&content, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match &kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let line = content[..range.start].matches('\n').count() + 1 + line_offset;
                current_code = Some((info, line, String::new()));
            }

            Event::Text(text) => {
                if let Some((_, _, source)) = current_code.as_mut() {
                    source.push_str(&text);
                } else if let Some((_, title)) = current_heading.as_mut() {
                    title.push_str(&text);
                }
            }

            Event::Code(text) => {
                if let Some((_, title)) = current_heading.as_mut() {
                    title.push_str(&text);
                }
            }

            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, line, source)) = current_code.take() {
                    let language = Language::from_info(&info);
                    if language.is_diagram() {
                        diagrams.push(DiagramBlock::new(source, line));
                    } else {
                        let mut block = CodeBlock::new(language, source, line);
                        block.title = extract_title(&info);
                        code_blocks.push(block);
                    }
                }
            }

            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((level as u8, String::new()));
            }

            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current_heading.take() {
                    let id = unique_anchor(&title, &mut anchors);
                    toc.push(TocEntry { title, id, level });
                }
            }

            _ => {}
        }
    }

    Ok(ParsedDoc {
        meta,
        content,
        code_blocks,
        diagrams,
        toc,
    })
}

/// Slug a heading, suffixing repeats with `-1`, `-2`, ...
fn unique_anchor(title: &str, seen: &mut HashMap<String, usize>) -> String {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "section".to_string();
    }

    let count = seen.entry(base.clone()).or_insert(0);
    let id = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}

/// Blank out top-level MDX `import`/`export` statements.
///
/// Lines are blanked rather than removed so block line numbers stay accurate.
fn strip_esm(body: &str, line_offset: usize) -> Result<String, ParseError> {
    let mut out = String::with_capacity(body.len());
    let mut fence: Option<(char, usize, usize)> = None; // (marker, length, opening line)
    let mut brace_depth: i32 = 0;
    let mut in_statement = false;

    for (index, line) in body.split_inclusive('\n').enumerate() {
        let trimmed = line.trim_start();
        let newline = if line.ends_with('\n') { "\n" } else { "" };

        if let Some(marker) = fence_marker(line) {
            match fence {
                None => fence = Some((marker.0, marker.1, index + 1 + line_offset)),
                Some((open, len, _))
                    if open == marker.0
                        && marker.1 >= len
                        && trimmed.trim_start_matches(open).trim().is_empty() =>
                {
                    fence = None;
                }
                Some(_) => {}
            }
            out.push_str(line);
            continue;
        }

        if fence.is_some() {
            out.push_str(line);
            continue;
        }

        if !in_statement && (line.starts_with("import ") || line.starts_with("export ")) {
            in_statement = true;
            brace_depth = 0;
        }

        if in_statement {
            brace_depth += line.matches('{').count() as i32;
            brace_depth -= line.matches('}').count() as i32;
            if brace_depth <= 0 {
                in_statement = false;
            }
            out.push_str(newline);
        } else {
            out.push_str(line);
        }
    }

    if let Some((_, _, line)) = fence {
        return Err(ParseError::UnclosedFence { line });
    }

    Ok(out)
}

/// Marker character and run length if the line opens or closes a code fence.
///
/// Follows CommonMark: at most three spaces of indentation, and a backtick
/// fence's info string may not contain a backtick.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }

    let rest = &line[indent..];
    let marker = rest.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    if marker == '`' && rest[len..].contains('`') {
        return None;
    }
    Some((marker, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ARTICLE: &str = r#"---
title: Adaptive PQC
pubDate: 2024-05-01
tags: ["pqc", "edge"]
---
import Callout from '../components/Callout.astro';

# Overview

The node picks a scheme at runtime.

```mermaid
flowchart LR
  A[Sensor] --> B[Classifier]
```

## Key exchange

```c title="kem.c"
int kem_encaps(void);
```

## Key exchange
"#;

    #[test]
    fn parses_complete_article() {
        let doc = parse_mdx(ARTICLE).unwrap();

        assert_eq!(doc.meta.title, "Adaptive PQC");
        assert!(!doc.content.contains("import Callout"));

        assert_eq!(doc.diagrams.len(), 1);
        assert!(doc.diagrams[0].source.starts_with("flowchart LR"));
        assert_eq!(doc.diagrams[0].line_number, 12);
        assert_eq!(doc.diagrams[0].id, "diagram-12");

        assert_eq!(doc.code_blocks.len(), 1);
        let block = &doc.code_blocks[0];
        assert_eq!(block.language, Language::C);
        assert_eq!(block.title.as_deref(), Some("kem.c"));
        assert_eq!(block.line_number, 19);
        assert!(block.source.contains("kem_encaps"));
    }

    #[test]
    fn builds_toc_with_unique_anchors() {
        let doc = parse_mdx(ARTICLE).unwrap();

        let ids: Vec<_> = doc.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["overview", "key-exchange", "key-exchange-1"]);
        assert_eq!(doc.toc[0].level, 1);
        assert_eq!(doc.toc[1].level, 2);
    }

    #[test]
    fn heading_with_inline_code() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\n## The `kem_encaps` call\n";
        let doc = parse_mdx(source).unwrap();
        assert_eq!(doc.toc[0].title, "The kem_encaps call");
        assert_eq!(doc.toc[0].id, "the-kem-encaps-call");
    }

    #[test]
    fn keeps_import_lines_inside_code() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\n```js\nimport x from 'y';\n```\n";
        let doc = parse_mdx(source).unwrap();
        assert!(doc.code_blocks[0].source.contains("import x from 'y';"));
    }

    #[test]
    fn strips_multiline_export() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\nexport const meta = {\n  a: 1,\n};\n\nBody text\n";
        let doc = parse_mdx(source).unwrap();
        assert!(!doc.content.contains("a: 1"));
        assert!(doc.content.contains("Body text"));
    }

    #[test]
    fn errors_on_unclosed_fence() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\n\n```mermaid\nflowchart TD\n";
        assert_eq!(
            parse_mdx(source).unwrap_err(),
            ParseError::UnclosedFence { line: 6 }
        );
    }

    #[test]
    fn inline_code_with_triple_backticks_is_not_a_fence() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\n```kem_encaps()``` returns the shared secret.\n\n```c\nint x;\n```\n";
        let doc = parse_mdx(source).unwrap();

        assert!(doc.content.contains("```kem_encaps()```"));
        assert_eq!(doc.code_blocks.len(), 1);
        assert_eq!(doc.code_blocks[0].line_number, 7);
    }

    #[test]
    fn indented_backticks_are_not_a_fence() {
        let source = "---\ntitle: T\npubDate: 2024-01-01\n---\nText\n\n    ```\n    indented code\n";
        assert!(parse_mdx(source).is_ok());
    }

    #[test]
    fn fence_markers() {
        assert_eq!(fence_marker("```rust\n"), Some(('`', 3)));
        assert_eq!(fence_marker("   ~~~~"), Some(('~', 4)));
        assert_eq!(fence_marker("    ```"), None);
        assert_eq!(fence_marker("```a` b"), None);
        assert_eq!(fence_marker("~~~ a`b"), Some(('~', 3)));
        assert_eq!(fence_marker("``"), None);
    }

    #[test]
    fn propagates_frontmatter_errors() {
        let result = parse_mdx("# No front-matter");
        assert_eq!(
            result.unwrap_err(),
            ParseError::Frontmatter(FrontmatterError::Missing)
        );
    }
}
