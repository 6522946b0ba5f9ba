//! Article body rendering.
//!
//! Runs the document through pulldown-cmark with the same options the parser
//! used, assigning heading ids from the table of contents and replacing
//! fenced blocks: `mermaid` fences become inline SVG figures, other fences
//! become captioned code figures.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd};

use folio_diagram::{DiagramRenderer, RenderError};
use folio_mdx::{markdown_options, Language, ParsedDoc};

/// A diagram in an article body failed to render.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("diagram at line {line}: {source}")]
pub struct DiagramFailure {
    pub line: usize,
    #[source]
    pub source: RenderError,
}

/// Render an article body to HTML.
pub fn render_body(doc: &ParsedDoc, diagrams: &DiagramRenderer) -> Result<String, DiagramFailure> {
    let mut events: Vec<Event> = Vec::new();
    let mut headings = doc.toc.iter();
    let mut diagram_blocks = doc.diagrams.iter();
    let mut code_blocks = doc.code_blocks.iter();
    let mut code: Option<(String, String)> = None; // (info, source)

    for event in Parser::new_ext(&doc.content, markdown_options()) {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = headings
                    .next()
                    .map(|entry| CowStr::from(entry.id.clone()))
                    .or(id);
                events.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((info, String::new()));
            }

            Event::Text(text) if code.is_some() => {
                if let Some((_, source)) = code.as_mut() {
                    source.push_str(&text);
                }
            }

            Event::End(TagEnd::CodeBlock) => {
                let Some((info, source)) = code.take() else {
                    continue;
                };

                let html = if Language::from_info(&info).is_diagram() {
                    let block = diagram_blocks.next();
                    let id = block.map_or("diagram", |b| b.id.as_str());
                    let line = block.map_or(0, |b| b.line_number);

                    let rendered = diagrams
                        .render(id, &source)
                        .map_err(|source| DiagramFailure { line, source })?;
                    format!("<figure class=\"diagram\">{}</figure>\n", rendered.svg)
                } else {
                    let title = code_blocks.next().and_then(|b| b.title.as_deref());
                    code_figure(&info, &source, title)
                };

                events.push(Event::Html(html.into()));
            }

            event => events.push(event),
        }
    }

    let mut out = String::with_capacity(doc.content.len() * 2);
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}

fn code_figure(info: &str, source: &str, title: Option<&str>) -> String {
    let language = info
        .split_whitespace()
        .next()
        .map(|l| l.to_lowercase())
        .filter(|l| l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '+'));

    let mut html = String::from("<figure class=\"code-block\">");
    if let Some(title) = title {
        html.push_str(&format!("<figcaption>{}</figcaption>", escape_html(title)));
    }
    match language {
        Some(language) => html.push_str(&format!("<pre><code class=\"language-{}\">", language)),
        None => html.push_str("<pre><code>"),
    }
    html.push_str(&escape_html(source));
    html.push_str("</code></pre></figure>\n");
    html
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
