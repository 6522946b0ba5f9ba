//! Fenced code block and diagram block extraction.

/// Language named in a code fence info string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Mermaid,
    C,
    Cpp,
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    Json,
    Toml,
    Yaml,
    Bash,
    #[default]
    Unknown,
}

impl Language {
    /// Parse language from code fence info string.
    pub fn from_info(info: &str) -> Self {
        let lang = info.split_whitespace().next().unwrap_or("");
        match lang.to_lowercase().as_str() {
            "mermaid" => Self::Mermaid,
            "c" | "h" => Self::C,
            "cpp" | "c++" | "cc" | "hpp" => Self::Cpp,
            "rust" | "rs" => Self::Rust,
            "python" | "py" => Self::Python,
            "js" | "javascript" | "jsx" => Self::JavaScript,
            "ts" | "typescript" | "tsx" => Self::TypeScript,
            "html" => Self::Html,
            "css" => Self::Css,
            "json" => Self::Json,
            "toml" => Self::Toml,
            "yaml" | "yml" => Self::Yaml,
            "bash" | "sh" | "shell" => Self::Bash,
            _ => Self::Unknown,
        }
    }

    /// Whether fences in this language are rendered as diagrams instead of code.
    pub fn is_diagram(&self) -> bool {
        matches!(self, Self::Mermaid)
    }
}

/// A fenced code sample from an article body.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Unique identifier for this block (format: block-{line_number})
    pub id: String,

    /// Programming language
    pub language: Language,

    /// Source code content
    pub source: String,

    /// Line number where the block starts (1-indexed)
    pub line_number: usize,

    /// Optional caption from the info string
    pub title: Option<String>,
}

impl CodeBlock {
    /// Create a new code block.
    pub fn new(language: Language, source: String, line_number: usize) -> Self {
        Self {
            id: format!("block-{}", line_number),
            language,
            source,
            line_number,
            title: None,
        }
    }
}

/// A diagram description taken from a `mermaid` fence.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramBlock {
    /// Unique identifier, also used as the rendered SVG id (format: diagram-{line_number})
    pub id: String,

    /// Diagram description text
    pub source: String,

    /// Line number where the block starts (1-indexed)
    pub line_number: usize,
}

impl DiagramBlock {
    pub fn new(source: String, line_number: usize) -> Self {
        Self {
            id: format!("diagram-{}", line_number),
            source,
            line_number,
        }
    }
}

/// Extract a caption from a code fence info string if present.
///
/// Supports formats like:
/// - `c title="pqc_switch.c"`
/// - `c filename="pqc_switch.c"`
/// - `c file=pqc_switch.c`
pub fn extract_title(info: &str) -> Option<String> {
    for key in ["title=\"", "filename=\""] {
        if let Some(start) = info.find(key) {
            let rest = &info[start + key.len()..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }

    // Try file=... format (without quotes)
    if let Some(start) = info.find("file=") {
        let rest = &info[start + 5..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let filename = rest[..end].trim_matches('"');
        if !filename.is_empty() {
            return Some(filename.to_string());
        }
    }

    None
}
