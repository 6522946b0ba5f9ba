//! Flowchart description parser.
//!
//! Turns mermaid `graph`/`flowchart` text into a [`Flowchart`]: nodes in order
//! of first mention, edges in order of declaration, and nested subgraphs.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::renderer::RenderError;

/// Layout direction of a flowchart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    /// Whether ranks advance along the y axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TopDown | Self::BottomUp)
    }

    /// Whether ranks advance toward smaller coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }
}

/// Node outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Rect,
    Round,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    Asymmetric,
    Rhombus,
    Hexagon,
}

impl Shape {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "rect" | "rectangle" | "square" | "proc" | "process" => Some(Self::Rect),
            "rounded" | "event" => Some(Self::Round),
            "stadium" | "pill" | "terminal" => Some(Self::Stadium),
            "subproc" | "subroutine" | "fr-rect" => Some(Self::Subroutine),
            "cyl" | "cylinder" | "database" | "db" => Some(Self::Cylinder),
            "circle" | "circ" => Some(Self::Circle),
            "odd" => Some(Self::Asymmetric),
            "diam" | "diamond" | "decision" | "question" => Some(Self::Rhombus),
            "hex" | "hexagon" | "prepare" => Some(Self::Hexagon),
            _ => None,
        }
    }
}

/// A flowchart node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// Label lines (a label may contain `<br>` breaks)
    pub label: Vec<String>,
    pub shape: Shape,
    /// `pack:icon` reference from `@{ icon: ... }`
    pub icon: Option<String>,
    /// Classes applied with `:::name` or `class` statements
    pub classes: Vec<String>,
    /// Inline style from `style` statements
    pub style: Option<String>,
    /// Innermost subgraph the node was first mentioned in
    pub subgraph: Option<usize>,
}

/// Line pattern of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Thick,
    Dotted,
    Invisible,
}

/// Marker drawn at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    None,
    Arrow,
    Circle,
    Cross,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub stroke: Stroke,
    pub head: ArrowHead,
    pub tail: ArrowHead,
}

/// A named group of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph {
    pub id: String,
    pub title: String,
    pub parent: Option<usize>,
}

/// A parsed flowchart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flowchart {
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub subgraphs: Vec<Subgraph>,
    /// Styles declared with `classDef`
    pub class_defs: HashMap<String, String>,
}

impl Flowchart {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Inline style for a node: its class styles followed by its own `style`.
    pub fn node_style(&self, node: &Node) -> Option<String> {
        let mut parts: Vec<&str> = node
            .classes
            .iter()
            .filter_map(|c| self.class_defs.get(c).map(String::as_str))
            .collect();
        if let Some(style) = &node.style {
            parts.push(style);
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(";").replace(',', ";"))
        }
    }

    /// Subgraph chain from `index` up to the outermost ancestor.
    pub fn subgraph_ancestry(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.subgraphs[current].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

static SUBGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^subgraph\s+([A-Za-z0-9_\-]+)\s*\[\s*"?([^"\]]*)"?\s*\]\s*$"#)
        .expect("Invalid subgraph regex")
});

static OTHER_DIAGRAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(sequenceDiagram|classDiagram(?:-v2)?|stateDiagram(?:-v2)?|erDiagram|journey|gantt|pie|quadrantChart|requirementDiagram|gitGraph|mindmap|timeline|sankey-beta|xychart-beta|block-beta|packet-beta|architecture-beta|C4Context|kanban|radar-beta)\b",
    )
    .expect("Invalid diagram type regex")
});

/// Parse a flowchart description.
pub fn parse(source: &str) -> Result<Flowchart, RenderError> {
    let statements = split_statements(source);

    let Some(((header_line, header), rest)) = statements.split_first() else {
        return Err(RenderError::Empty);
    };

    let mut parser = FlowchartParser::new(parse_header(*header_line, header)?);

    for (line, statement) in rest {
        parser.statement(*line, statement)?;
    }

    parser.finish()
}

fn parse_header(line: usize, header: &str) -> Result<Direction, RenderError> {
    let mut tokens = header.split_whitespace();
    let kind = tokens.next().unwrap_or("");

    if kind != "graph" && kind != "flowchart" && kind != "flowchart-elk" {
        if let Some(caps) = OTHER_DIAGRAM_RE.captures(header) {
            return Err(RenderError::Unsupported(caps[1].to_string()));
        }
        return Err(RenderError::Syntax {
            line,
            message: format!("unknown diagram type '{}'", kind),
        });
    }

    match tokens.next() {
        None => Ok(Direction::default()),
        Some(token) => Direction::parse(token).ok_or_else(|| RenderError::Syntax {
            line,
            message: format!("unknown direction '{}'", token),
        }),
    }
}

/// Split source into `(line, statement)` pairs, dropping comments, directives
/// and a leading `---` config block.
fn split_statements(source: &str) -> Vec<(usize, String)> {
    let mut statements = Vec::new();
    let mut lines = source.lines().enumerate().peekable();

    // Skip blank lines, then an optional front-matter config block
    while let Some((_, line)) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
        } else {
            break;
        }
    }
    if lines.peek().is_some_and(|(_, l)| l.trim() == "---") {
        lines.next();
        for (_, line) in lines.by_ref() {
            if line.trim() == "---" {
                break;
            }
        }
    }

    for (index, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        for part in split_outside_quotes(trimmed, ';') {
            let part = part.trim();
            if !part.is_empty() {
                statements.push((index + 1, part.to_string()));
            }
        }
    }

    statements
}

/// Split on `sep` when it is outside quotes and brackets.
fn split_outside_quotes(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' | '{' if !in_quotes => depth += 1,
            ']' | ')' | '}' if !in_quotes => depth -= 1,
            c if c == sep && !in_quotes && depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

struct FlowchartParser {
    chart: Flowchart,
    index: HashMap<String, usize>,
    /// Nodes that were given an explicit shape or label
    defined: Vec<bool>,
    stack: Vec<(usize, usize)>, // (subgraph index, opening line)
}

impl FlowchartParser {
    fn new(direction: Direction) -> Self {
        Self {
            chart: Flowchart {
                direction,
                ..Default::default()
            },
            index: HashMap::new(),
            defined: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn statement(&mut self, line: usize, statement: &str) -> Result<(), RenderError> {
        let keyword = statement.split_whitespace().next().unwrap_or("");

        match keyword {
            "subgraph" => self.open_subgraph(line, statement),
            "end" if statement == "end" => {
                if self.stack.pop().is_none() {
                    return Err(RenderError::Syntax {
                        line,
                        message: "'end' without matching 'subgraph'".to_string(),
                    });
                }
                Ok(())
            }
            "direction" => Ok(()),
            "classDef" => {
                let mut parts = statement.splitn(3, char::is_whitespace).skip(1);
                let names = parts.next().unwrap_or("");
                let style = parts.next().unwrap_or("").trim();
                for name in names.split(',') {
                    self.chart
                        .class_defs
                        .insert(name.to_string(), style.trim_end_matches(';').to_string());
                }
                Ok(())
            }
            "class" => {
                let mut parts = statement.split_whitespace().skip(1);
                let ids = parts.next().unwrap_or("");
                let class = parts.next().ok_or_else(|| RenderError::Syntax {
                    line,
                    message: "class statement needs node ids and a class name".to_string(),
                })?;
                for id in ids.split(',') {
                    let node = self.touch(id);
                    self.chart.nodes[node].classes.push(class.to_string());
                }
                Ok(())
            }
            "style" => {
                let mut parts = statement.splitn(3, char::is_whitespace).skip(1);
                let id = parts.next().unwrap_or("");
                let style = parts.next().unwrap_or("").trim().to_string();
                let node = self.touch(id);
                self.chart.nodes[node].style = Some(style);
                Ok(())
            }
            "linkStyle" | "click" | "accTitle" | "accDescr" | "accTitle:" | "accDescr:" => Ok(()),
            _ => self.chain(line, statement),
        }
    }

    fn open_subgraph(&mut self, line: usize, statement: &str) -> Result<(), RenderError> {
        let (id, title) = if let Some(caps) = SUBGRAPH_RE.captures(statement) {
            (caps[1].to_string(), caps[2].trim().to_string())
        } else {
            let rest = statement["subgraph".len()..].trim().trim_matches('"').to_string();
            if rest.is_empty() {
                return Err(RenderError::Syntax {
                    line,
                    message: "subgraph needs an id or title".to_string(),
                });
            }
            (rest.clone(), rest)
        };

        let parent = self.stack.last().map(|(index, _)| *index);
        self.chart.subgraphs.push(Subgraph { id, title, parent });
        self.stack.push((self.chart.subgraphs.len() - 1, line));
        Ok(())
    }

    /// Parse `group (link group)*` where a group is `node (& node)*`.
    fn chain(&mut self, line: usize, statement: &str) -> Result<(), RenderError> {
        let mut cursor = Cursor::new(statement, line);

        let mut previous = self.group(&mut cursor)?;

        loop {
            cursor.skip_ws();
            if cursor.at_end() {
                break;
            }

            let link = cursor.link()?;
            let next = self.group(&mut cursor)?;

            for from in &previous {
                for to in &next {
                    self.chart.edges.push(Edge {
                        from: self.chart.nodes[*from].id.clone(),
                        to: self.chart.nodes[*to].id.clone(),
                        label: link.label.clone(),
                        stroke: link.stroke,
                        head: link.head,
                        tail: link.tail,
                    });
                }
            }

            previous = next;
        }

        Ok(())
    }

    fn group(&mut self, cursor: &mut Cursor) -> Result<Vec<usize>, RenderError> {
        let mut nodes = vec![self.node_ref(cursor)?];

        loop {
            cursor.skip_ws();
            if cursor.eat("&") {
                nodes.push(self.node_ref(cursor)?);
            } else {
                break;
            }
        }

        Ok(nodes)
    }

    fn node_ref(&mut self, cursor: &mut Cursor) -> Result<usize, RenderError> {
        cursor.skip_ws();
        let id = cursor.identifier()?;
        let node = self.touch(&id);

        if let Some(def) = cursor.shape()? {
            let entry = &mut self.chart.nodes[node];
            if let Some(shape) = def.shape {
                entry.shape = shape;
            }
            match def.label {
                Some(label) => entry.label = split_label(&label),
                // Icon nodes without a label show only the icon
                None if def.icon.is_some() => entry.label = Vec::new(),
                None => {}
            }
            if def.icon.is_some() {
                entry.icon = def.icon;
            }
            self.defined[node] = true;
        }

        if cursor.eat(":::") {
            let class = cursor.word();
            if class.is_empty() {
                return Err(cursor.error("expected class name after ':::'"));
            }
            self.chart.nodes[node].classes.push(class);
        }

        Ok(node)
    }

    /// Index of the node with `id`, creating it on first mention.
    fn touch(&mut self, id: &str) -> usize {
        if let Some(&index) = self.index.get(id) {
            return index;
        }

        self.chart.nodes.push(Node {
            id: id.to_string(),
            label: vec![id.to_string()],
            shape: Shape::default(),
            icon: None,
            classes: Vec::new(),
            style: None,
            subgraph: self.stack.last().map(|(index, _)| *index),
        });
        self.defined.push(false);
        let index = self.chart.nodes.len() - 1;
        self.index.insert(id.to_string(), index);
        index
    }

    fn finish(mut self) -> Result<Flowchart, RenderError> {
        if let Some((_, line)) = self.stack.last() {
            return Err(RenderError::Syntax {
                line: *line,
                message: "subgraph is missing 'end'".to_string(),
            });
        }

        // Edges to a subgraph id attach to the subgraph's first member
        let mut retarget: HashMap<String, String> = HashMap::new();
        for (sg_index, subgraph) in self.chart.subgraphs.iter().enumerate() {
            let Some(&node_index) = self.index.get(&subgraph.id) else {
                continue;
            };
            if self.defined[node_index] {
                continue;
            }
            let member = self.chart.nodes.iter().find(|n| {
                n.subgraph
                    .is_some_and(|s| self.chart.subgraph_ancestry(s).contains(&sg_index))
            });
            if let Some(member) = member {
                retarget.insert(subgraph.id.clone(), member.id.clone());
            }
        }

        if !retarget.is_empty() {
            self.chart.nodes.retain(|n| !retarget.contains_key(&n.id));
            for edge in &mut self.chart.edges {
                if let Some(target) = retarget.get(&edge.from) {
                    edge.from = target.clone();
                }
                if let Some(target) = retarget.get(&edge.to) {
                    edge.to = target.clone();
                }
            }
        }

        Ok(self.chart)
    }
}

/// Split a label on `<br>` variants and literal newlines.
fn split_label(label: &str) -> Vec<String> {
    let normalized = label
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n");
    normalized.lines().map(|l| l.trim().to_string()).collect()
}

struct ShapeDef {
    shape: Option<Shape>,
    label: Option<String>,
    icon: Option<String>,
}

struct Link {
    stroke: Stroke,
    head: ArrowHead,
    tail: ArrowHead,
    label: Option<String>,
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self { text, pos: 0, line }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> RenderError {
        RenderError::Syntax {
            line: self.line,
            message: format!("{} near '{}'", message.into(), self.rest()),
        }
    }

    fn word(&mut self) -> String {
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest().len());
        let word = self.rest()[..len].to_string();
        self.pos += len;
        word
    }

    /// Node id: alphanumerics and `_`, with `-` allowed between word characters.
    fn identifier(&mut self) -> Result<String, RenderError> {
        let rest = self.rest();
        let chars: Vec<(usize, char)> = rest.char_indices().collect();
        let mut end = 0;

        for (i, &(offset, c)) in chars.iter().enumerate() {
            let next = chars.get(i + 1).map(|(_, c)| *c);
            let ok = c.is_alphanumeric()
                || c == '_'
                || (c == '-' && end > 0 && next.is_some_and(|n| n.is_alphanumeric() || n == '_'))
                || (c == '.' && end > 0 && next.is_some_and(|n| n.is_alphanumeric()));
            if !ok {
                break;
            }
            end = offset + c.len_utf8();
        }

        if end == 0 {
            return Err(self.error("expected node id"));
        }

        let id = rest[..end].to_string();
        self.pos += end;
        Ok(id)
    }

    /// Optional shape and label directly after a node id.
    fn shape(&mut self) -> Result<Option<ShapeDef>, RenderError> {
        if self.eat("@{") {
            let body = self.until("}")?;
            return self.attributes(&body).map(Some);
        }

        const DELIMITERS: [(&str, &str, Shape); 9] = [
            ("([", "])", Shape::Stadium),
            ("[[", "]]", Shape::Subroutine),
            ("[(", ")]", Shape::Cylinder),
            ("((", "))", Shape::Circle),
            ("{{", "}}", Shape::Hexagon),
            ("[", "]", Shape::Rect),
            ("(", ")", Shape::Round),
            ("{", "}", Shape::Rhombus),
            (">", "]", Shape::Asymmetric),
        ];

        for (open, close, shape) in DELIMITERS {
            if self.eat(open) {
                let label = self.label(close)?;
                return Ok(Some(ShapeDef {
                    shape: Some(shape),
                    label: Some(label),
                    icon: None,
                }));
            }
        }

        Ok(None)
    }

    /// Label text up to `close`, honoring a quoted label.
    fn label(&mut self, close: &str) -> Result<String, RenderError> {
        self.skip_ws();
        if self.eat("\"") {
            let text = self.until("\"")?;
            self.skip_ws();
            if !self.eat(close) {
                return Err(self.error(format!("expected '{}'", close)));
            }
            return Ok(text);
        }

        let text = self.until(close)?;
        Ok(text.trim().to_string())
    }

    /// Consume text up to and including `token`, returning the text before it.
    fn until(&mut self, token: &str) -> Result<String, RenderError> {
        match self.rest().find(token) {
            Some(index) => {
                let text = self.rest()[..index].to_string();
                self.pos += index + token.len();
                Ok(text)
            }
            None => Err(self.error(format!("missing '{}'", token))),
        }
    }

    /// `key: value` pairs from an `@{ ... }` block.
    fn attributes(&self, body: &str) -> Result<ShapeDef, RenderError> {
        let mut def = ShapeDef {
            shape: None,
            label: None,
            icon: None,
        };

        for pair in split_outside_quotes(body, ',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once(':')
                .ok_or_else(|| self.error(format!("malformed attribute '{}'", pair)))?;
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();

            match key.trim() {
                "icon" => def.icon = Some(value),
                "label" => def.label = Some(value),
                "shape" => {
                    def.shape = Some(
                        Shape::from_name(&value)
                            .ok_or_else(|| self.error(format!("unknown shape '{}'", value)))?,
                    )
                }
                // form, pos, h, w, constraint and friends only affect styling details
                _ => {}
            }
        }

        Ok(def)
    }

    fn link(&mut self) -> Result<Link, RenderError> {
        let tail = if self.eat("<") {
            ArrowHead::Arrow
        } else {
            ArrowHead::None
        };

        let mut link = if self.eat("~~~") {
            while self.eat("~") {}
            Link {
                stroke: Stroke::Invisible,
                head: ArrowHead::None,
                tail: ArrowHead::None,
                label: None,
            }
        } else if self.rest().starts_with("-.") {
            self.pos += 1;
            while self.eat(".") {}
            if self.peek().is_some_and(char::is_whitespace) {
                // -. label .->
                let label = self.until(".-")?;
                while self.eat("-") {}
                let head = self.head();
                Link {
                    stroke: Stroke::Dotted,
                    head,
                    tail,
                    label: Some(label.trim().to_string()),
                }
            } else {
                while self.eat("-") {}
                let head = self.head();
                Link {
                    stroke: Stroke::Dotted,
                    head,
                    tail,
                    label: None,
                }
            }
        } else if let Some(marker) = self.peek().filter(|c| *c == '-' || *c == '=') {
            let run = self.rest().chars().take_while(|c| *c == marker).count();
            if run < 2 {
                return Err(self.error("expected link"));
            }
            self.pos += run;
            let stroke = if marker == '=' {
                Stroke::Thick
            } else {
                Stroke::Solid
            };
            let head = self.head();

            if run == 2 && head == ArrowHead::None && self.peek().is_some_and(char::is_whitespace)
            {
                // -- label --> / == label ==>
                let closing: String = [marker, marker].iter().collect();
                let label = self.until(&closing)?;
                while self.eat(&marker.to_string()) {}
                let head = self.head();
                Link {
                    stroke,
                    head,
                    tail,
                    label: Some(label.trim().to_string()),
                }
            } else {
                Link {
                    stroke,
                    head,
                    tail,
                    label: None,
                }
            }
        } else {
            return Err(self.error("expected link"));
        };

        if link.tail == ArrowHead::Arrow && link.head == ArrowHead::None {
            return Err(self.error("bidirectional link needs a head"));
        }

        // -->|label|
        let before_label = self.pos;
        self.skip_ws();
        if self.eat("|") {
            let label = self.until("|")?;
            link.label = Some(label.trim().trim_matches('"').to_string());
        } else {
            self.pos = before_label;
        }

        Ok(link)
    }

    fn head(&mut self) -> ArrowHead {
        if self.eat(">") {
            return ArrowHead::Arrow;
        }
        // `o`/`x` heads must be followed by whitespace so ids like `x1` still parse
        let after = self.rest().chars().nth(1);
        let terminal = after.is_none_or(|c| c.is_whitespace() || c == '|');
        match self.peek() {
            Some('o') if terminal => {
                self.pos += 1;
                ArrowHead::Circle
            }
            Some('x') if terminal => {
                self.pos += 1;
                ArrowHead::Cross
            }
            _ => ArrowHead::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(chart: &Flowchart) -> Vec<&str> {
        chart.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn parses_direction_and_nodes() {
        let chart = parse("flowchart LR\n  A[Start] --> B(Round) --> C{Decide}").unwrap();

        assert_eq!(chart.direction, Direction::LeftRight);
        assert_eq!(ids(&chart), vec!["A", "B", "C"]);
        assert_eq!(chart.nodes[0].label, vec!["Start"]);
        assert_eq!(chart.nodes[1].shape, Shape::Round);
        assert_eq!(chart.nodes[2].shape, Shape::Rhombus);
        assert_eq!(chart.edges.len(), 2);
        assert_eq!(chart.edges[1].from, "B");
        assert_eq!(chart.edges[1].to, "C");
    }

    #[test]
    fn defaults_to_top_down() {
        let chart = parse("graph\nA --> B").unwrap();
        assert_eq!(chart.direction, Direction::TopDown);
    }

    #[test]
    fn parses_all_shapes() {
        let chart = parse(
            "graph TD\nA([s]) --> B[[sub]]\nC[(db)] --> D((c))\nE>flag] --> F{{hex}}",
        )
        .unwrap();

        let shapes: Vec<_> = chart.nodes.iter().map(|n| n.shape).collect();
        assert_eq!(
            shapes,
            vec![
                Shape::Stadium,
                Shape::Subroutine,
                Shape::Cylinder,
                Shape::Circle,
                Shape::Asymmetric,
                Shape::Hexagon
            ]
        );
    }

    #[test]
    fn parses_link_styles_and_labels() {
        let chart = parse(
            "graph TD\nA -->|yes| B\nB -- maybe --> C\nC -.-> D\nD ==> E\nE --- F\nF -. later .-> G\nG --o H\nH --x I\nI <--> J\nJ ~~~ K",
        )
        .unwrap();

        let e = &chart.edges;
        assert_eq!(e[0].label.as_deref(), Some("yes"));
        assert_eq!(e[0].head, ArrowHead::Arrow);
        assert_eq!(e[1].label.as_deref(), Some("maybe"));
        assert_eq!(e[1].to, "C");
        assert_eq!(e[2].stroke, Stroke::Dotted);
        assert_eq!(e[3].stroke, Stroke::Thick);
        assert_eq!(e[4].head, ArrowHead::None);
        assert_eq!(e[5].label.as_deref(), Some("later"));
        assert_eq!(e[5].stroke, Stroke::Dotted);
        assert_eq!(e[6].head, ArrowHead::Circle);
        assert_eq!(e[7].head, ArrowHead::Cross);
        assert_eq!(e[8].tail, ArrowHead::Arrow);
        assert_eq!(e[8].head, ArrowHead::Arrow);
        assert_eq!(e[9].stroke, Stroke::Invisible);
    }

    #[test]
    fn ids_may_start_with_link_head_letters() {
        let chart = parse("graph TD\nx1 --> o2").unwrap();
        assert_eq!(ids(&chart), vec!["x1", "o2"]);
        assert_eq!(chart.edges[0].head, ArrowHead::Arrow);
    }

    #[test]
    fn fans_out_ampersand_groups() {
        let chart = parse("graph TD\nA & B --> C & D").unwrap();
        assert_eq!(chart.edges.len(), 4);
    }

    #[test]
    fn parses_nested_subgraphs() {
        let chart = parse(
            "flowchart TB\nsubgraph edge [Edge Node]\n  subgraph mcu [\"MCU\"]\n    A --> B\n  end\n  C\nend\nsubgraph Cloud Services\n  D\nend\nB --> D",
        )
        .unwrap();

        assert_eq!(chart.subgraphs.len(), 3);
        assert_eq!(chart.subgraphs[0].title, "Edge Node");
        assert_eq!(chart.subgraphs[1].title, "MCU");
        assert_eq!(chart.subgraphs[1].parent, Some(0));
        assert_eq!(chart.subgraphs[2].id, "Cloud Services");
        assert_eq!(chart.node("A").unwrap().subgraph, Some(1));
        assert_eq!(chart.node("C").unwrap().subgraph, Some(0));
        assert_eq!(chart.node("D").unwrap().subgraph, Some(2));
        assert_eq!(chart.subgraph_ancestry(1), vec![1, 0]);
    }

    #[test]
    fn edges_to_subgraphs_attach_to_first_member() {
        let chart = parse("graph LR\nsubgraph one\n  A\nend\nX --> one").unwrap();
        assert!(chart.node("one").is_none());
        assert_eq!(chart.edges[0].to, "A");
    }

    #[test]
    fn parses_icon_nodes() {
        let chart =
            parse("flowchart TD\nM@{ icon: \"chips:mcu\", label: \"Cortex-M4\", form: \"square\" } --> S").unwrap();
        let node = chart.node("M").unwrap();
        assert_eq!(node.icon.as_deref(), Some("chips:mcu"));
        assert_eq!(node.label, vec!["Cortex-M4"]);
    }

    #[test]
    fn applies_classes_and_styles() {
        let chart = parse(
            "graph TD\nclassDef hot fill:#f96,stroke:#333\nA:::hot --> B\nclass B hot\nstyle A stroke-width:4px",
        )
        .unwrap();

        let a = chart.node("A").unwrap();
        assert_eq!(a.classes, vec!["hot"]);
        assert_eq!(
            chart.node_style(a).as_deref(),
            Some("fill:#f96;stroke:#333;stroke-width:4px")
        );
        assert_eq!(chart.node("B").unwrap().classes, vec!["hot"]);
    }

    #[test]
    fn splits_semicolons_and_br_labels() {
        let chart = parse("graph TD; A[\"Kyber; ML-KEM<br/>768\"] --> B;").unwrap();
        assert_eq!(chart.nodes[0].label, vec!["Kyber; ML-KEM", "768"]);
        assert_eq!(chart.edges.len(), 1);
    }

    #[test]
    fn skips_comments_and_config_block() {
        let chart = parse("---\ntitle: demo\n---\n%%{init: {}}%%\ngraph TD\n%% note\nA --> B").unwrap();
        assert_eq!(chart.edges.len(), 1);
    }

    #[test]
    fn rejects_empty_source() {
        assert_eq!(parse("  \n\n").unwrap_err(), RenderError::Empty);
    }

    #[test]
    fn rejects_unsupported_diagram_types() {
        assert_eq!(
            parse("sequenceDiagram\nA->>B: hi").unwrap_err(),
            RenderError::Unsupported("sequenceDiagram".to_string())
        );
    }

    #[test]
    fn rejects_unknown_header_and_direction() {
        assert!(matches!(
            parse("flowgraph TD"),
            Err(RenderError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            parse("graph XY\nA-->B"),
            Err(RenderError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_unbalanced_subgraphs() {
        assert!(matches!(
            parse("graph TD\nsubgraph S\nA\n"),
            Err(RenderError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse("graph TD\nA\nend"),
            Err(RenderError::Syntax { line: 3, .. })
        ));
    }

    #[test]
    fn rejects_malformed_nodes_and_links() {
        assert!(matches!(
            parse("graph TD\nA[unclosed --> B"),
            Err(RenderError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse("graph TD\nA -> B"),
            Err(RenderError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse("graph TD\nA -->"),
            Err(RenderError::Syntax { line: 2, .. })
        ));
    }
}
