//! Template parser – turns template text into a tree of [`Node`]s.
//!
//! Supported syntax:
//! - `{{ path.to.field }}` – escaped placeholder
//! - `{{{ path }}}` – raw placeholder
//! - `{{#each list}}…{{else}}…{{/each}}` – repeating section with optional
//!   empty-state block
//! - `{{#if path}}…{{else}}…{{/if}}`, `{{#unless path}}…{{/unless}}`
//! - `{{@index}}`, `{{@number}}`, `{{@first}}`, `{{@last}}` inside `#each`
//! - `{{this}}`, `{{this.field}}`, `{{../field}}`
//! - `{{! comment }}`
//!
//! Parsing is a separate pass from evaluation: malformed markers are
//! reported here, before any output exists.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const RAW_OPEN: &str = "{{{";
const RAW_CLOSE: &str = "}}}";

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// A parsed template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Placeholder(Placeholder),
    Each(EachBlock),
    Conditional(ConditionalBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub path: Path,
    /// `false` for `{{{ raw }}}` placeholders.
    pub escape: bool,
    /// Byte offset of the opening braces.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EachBlock {
    pub path: FieldPath,
    pub body: Vec<Node>,
    /// Rendered instead of `body` when the list is empty.
    pub empty: Option<Vec<Node>>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub guard: Path,
    /// `true` for `#unless`.
    pub negate: bool,
    pub then: Vec<Node>,
    pub otherwise: Option<Vec<Node>>,
    pub offset: usize,
}

/// A reference to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    Field(FieldPath),
    Loop(LoopVar),
}

/// A dotted field reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Number of `../` prefixes.
    pub up: usize,
    /// `this`-anchored: resolve only in the current scope frame.
    pub anchored: bool,
    /// Dotted segments; empty for a bare `this`.
    pub segments: Vec<String>,
}

/// Loop metadata available inside a repeating section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopVar {
    Index,
    Number,
    First,
    Last,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.up {
            f.write_str("../")?;
        }
        match (self.anchored, self.segments.is_empty()) {
            (true, true) => f.write_str("this"),
            (true, false) => write!(f, "this.{}", self.segments.join(".")),
            (false, _) => f.write_str(&self.segments.join(".")),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Field(p) => p.fmt(f),
            Path::Loop(LoopVar::Index) => f.write_str("@index"),
            Path::Loop(LoopVar::Number) => f.write_str("@number"),
            Path::Loop(LoopVar::First) => f.write_str("@first"),
            Path::Loop(LoopVar::Last) => f.write_str("@last"),
        }
    }
}

/// A parsed, reusable template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Parser::new(source).parse()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// First segments of every field referenced from the root scope, i.e.
    /// outside any repeating section. Used to warn about keys the mapped
    /// data does not provide.
    pub fn root_fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_root_fields(&self.nodes, &mut out);
        out
    }
}

fn collect_root_fields(nodes: &[Node], out: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Placeholder(Placeholder { path: Path::Field(p), .. }) => add_root_field(p, out),
            Node::Placeholder(_) => {}
            Node::Each(each) => {
                add_root_field(&each.path, out);
                if let Some(empty) = &each.empty {
                    collect_root_fields(empty, out);
                }
            }
            Node::Conditional(c) => {
                if let Path::Field(p) = &c.guard {
                    add_root_field(p, out);
                }
                collect_root_fields(&c.then, out);
                if let Some(otherwise) = &c.otherwise {
                    collect_root_fields(otherwise, out);
                }
            }
        }
    }
}

fn add_root_field(path: &FieldPath, out: &mut BTreeSet<String>) {
    if path.up == 0 {
        if let Some(first) = path.segments.first() {
            out.insert(first.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Each,
    If,
    Unless,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            BlockKind::Each => "each",
            BlockKind::If => "if",
            BlockKind::Unless => "unless",
        }
    }
}

/// An open section waiting for its closing marker.
struct OpenBlock {
    kind: BlockKind,
    path: Path,
    offset: usize,
    primary: Vec<Node>,
    alternate: Option<Vec<Node>>,
}

impl OpenBlock {
    fn current(&mut self) -> &mut Vec<Node> {
        self.alternate.as_mut().unwrap_or(&mut self.primary)
    }
}

/// One `{{ … }}` tag after classification.
enum Tag {
    Value { path: Path, escape: bool },
    Open { kind: BlockKind, path: Path },
    Else,
    Close(BlockKind),
    Comment,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    root: Vec<Node>,
    stack: Vec<OpenBlock>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Template, TemplateError> {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let Some(rel) = rest.find(OPEN) else {
                self.push_text(rest.to_string());
                self.pos = src.len();
                break;
            };
            if rel > 0 {
                self.push_text(rest[..rel].to_string());
            }
            let start = self.pos + rel;
            let (tag, end) = self.read_tag(start)?;
            self.pos = end;
            self.apply(tag, start)?;
        }

        if let Some(open) = self.stack.pop() {
            return Err(self.error_at(
                open.offset,
                format!(
                    "unclosed {{{{#{} {}}}}}: missing {{{{/{}}}}}",
                    open.kind.name(),
                    open.path,
                    open.kind.name()
                ),
            ));
        }

        Ok(Template { nodes: self.root })
    }

    fn sink(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(open) => open.current(),
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: String) {
        let sink = self.sink();
        if let Some(Node::Text(prev)) = sink.last_mut() {
            prev.push_str(&text);
        } else {
            sink.push(Node::Text(text));
        }
    }

    /// Read the tag starting at `start`; returns it and the offset just past it.
    fn read_tag(&self, start: usize) -> Result<(Tag, usize), TemplateError> {
        let rest = &self.src[start..];
        if rest.starts_with(RAW_OPEN) {
            let inner_start = start + RAW_OPEN.len();
            let close = self.src[inner_start..]
                .find(RAW_CLOSE)
                .ok_or_else(|| self.error_at(start, "unterminated '{{{' placeholder"))?;
            let inner = self.src[inner_start..inner_start + close].trim();
            let path = self.parse_path(inner, start)?;
            return Ok((
                Tag::Value { path, escape: false },
                inner_start + close + RAW_CLOSE.len(),
            ));
        }

        let inner_start = start + OPEN.len();
        let close = self.src[inner_start..]
            .find(CLOSE)
            .ok_or_else(|| self.error_at(start, "unterminated '{{' tag"))?;
        let end = inner_start + close + CLOSE.len();
        let inner = self.src[inner_start..inner_start + close].trim();

        let tag = if inner.starts_with('!') {
            Tag::Comment
        } else if let Some(open) = inner.strip_prefix('#') {
            let (helper, arg) = split_helper(open);
            let kind = self.block_kind(helper, start)?;
            if arg.is_empty() {
                return Err(
                    self.error_at(start, format!("{{{{#{helper}}}}} requires an argument"))
                );
            }
            let path = self.parse_path(arg, start)?;
            if kind == BlockKind::Each && !matches!(path, Path::Field(_)) {
                return Err(self.error_at(start, format!("cannot iterate over '{path}'")));
            }
            Tag::Open { kind, path }
        } else if let Some(close) = inner.strip_prefix('/') {
            Tag::Close(self.block_kind(close.trim(), start)?)
        } else if inner == "else" {
            Tag::Else
        } else {
            Tag::Value {
                path: self.parse_path(inner, start)?,
                escape: true,
            }
        };
        Ok((tag, end))
    }

    fn block_kind(&self, helper: &str, offset: usize) -> Result<BlockKind, TemplateError> {
        match helper {
            "each" => Ok(BlockKind::Each),
            "if" => Ok(BlockKind::If),
            "unless" => Ok(BlockKind::Unless),
            other => Err(self.error_at(offset, format!("unknown section helper '{other}'"))),
        }
    }

    fn apply(&mut self, tag: Tag, offset: usize) -> Result<(), TemplateError> {
        match tag {
            Tag::Comment => {}
            Tag::Value { path, escape } => self.sink().push(Node::Placeholder(Placeholder {
                path,
                escape,
                offset,
            })),
            Tag::Open { kind, path } => self.stack.push(OpenBlock {
                kind,
                path,
                offset,
                primary: Vec::new(),
                alternate: None,
            }),
            Tag::Else => {
                let src = self.src;
                let Some(open) = self.stack.last_mut() else {
                    return Err(syntax_error(src, offset, "{{else}} outside of a section"));
                };
                if open.alternate.is_some() {
                    let kind = open.kind.name();
                    return Err(syntax_error(
                        src,
                        offset,
                        format!("duplicate {{{{else}}}} in {{{{#{kind}}}}}"),
                    ));
                }
                open.alternate = Some(Vec::new());
            }
            Tag::Close(kind) => {
                let Some(open) = self.stack.pop() else {
                    let name = kind.name();
                    return Err(self.error_at(
                        offset,
                        format!("{{{{/{name}}}}} without matching {{{{#{name}}}}}"),
                    ));
                };
                if open.kind != kind {
                    let (line, column) = line_col(self.src, open.offset);
                    return Err(self.error_at(
                        offset,
                        format!(
                            "{{{{/{}}}}} closes {{{{#{} {}}}}} opened at line {line}, column {column}",
                            kind.name(),
                            open.kind.name(),
                            open.path
                        ),
                    ));
                }
                let node = close_block(open);
                self.sink().push(node);
            }
        }
        Ok(())
    }

    fn parse_path(&self, raw: &str, offset: usize) -> Result<Path, TemplateError> {
        match raw {
            "@index" => return Ok(Path::Loop(LoopVar::Index)),
            "@number" => return Ok(Path::Loop(LoopVar::Number)),
            "@first" => return Ok(Path::Loop(LoopVar::First)),
            "@last" => return Ok(Path::Loop(LoopVar::Last)),
            "" => return Err(self.error_at(offset, "empty placeholder")),
            _ => {}
        }

        let mut rest = raw;
        let mut up = 0;
        while let Some(r) = rest.strip_prefix("../") {
            up += 1;
            rest = r;
        }

        let mut anchored = false;
        let mut segments: Vec<String> = Vec::new();
        for (i, segment) in rest.split('.').enumerate() {
            if i == 0 && segment == "this" {
                anchored = true;
                continue;
            }
            if !is_identifier(segment) {
                return Err(self.error_at(offset, format!("invalid placeholder path '{raw}'")));
            }
            segments.push(segment.to_string());
        }

        if segments.is_empty() && !anchored {
            return Err(self.error_at(offset, format!("invalid placeholder path '{raw}'")));
        }
        Ok(Path::Field(FieldPath {
            up,
            anchored,
            segments,
        }))
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        syntax_error(self.src, offset, message)
    }
}

fn syntax_error(src: &str, offset: usize, message: impl Into<String>) -> TemplateError {
    let (line, column) = line_col(src, offset);
    TemplateError::syntax(message, line, column)
}

fn close_block(open: OpenBlock) -> Node {
    match (open.kind, open.path) {
        (BlockKind::Each, Path::Field(path)) => Node::Each(EachBlock {
            path,
            body: open.primary,
            empty: open.alternate,
            offset: open.offset,
        }),
        (kind, guard) => Node::Conditional(ConditionalBlock {
            guard,
            negate: kind == BlockKind::Unless,
            then: open.primary,
            otherwise: open.alternate,
            offset: open.offset,
        }),
    }
}

fn split_helper(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((helper, arg)) => (helper, arg.trim()),
        None => (s, ""),
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// 1-based line and column (in characters) of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}
