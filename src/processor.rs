//! Template processor – evaluates a parsed [`Template`] against a value tree.
//!
//! The processor holds configuration only. Every call brings its own template
//! and data, so one instance can be shared freely between threads.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::error::TemplateError;
use crate::mapper::MappedEmployeeData;
use crate::template::{
    ConditionalBlock, EachBlock, FieldPath, LoopVar, Node, Path, Placeholder, Template,
};
use crate::value::{format_number, LoopPosition, Scope, TemplateValue};

/// Output formatting options.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOptions {
    /// Log every resolution step at `debug` level. Output is unaffected.
    pub debug: bool,
    /// HTML-escape `{{ }}` placeholders. `{{{ }}}` is never escaped.
    pub escape_html: bool,
    pub true_text: String,
    pub false_text: String,
    /// Rendered for missing paths and empty values.
    pub empty_placeholder: String,
    /// Joins scalar list elements rendered through a placeholder.
    pub list_separator: String,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            debug: false,
            escape_html: true,
            true_text: "Yes".to_string(),
            false_text: "No".to_string(),
            empty_placeholder: String::new(),
            list_separator: ", ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateProcessor {
    options: ProcessorOptions,
}

impl TemplateProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Parse `template` and render it against mapped employee data.
    pub fn process(
        &self,
        template: &str,
        data: &MappedEmployeeData,
    ) -> Result<String, TemplateError> {
        self.process_value(template, &data.to_value())
    }

    /// Parse `template` and render it against an arbitrary value tree.
    pub fn process_value(
        &self,
        template: &str,
        data: &TemplateValue,
    ) -> Result<String, TemplateError> {
        let parsed = Template::parse(template)?;
        Ok(self.render(&parsed, data))
    }

    /// Render an already-parsed template. Cannot fail: every syntax problem
    /// was rejected by the parser and every lookup has a defined fallback.
    pub fn render(&self, template: &Template, data: &TemplateValue) -> String {
        let mut out = String::new();
        let root = Scope::root(data);
        self.render_nodes(template.nodes(), &root, &mut out);
        out
    }

    fn render_nodes(&self, nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Placeholder(p) => self.render_placeholder(p, scope, out),
                Node::Each(each) => self.render_each(each, scope, out),
                Node::Conditional(cond) => self.render_conditional(cond, scope, out),
            }
        }
    }

    fn render_placeholder(&self, p: &Placeholder, scope: &Scope<'_>, out: &mut String) {
        let resolved = resolve(&p.path, scope);
        let text = match &resolved {
            Some(value) => self.format_value(value),
            None => self.options.empty_placeholder.clone(),
        };
        if self.options.debug {
            log::debug!(
                "placeholder {} at byte {} -> {} {:?}",
                p.path,
                p.offset,
                resolved.as_ref().map_or("missing", |v| v.kind()),
                text
            );
        }
        if p.escape && self.options.escape_html {
            escape_html_into(&text, out);
        } else {
            out.push_str(&text);
        }
    }

    fn render_each(&self, each: &EachBlock, scope: &Scope<'_>, out: &mut String) {
        let resolved = resolve_field(&each.path, scope);
        let items: &[TemplateValue] = match resolved {
            Some(TemplateValue::List(items)) => items,
            // A single truthy value is iterated once, like a one-element list.
            Some(value) if value.is_truthy() => std::slice::from_ref(value),
            _ => &[],
        };

        if self.options.debug {
            log::debug!(
                "each {} at byte {} -> {} item(s)",
                each.path,
                each.offset,
                items.len()
            );
        }

        if items.is_empty() {
            if let Some(empty) = &each.empty {
                self.render_nodes(empty, scope, out);
            }
            return;
        }

        let len = items.len();
        for (index, item) in items.iter().enumerate() {
            let child = scope.child(item, LoopPosition { index, len });
            self.render_nodes(&each.body, &child, out);
        }
    }

    fn render_conditional(&self, cond: &ConditionalBlock, scope: &Scope<'_>, out: &mut String) {
        let truthy = resolve(&cond.guard, scope).is_some_and(|v| v.is_truthy());
        let take_then = truthy != cond.negate;

        if self.options.debug {
            log::debug!(
                "{} {} at byte {} -> {}",
                if cond.negate { "unless" } else { "if" },
                cond.guard,
                cond.offset,
                if take_then { "render" } else { "skip" }
            );
        }

        if take_then {
            self.render_nodes(&cond.then, scope, out);
        } else if let Some(otherwise) = &cond.otherwise {
            self.render_nodes(otherwise, scope, out);
        }
    }

    /// String form of a resolved value.
    fn format_value(&self, value: &TemplateValue) -> String {
        match value {
            TemplateValue::Null | TemplateValue::Map(_) => self.options.empty_placeholder.clone(),
            TemplateValue::String(s) if s.is_empty() => self.options.empty_placeholder.clone(),
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Number(n) => format_number(*n),
            TemplateValue::Bool(true) => self.options.true_text.clone(),
            TemplateValue::Bool(false) => self.options.false_text.clone(),
            TemplateValue::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_blank())
                    .map(|v| self.format_value(v))
                    .collect();
                if parts.is_empty() {
                    self.options.empty_placeholder.clone()
                } else {
                    parts.join(&self.options.list_separator)
                }
            }
        }
    }
}

/// The value a path refers to, if any.
///
/// Loop variables are computed from the nearest enclosing loop. Outside a
/// loop they are missing.
fn resolve<'a>(path: &Path, scope: &Scope<'a>) -> Option<Cow<'a, TemplateValue>> {
    match path {
        Path::Field(field) => resolve_field(field, scope).map(Cow::Borrowed),
        Path::Loop(var) => {
            let pos = scope.position()?;
            Some(Cow::Owned(match var {
                LoopVar::Index => TemplateValue::from(pos.index),
                LoopVar::Number => TemplateValue::from(pos.index + 1),
                LoopVar::First => TemplateValue::Bool(pos.index == 0),
                LoopVar::Last => TemplateValue::Bool(pos.index + 1 == pos.len),
            }))
        }
    }
}

fn resolve_field<'a>(path: &FieldPath, scope: &Scope<'a>) -> Option<&'a TemplateValue> {
    let scope = scope.ancestor(path.up);
    if path.anchored {
        scope.value().get_path(path.segments.as_slice())
    } else {
        scope.lookup(path.segments.as_slice())
    }
}

/// Append `text` with `& < > " '` escaped.
pub fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_html_into(text, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Live preview
// ---------------------------------------------------------------------------

/// Caller-owned preview state for templates edited interactively.
///
/// A failed update keeps the previous good output, so an editor can keep
/// showing it next to the error instead of half-rendered markup.
#[derive(Debug, Default)]
pub struct LivePreview {
    output: Option<String>,
    error: Option<TemplateError>,
    revisions: usize,
}

impl LivePreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reprocess `template`. On success the new output replaces the old one.
    pub fn update(
        &mut self,
        processor: &TemplateProcessor,
        template: &str,
        data: &TemplateValue,
    ) -> Result<&str, TemplateError> {
        match processor.process_value(template, data) {
            Ok(html) => {
                self.revisions += 1;
                self.error = None;
                Ok(self.output.insert(html).as_str())
            }
            Err(e) => {
                log::debug!("preview kept revision {}: {e}", self.revisions);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Last successfully processed output.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&TemplateError> {
        self.error.as_ref()
    }

    /// Number of successful updates so far.
    pub fn revisions(&self) -> usize {
        self.revisions
    }

    /// Short status line for an editor status bar.
    pub fn status(&self) -> String {
        let mut s = String::new();
        match (&self.error, self.revisions) {
            (Some(e), 0) => {
                let _ = write!(s, "error: {e}");
            }
            (Some(e), n) => {
                let _ = write!(s, "error: {e} (showing revision {n})");
            }
            (None, n) => {
                let _ = write!(s, "ok (revision {n})");
            }
        }
        s
    }
}
