//! Template values and the lexical scope chain used while evaluating
//! repeating sections.

use std::collections::BTreeMap;

/// A value addressable from a template.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<TemplateValue>),
    Map(BTreeMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Truthiness for `#if` / `#unless` guards.
    ///
    /// - `Null` and empty strings, lists and maps are falsy
    /// - numbers are falsy only when zero (or NaN)
    /// - booleans are themselves
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => *n != 0.0 && !n.is_nan(),
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Map(m) => !m.is_empty(),
        }
    }

    /// Whether this value should render as the empty placeholder.
    pub fn is_blank(&self) -> bool {
        match self {
            TemplateValue::Null => true,
            TemplateValue::String(s) => s.is_empty(),
            TemplateValue::List(items) => items.is_empty(),
            TemplateValue::Map(_) => true,
            TemplateValue::Bool(_) | TemplateValue::Number(_) => false,
        }
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateValue::Null => "null",
            TemplateValue::Bool(_) => "bool",
            TemplateValue::Number(_) => "number",
            TemplateValue::String(_) => "string",
            TemplateValue::List(_) => "list",
            TemplateValue::Map(_) => "map",
        }
    }

    /// Look up a field of a map value.
    pub fn field(&self, key: &str) -> Option<&TemplateValue> {
        match self {
            TemplateValue::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Follow a dotted path from this value.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&TemplateValue> {
        path.iter()
            .try_fold(self, |value, key| value.field(key.as_ref()))
    }

    /// Convert into the JSON shape used for mapped-data previews.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TemplateValue::Null => serde_json::Value::Null,
            TemplateValue::Bool(b) => serde_json::Value::Bool(*b),
            TemplateValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            TemplateValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            TemplateValue::String(s) => serde_json::Value::String(s.clone()),
            TemplateValue::List(items) => {
                serde_json::Value::Array(items.iter().map(TemplateValue::to_json).collect())
            }
            TemplateValue::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Format a number as its natural decimal string: `9`, `7.5`, `-0.25`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<f64> for TemplateValue {
    fn from(n: f64) -> Self {
        TemplateValue::Number(n)
    }
}

impl From<usize> for TemplateValue {
    fn from(n: usize) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(items: Vec<T>) -> Self {
        TemplateValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, TemplateValue>> for TemplateValue {
    fn from(m: BTreeMap<String, TemplateValue>) -> Self {
        TemplateValue::Map(m)
    }
}

impl From<&serde_json::Value> for TemplateValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(TemplateValue::Number)
                .unwrap_or(TemplateValue::Null),
            serde_json::Value::String(s) => TemplateValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.iter().map(TemplateValue::from).collect())
            }
            serde_json::Value::Object(m) => TemplateValue::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Builder for map values, keeping call sites in the mapper compact.
#[derive(Debug, Default)]
pub struct MapBuilder(BTreeMap<String, TemplateValue>);

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<TemplateValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> TemplateValue {
        TemplateValue::Map(self.0)
    }
}

// ---------------------------------------------------------------------------
// Scope chain
// ---------------------------------------------------------------------------

/// Position of the current element inside a repeating section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPosition {
    pub index: usize,
    pub len: usize,
}

/// One level of lexical scope: the root data, or one list element.
///
/// Frames borrow from the data tree and from their parent, so entering a
/// repeating section never clones the data.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    value: &'a TemplateValue,
    position: Option<LoopPosition>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn root(value: &'a TemplateValue) -> Self {
        Self {
            value,
            position: None,
            parent: None,
        }
    }

    /// Open a child scope for one element of a repeating section.
    pub fn child(&'a self, value: &'a TemplateValue, position: LoopPosition) -> Scope<'a> {
        Scope {
            value,
            position: Some(position),
            parent: Some(self),
        }
    }

    pub fn value(&self) -> &'a TemplateValue {
        self.value
    }

    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    /// Nearest enclosing loop position.
    pub fn position(&self) -> Option<LoopPosition> {
        self.position
            .or_else(|| self.parent.and_then(|p| p.position()))
    }

    /// Resolve a dotted path: the first segment is looked up in this frame,
    /// then in each ancestor, so inner names shadow outer ones.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&'a TemplateValue> {
        let (first, rest) = path.split_first()?;
        match self.value.field(first.as_ref()) {
            Some(v) => v.get_path(rest),
            None => self.parent.and_then(|p| p.lookup(path)),
        }
    }

    /// Walk `levels` frames up the chain, stopping at the root.
    pub fn ancestor(&self, levels: usize) -> &Scope<'a> {
        let mut scope = self;
        for _ in 0..levels {
            match scope.parent {
                Some(p) => scope = p,
                None => break,
            }
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TemplateValue {
        MapBuilder::new()
            .set("name", "outer")
            .set("company", "Acme")
            .set(
                "skills",
                vec![MapBuilder::new().set("name", "Rust").build()],
            )
            .build()
    }

    #[test]
    fn truthiness() {
        assert!(!TemplateValue::Null.is_truthy());
        assert!(!TemplateValue::from("").is_truthy());
        assert!(TemplateValue::from("false").is_truthy());
        assert!(!TemplateValue::Number(0.0).is_truthy());
        assert!(TemplateValue::Number(3.0).is_truthy());
        assert!(!TemplateValue::List(vec![]).is_truthy());
        assert!(TemplateValue::from(vec!["a"]).is_truthy());
        assert!(!TemplateValue::Bool(false).is_truthy());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(9.0), "9");
        assert_eq!(format_number(7.5), "7.5");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let root_value = sample();
        let root = Scope::root(&root_value);
        let skills = match root.lookup(&["skills"]) {
            Some(TemplateValue::List(items)) => items,
            other => panic!("expected list, got {other:?}"),
        };
        let child = root.child(&skills[0], LoopPosition { index: 0, len: 1 });

        assert_eq!(child.lookup(&["name"]), Some(&TemplateValue::from("Rust")));
        assert_eq!(child.lookup(&["company"]), Some(&TemplateValue::from("Acme")));
        assert_eq!(
            child.ancestor(1).lookup(&["name"]),
            Some(&TemplateValue::from("outer"))
        );
        assert_eq!(child.position(), Some(LoopPosition { index: 0, len: 1 }));
    }

    #[test]
    fn json_conversion_preserves_shape() {
        let json = serde_json::json!({"a": [1, "x", true, null], "b": {"c": 2.5}});
        let value = TemplateValue::from(&json);
        assert_eq!(value.to_json(), json);
    }
}
