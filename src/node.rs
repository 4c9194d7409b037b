use std::fmt::{self, Write};

use serde_json::Value;

pub type NodeList<'v> = Vec<Node<'v>>;

/// One step from a value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(i) => write!(f, "[{i}]"),
            PathElement::Name(name) => {
                f.write_char('[')?;
                write_quoted(f, name)?;
                f.write_char(']')
            }
        }
    }
}

/// Write `name` as a single quoted string with normalized path escapes.
pub(crate) fn write_quoted<W: Write>(w: &mut W, name: &str) -> fmt::Result {
    w.write_char('\'')?;
    for c in name.chars() {
        match c {
            '\'' => w.write_str("\\'")?,
            '\\' => w.write_str("\\\\")?,
            '\u{8}' => w.write_str("\\b")?,
            '\u{c}' => w.write_str("\\f")?,
            '\n' => w.write_str("\\n")?,
            '\r' => w.write_str("\\r")?,
            '\t' => w.write_str("\\t")?,
            c if c < ' ' => write!(w, "\\u{:04x}", c as u32)?,
            c => w.write_char(c)?,
        }
    }
    w.write_char('\'')
}

/// A JSON value found by a query, and where it was found.
#[derive(Debug, PartialEq)]
pub struct Node<'v> {
    pub value: &'v Value,
    pub location: Vec<PathElement>,
}

impl<'v> Node<'v> {
    pub fn root(value: &'v Value) -> Self {
        Node {
            value,
            location: Vec::new(),
        }
    }

    fn child(&self, value: &'v Value, step: PathElement) -> Self {
        let mut location = Vec::with_capacity(self.location.len() + 1);
        location.extend_from_slice(&self.location);
        location.push(step);
        Node { value, location }
    }

    pub fn element(&self, value: &'v Value, index: usize) -> Self {
        self.child(value, PathElement::Index(index))
    }

    pub fn member(&self, value: &'v Value, name: &str) -> Self {
        self.child(value, PathElement::Name(name.to_owned()))
    }

    /// Array elements or object members, in document order. Scalars have none.
    pub fn children(&self) -> NodeList<'v> {
        match self.value {
            Value::Array(arr) => arr
                .iter()
                .enumerate()
                .map(|(i, v)| self.element(v, i))
                .collect(),
            Value::Object(obj) => obj.iter().map(|(k, v)| self.member(v, k)).collect(),
            _ => Vec::new(),
        }
    }

    /// The normalized path to this node's value.
    pub fn path(&self) -> String {
        self.location
            .iter()
            .fold(String::from("$"), |mut path, step| {
                let _ = write!(path, "{step}");
                path
            })
    }
}
