//! Untyped snapshot tree.
//!
//! Snapshot files have no fixed schema, so they are decoded into a small
//! tagged tree first. Accessors never panic: a lookup either yields the
//! requested shape or a [`Mismatch`] saying what went wrong, which lets the
//! flattener drop malformed entries one at a time.
use std::fmt;

use indexmap::IndexMap;
use serde_yaml::Value;

pub type Mapping = IndexMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

/// Why an accessor could not produce the requested shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Missing => write!(f, "missing"),
            Mismatch::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
        }
    }
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Integer(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Mismatch {
        Mismatch::WrongType {
            expected,
            found: self.kind(),
        }
    }

    pub fn mapping(&self) -> Result<&Mapping, Mismatch> {
        match self {
            Node::Mapping(map) => Ok(map),
            other => Err(other.mismatch("mapping")),
        }
    }

    /// Child of a mapping node.
    pub fn field(&self, key: &str) -> Result<&Node, Mismatch> {
        self.mapping()?.get(key).ok_or(Mismatch::Missing)
    }

    /// Successive `field` lookups, e.g. `["compute", "instance"]`.
    pub fn path(&self, keys: &[&str]) -> Result<&Node, Mismatch> {
        keys.iter().try_fold(self, |node, key| node.field(key))
    }

    /// Integer or finite float, widened to f64.
    pub fn number(&self) -> Result<f64, Mismatch> {
        match self {
            Node::Integer(i) => Ok(*i as f64),
            Node::Float(f) if f.is_finite() => Ok(*f),
            other => Err(other.mismatch("number")),
        }
    }

    /// Integer, or a float with no fractional part that fits in i64.
    pub fn integer(&self) -> Result<i64, Mismatch> {
        match self {
            Node::Integer(i) => Ok(*i),
            Node::Float(f)
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f < i64::MAX as f64 =>
            {
                Ok(*f as i64)
            }
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Mapping keys are kept when they are scalars; anything else cannot name a
/// machine type or region and is dropped.
fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => key_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Integer(i)
                } else {
                    // u64 above i64::MAX and real floats both land here.
                    Node::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Node::String(s),
            Value::Sequence(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    if let Some(key) = key_string(&k) {
                        out.insert(key, Node::from(v));
                    }
                }
                Node::Mapping(out)
            }
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}
