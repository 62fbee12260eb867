//! Statements and the scalar values substituted into them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder marker inside a statement template.
pub const PLACEHOLDER: char = '?';

/// A scalar substitution value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A query template plus its ordered substitution values.
///
/// Each `?` in `text` is matched, left to right, with one entry of `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// Number of placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        self.text.matches(PLACEHOLDER).count()
    }

    /// Whether placeholder and value counts agree.
    pub fn is_well_formed(&self) -> bool {
        self.placeholder_count() == self.values.len()
    }

    /// Substitute every value into the template, for stores that take text.
    ///
    /// Single pass: text coming from a value is never rescanned, so a value
    /// containing `?` does not consume a later placeholder. Surplus
    /// placeholders are left in place and surplus values are ignored; callers
    /// check [`Statement::is_well_formed`] first.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + self.values.len() * 8);
        let mut values = self.values.iter();

        for ch in self.text.chars() {
            if ch == PLACEHOLDER {
                if let Some(value) = values.next() {
                    out.push_str(&value.to_string());
                    continue;
                }
            }
            out.push(ch);
        }
        out
    }
}
