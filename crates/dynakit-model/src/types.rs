//! Shared logical-layer types: literal values and traversal direction.

use std::fmt;

use crate::attr_value::AttrValue;

/// A caller-side literal used in predicates.
///
/// The variant is chosen at the call site by the caller's static type, and it
/// alone decides the wire encoding; there is no runtime inspection of
/// dynamic values anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal.
    Str(String),
    /// Numeric literal.
    Num(f64),
    /// Boolean literal.
    Bool(bool),
    /// Null literal.
    Null,
}

impl Literal {
    /// Converts this literal into its wire encoding.
    #[must_use]
    pub fn to_attr(&self) -> AttrValue {
        match self {
            Self::Str(s) => AttrValue::S(s.clone()),
            Self::Num(n) => AttrValue::N(n.to_string()),
            Self::Bool(b) => AttrValue::Bool(*b),
            Self::Null => AttrValue::Null(true),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Num(f64::from(n))
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Traversal direction for a page of results.
///
/// `Forward` maps to the store's ascending sort order, `Backward` to
/// descending. The direction only selects the physical sort order of the
/// request; page derivation is direction-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending sort-key order.
    #[default]
    Forward,
    /// Descending sort-key order.
    Backward,
}

impl Direction {
    /// Returns `true` for the ascending direction.
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}
