//! Attribute values and well-known attribute names

use serde::{Deserialize, Serialize};

/// A single attribute value on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl AttrValue {
    /// Get the string form, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer form, if this is an integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean form, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<usize> for AttrValue {
    fn from(n: usize) -> Self {
        AttrValue::Int(n as i64)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Well-known attribute names
pub mod attrs {
    /// Heading level, 1 through 6
    pub const LEVEL: &str = "level";
    /// Cell column span, >= 1
    pub const COLSPAN: &str = "colspan";
    /// Cell row span, >= 1
    pub const ROWSPAN: &str = "rowspan";
    /// Cell background color (CSS color string)
    pub const BACKGROUND_COLOR: &str = "backgroundColor";
    /// Cell text color (CSS color string)
    pub const TEXT_COLOR: &str = "textColor";
    /// Image source URL
    pub const SRC: &str = "src";
    /// Image alternative text
    pub const ALT: &str = "alt";
    /// Ordered list starting number
    pub const START: &str = "start";
}
