//! Node identifiers.
//!
//! The index is generic over any [`Key`]. [`NodeKey`] is the concrete key
//! used for JSON records, where an id is either an integer or a string.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IndexError, IndexResult};

/// Bound for types usable as node ids.
pub trait Key: Eq + Hash + Clone + fmt::Debug + fmt::Display {}

impl<T: Eq + Hash + Clone + fmt::Debug + fmt::Display> Key for T {}

/// An id read from a JSON record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    /// An integral JSON number.
    Int(i64),
    /// A JSON string.
    Str(String),
}

impl NodeKey {
    /// Parse a key from a JSON value. `null` yields `None`.
    ///
    /// `field` only labels the error.
    pub fn from_json(field: &str, value: &Value) -> IndexResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::Str(s.clone()))),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .map(|i| Some(Self::Int(i)))
                .ok_or_else(|| IndexError::InvalidKey {
                    field: field.to_string(),
                    value: value.to_string(),
                }),
            other => Err(IndexError::InvalidKey {
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Parse a key typed on a command line: integers become [`NodeKey::Int`].
    pub fn parse_lossy(s: &str) -> Self {
        s.parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Str(s.to_string()))
    }
}

/// `3.0` names the same node as `3`.
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for NodeKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
