//! Canonical scalar value representation shared between predicate trees and
//! leaf constraints.

use serde::{Deserialize, Serialize};

use crate::types::ObjRef;

/// Typed constant carried by predicate comparisons and leaf constraints.
///
/// The tagged encoding keeps the wire format unambiguous when predicate
/// trees are serialized for diagnostics or transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Null literal; only meaningful against link-typed columns ("unset").
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// Floating point literal (covers float and double columns).
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// Arbitrary binary payload.
    Bytes(Vec<u8>),
    /// Nanoseconds since Unix epoch in UTC.
    Date(i64),
    /// Reference to a row of a named entity.
    Object(ObjRef),
    /// Ordered collection; the right operand of BETWEEN and IN.
    List(Vec<Value>),
}

impl Value {
    /// Human-readable name of the value's type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "binary",
            Value::Date(_) => "date",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<ObjRef> for Value {
    fn from(value: ObjRef) -> Self {
        Value::Object(value)
    }
}
