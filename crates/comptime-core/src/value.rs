//! The value model for compile-time constants
//!
//! [`ComptimeValue`] covers exactly the JSON data model: null, booleans,
//! finite numbers, strings, ordered lists and ordered string-keyed maps.
//! Anything that can be built as a `ComptimeValue` can be emitted as a
//! literal, so serializability is checked when the value is constructed
//! rather than when the module is synthesized.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

use crate::errors::ValueError;

/// Map key that an object literal treats as a prototype assignment
pub const PROTOTYPE_KEY: &str = "__proto__";

/// Largest integer magnitude a double represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// A plain data value that can be baked into a synthesized module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComptimeValue {
    Null,
    Bool(bool),
    /// Always finite. Integers beyond ±(2^53 - 1) are stored exactly but
    /// lose precision once the consuming compiler parses them as doubles.
    Number(Number),
    String(String),
    List(Vec<ComptimeValue>),
    /// Keys keep their insertion order
    Map(IndexMap<String, ComptimeValue>),
}

impl ComptimeValue {
    /// Build a value from any serde-serializable data.
    ///
    /// Struct fields and map entries keep the order the serializer
    /// produces them in. Fails when the data has no JSON representation,
    /// e.g. a map keyed by tuples or a non-finite float.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, ValueError> {
        let bytes = serde_json::to_vec(data).map_err(ValueError::Unrepresentable)?;
        serde_json::from_slice(&bytes).map_err(ValueError::Unrepresentable)
    }

    /// Build a number from a float, rejecting NaN and infinities
    pub fn float(value: f64) -> Result<Self, ValueError> {
        Number::from_f64(value)
            .map(ComptimeValue::Number)
            .ok_or(ValueError::NonFiniteNumber(value))
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ComptimeValue::Null => serde_json::Value::Null,
            ComptimeValue::Bool(b) => serde_json::Value::Bool(*b),
            ComptimeValue::Number(n) => serde_json::Value::Number(n.clone()),
            ComptimeValue::String(s) => serde_json::Value::String(s.clone()),
            ComptimeValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ComptimeValue::to_json).collect())
            }
            ComptimeValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ComptimeValue::Null => "null",
            ComptimeValue::Bool(_) => "bool",
            ComptimeValue::Number(_) => "number",
            ComptimeValue::String(_) => "string",
            ComptimeValue::List(_) => "list",
            ComptimeValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ComptimeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ComptimeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ComptimeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ComptimeValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ComptimeValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ComptimeValue]> {
        match self {
            ComptimeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ComptimeValue>> {
        match self {
            ComptimeValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&ComptimeValue> {
        self.as_map().and_then(|entries| entries.get(key))
    }

    /// True if any map, at any depth, has a `__proto__` key.
    ///
    /// In an object literal that key sets the prototype instead of creating
    /// a property, so such maps cannot be emitted faithfully.
    pub fn has_prototype_key(&self) -> bool {
        match self {
            ComptimeValue::List(items) => items.iter().any(ComptimeValue::has_prototype_key),
            ComptimeValue::Map(entries) => entries
                .iter()
                .any(|(key, value)| key == PROTOTYPE_KEY || value.has_prototype_key()),
            _ => false,
        }
    }

    /// True if any integer, at any depth, is outside the range a double
    /// represents exactly
    pub fn has_unsafe_integer(&self) -> bool {
        match self {
            ComptimeValue::Number(n) => {
                n.as_u64().is_some_and(|v| v > MAX_SAFE_INTEGER)
                    || n.as_i64().is_some_and(|v| v.unsigned_abs() > MAX_SAFE_INTEGER)
            }
            ComptimeValue::List(items) => items.iter().any(ComptimeValue::has_unsafe_integer),
            ComptimeValue::Map(entries) => entries.values().any(ComptimeValue::has_unsafe_integer),
            _ => false,
        }
    }
}

impl Default for ComptimeValue {
    fn default() -> Self {
        ComptimeValue::Null
    }
}

/// Renders the value as compact JSON
impl fmt::Display for ComptimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<bool> for ComptimeValue {
    fn from(value: bool) -> Self {
        ComptimeValue::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ComptimeValue {
                fn from(value: $ty) -> Self {
                    ComptimeValue::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl TryFrom<f64> for ComptimeValue {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ComptimeValue::float(value)
    }
}

impl TryFrom<f32> for ComptimeValue {
    type Error = ValueError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        ComptimeValue::float(f64::from(value))
    }
}

impl From<&str> for ComptimeValue {
    fn from(value: &str) -> Self {
        ComptimeValue::String(value.to_string())
    }
}

impl From<String> for ComptimeValue {
    fn from(value: String) -> Self {
        ComptimeValue::String(value)
    }
}

impl<T: Into<ComptimeValue>> From<Vec<T>> for ComptimeValue {
    fn from(items: Vec<T>) -> Self {
        ComptimeValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ComptimeValue>> From<Option<T>> for ComptimeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ComptimeValue::Null, Into::into)
    }
}

impl<T: Into<ComptimeValue>> From<IndexMap<String, T>> for ComptimeValue {
    fn from(entries: IndexMap<String, T>) -> Self {
        ComptimeValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<ComptimeValue>> FromIterator<(K, V)> for ComptimeValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ComptimeValue::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for ComptimeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ComptimeValue::Null,
            serde_json::Value::Bool(b) => ComptimeValue::Bool(b),
            serde_json::Value::Number(n) => ComptimeValue::Number(n),
            serde_json::Value::String(s) => ComptimeValue::String(s),
            serde_json::Value::Array(items) => {
                ComptimeValue::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(entries) => ComptimeValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<ComptimeValue> for serde_json::Value {
    fn from(value: ComptimeValue) -> Self {
        value.to_json()
    }
}
