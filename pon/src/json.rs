//! Conversion between Pon and `serde_json::Value`.
//!
//! JSON has no call or reference types, so the mapping is lossy in one
//! direction: calls become `{"_transform": name, "arg": ...}` objects (and
//! convert back), while selectors and property references become their
//! prefixed text and come back as plain strings.

use serde_json::{Map, Value};

use crate::value::{Pon, PonMap};

const TRANSFORM_KEY: &str = "_transform";
const ARG_KEY: &str = "arg";

impl Pon {
    /// Convert to a JSON value for display or interop.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Nil => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Number(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::String(v) => Value::String(v.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Call(call) => {
                let mut object = Map::new();
                object.insert(TRANSFORM_KEY.to_owned(), Value::String(call.name.clone()));
                object.insert(ARG_KEY.to_owned(), call.arg.to_json());
                Value::Object(object)
            }
            Self::Selector(_) | Self::PropRef(_) | Self::DepPropRef(_) => Value::String(self.to_string()),
        }
    }

    /// Build a value from JSON.
    ///
    /// Objects shaped exactly like `{"_transform": "<name>", "arg": ...}`
    /// become calls; every other object becomes a map.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Nil,
            Value::Bool(v) => Self::Bool(*v),
            Value::Number(v) => Self::Number(v.as_f64().unwrap_or(0.0)),
            Value::String(v) => Self::String(v.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(object) => {
                if object.len() == 2 {
                    if let (Some(Value::String(name)), Some(arg)) = (object.get(TRANSFORM_KEY), object.get(ARG_KEY)) {
                        return Self::call(name.clone(), Self::from_json(arg));
                    }
                }
                Self::Map(
                    object
                        .iter()
                        .map(|(k, v)| (k.clone(), Self::from_json(v)))
                        .collect::<PonMap>(),
                )
            }
        }
    }
}

impl From<&Pon> for Value {
    fn from(value: &Pon) -> Self {
        value.to_json()
    }
}

impl From<&Value> for Pon {
    fn from(value: &Value) -> Self {
        Pon::from_json(value)
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;
