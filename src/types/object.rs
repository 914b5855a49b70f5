//! JSON object adapter
//!
//! Weibo responses are loosely typed and differ between endpoints, so the
//! binder hands back a [`JsonObject`]: an ordered key-value view over the
//! parsed body with explicit accessors that return `None` for missing or
//! mistyped fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WeiboError;

/// Parsed JSON payload with typed, optional accessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonObject(Value);

impl JsonObject {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a response body.
    pub fn parse(body: &str) -> Result<Self, WeiboError> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns `true` when the payload is a JSON array.
    pub fn is_list(&self) -> bool {
        self.0.is_array()
    }

    /// Returns `true` when the payload is a JSON object containing `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Field names in response order; empty for non-object payloads.
    pub fn keys(&self) -> Vec<&str> {
        match &self.0 {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(key))
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer field. Weibo sends some identifiers as strings, which are
    /// parsed as well.
    pub fn i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Boolean field. `0`/`1` integers are accepted.
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// Nested object field.
    pub fn object(&self, key: &str) -> Option<JsonObject> {
        self.get(key)
            .filter(|v| v.is_object())
            .map(|v| JsonObject(v.clone()))
    }

    /// Array field, one [`JsonObject`] per element.
    pub fn list(&self, key: &str) -> Option<Vec<JsonObject>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().map(JsonObject).collect())
    }

    /// Elements of a list payload.
    ///
    /// A top-level array yields its elements. Otherwise the array stored
    /// under `list_key` is used, and anything else yields no elements.
    pub fn items(&self, list_key: Option<&str>) -> Vec<JsonObject> {
        match (&self.0, list_key) {
            (Value::Array(items), _) => items.iter().cloned().map(JsonObject).collect(),
            (Value::Object(_), Some(key)) => self.list(key).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Deserialize the payload into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, WeiboError> {
        Ok(T::deserialize(&self.0)?)
    }
}

impl From<Value> for JsonObject {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
