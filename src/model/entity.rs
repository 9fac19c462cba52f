//! Entities and key values.
//!
//! An [`Entity`] is one row from one logical table: an ordered mapping from
//! field name to a JSON scalar or null. Rows returned with an inline
//! expansion carry the expanded rows under the navigation name as a JSON
//! array of objects, exactly as the remote store returns them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of field/value pairs.
///
/// Fields are kept in a `BTreeMap` so two entities with the same content
/// compare and serialize identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entity from `(field, value)` pairs.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Convert a JSON object into an entity. Returns `None` for any other
    /// JSON shape.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.into()),
            _ => None,
        }
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// True if the field is missing or explicitly null.
    pub fn is_null(&self, field: &str) -> bool {
        self.get(field).map_or(true, Value::is_null)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The field's value as a join key, if it is usable as one.
    pub fn key_value(&self, field: &str) -> Option<KeyValue> {
        self.get(field).and_then(KeyValue::from_value)
    }

    /// Rows attached under a navigation name by an inline expansion.
    ///
    /// Missing navigations and non-object array members yield nothing; a
    /// single object (some stores return to-one expansions unwrapped) is
    /// treated as a one-element array.
    pub fn expanded(&self, navigation: &str) -> Vec<Entity> {
        match self.get(navigation) {
            Some(Value::Array(rows)) => rows
                .iter()
                .filter_map(|row| Entity::from_json(row.clone()))
                .collect(),
            Some(Value::Object(map)) => vec![map.clone().into()],
            _ => Vec::new(),
        }
    }

    /// A new entity holding exactly `fields`, with null for any field this
    /// entity does not carry.
    pub fn project(&self, fields: &[String]) -> Entity {
        Entity {
            fields: fields
                .iter()
                .map(|f| (f.clone(), self.get(f).cloned().unwrap_or(Value::Null)))
                .collect(),
        }
    }

    /// An entity with every listed field set to null.
    pub fn nulls(fields: &[String]) -> Entity {
        Entity {
            fields: fields.iter().map(|f| (f.clone(), Value::Null)).collect(),
        }
    }

    /// A copy of this entity without `field`.
    pub fn without(&self, field: &str) -> Entity {
        let mut fields = self.fields.clone();
        fields.remove(field);
        Entity { fields }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for Entity {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_json()
    }
}

/// A foreign-key value.
///
/// Only non-empty text and integers are keys. Null, missing, empty text,
/// floats, booleans, arrays and objects never identify a related row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Integer(i64),
    Text(String),
}

impl KeyValue {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Integer),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for KeyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}
