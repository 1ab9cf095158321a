//! Record: the schema-less row shape shared by every table.
//!
//! The accessor has no compiled knowledge of any table's columns. A record is
//! a JSON object; only the identifier and creation timestamp fields carry
//! meaning to this crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the record identifier.
pub const ID_FIELD: &str = "id";

/// Field holding the creation timestamp (RFC 3339).
pub const CREATED_AT_FIELD: &str = "created_at";

// ─── RecordId ────────────────────────────────────────────────────────────────

/// Textual form of a record's `id` field.
///
/// Remote tables may use uuid or integer keys; both are compared as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  pub fn as_str(&self) -> &str { &self.0 }

  /// Normalise an `id` value. Only strings and numbers are identifiers.
  pub fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::String(s) => Some(Self(s.clone())),
      Value::Number(n) => Some(Self(n.to_string())),
      _ => None,
    }
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A mapping from field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
  pub fn new() -> Self { Self::default() }

  pub fn id(&self) -> Option<RecordId> {
    self.0.get(ID_FIELD).and_then(RecordId::from_value)
  }

  pub fn has_id(&self, id: &RecordId) -> bool { self.id().as_ref() == Some(id) }

  pub fn created_at(&self) -> Option<&str> {
    self.0.get(CREATED_AT_FIELD).and_then(Value::as_str)
  }

  pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.0.insert(field.into(), value.into())
  }

  pub fn remove(&mut self, field: &str) -> Option<Value> { self.0.remove(field) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

  /// Overlay every field of `other` onto `self`; `other` wins on conflict.
  pub fn merge(&mut self, other: &Record) {
    for (k, v) in &other.0 {
      self.0.insert(k.clone(), v.clone());
    }
  }

  pub fn into_inner(self) -> Map<String, Value> { self.0 }
}

impl From<Map<String, Value>> for Record {
  fn from(map: Map<String, Value>) -> Self { Self(map) }
}

impl TryFrom<Value> for Record {
  type Error = Value;

  /// Succeeds only for JSON objects; any other value is handed back.
  fn try_from(value: Value) -> Result<Self, Self::Error> {
    match value {
      Value::Object(map) => Ok(Self(map)),
      other => Err(other),
    }
  }
}

impl From<Record> for Value {
  fn from(record: Record) -> Self { Value::Object(record.0) }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn numeric_and_string_ids_compare_as_text() {
    let a: Record = [("id", json!(42))].into_iter().collect();
    let b: Record = [("id", json!("42"))].into_iter().collect();
    assert_eq!(a.id(), b.id());
    assert!(a.has_id(&RecordId::from("42")));
  }

  #[test]
  fn non_scalar_id_is_not_an_identifier() {
    let r: Record = [("id", json!({"nested": true}))].into_iter().collect();
    assert_eq!(r.id(), None);
  }

  #[test]
  fn merge_overwrites_existing_fields() {
    let mut base: Record = [("id", json!("a")), ("stock", json!(1))].into_iter().collect();
    let patch: Record = [("stock", json!(5)), ("name", json!("Gel"))].into_iter().collect();
    base.merge(&patch);
    assert_eq!(base.get("stock"), Some(&json!(5)));
    assert_eq!(base.get("name"), Some(&json!("Gel")));
    assert_eq!(base.len(), 3);
  }

  #[test]
  fn non_object_values_are_rejected() {
    assert!(Record::try_from(json!([1, 2])).is_err());
  }
}
