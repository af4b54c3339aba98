//! # Dynamic Values
//!
//! The value model threaded between an expression evaluator and the
//! registry. Call-site arguments, finished records, and field contents are
//! all `Value`s.
//!
//! ## Loosely-Typed Slots
//!
//! An evaluator that reads data out of a heterogeneous context (a map of
//! `any`) hands values over wrapped in [`Value::Dyn`]. Such a value must be
//! devirtualized before any type comparison, so that map/sequence
//! compatibility checks and dispatch type guards see the concrete value.
//!
//! ## Ordering
//!
//! `Value` is totally ordered so that any value, records included, can key
//! a map. Floats compare with `f64::total_cmp`; values of different variants
//! compare by variant rank. Equality is derived from the same order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::types::SchemaId;

/// A dynamically-typed value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value; also the unallocated state of sequences and maps.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Keyed map.
    Map(BTreeMap<Value, Value>),
    /// A populated record instance.
    Record(Record),
    /// A value arriving through a loosely-typed slot.
    Dyn(Box<Value>),
}

impl Value {
    /// Wrap a value in a loosely-typed slot.
    pub fn dynamic(value: impl Into<Value>) -> Self {
        Value::Dyn(Box::new(value.into()))
    }

    /// Unwrap loosely-typed slots until a concrete value remains.
    pub fn devirt(self) -> Value {
        let mut v = self;
        while let Value::Dyn(inner) = v {
            v = *inner;
        }
        v
    }

    /// Borrowing form of [`Value::devirt`].
    pub fn concrete(&self) -> &Value {
        let mut v = self;
        while let Value::Dyn(inner) = v {
            v = inner;
        }
        v
    }

    /// Short runtime type name, used in error messages.
    pub fn kind_name(&self) -> String {
        match self.concrete() {
            Value::Nil => "nil".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Record(r) => r.type_id().name().to_string(),
            Value::Dyn(_) => "dyn".to_string(),
        }
    }

    /// Returns the record, if this value (after devirtualization) is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self.concrete() {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Returns true for [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self.concrete(), Value::Nil)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Str(_) => 4,
            Value::List(_) => 5,
            Value::Map(_) => 6,
            Value::Record(_) => 7,
            Value::Dyn(_) => 8,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            (Value::Dyn(a), Value::Dyn(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Record(r) => r.serialize(serializer),
            Value::Dyn(inner) => inner.serialize(serializer),
        }
    }
}

// ─── Record ──────────────────────────────────────────────────────────

/// A record instance produced by a constructor.
///
/// Carries the identity of the schema that produced it; dispatch chains
/// compare this identity to route a shared field name to the right setter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Record {
    type_id: SchemaId,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with the given identity and initial field values.
    pub fn new(type_id: SchemaId, fields: BTreeMap<String, Value>) -> Self {
        Self { type_id, fields }
    }

    /// The identity of the schema that produced this record.
    pub fn type_id(&self) -> &SchemaId {
        &self.type_id
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Mutable access to a field slot.
    pub fn field_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Consume the record and return its fields.
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    /// Convert into a concrete Rust type by way of its serialized form.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let json = serde_json::to_value(self)?;
        serde_json::from_value(json)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devirt_unwraps_nested_slots() {
        let v = Value::dynamic(Value::dynamic(7));
        assert_eq!(v.devirt(), Value::Int(7));
    }

    #[test]
    fn test_kind_name_sees_through_dyn() {
        assert_eq!(Value::dynamic("a").kind_name(), "string");
        assert_eq!(Value::Nil.kind_name(), "nil");
    }

    #[test]
    fn test_float_ordering_is_total() {
        let mut m = BTreeMap::new();
        m.insert(Value::Float(f64::NAN), Value::Int(1));
        m.insert(Value::Float(1.5), Value::Int(2));
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&Value::Float(f64::NAN)), Some(&Value::Int(1)));
    }

    #[test]
    fn test_variants_of_different_kind_are_unequal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Nil, Value::List(vec![]));
    }

    #[test]
    fn test_serialize_list_and_map() {
        let mut m = BTreeMap::new();
        m.insert(Value::from("a"), Value::from(vec![1, 2]));
        let json = serde_json::to_value(Value::Map(m)).unwrap();
        assert_eq!(json, serde_json::json!({"a": [1, 2]}));
    }
}
