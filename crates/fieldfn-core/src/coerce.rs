//! # Value Coercion
//!
//! Converts a devirtualized call-site argument into the exact static type
//! of the field it will be stored in. Only lossless conversions between
//! compatible scalars are performed: integers widen to floats, and floats
//! with no fractional part narrow to integers.

use std::collections::BTreeMap;

use crate::error::CoercionError;
use crate::types::FieldType;
use crate::value::Value;

/// Coerce `value` to `ty`.
pub fn coerce(value: Value, ty: &FieldType) -> Result<Value, CoercionError> {
    let value = value.devirt();
    match (ty, value) {
        (FieldType::Named(n), v) => coerce(v, &n.base),
        (FieldType::Any, v) => Ok(v),
        (FieldType::Bool, v @ Value::Bool(_)) => Ok(v),
        (FieldType::Int, v @ Value::Int(_)) => Ok(v),
        (FieldType::Int, Value::Float(x)) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
            Ok(Value::Int(x as i64))
        }
        (FieldType::Float, v @ Value::Float(_)) => Ok(v),
        (FieldType::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (FieldType::Str, v @ Value::Str(_)) => Ok(v),
        (FieldType::Seq(_), Value::Nil) | (FieldType::Map(_, _), Value::Nil) => Ok(Value::Nil),
        (FieldType::Seq(elem), Value::List(items)) => items
            .into_iter()
            .map(|item| coerce(item, elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (FieldType::Map(k, v), Value::Map(entries)) => coerce_entries(entries, k, v).map(Value::Map),
        (FieldType::Record(schema), Value::Record(r)) if r.type_id() == schema.id() => Ok(Value::Record(r)),
        (ty, v) => Err(mismatch(ty, &v)),
    }
}

/// Coerce every entry of a map to the given key and value types.
pub fn coerce_entries(
    entries: BTreeMap<Value, Value>,
    key: &FieldType,
    value: &FieldType,
) -> Result<BTreeMap<Value, Value>, CoercionError> {
    entries
        .into_iter()
        .map(|(k, v)| Ok((coerce(k, key)?, coerce(v, value)?)))
        .collect()
}

/// Whether a sequence argument should be spliced into a sequence of
/// `elem` rather than appended as a single element.
pub fn is_splice_candidate(value: &Value, elem: &FieldType) -> bool {
    matches!(value.concrete(), Value::List(_)) && !matches!(elem.underlying(), FieldType::Seq(_))
}

fn mismatch(ty: &FieldType, found: &Value) -> CoercionError {
    CoercionError {
        expected: ty.to_string(),
        found: found.kind_name(),
    }
}
