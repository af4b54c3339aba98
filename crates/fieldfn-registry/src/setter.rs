//! # Field Setters
//!
//! One [`FieldSetter`] is produced per registered field, chosen by the
//! field's [`FieldKind`]:
//!
//! | Kind | Behavior |
//! |---|---|
//! | scalar, nested record | replace; zero args means `true` for booleans |
//! | sequence | append; a list argument is spliced |
//! | keyed map | allocate lazily, then merge a map argument or key/value pairs |
//! | custom hook | run the type's `Set` hook on a fresh zero value, store the result |
//!
//! Calling a setter function does not mutate anything. It yields an
//! [`ApplyStep`] that a constructor later feeds a target record.

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldfn_core::{
    coerce, coerce_entries, is_splice_candidate, CallError, CoercionError, Field, FieldKind,
    FieldType, Method, NamedType, Record, RegistrationError, Value,
};

use crate::dispatch::DispatchChain;
use crate::required::RequiredSet;

/// Mutation logic for one field of one schema.
#[derive(Debug, Clone)]
pub enum FieldSetter {
    /// Replace the field value.
    Scalar {
        /// Field name.
        field: String,
        /// Field type.
        ty: FieldType,
    },
    /// Append to the sequence.
    Sequence {
        /// Field name.
        field: String,
        /// Element type.
        elem: FieldType,
    },
    /// Merge into the map.
    Map {
        /// Field name.
        field: String,
        /// Key type.
        key: FieldType,
        /// Value type.
        value: FieldType,
    },
    /// Delegate to the named type's mutator hook.
    Hook {
        /// Field name.
        field: String,
        /// Field type.
        ty: FieldType,
        /// The named type exposing the hook.
        named: Arc<NamedType>,
        /// The validated hook.
        hook: Method,
    },
}

impl FieldSetter {
    /// Build the setter for `field`, validating any mutator hook.
    pub fn for_field(field: &Field) -> Result<Self, RegistrationError> {
        let name = field.name.clone();
        if let FieldType::Named(named) = &field.ty {
            if let Some(hook) = named.mutator_hook(&field.name)? {
                return Ok(FieldSetter::Hook {
                    field: name,
                    ty: field.ty.clone(),
                    named: Arc::clone(named),
                    hook: hook.clone(),
                });
            }
        }
        Ok(match (field.ty.kind(), field.ty.underlying()) {
            (FieldKind::Sequence, FieldType::Seq(elem)) => FieldSetter::Sequence {
                field: name,
                elem: (**elem).clone(),
            },
            (FieldKind::KeyedMap, FieldType::Map(key, value)) => FieldSetter::Map {
                field: name,
                key: (**key).clone(),
                value: (**value).clone(),
            },
            _ => FieldSetter::Scalar {
                field: name,
                ty: field.ty.clone(),
            },
        })
    }

    /// The field this setter writes.
    pub fn field(&self) -> &str {
        match self {
            FieldSetter::Scalar { field, .. }
            | FieldSetter::Sequence { field, .. }
            | FieldSetter::Map { field, .. }
            | FieldSetter::Hook { field, .. } => field,
        }
    }

    /// Write `args` into `slot`.
    pub fn apply(&self, slot: &mut Value, args: Vec<Value>) -> Result<(), CallError> {
        match self {
            FieldSetter::Scalar { ty, .. } => {
                let got = args.len();
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (None, _) if ty.is_bool() => *slot = Value::Bool(true),
                    (Some(arg), None) => *slot = coerce(arg, ty).map_err(|e| self.coercion(e))?,
                    _ => {
                        return Err(CallError::WrongArgCount {
                            field: self.field().to_string(),
                            expected: 1,
                            got,
                        })
                    }
                }
            }
            FieldSetter::Sequence { elem, .. } => {
                if args.is_empty() {
                    return Ok(());
                }
                let mut items = match slot {
                    Value::List(items) => std::mem::take(items),
                    _ => Vec::new(),
                };
                for arg in args {
                    let arg = arg.devirt();
                    if is_splice_candidate(&arg, elem) {
                        if let Value::List(spliced) = arg {
                            for item in spliced {
                                items.push(coerce(item, elem).map_err(|e| self.coercion(e))?);
                            }
                        }
                    } else {
                        items.push(coerce(arg, elem).map_err(|e| self.coercion(e))?);
                    }
                }
                *slot = Value::List(items);
            }
            FieldSetter::Map { key, value, .. } => {
                let mut entries = match slot {
                    Value::Map(entries) => std::mem::take(entries),
                    _ => BTreeMap::new(),
                };
                let single_map = args.len() == 1 && matches!(args[0].concrete(), Value::Map(_));
                if single_map {
                    if let Some(Value::Map(merged)) = args.into_iter().next().map(Value::devirt) {
                        let merged = coerce_entries(merged, key, value).map_err(|e| self.coercion(e))?;
                        entries.extend(merged);
                    }
                } else if args.len() % 2 != 0 {
                    return Err(CallError::OddMapArgs {
                        field: self.field().to_string(),
                        got: args.len(),
                    });
                } else {
                    let mut args = args.into_iter();
                    while let (Some(k), Some(v)) = (args.next(), args.next()) {
                        let k = coerce(k, key).map_err(|e| self.coercion(e))?;
                        let v = coerce(v, value).map_err(|e| self.coercion(e))?;
                        entries.insert(k, v);
                    }
                }
                *slot = Value::Map(entries);
            }
            FieldSetter::Hook { ty, named, hook, .. } => {
                let mut receiver = named.base.zero();
                let args: Vec<Value> = args.into_iter().map(Value::devirt).collect();
                (hook.body)(&mut receiver, &args)?;
                *slot = coerce(receiver, ty).map_err(|e| self.coercion(e))?;
            }
        }
        Ok(())
    }

    fn coercion(&self, source: CoercionError) -> CallError {
        CallError::Coercion {
            field: self.field().to_string(),
            source,
        }
    }
}

// ─── Apply Steps ─────────────────────────────────────────────────────

/// A deferred field assignment: the result of calling a setter function.
///
/// Holds the call-site arguments and the dispatch chain for the field name.
/// The concrete setter is chosen only when the step meets its target, by
/// the target's runtime type.
#[derive(Debug, Clone)]
pub struct ApplyStep {
    chain: Arc<DispatchChain>,
    args: Vec<Value>,
}

impl ApplyStep {
    pub(crate) fn new(chain: Arc<DispatchChain>, args: Vec<Value>) -> Self {
        Self { chain, args }
    }

    /// The field name this step assigns.
    pub fn field(&self) -> &str {
        self.chain.field()
    }

    /// The captured call-site arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Presence phase: record that this field was supplied.
    pub fn mark_present(&self, required: &mut RequiredSet) {
        required.mark_present(self.field());
    }

    /// Apply phase: mutate `target`.
    pub fn apply(self, target: &mut Record) -> Result<(), CallError> {
        let Some(setter) = self.chain.resolve(target.type_id()) else {
            return Err(unknown_field(self.chain.field(), target));
        };
        match target.field_mut(setter.field()) {
            Some(slot) => setter.apply(slot, self.args),
            None => Err(unknown_field(self.chain.field(), target)),
        }
    }
}

fn unknown_field(field: &str, target: &Record) -> CallError {
    CallError::UnknownField {
        field: field.to_string(),
        record: target.type_id().name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldfn_core::{Receiver, MUTATOR_HOOK};

    fn setter(ty: FieldType) -> FieldSetter {
        FieldSetter::for_field(&Field::new("F", ty)).unwrap()
    }

    fn run(s: &FieldSetter, calls: Vec<Vec<Value>>) -> Result<Value, CallError> {
        let mut slot = match s {
            FieldSetter::Scalar { ty, .. } | FieldSetter::Hook { ty, .. } => ty.zero(),
            _ => Value::Nil,
        };
        for args in calls {
            s.apply(&mut slot, args)?;
        }
        Ok(slot)
    }

    fn zed() -> Arc<NamedType> {
        Arc::new(
            NamedType::new("Z", FieldType::Str).with_method(Method::by_ref(MUTATOR_HOOK, |recv, args| {
                let suffix = match args {
                    [Value::Str(s)] => s.clone(),
                    _ => {
                        return Err(CallError::Hook {
                            type_name: "Z".to_string(),
                            message: "want one string".to_string(),
                        })
                    }
                };
                *recv = Value::Str(format!("z{suffix}"));
                Ok(())
            })),
        )
    }

    #[test]
    fn test_kind_selects_setter() {
        assert!(matches!(setter(FieldType::Int), FieldSetter::Scalar { .. }));
        assert!(matches!(setter(FieldType::seq(FieldType::Int)), FieldSetter::Sequence { .. }));
        assert!(matches!(
            setter(FieldType::map(FieldType::Str, FieldType::Int)),
            FieldSetter::Map { .. }
        ));
        assert!(matches!(setter(FieldType::named(zed())), FieldSetter::Hook { .. }));
    }

    #[test]
    fn test_bool_shortcut() {
        assert_eq!(run(&setter(FieldType::Bool), vec![vec![]]), Ok(Value::Bool(true)));
        assert_eq!(
            run(&setter(FieldType::Bool), vec![vec![Value::Bool(false)]]),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_scalar_wrong_arg_count() {
        let err = run(&setter(FieldType::Int), vec![vec![]]).unwrap_err();
        assert!(matches!(err, CallError::WrongArgCount { got: 0, .. }));
        let err = run(&setter(FieldType::Int), vec![vec![1.into(), 2.into()]]).unwrap_err();
        assert!(err.to_string().contains("wrong number of args"));
    }

    #[test]
    fn test_scalar_replaces() {
        let got = run(&setter(FieldType::Str), vec![vec!["a".into()], vec!["b".into()]]);
        assert_eq!(got, Ok(Value::from("b")));
    }

    #[test]
    fn test_sequence_appends_and_splices() {
        let s = setter(FieldType::seq(FieldType::Int));
        let got = run(&s, vec![vec![1.into(), 2.into(), 3.into()], vec![4.into()]]);
        assert_eq!(got, Ok(Value::from(vec![1, 2, 3, 4])));

        let ints = Value::dynamic(Value::from(vec![1, 2, 3]));
        let got = run(&s, vec![vec![0.into(), ints.clone(), 4.into(), ints]]);
        assert_eq!(got, Ok(Value::from(vec![0, 1, 2, 3, 4, 1, 2, 3])));
    }

    #[test]
    fn test_sequence_of_sequences_appends_lists_whole() {
        let s = setter(FieldType::seq(FieldType::seq(FieldType::Int)));
        let got = run(&s, vec![vec![Value::from(vec![1, 2])]]);
        assert_eq!(got, Ok(Value::List(vec![Value::from(vec![1, 2])])));
    }

    #[test]
    fn test_empty_sequence_call_leaves_nil() {
        let s = setter(FieldType::seq(FieldType::Int));
        assert_eq!(run(&s, vec![vec![]]), Ok(Value::Nil));
    }

    #[test]
    fn test_map_pairs_accumulate() {
        let s = setter(FieldType::map(FieldType::Str, FieldType::Int));
        let got = run(&s, vec![vec!["a".into(), 1.into()], vec!["b".into(), 2.into()]]).unwrap();
        let mut want = BTreeMap::new();
        want.insert(Value::from("a"), Value::Int(1));
        want.insert(Value::from("b"), Value::Int(2));
        assert_eq!(got, Value::Map(want));
    }

    #[test]
    fn test_map_zero_args_allocates() {
        let s = setter(FieldType::map(FieldType::Str, FieldType::Int));
        assert_eq!(run(&s, vec![vec![]]), Ok(Value::Map(BTreeMap::new())));
    }

    #[test]
    fn test_map_odd_args() {
        let s = setter(FieldType::map(FieldType::Str, FieldType::Int));
        let err = run(&s, vec![vec!["a".into(), 1.into(), "b".into()]]).unwrap_err();
        assert_eq!(err, CallError::OddMapArgs { field: "F".to_string(), got: 3 });
    }

    #[test]
    fn test_map_merges_compatible_map() {
        let s = setter(FieldType::map(FieldType::Str, FieldType::Any));
        let mut given = BTreeMap::new();
        given.insert(Value::from("A"), Value::Int(1));
        given.insert(Value::from("B"), Value::Int(2));
        let got = run(&s, vec![vec![Value::dynamic(Value::Map(given.clone()))]]);
        assert_eq!(got, Ok(Value::Map(given)));
    }

    #[test]
    fn test_hook_transforms_argument() {
        let s = setter(FieldType::named(zed()));
        assert_eq!(run(&s, vec![vec![Value::dynamic("hello")]]), Ok(Value::from("zhello")));
    }

    #[test]
    fn test_hook_errors_propagate() {
        let s = setter(FieldType::named(zed()));
        assert!(matches!(run(&s, vec![vec![]]), Err(CallError::Hook { .. })));
    }

    #[test]
    fn test_invalid_hook_rejected_at_build() {
        let bad = NamedType::new("Y", FieldType::Int)
            .with_method(Method::new(MUTATOR_HOOK, Receiver::Value, 0, |_, _| Ok(Vec::new())));
        let err = FieldSetter::for_field(&Field::new("F", FieldType::named(Arc::new(bad)))).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidHook { .. }));
    }
}
