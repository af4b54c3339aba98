//! # Function Registry
//!
//! The namespace consumed by an expression evaluator: a map from name to
//! callable. Schema names map to constructors, field names to dispatch
//! chains, and anything the host adds itself to native functions.
//!
//! Every callable takes a variadic list of [`Operand`]s and returns one.
//! An evaluator only needs to look a name up and thread operands through:
//!
//! ```text
//! (S (URL "x") (List 1 2))
//!     │          └─ call "List" [1, 2]   -> Step
//!     └─ call "URL" ["x"]                -> Step
//! call "S" [Step, Step]                  -> Value::Record
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use fieldfn_core::{CallError, FieldFnError, FieldType, RegistrationError, Schema, Value};

use crate::constructor::Constructor;
use crate::dispatch::DispatchChain;
use crate::registrar;
use crate::setter::ApplyStep;

/// Argument to, and result of, a registry function.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A plain value.
    Value(Value),
    /// A deferred field assignment produced by a setter function.
    Step(ApplyStep),
}

impl Operand {
    /// Wrap anything convertible to a value.
    pub fn value(v: impl Into<Value>) -> Self {
        Operand::Value(v.into())
    }

    /// The value, if this is one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Operand::Value(v) => Some(v),
            Operand::Step(_) => None,
        }
    }

    /// The apply step, if this is one.
    pub fn into_step(self) -> Option<ApplyStep> {
        match self {
            Operand::Step(s) => Some(s),
            Operand::Value(_) => None,
        }
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<ApplyStep> for Operand {
    fn from(s: ApplyStep) -> Self {
        Operand::Step(s)
    }
}

/// A function supplied by the host rather than synthesized from a schema.
pub type NativeFn = Arc<dyn Fn(Vec<Operand>) -> Result<Operand, CallError> + Send + Sync>;

/// A registry entry.
#[derive(Clone)]
pub enum Entry {
    /// Builds a record of one schema.
    Constructor(Arc<Constructor>),
    /// Field setter shared by every schema with a field of this name.
    Setter(Arc<DispatchChain>),
    /// Host function.
    Native(NativeFn),
}

impl Entry {
    /// Invoke the entry.
    pub fn call(&self, name: &str, args: Vec<Operand>) -> Result<Operand, CallError> {
        match self {
            Entry::Constructor(c) => c.call(args),
            Entry::Setter(chain) => chain.call(args).map(Operand::Step),
            Entry::Native(f) => f(args).map_err(|e| match e {
                CallError::Native { .. } => e,
                other => CallError::Native {
                    name: name.to_string(),
                    message: other.to_string(),
                },
            }),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Constructor(c) => f.debug_tuple("Constructor").field(&c.schema().name()).finish(),
            Entry::Setter(chain) => f
                .debug_tuple("Setter")
                .field(&chain.field())
                .field(&chain.links().len())
                .finish(),
            Entry::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// Name-to-callable namespace.
///
/// Cloning is cheap: entries are reference counted and immutable.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` and everything it contains. On error the registry
    /// is unchanged.
    pub fn register(&mut self, schema: &Arc<Schema>) -> Result<(), RegistrationError> {
        registrar::register(schema, self)
    }

    /// Register a root type, which must be a record.
    pub fn register_type(&mut self, ty: &FieldType) -> Result<(), RegistrationError> {
        registrar::register_type(ty, self)
    }

    /// Bind a host function, replacing any previous binding.
    pub fn insert_native<F>(&mut self, name: impl Into<String>, f: F) -> Option<Entry>
    where
        F: Fn(Vec<Operand>) -> Result<Operand, CallError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Entry::Native(Arc::new(f)))
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, entry: Entry) {
        self.entries.insert(name.into(), entry);
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Call the function bound to `name`.
    pub fn call(&self, name: &str, args: Vec<Operand>) -> Result<Operand, CallError> {
        let entry = self.get(name).ok_or_else(|| CallError::UnknownFunction {
            name: name.to_string(),
        })?;
        entry.call(name, args)
    }

    /// Call `name` and decode the resulting value into a concrete type.
    pub fn construct<T: DeserializeOwned>(&self, name: &str, args: Vec<Operand>) -> Result<T, FieldFnError> {
        match self.call(name, args)? {
            Operand::Value(Value::Record(record)) => Ok(record.decode()?),
            Operand::Value(other) => Ok(serde_json::from_value(serde_json::to_value(&other)?)?),
            Operand::Step(step) => Err(FieldFnError::NotAValue {
                name: step.field().to_string(),
            }),
        }
    }
}
