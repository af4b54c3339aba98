//! # Type Model
//!
//! Describes record types ("schemas") and the types of their fields. The
//! registry walks these descriptions to synthesize constructors and
//! setters; coercion consults them to convert call-site arguments.
//!
//! ## Identity
//!
//! Every [`Schema`] carries a [`SchemaId`]: its name plus a SHA-256 digest
//! of its structural signature. Two schemas produce the same record type
//! if and only if their ids are equal. Dispatch chains and collision checks
//! compare ids, never names alone.
//!
//! ## Named Types and Hooks
//!
//! A [`NamedType`] gives a base type a name and a method table. A method
//! named [`MUTATOR_HOOK`] bound by reference turns a field of that type into
//! a custom-hook field: its setter runs the hook instead of storing the
//! argument directly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::{CallError, RegistrationError};
use crate::value::{Record, Value};

/// Name of the method that acts as a custom field mutator.
pub const MUTATOR_HOOK: &str = "Set";

// ─── Schema Identity ─────────────────────────────────────────────────

/// Identity of a record type: its name plus a structural digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId {
    name: String,
    digest: [u8; 32],
}

impl SchemaId {
    /// The schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw structural digest.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Render the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ─── Field Types ─────────────────────────────────────────────────────

/// The static type of a record field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    Str,
    /// Accepts any value.
    Any,
    /// Sequence of the element type.
    Seq(Box<FieldType>),
    /// Map from key type to value type.
    Map(Box<FieldType>, Box<FieldType>),
    /// Nested record.
    Record(Arc<Schema>),
    /// User-named type with a method table.
    Named(Arc<NamedType>),
}

/// How a field's setter behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Replace the value.
    Scalar,
    /// Append or splice.
    Sequence,
    /// Merge entries.
    KeyedMap,
    /// Replace with a record built by a nested constructor.
    NestedRecord,
    /// Delegate to the type's mutator hook.
    CustomHook,
}

impl FieldType {
    /// Sequence of `elem`.
    pub fn seq(elem: FieldType) -> Self {
        FieldType::Seq(Box::new(elem))
    }

    /// Map from `key` to `value`.
    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(Box::new(key), Box::new(value))
    }

    /// Nested record of `schema`.
    pub fn record(schema: Arc<Schema>) -> Self {
        FieldType::Record(schema)
    }

    /// Field of the named type.
    pub fn named(named: Arc<NamedType>) -> Self {
        FieldType::Named(named)
    }

    /// Setter behavior for a field of this type.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldType::Seq(_) => FieldKind::Sequence,
            FieldType::Map(_, _) => FieldKind::KeyedMap,
            FieldType::Record(_) => FieldKind::NestedRecord,
            FieldType::Named(n) if n.method(MUTATOR_HOOK).is_some() => FieldKind::CustomHook,
            FieldType::Named(n) => n.base.kind(),
            _ => FieldKind::Scalar,
        }
    }

    /// The type with named wrappers stripped.
    pub fn underlying(&self) -> &FieldType {
        match self {
            FieldType::Named(n) => n.base.underlying(),
            other => other,
        }
    }

    /// Whether a zero-argument setter call means `true`.
    pub fn is_bool(&self) -> bool {
        matches!(self.underlying(), FieldType::Bool)
    }

    /// Zero value of this type. Collections start unallocated.
    pub fn zero(&self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int => Value::Int(0),
            FieldType::Float => Value::Float(0.0),
            FieldType::Str => Value::Str(String::new()),
            FieldType::Any | FieldType::Seq(_) | FieldType::Map(_, _) => Value::Nil,
            FieldType::Record(schema) => Value::Record(schema.zero_record()),
            FieldType::Named(n) => n.base.zero(),
        }
    }

    /// Record schemas reachable through sequence, map, and named wrappers.
    pub fn contained_schemas(&self) -> Vec<Arc<Schema>> {
        match self {
            FieldType::Record(schema) => vec![Arc::clone(schema)],
            FieldType::Seq(elem) => elem.contained_schemas(),
            FieldType::Map(k, v) => {
                let mut out = k.contained_schemas();
                out.extend(v.contained_schemas());
                out
            }
            FieldType::Named(n) if n.method(MUTATOR_HOOK).is_some() => Vec::new(),
            FieldType::Named(n) => n.base.contained_schemas(),
            _ => Vec::new(),
        }
    }

    fn signature(&self) -> String {
        match self {
            FieldType::Record(schema) => format!("record:{}", schema.id().to_hex()),
            FieldType::Seq(elem) => format!("[]{}", elem.signature()),
            FieldType::Map(k, v) => format!("map[{}]{}", k.signature(), v.signature()),
            FieldType::Named(n) => {
                let methods: Vec<String> = n
                    .methods
                    .iter()
                    .map(|m| format!("{}/{:?}/{}", m.name, m.receiver, m.results))
                    .collect();
                format!("named:{}({})[{}]", n.name, n.base.signature(), methods.join(","))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Float => f.write_str("float"),
            FieldType::Str => f.write_str("string"),
            FieldType::Any => f.write_str("any"),
            FieldType::Seq(elem) => write!(f, "[]{elem}"),
            FieldType::Map(k, v) => write!(f, "map[{k}]{v}"),
            FieldType::Record(schema) if schema.name().is_empty() => f.write_str("struct{...}"),
            FieldType::Record(schema) => f.write_str(schema.name()),
            FieldType::Named(n) => f.write_str(&n.name),
        }
    }
}

// ─── Named Types ─────────────────────────────────────────────────────

/// How a method is bound to its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Called on a copy of the value.
    Value,
    /// Called on a mutable reference to the value.
    Reference,
}

/// Method implementation: receives the receiver slot and the arguments,
/// returns the method's results.
pub type MethodBody = Arc<dyn Fn(&mut Value, &[Value]) -> Result<Vec<Value>, CallError> + Send + Sync>;

/// An entry in a named type's method table.
#[derive(Clone)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Receiver binding.
    pub receiver: Receiver,
    /// Number of declared results.
    pub results: usize,
    /// Implementation.
    pub body: MethodBody,
}

impl Method {
    /// A reference-bound method with no results.
    pub fn by_ref<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Value, &[Value]) -> Result<(), CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver: Receiver::Reference,
            results: 0,
            body: Arc::new(move |recv, args| body(recv, args).map(|()| Vec::new())),
        }
    }

    /// A method with an explicit receiver binding and result count.
    pub fn new<F>(name: impl Into<String>, receiver: Receiver, results: usize, body: F) -> Self
    where
        F: Fn(&mut Value, &[Value]) -> Result<Vec<Value>, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            receiver,
            results,
            body: Arc::new(body),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

/// A named type: a base type plus a method table.
#[derive(Debug, Clone)]
pub struct NamedType {
    /// Type name.
    pub name: String,
    /// Underlying representation.
    pub base: FieldType,
    /// Methods, in declaration order.
    pub methods: Vec<Method>,
}

impl NamedType {
    /// A named type without methods.
    pub fn new(name: impl Into<String>, base: FieldType) -> Self {
        Self {
            name: name.into(),
            base,
            methods: Vec::new(),
        }
    }

    /// Add a method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// First method with the given name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Validate and return the mutator hook used for `field`.
    ///
    /// The hook must be reference-bound, must not return values, and must
    /// not also be exposed through a value-bound method.
    pub fn mutator_hook(&self, field: &str) -> Result<Option<&Method>, RegistrationError> {
        let hooks: Vec<&Method> = self.methods.iter().filter(|m| m.name == MUTATOR_HOOK).collect();
        if hooks.is_empty() {
            return Ok(None);
        }
        if hooks.iter().any(|m| m.receiver == Receiver::Value) {
            return Err(RegistrationError::InvalidHook {
                type_name: self.name.clone(),
                field: field.to_string(),
                reason: "must be bound by reference, not by value".to_string(),
            });
        }
        let hook = hooks[0];
        if hook.results != 0 {
            return Err(RegistrationError::InvalidHook {
                type_name: self.name.clone(),
                field: field.to_string(),
                reason: format!("must not return values (declares {})", hook.results),
            });
        }
        Ok(Some(hook))
    }
}

// ─── Fields and Schemas ──────────────────────────────────────────────

/// Per-field registration directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `-`: excluded from registration.
    Ignore,
    /// `+`: must be supplied on every construction.
    Required,
}

impl Directive {
    /// Parse a raw directive; the empty string means no directive.
    pub fn parse(raw: &str) -> Result<Option<Directive>, String> {
        match raw {
            "" => Ok(None),
            "-" => Ok(Some(Directive::Ignore)),
            "+" => Ok(Some(Directive::Required)),
            other => Err(other.to_string()),
        }
    }

    /// The raw form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::Ignore => "-",
            Directive::Required => "+",
        }
    }
}

/// A record field.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name; also the name of its setter function.
    pub name: String,
    /// Static type.
    pub ty: FieldType,
    /// Raw directive, parsed at registration.
    pub directive: Option<String>,
    /// Unexported fields are never registered.
    pub exported: bool,
}

impl Field {
    /// An exported field without directives.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            directive: None,
            exported: true,
        }
    }

    /// Mark as required.
    pub fn required(self) -> Self {
        self.directive(Directive::Required.as_str())
    }

    /// Exclude from registration.
    pub fn ignored(self) -> Self {
        self.directive(Directive::Ignore.as_str())
    }

    /// Attach a raw directive string.
    pub fn directive(mut self, raw: impl Into<String>) -> Self {
        self.directive = Some(raw.into());
        self
    }

    /// Mark as unexported.
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Parse the directive in the context of `schema`.
    pub fn parsed_directive(&self, schema: &str) -> Result<Option<Directive>, RegistrationError> {
        match &self.directive {
            None => Ok(None),
            Some(raw) => Directive::parse(raw).map_err(|directive| RegistrationError::UnknownDirective {
                schema: schema.to_string(),
                field: self.name.clone(),
                directive,
            }),
        }
    }
}

/// A named record type.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    id: SchemaId,
}

impl Schema {
    /// Create a schema. An empty name describes an anonymous composite,
    /// which registration rejects.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        let name = name.into();
        let id = Self::compute_id(&name, &fields);
        Self { name, fields, id }
    }

    /// Create a shared schema.
    pub fn shared(name: impl Into<String>, fields: Vec<Field>) -> Arc<Self> {
        Arc::new(Self::new(name, fields))
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Structural identity.
    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    /// The first field name declared more than once, if any.
    pub fn duplicate_field(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// A record with every field at its zero value.
    pub fn zero_record(&self) -> Record {
        let fields: BTreeMap<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.ty.zero()))
            .collect();
        Record::new(self.id.clone(), fields)
    }

    fn compute_id(name: &str, fields: &[Field]) -> SchemaId {
        let mut sig = format!("{name}{{");
        for f in fields {
            sig.push_str(&format!(
                "{}:{}:{}:{};",
                f.name,
                f.ty.signature(),
                f.directive.as_deref().unwrap_or(""),
                f.exported
            ));
        }
        sig.push('}');
        let hash = Sha256::digest(sig.as_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hash);
        SchemaId {
            name: name.to_string(),
            digest,
        }
    }
}
