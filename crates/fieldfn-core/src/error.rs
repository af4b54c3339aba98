//! # Error Types
//!
//! Two classes of failure, kept in separate enums so callers can tell a
//! static schema defect from a bad call site.
//!
//! - [`RegistrationError`]: surfaced while registering a schema. The target
//!   registry is left untouched. Never worth retrying.
//! - [`CallError`]: surfaced while an evaluator invokes a constructor or
//!   setter. Aborts the current expression only.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum FieldFnError {
    /// Schema registration failed.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A registered function was called incorrectly.
    #[error("call error: {0}")]
    Call(#[from] CallError),

    /// A finished value could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A call produced a setter result where a value was expected.
    #[error("{name} produced a setter result, not a value")]
    NotAValue {
        /// Name of the setter.
        name: String,
    },
}

/// A schema could not be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The root type is not a record.
    #[error("type {type_name} is not a record")]
    NotARecord {
        /// Rendered type expression.
        type_name: String,
    },

    /// The root schema has no name.
    #[error("anonymous record types cannot be registered")]
    AnonymousSchema,

    /// A field's type contains an anonymous inline record.
    #[error("field {schema}.{field} uses an anonymous record type")]
    AnonymousField {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
    },

    /// The key is already bound to something this registry did not create.
    #[error("registry conflict on key {key:?}")]
    KeyConflict {
        /// The contested name.
        key: String,
    },

    /// The schema name is bound to a constructor for a different record type.
    #[error("schema {name} is already registered with a different shape")]
    SchemaMismatch {
        /// The contested schema name.
        name: String,
    },

    /// A field name and a schema name collide.
    #[error("name {name} is used both as a schema and as a field")]
    FieldSchemaCollision {
        /// The contested name.
        name: String,
    },

    /// A schema declares the same field name more than once.
    #[error("schema {schema} declares field {field} more than once")]
    DuplicateField {
        /// Owning schema.
        schema: String,
        /// Repeated field name.
        field: String,
    },

    /// A mutator hook has the wrong shape.
    #[error("({type_name}).Set (for field {field}) {reason}")]
    InvalidHook {
        /// Named type exposing the hook.
        type_name: String,
        /// Field whose type it is.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A field carries a directive that is neither `-` nor `+`.
    #[error("unknown directive {directive:?} on field {schema}.{field}")]
    UnknownDirective {
        /// Owning schema.
        schema: String,
        /// Offending field.
        field: String,
        /// The raw directive.
        directive: String,
    },
}

/// A registered function was invoked with unusable arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// A scalar setter received the wrong number of arguments.
    #[error("{field}: wrong number of args: expected {expected}, got {got}")]
    WrongArgCount {
        /// Field name.
        field: String,
        /// Expected count.
        expected: usize,
        /// Supplied count.
        got: usize,
    },

    /// A map setter received an odd number of key/value arguments.
    #[error("{field}: map setter needs key/value pairs, got {got} args")]
    OddMapArgs {
        /// Field name.
        field: String,
        /// Supplied count.
        got: usize,
    },

    /// Required fields were not supplied.
    #[error("{} required but not provided", .missing.join(", "))]
    MissingRequired {
        /// Qualified `Schema.Field` names, sorted.
        missing: Vec<String>,
    },

    /// An argument could not be converted to the field's type.
    #[error("{field}: {source}")]
    Coercion {
        /// Field name.
        field: String,
        /// Conversion failure.
        source: CoercionError,
    },

    /// A constructor received something other than a setter result.
    #[error("{callee}: argument {index} is not a field setter result")]
    NotAStep {
        /// Constructor name.
        callee: String,
        /// Zero-based argument index.
        index: usize,
    },

    /// A setter result was passed where a value was expected.
    #[error("{callee}: argument {index} is a setter result, not a value")]
    UnexpectedStep {
        /// Callee name.
        callee: String,
        /// Zero-based argument index.
        index: usize,
    },

    /// No dispatch-chain link handles the target record type.
    #[error("record type {record} has no field {field}")]
    UnknownField {
        /// Field name.
        field: String,
        /// Target record type name.
        record: String,
    },

    /// No function is registered under the name.
    #[error("function {name:?} not registered")]
    UnknownFunction {
        /// Requested name.
        name: String,
    },

    /// A mutator hook reported failure.
    #[error("({type_name}).Set: {message}")]
    Hook {
        /// Named type.
        type_name: String,
        /// Failure description.
        message: String,
    },

    /// A host-provided function reported failure.
    #[error("{name}: {message}")]
    Native {
        /// Function name.
        name: String,
        /// Failure description.
        message: String,
    },
}

/// A value could not be converted to a field type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot use {found} as {expected}")]
pub struct CoercionError {
    /// Rendered target type.
    pub expected: String,
    /// Runtime kind of the offending value.
    pub found: String,
}
