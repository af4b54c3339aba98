//! # fieldfn-core — Values, Types, and Coercion
//!
//! The leaf crate of the fieldfn workspace. It defines the dynamic value
//! model exchanged with an expression evaluator, the type model describing
//! record schemas, the coercion rules that bridge the two, and the error
//! hierarchy shared by every other crate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fieldfn-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod coerce;
pub mod error;
pub mod types;
pub mod value;

pub use coerce::{coerce, coerce_entries, is_splice_candidate};
pub use error::{CallError, CoercionError, FieldFnError, RegistrationError};
pub use types::{
    Directive, Field, FieldKind, FieldType, Method, MethodBody, NamedType, Receiver, Schema,
    SchemaId, MUTATOR_HOOK,
};
pub use value::{Record, Value};
