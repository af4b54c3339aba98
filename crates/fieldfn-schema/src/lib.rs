//! # fieldfn-schema — Schema Documents
//!
//! Loads record schemas declared in YAML or JSON and resolves them into
//! [`fieldfn_core::Schema`] values ready for registration.
//!
//! ## Type Syntax
//!
//! Field types use the expressions of [`TypeExpr`]: scalars, `[]T`,
//! `map[K]V`, and names. A name refers either to another schema in the same
//! document or to a named type supplied through a [`TypeCatalog`]. Named
//! types with mutator hooks cannot be written in a document because their
//! hooks are host code.
//!
//! ## Crate Policy
//!
//! - Depends only on `fieldfn-core` internally.
//! - Documents are a trust boundary: unknown keys, unknown type names and
//!   reference cycles are rejected with structured errors.

pub mod document;
pub mod error;
pub mod type_expr;

pub use document::{FieldDescriptor, SchemaDescriptor, SchemaDocument, TypeCatalog};
pub use error::SchemaLoadError;
pub use type_expr::TypeExpr;
