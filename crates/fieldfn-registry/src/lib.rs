//! # fieldfn-registry — Dynamic Builder Registry
//!
//! Turns record schemas into a flat namespace of callable functions that
//! an expression evaluator can compose into fully populated records:
//!
//! ```text
//! (Person (Name "Ada") (Tags "math" "engines") (Address (City "London")))
//! ```
//!
//! Each schema contributes a constructor named after the schema and a
//! setter per field named after the field.
//!
//! ## Components
//!
//! - **Registrar** (`registrar.rs`): transactional registration, recursion
//!   into nested schemas, collision rules.
//! - **Setters** (`setter.rs`): per-kind field mutation and the deferred
//!   [`ApplyStep`] a setter call returns.
//! - **Dispatch chains** (`dispatch.rs`): one setter name shared by many
//!   schemas, resolved by the runtime type of the target record.
//! - **Required tracking** (`required.rs`): per-invocation presence check
//!   with aggregated errors.
//! - **Constructors** (`constructor.rs`): presence phase, then apply phase.
//!
//! ## Concurrency
//!
//! Registration takes `&mut Registry`; callers sharing a registry across
//! threads serialize registration themselves. Construction reads the
//! registry immutably and keeps all per-call state on the stack.

pub mod constructor;
pub mod dispatch;
pub mod registrar;
pub mod registry;
pub mod required;
pub mod setter;

pub use constructor::Constructor;
pub use dispatch::{DispatchChain, Link};
pub use registrar::{register, register_type};
pub use registry::{Entry, NativeFn, Operand, Registry};
pub use required::{check_presence, RequiredSet};
pub use setter::{ApplyStep, FieldSetter};
