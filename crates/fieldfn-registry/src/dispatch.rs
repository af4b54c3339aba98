//! # Dispatch Chains
//!
//! Several schemas may declare a field with the same name. The registry
//! exposes one setter function per name, backed by a chain of links, each
//! guarded by the identity of the schema that registered it. The newest
//! link comes first; a target record is handled by the first link whose
//! identity equals the record's runtime type.
//!
//! ```text
//! "Name" ──▶ [Person] ──▶ [Company] ──▶ [Project]
//!            newest                      oldest
//! ```
//!
//! Chains are immutable. Extending one produces a new chain, so a registry
//! clone used for a failed registration never disturbs the original.

use std::sync::Arc;

use fieldfn_core::{CallError, SchemaId, Value};

use crate::registry::Operand;
use crate::setter::{ApplyStep, FieldSetter};

/// One type-guarded handler.
#[derive(Debug, Clone)]
pub struct Link {
    /// Identity of the schema that owns this handler.
    pub type_id: SchemaId,
    /// Mutation logic for that schema's field.
    pub setter: FieldSetter,
}

/// Type-guarded setters sharing one field name.
#[derive(Debug, Clone)]
pub struct DispatchChain {
    field: String,
    links: Vec<Link>,
}

impl DispatchChain {
    /// A chain with a single link.
    pub fn new(field: impl Into<String>, type_id: SchemaId, setter: FieldSetter) -> Self {
        Self {
            field: field.into(),
            links: vec![Link { type_id, setter }],
        }
    }

    /// A new chain with `setter` placed in front of the existing links.
    pub fn extended(&self, type_id: SchemaId, setter: FieldSetter) -> Self {
        let mut links = Vec::with_capacity(self.links.len() + 1);
        links.push(Link { type_id, setter });
        links.extend(self.links.iter().cloned());
        Self {
            field: self.field.clone(),
            links,
        }
    }

    /// The shared field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Links, newest first.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Whether some link is guarded by `type_id`.
    pub fn handles(&self, type_id: &SchemaId) -> bool {
        self.links.iter().any(|l| &l.type_id == type_id)
    }

    /// The setter for a record of type `type_id`.
    pub fn resolve(&self, type_id: &SchemaId) -> Option<&FieldSetter> {
        self.links
            .iter()
            .find(|l| &l.type_id == type_id)
            .map(|l| &l.setter)
    }

    /// Invoke the setter function: capture `args` into an apply step.
    pub fn call(self: &Arc<Self>, args: Vec<Operand>) -> Result<ApplyStep, CallError> {
        let values = args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| match arg {
                Operand::Value(v) => Ok(v),
                Operand::Step(_) => Err(CallError::UnexpectedStep {
                    callee: self.field.clone(),
                    index,
                }),
            })
            .collect::<Result<Vec<Value>, _>>()?;
        Ok(ApplyStep::new(Arc::clone(self), values))
    }
}
