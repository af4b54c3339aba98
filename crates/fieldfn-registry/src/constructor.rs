//! # Constructors
//!
//! A constructor allocates a fresh record for its schema and applies the
//! supplied steps in argument order. When the schema has required fields,
//! the presence check runs first and construction fails with every missing
//! field named at once.

use std::sync::Arc;

use fieldfn_core::{CallError, Record, Schema, SchemaId, Value};

use crate::registry::Operand;
use crate::required::check_presence;
use crate::setter::ApplyStep;

/// Constructor function for one schema.
#[derive(Debug, Clone)]
pub struct Constructor {
    schema: Arc<Schema>,
    required: Vec<String>,
}

impl Constructor {
    /// A constructor enforcing the given required field names.
    pub fn new(schema: Arc<Schema>, required: Vec<String>) -> Self {
        Self { schema, required }
    }

    /// The schema this constructor builds.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Identity of the produced records.
    pub fn produces(&self) -> &SchemaId {
        self.schema.id()
    }

    /// Required field names, in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// The record built from no arguments, skipping the presence check.
    pub fn zero_instance(&self) -> Record {
        self.schema.zero_record()
    }

    /// Build a record from apply steps.
    pub fn build(&self, steps: Vec<ApplyStep>) -> Result<Record, CallError> {
        tracing::trace!(schema = %self.schema.name(), steps = steps.len(), "constructing record");
        if !self.required.is_empty() {
            let missing = check_presence(self.schema.name(), &self.required, &steps);
            if !missing.is_empty() {
                return Err(CallError::MissingRequired { missing });
            }
        }
        let mut record = self.schema.zero_record();
        for step in steps {
            step.apply(&mut record)?;
        }
        Ok(record)
    }

    /// Invoke as a registry function: every argument must be an apply step.
    pub fn call(&self, args: Vec<Operand>) -> Result<Operand, CallError> {
        let steps = args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| match arg {
                Operand::Step(step) => Ok(step),
                Operand::Value(_) => Err(CallError::NotAStep {
                    callee: self.schema.name().to_string(),
                    index,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.build(steps).map(|r| Operand::Value(Value::Record(r)))
    }
}
