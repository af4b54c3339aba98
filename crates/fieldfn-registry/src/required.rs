//! # Required-Field Tracking
//!
//! Constructors with required fields run every supplied apply step twice.
//! The presence phase marks each supplied field in a [`RequiredSet`] that
//! exists only for the duration of one constructor invocation; the apply
//! phase runs only if nothing required is left unset. Presence means the
//! setter was called at all. An explicit zero value counts as provided.

use std::collections::BTreeSet;

use fieldfn_core::CallError;

use crate::setter::ApplyStep;

/// Per-invocation set of required fields not yet supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSet {
    schema: String,
    unset: BTreeSet<String>,
}

impl RequiredSet {
    /// All `fields` of `schema`, marked unset.
    pub fn new(schema: impl Into<String>, fields: &[String]) -> Self {
        Self {
            schema: schema.into(),
            unset: fields.iter().cloned().collect(),
        }
    }

    /// Record that `field` was supplied.
    pub fn mark_present(&mut self, field: &str) {
        self.unset.remove(field);
    }

    /// Whether every required field has been supplied.
    pub fn is_satisfied(&self) -> bool {
        self.unset.is_empty()
    }

    /// Remaining fields as sorted `Schema.Field` names.
    pub fn missing(&self) -> Vec<String> {
        self.unset
            .iter()
            .map(|f| format!("{}.{}", self.schema, f))
            .collect()
    }

    /// Consume the set; an aggregated error if anything is missing.
    pub fn into_result(self) -> Result<(), CallError> {
        if self.is_satisfied() {
            Ok(())
        } else {
            Err(CallError::MissingRequired {
                missing: self.missing(),
            })
        }
    }
}

/// Presence phase over `steps`: the sorted qualified names still missing.
pub fn check_presence(schema: &str, required: &[String], steps: &[ApplyStep]) -> Vec<String> {
    let mut set = RequiredSet::new(schema, required);
    for step in steps {
        step.mark_present(&mut set);
    }
    set.missing()
}
