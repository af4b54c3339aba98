//! # Schema Registration
//!
//! Walks a schema and installs one constructor plus one setter per field.
//!
//! ## Transactional Semantics
//!
//! All work happens on a clone of the target registry. The clone replaces
//! the target only once the whole schema, nested schemas included, has been
//! registered. A failed registration leaves the target exactly as it was.
//!
//! ## Collision Rules
//!
//! | Name already bound to | Registering a schema | Registering a field |
//! |---|---|---|
//! | constructor, same record type | no-op | collision error |
//! | constructor, other record type | mismatch error | collision error |
//! | setter chain | collision error | chain extended |
//! | native function | conflict error | conflict error |

use std::sync::Arc;

use fieldfn_core::{Directive, FieldType, RegistrationError, Schema, SchemaId};

use crate::constructor::Constructor;
use crate::dispatch::DispatchChain;
use crate::registry::{Entry, Registry};
use crate::setter::FieldSetter;

/// Register `schema` into `registry`, all or nothing.
pub fn register(schema: &Arc<Schema>, registry: &mut Registry) -> Result<(), RegistrationError> {
    let mut working = registry.clone();
    let outcome = Registrar { registry: &mut working }.add_schema(schema);
    match outcome {
        Ok(()) => {
            *registry = working;
            Ok(())
        }
        Err(err) => {
            tracing::warn!(schema = %schema.name(), error = %err, "schema registration rejected");
            Err(err)
        }
    }
}

/// Register a root type. Only record types can be registered.
pub fn register_type(ty: &FieldType, registry: &mut Registry) -> Result<(), RegistrationError> {
    match ty.underlying() {
        FieldType::Record(schema) => register(schema, registry),
        _ => Err(RegistrationError::NotARecord {
            type_name: ty.to_string(),
        }),
    }
}

struct Registrar<'a> {
    registry: &'a mut Registry,
}

impl Registrar<'_> {
    fn add_schema(&mut self, schema: &Arc<Schema>) -> Result<(), RegistrationError> {
        if schema.name().is_empty() {
            return Err(RegistrationError::AnonymousSchema);
        }
        if let Some(field) = schema.duplicate_field() {
            return Err(RegistrationError::DuplicateField {
                schema: schema.name().to_string(),
                field: field.to_string(),
            });
        }
        if self.already_registered(schema)? {
            tracing::debug!(schema = %schema.name(), "schema already registered");
            return Ok(());
        }

        let mut required = Vec::new();
        for field in schema.fields() {
            let directive = field.parsed_directive(schema.name())?;
            if !field.exported || directive == Some(Directive::Ignore) {
                continue;
            }
            for inner in field.ty.contained_schemas() {
                if inner.name().is_empty() {
                    return Err(RegistrationError::AnonymousField {
                        schema: schema.name().to_string(),
                        field: field.name.clone(),
                    });
                }
                self.add_schema(&inner)?;
            }
            let setter = FieldSetter::for_field(field)?;
            self.bind_field(schema.id(), &field.name, setter)?;
            if directive == Some(Directive::Required) {
                required.push(field.name.clone());
            }
        }

        // A field of this schema or of a nested one may have claimed the name.
        if self.already_registered(schema)? {
            return Ok(());
        }
        tracing::debug!(
            schema = %schema.name(),
            fields = schema.fields().len(),
            required = required.len(),
            "registered schema"
        );
        self.registry.insert(
            schema.name(),
            Entry::Constructor(Arc::new(Constructor::new(Arc::clone(schema), required))),
        );
        Ok(())
    }

    /// Whether the schema name is already bound to a constructor for the
    /// same record type. Any other binding is an error.
    fn already_registered(&self, schema: &Schema) -> Result<bool, RegistrationError> {
        match self.registry.get(schema.name()) {
            None => Ok(false),
            Some(Entry::Constructor(existing)) => {
                if existing.zero_instance().type_id() == schema.id() {
                    Ok(true)
                } else {
                    Err(RegistrationError::SchemaMismatch {
                        name: schema.name().to_string(),
                    })
                }
            }
            Some(Entry::Setter(_)) => Err(RegistrationError::FieldSchemaCollision {
                name: schema.name().to_string(),
            }),
            Some(Entry::Native(_)) => Err(RegistrationError::KeyConflict {
                key: schema.name().to_string(),
            }),
        }
    }

    fn bind_field(&mut self, owner: &SchemaId, name: &str, setter: FieldSetter) -> Result<(), RegistrationError> {
        let chain = match self.registry.get(name) {
            None => DispatchChain::new(name, owner.clone(), setter),
            Some(Entry::Setter(chain)) if chain.handles(owner) => return Ok(()),
            Some(Entry::Setter(chain)) => {
                tracing::debug!(
                    field = name,
                    schema = %owner,
                    links = chain.links().len() + 1,
                    "extending dispatch chain"
                );
                chain.extended(owner.clone(), setter)
            }
            Some(Entry::Constructor(_)) => {
                return Err(RegistrationError::FieldSchemaCollision {
                    name: name.to_string(),
                })
            }
            Some(Entry::Native(_)) => {
                return Err(RegistrationError::KeyConflict {
                    key: name.to_string(),
                })
            }
        };
        self.registry.insert(name, Entry::Setter(Arc::new(chain)));
        Ok(())
    }
}
