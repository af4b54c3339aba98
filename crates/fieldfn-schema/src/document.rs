//! # Schema Documents
//!
//! Declarative schema definitions loaded from YAML or JSON:
//!
//! ```yaml
//! schemas:
//!   - name: Server
//!     fields:
//!       - { name: Host, type: string, directive: "+" }
//!       - { name: Ports, type: "[]int" }
//!       - { name: Tls, type: Tls }
//!   - name: Tls
//!     fields:
//!       - { name: Cert, type: string }
//! ```
//!
//! ## Resolution
//!
//! Type names resolve first against the other schemas of the same document,
//! then against the host-provided [`TypeCatalog`]. Schemas may be declared
//! in any order. A schema that reaches itself through its fields, directly
//! or through collections, is rejected: records nest by value.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fieldfn_core::{Field, FieldType, NamedType, Schema};

use crate::error::SchemaLoadError;
use crate::type_expr::TypeExpr;

/// A set of schema declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Declared schemas, in document order.
    #[serde(default)]
    pub schemas: Vec<SchemaDescriptor>,
}

/// One declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescriptor {
    /// Schema name; also the constructor name.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Field name; also the setter name.
    pub name: String,
    /// Type expression, see [`TypeExpr`].
    #[serde(rename = "type")]
    pub ty: String,
    /// Raw directive: `-` to ignore, `+` to require.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
    /// Unexported fields are kept in the record but never registered.
    #[serde(default = "exported_default")]
    pub exported: bool,
}

fn exported_default() -> bool {
    true
}

/// Host-provided named types that documents may reference by name.
///
/// Mutator hooks are code, so types carrying them can only enter a
/// document through the catalog.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    named: BTreeMap<String, Arc<NamedType>>,
}

impl TypeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named type, replacing any previous type of the same name.
    pub fn insert(&mut self, named: Arc<NamedType>) {
        self.named.insert(named.name.clone(), named);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, named: Arc<NamedType>) -> Self {
        self.insert(named);
        self
    }

    /// Look up a named type.
    pub fn get(&self, name: &str) -> Option<&Arc<NamedType>> {
        self.named.get(name)
    }
}

impl SchemaDocument {
    /// Parse a YAML document.
    pub fn from_yaml_str(src: &str) -> Result<Self, SchemaLoadError> {
        Ok(serde_yaml::from_str(src)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(src: &str) -> Result<Self, SchemaLoadError> {
        Ok(serde_json::from_str(src)?)
    }

    /// Load a document from disk. Files ending in `.json` are parsed as
    /// JSON, everything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Resolve every declared schema, returned in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSchema` if a schema name is declared twice,
    /// `DuplicateField` if a schema repeats a field name, `InvalidTypeExpr`
    /// or `UnknownType` for a bad field type, and `Cycle` for schemas that
    /// contain themselves.
    pub fn resolve(&self, catalog: &TypeCatalog) -> Result<Vec<Arc<Schema>>, SchemaLoadError> {
        let mut declared = BTreeMap::new();
        for desc in &self.schemas {
            if declared.insert(desc.name.as_str(), desc).is_some() {
                return Err(SchemaLoadError::DuplicateSchema {
                    name: desc.name.clone(),
                });
            }
        }
        let mut resolver = Resolver {
            declared,
            catalog,
            done: BTreeMap::new(),
            stack: Vec::new(),
        };
        let resolved = self
            .schemas
            .iter()
            .map(|desc| resolver.schema(&desc.name))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(schemas = resolved.len(), "resolved schema document");
        Ok(resolved)
    }
}

struct Resolver<'a> {
    declared: BTreeMap<&'a str, &'a SchemaDescriptor>,
    catalog: &'a TypeCatalog,
    done: BTreeMap<String, Arc<Schema>>,
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn schema(&mut self, name: &str) -> Result<Arc<Schema>, SchemaLoadError> {
        if let Some(schema) = self.done.get(name) {
            return Ok(Arc::clone(schema));
        }
        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut path = self.stack[pos..].to_vec();
            path.push(name.to_string());
            return Err(SchemaLoadError::Cycle { path });
        }
        let Some(desc) = self.declared.get(name).copied() else {
            return Err(SchemaLoadError::UnknownType {
                schema: self.stack.last().cloned().unwrap_or_default(),
                field: String::new(),
                name: name.to_string(),
            });
        };

        let mut seen = BTreeSet::new();
        if let Some(dup) = desc.fields.iter().find(|fd| !seen.insert(fd.name.as_str())) {
            return Err(SchemaLoadError::DuplicateField {
                schema: desc.name.clone(),
                field: dup.name.clone(),
            });
        }

        self.stack.push(name.to_string());
        let mut fields = Vec::with_capacity(desc.fields.len());
        for fd in &desc.fields {
            let expr = TypeExpr::parse(&fd.ty)?;
            let ty = self.field_type(&expr, &desc.name, &fd.name)?;
            let mut field = Field::new(fd.name.clone(), ty);
            if let Some(raw) = &fd.directive {
                field = field.directive(raw.clone());
            }
            if !fd.exported {
                field = field.private();
            }
            fields.push(field);
        }
        self.stack.pop();

        let schema = Schema::shared(desc.name.clone(), fields);
        tracing::trace!(schema = %schema.name(), digest = %schema.id().to_hex(), "resolved schema");
        self.done.insert(desc.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    fn field_type(&mut self, expr: &TypeExpr, schema: &str, field: &str) -> Result<FieldType, SchemaLoadError> {
        Ok(match expr {
            TypeExpr::Bool => FieldType::Bool,
            TypeExpr::Int => FieldType::Int,
            TypeExpr::Float => FieldType::Float,
            TypeExpr::Str => FieldType::Str,
            TypeExpr::Any => FieldType::Any,
            TypeExpr::Seq(elem) => FieldType::seq(self.field_type(elem, schema, field)?),
            TypeExpr::Map(k, v) => {
                let key = self.field_type(k, schema, field)?;
                FieldType::map(key, self.field_type(v, schema, field)?)
            }
            TypeExpr::Name(name) if self.declared.contains_key(name.as_str()) => {
                FieldType::record(self.schema(name)?)
            }
            TypeExpr::Name(name) => match self.catalog.get(name) {
                Some(named) => FieldType::named(Arc::clone(named)),
                None => {
                    return Err(SchemaLoadError::UnknownType {
                        schema: schema.to_string(),
                        field: field.to_string(),
                        name: name.clone(),
                    })
                }
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldfn_core::{Directive, FieldKind, Method, MUTATOR_HOOK};

    const SERVER_YAML: &str = r#"
schemas:
  - name: Server
    fields:
      - { name: Host, type: string, directive: "+" }
      - { name: Ports, type: "[]int" }
      - { name: Labels, type: "map[string]string" }
      - { name: Tls, type: Tls }
      - { name: secret, type: string, exported: false }
  - name: Tls
    fields:
      - { name: Cert, type: string }
"#;

    fn upper_type() -> Arc<NamedType> {
        Arc::new(
            NamedType::new("Upper", FieldType::Str).with_method(Method::by_ref(MUTATOR_HOOK, |recv, args| {
                if let [fieldfn_core::Value::Str(s)] = args {
                    *recv = fieldfn_core::Value::Str(s.to_uppercase());
                }
                Ok(())
            })),
        )
    }

    #[test]
    fn test_yaml_forward_reference() {
        let doc = SchemaDocument::from_yaml_str(SERVER_YAML).unwrap();
        let schemas = doc.resolve(&TypeCatalog::new()).unwrap();
        assert_eq!(schemas.len(), 2);
        let server = &schemas[0];
        assert_eq!(server.name(), "Server");
        assert_eq!(server.fields()[1].ty.to_string(), "[]int");
        assert_eq!(server.fields()[2].ty.to_string(), "map[string]string");
        assert_eq!(server.fields()[0].parsed_directive("Server").unwrap(), Some(Directive::Required));
        assert!(!server.fields()[4].exported);
        match &server.fields()[3].ty {
            FieldType::Record(tls) => assert_eq!(tls.id(), schemas[1].id()),
            other => panic!("unexpected type {other}"),
        }
    }

    #[test]
    fn test_json_matches_yaml() {
        let json = r#"{"schemas":[{"name":"Tls","fields":[{"name":"Cert","type":"string"}]}]}"#;
        let from_json = SchemaDocument::from_json_str(json).unwrap().resolve(&TypeCatalog::new()).unwrap();
        let from_yaml = SchemaDocument::from_yaml_str(SERVER_YAML).unwrap().resolve(&TypeCatalog::new()).unwrap();
        assert_eq!(from_json[0].id(), from_yaml[1].id());
    }

    #[test]
    fn test_catalog_named_type() {
        let yaml = "schemas:\n  - name: Doc\n    fields:\n      - { name: Title, type: Upper }\n";
        let catalog = TypeCatalog::new().with(upper_type());
        let schemas = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&catalog).unwrap();
        assert_eq!(schemas[0].fields()[0].ty.kind(), FieldKind::CustomHook);
    }

    #[test]
    fn test_unknown_type() {
        let yaml = "schemas:\n  - name: Doc\n    fields:\n      - { name: Title, type: \"[]Missing\" }\n";
        let err = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&TypeCatalog::new()).unwrap_err();
        assert!(matches!(err, SchemaLoadError::UnknownType { ref name, ref field, .. } if name == "Missing" && field == "Title"));
    }

    #[test]
    fn test_cycle_through_collection() {
        let yaml = r#"
schemas:
  - name: A
    fields:
      - { name: Bs, type: "[]B" }
  - name: B
    fields:
      - { name: Back, type: "map[string]A" }
"#;
        let err = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&TypeCatalog::new()).unwrap_err();
        match err {
            SchemaLoadError::Cycle { path } => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_duplicate_schema() {
        let yaml = "schemas:\n  - name: A\n  - name: A\n";
        let err = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&TypeCatalog::new()).unwrap_err();
        assert!(matches!(err, SchemaLoadError::DuplicateSchema { ref name } if name == "A"));
    }

    #[test]
    fn test_duplicate_field() {
        let yaml = r#"
schemas:
  - name: S
    fields:
      - { name: F, type: int }
      - { name: F, type: string }
"#;
        let err = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&TypeCatalog::new()).unwrap_err();
        assert!(matches!(
            err,
            SchemaLoadError::DuplicateField { ref schema, ref field } if schema == "S" && field == "F"
        ));
    }

    #[test]
    fn test_bad_type_expression() {
        let yaml = "schemas:\n  - name: A\n    fields:\n      - { name: X, type: \"map[int\" }\n";
        let err = SchemaDocument::from_yaml_str(yaml).unwrap().resolve(&TypeCatalog::new()).unwrap_err();
        assert!(matches!(err, SchemaLoadError::InvalidTypeExpr { ref expr, .. } if expr == "map[int"));
    }

    #[test]
    fn test_unknown_document_key_rejected() {
        let yaml = "schemas:\n  - name: A\n    colour: red\n";
        assert!(matches!(SchemaDocument::from_yaml_str(yaml), Err(SchemaLoadError::Yaml(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SchemaDocument::from_path("/nonexistent/schemas.yaml").unwrap_err();
        assert!(matches!(err, SchemaLoadError::Io { .. }));
    }
}
