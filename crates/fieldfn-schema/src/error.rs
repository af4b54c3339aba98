//! Errors raised while loading and resolving schema documents.

use thiserror::Error;

/// Error loading a schema document or resolving it into schemas.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The document could not be read.
    #[error("document load error for '{path}': {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for a schema document.
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON for a schema document.
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field's type expression does not parse.
    #[error("invalid type expression '{expr}': {reason}")]
    InvalidTypeExpr {
        /// The whole expression as written.
        expr: String,
        /// What went wrong, with the offset into `expr`.
        reason: String,
    },

    /// A type name is neither a schema in the document nor a catalog type.
    #[error("schema '{schema}' field '{field}': unknown type '{name}'")]
    UnknownType {
        /// Schema declaring the field.
        schema: String,
        /// Field whose type names it.
        field: String,
        /// The unresolved name.
        name: String,
    },

    /// Two schemas in one document share a name.
    #[error("schema '{name}' declared more than once")]
    DuplicateSchema {
        /// The repeated schema name.
        name: String,
    },

    /// One schema declares a field name twice.
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField {
        /// Owning schema.
        schema: String,
        /// The repeated field name.
        field: String,
    },

    /// Schemas reference each other in a loop.
    #[error("schema reference cycle: {}", .path.join(" -> "))]
    Cycle {
        /// Schema names along the loop, first name repeated at the end.
        path: Vec<String>,
    },
}
