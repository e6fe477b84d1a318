//! Error types for schema loading and row storage.
//!
//! Provides a unified error type covering I/O, serialization, schema and
//! record failures, and backend calls made through the session wrapper.

use bookshelf_core::{BookError, Field};
use thiserror::Error;

use crate::session::SessionError;

/// Errors that can occur while loading schemas or reading and writing rows.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Schema lookup, row parse or integrity failure.
    #[error(transparent)]
    Book(#[from] BookError),

    /// Authenticated backend call failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// No schema is registered under this version.
    #[error("unknown schema version: {0}")]
    UnknownSchemaVersion(String),

    /// Two descriptors claim the same version.
    #[error("schema version registered twice: {0}")]
    DuplicateSchemaVersion(String),

    /// A newer schema moves or drops columns of an older one.
    #[error("schema {version} is incompatible with {previous}: moved or dropped {}", field_list(.fields))]
    IncompatibleSchema {
        version: String,
        previous: String,
        fields: Vec<Field>,
    },

    /// No record is stored at this data row.
    #[error("no book at row {0}")]
    RowNotFound(usize),
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
