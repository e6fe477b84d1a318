//! Error types for schema resolution and record construction.
//!
//! None of these errors are transient. A lookup miss, a malformed row or a
//! broken schema descriptor all describe a structural mismatch between the
//! stored rows and the active schema, so callers decide whether to skip the
//! row, report it, or abort; nothing here retries.

use thiserror::Error;

use crate::ColumnId;

/// Errors raised by the column schema and book record layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Field name not present in the active schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Column position not mapped by the active schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Row could not be turned into a record.
    #[error("malformed row{}: {reason}", row_label(.row))]
    MalformedRow {
        /// Data row index, when the row was already persisted.
        row: Option<usize>,
        /// What was wrong with it.
        reason: String,
    },

    /// Schema descriptor violates the field/column bijection.
    #[error("schema integrity violation: {0}")]
    SchemaIntegrity(#[from] IntegrityViolation),
}

impl BookError {
    pub(crate) fn malformed(row: Option<usize>, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }
}

fn row_label(row: &Option<usize>) -> String {
    row.map(|r| format!(" {r}")).unwrap_or_default()
}

/// Structural problems detected while loading a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// Descriptor maps no columns at all.
    #[error("schema maps no columns")]
    Empty,
    /// Descriptor names a field the record model does not know.
    #[error("descriptor names unknown field '{0}'")]
    UnknownField(String),
    /// Column code is not a spreadsheet letter code.
    #[error("invalid column code '{0}'")]
    InvalidColumn(String),
    /// The same field is listed twice.
    #[error("field {0} is mapped more than once")]
    DuplicateField(String),
    /// Two fields share one column.
    #[error("column {column} is mapped by both {first} and {second}")]
    DuplicateColumn {
        column: ColumnId,
        first: String,
        second: String,
    },
    /// A position inside the mapped range has no field.
    #[error("column {0} is not mapped to any field")]
    UnmappedColumn(ColumnId),
    /// A field every record needs is absent.
    #[error("required field {0} is missing")]
    MissingRequiredField(String),
}

/// Errors raised while preparing or reading catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Neither title, authors nor a general query was given.
    #[error("catalog query needs a title, authors or a general query")]
    EmptyQuery,

    /// Catalog response could not be decoded.
    #[error("catalog response error: {0}")]
    Response(#[from] serde_json::Error),

    /// The lookup itself failed (transport, quota, ...).
    #[error("catalog lookup failed: {0}")]
    Lookup(String),
}

/// Convenience alias for results with [`BookError`].
pub type Result<T> = std::result::Result<T, BookError>;
