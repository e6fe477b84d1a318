//! Schema descriptor validation.
//!
//! A descriptor must describe a bijection between logical fields and a
//! contiguous run of columns starting at `A`, and it must map every field a
//! record needs. Anything else would make positional rows ambiguous.
//!
//! # Examples
//!
//! ```
//! use bookshelf_core::*;
//!
//! let ok = SchemaDescriptor::ordered(
//!     "custom",
//!     ["TITLE", "AUTHORS", "CREATED_TIMESTAMP", "UPDATED_TIMESTAMP"],
//! );
//! assert!(validate_descriptor(&ok).is_empty());
//!
//! let bad = SchemaDescriptor::lettered(
//!     "custom",
//!     [("TITLE", "A"), ("AUTHORS", "A"), ("CREATED_TIMESTAMP", "B"), ("UPDATED_TIMESTAMP", "C")],
//! );
//! assert!(!validate_descriptor(&bad).is_empty());
//! ```

use std::collections::HashMap;

use crate::error::IntegrityViolation;
use crate::schema::SchemaDescriptor;
use crate::{ColumnId, Field};

/// Validates a descriptor, returning every violation found.
///
/// An empty vector means [`ColumnSchema::from_descriptor`](crate::ColumnSchema::from_descriptor)
/// will accept it.
pub fn validate_descriptor(descriptor: &SchemaDescriptor) -> Vec<IntegrityViolation> {
    match resolve_layout(descriptor) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    }
}

/// Resolves a descriptor into fields ordered by column position.
pub(crate) fn resolve_layout(
    descriptor: &SchemaDescriptor,
) -> Result<Vec<Field>, Vec<IntegrityViolation>> {
    let entries = descriptor.columns.entries();
    if entries.is_empty() {
        return Err(vec![IntegrityViolation::Empty]);
    }

    let mut errors = Vec::new();
    let mut by_column: HashMap<ColumnId, Field> = HashMap::new();
    let mut seen_fields: HashMap<Field, ColumnId> = HashMap::new();

    for (name, column) in entries {
        let field = match name.parse::<Field>() {
            Ok(field) => field,
            Err(_) => {
                errors.push(IntegrityViolation::UnknownField(name));
                continue;
            }
        };
        let column = match column {
            Ok(column) => column,
            Err(violation) => {
                errors.push(violation);
                continue;
            }
        };

        if seen_fields.insert(field, column).is_some() {
            errors.push(IntegrityViolation::DuplicateField(field.to_string()));
            continue;
        }
        if let Some(existing) = by_column.get(&column) {
            errors.push(IntegrityViolation::DuplicateColumn {
                column,
                first: existing.to_string(),
                second: field.to_string(),
            });
            continue;
        }
        by_column.insert(column, field);
    }

    let width = by_column.keys().map(|c| c.index() + 1).max().unwrap_or(0);
    for index in 0..width {
        let column = ColumnId::new(index);
        if !by_column.contains_key(&column) {
            errors.push(IntegrityViolation::UnmappedColumn(column));
        }
    }

    for required in Field::REQUIRED {
        if !seen_fields.contains_key(&required) {
            errors.push(IntegrityViolation::MissingRequiredField(
                required.to_string(),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut ordered: Vec<(ColumnId, Field)> = by_column.into_iter().collect();
    ordered.sort_by_key(|(column, _)| *column);
    Ok(ordered.into_iter().map(|(_, field)| field).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(names: &[&str]) -> SchemaDescriptor {
        SchemaDescriptor::ordered("test", names.iter().copied())
    }

    #[test]
    fn test_accepts_minimal_layout() {
        let descriptor = minimal(&["TITLE", "AUTHORS", "CREATED_TIMESTAMP", "UPDATED_TIMESTAMP"]);
        assert!(validate_descriptor(&descriptor).is_empty());
    }

    #[test]
    fn test_rejects_empty_layout() {
        let descriptor = minimal(&[]);
        assert_eq!(
            validate_descriptor(&descriptor),
            vec![IntegrityViolation::Empty]
        );
    }

    #[test]
    fn test_rejects_shared_column() {
        let descriptor = SchemaDescriptor::lettered(
            "test",
            [
                ("TITLE", "A"),
                ("AUTHORS", "B"),
                ("YEAR", "B"),
                ("CREATED_TIMESTAMP", "C"),
                ("UPDATED_TIMESTAMP", "D"),
            ],
        );
        assert_eq!(
            validate_descriptor(&descriptor),
            vec![IntegrityViolation::DuplicateColumn {
                column: ColumnId::new(1),
                first: "AUTHORS".to_string(),
                second: "YEAR".to_string(),
            }]
        );
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let descriptor = minimal(&[
            "TITLE",
            "AUTHORS",
            "TITLE",
            "CREATED_TIMESTAMP",
            "UPDATED_TIMESTAMP",
        ]);
        let errors = validate_descriptor(&descriptor);
        assert!(errors.contains(&IntegrityViolation::DuplicateField("TITLE".to_string())));
    }

    #[test]
    fn test_rejects_gap() {
        let descriptor = SchemaDescriptor::lettered(
            "test",
            [
                ("TITLE", "A"),
                ("AUTHORS", "B"),
                ("CREATED_TIMESTAMP", "D"),
                ("UPDATED_TIMESTAMP", "E"),
            ],
        );
        assert_eq!(
            validate_descriptor(&descriptor),
            vec![IntegrityViolation::UnmappedColumn(ColumnId::new(2))]
        );
    }

    #[test]
    fn test_rejects_unknown_and_missing_fields() {
        let descriptor = minimal(&["TITLE", "SUBTITLE"]);
        let errors = validate_descriptor(&descriptor);
        assert!(errors.contains(&IntegrityViolation::UnknownField("SUBTITLE".to_string())));
        assert!(errors.contains(&IntegrityViolation::MissingRequiredField(
            "AUTHORS".to_string()
        )));
    }

    #[test]
    fn test_rejects_bad_column_code() {
        let descriptor = SchemaDescriptor::lettered(
            "test",
            [
                ("TITLE", "A"),
                ("AUTHORS", "2"),
                ("CREATED_TIMESTAMP", "B"),
                ("UPDATED_TIMESTAMP", "C"),
            ],
        );
        let errors = validate_descriptor(&descriptor);
        assert!(errors.contains(&IntegrityViolation::InvalidColumn("2".to_string())));
    }
}
