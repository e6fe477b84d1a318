//! Column schema: the bijection between logical fields and row positions.
//!
//! A [`ColumnSchema`] is built once from a [`SchemaDescriptor`] (or one of the
//! built-in [`SchemaVersion`]s), validated on construction, and then only read.
//! It is shared by reference with every record operation; there is no global
//! column table.
//!
//! # Example
//!
//! ```
//! use bookshelf_core::*;
//!
//! let schema = ColumnSchema::builtin(SchemaVersion::V3);
//! assert_eq!(schema.width(), 17);
//! assert_eq!(schema.resolve_column("PUBLIC").unwrap().to_string(), "Q");
//! assert_eq!(schema.resolve_field_name(ColumnId::new(0)).unwrap(), Field::Title);
//!
//! let legacy = ColumnSchema::builtin(SchemaVersion::V1);
//! assert!(legacy.resolve_column("STARRED").is_err());
//! assert!(schema.is_compatible_with(&legacy));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{BookError, IntegrityViolation, Result};
use crate::validate::resolve_layout;
use crate::{ColumnId, Field};

/// Built-in schema versions.
///
/// Each version is a distinct column layout; later versions only append
/// columns, so older rows stay readable under newer schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Fifteen columns, `TITLE` through `UPDATED_TIMESTAMP`.
    V1,
    /// Adds `STARRED`.
    V2,
    /// Adds `PUBLIC`.
    V3,
}

impl SchemaVersion {
    /// The most recent built-in layout.
    pub const LATEST: SchemaVersion = SchemaVersion::V3;

    /// All built-in versions, oldest first.
    pub const ALL: [SchemaVersion; 3] = [SchemaVersion::V1, SchemaVersion::V2, SchemaVersion::V3];

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::V3 => "v3",
        }
    }

    /// Returns the fields of this layout in column order.
    pub fn fields(self) -> &'static [Field] {
        let width = match self {
            SchemaVersion::V1 => 15,
            SchemaVersion::V2 => 16,
            SchemaVersion::V3 => 17,
        };
        &Field::ALL[..width]
    }

    /// Returns the descriptor for this layout.
    pub fn descriptor(self) -> SchemaDescriptor {
        SchemaDescriptor::ordered(self.as_str(), self.fields().iter().map(|f| f.name()))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SchemaVersion::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown schema version '{s}'"))
    }
}

/// One `{field, column}` pair of an explicit descriptor layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub field: String,
    pub column: String,
}

/// Column layout of a descriptor.
///
/// Three equivalent encodings are accepted:
///
/// - a list of field names where position implies the column,
/// - a list of `{field, column}` pairs,
/// - a map of field name to column letter (the sheet-spec format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLayout {
    Ordered(Vec<String>),
    Pairs(Vec<ColumnEntry>),
    Lettered(LetterMap),
}

/// Field name to column letter map, in listing order.
///
/// Repeated keys are kept rather than collapsed, so a field mapped twice is
/// reported as such by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterMap(pub Vec<(String, String)>);

impl Serialize for LetterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, column) in &self.0 {
            map.serialize_entry(field, column)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LetterMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LetterMapVisitor;

        impl<'de> Visitor<'de> for LetterMapVisitor {
            type Value = LetterMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of field names to column letters")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(LetterMap(entries))
            }
        }

        deserializer.deserialize_map(LetterMapVisitor)
    }
}

impl ColumnLayout {
    /// Flattens the layout into `(field name, column)` pairs in listing order.
    pub(crate) fn entries(
        &self,
    ) -> Vec<(String, std::result::Result<ColumnId, IntegrityViolation>)> {
        match self {
            ColumnLayout::Ordered(names) => names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), Ok(ColumnId::new(i))))
                .collect(),
            ColumnLayout::Pairs(entries) => entries
                .iter()
                .map(|e| (e.field.clone(), e.column.parse()))
                .collect(),
            ColumnLayout::Lettered(map) => map
                .0
                .iter()
                .map(|(field, column)| (field.clone(), column.parse()))
                .collect(),
        }
    }
}

/// Serializable schema descriptor.
///
/// # Example JSON
///
/// ```json
/// {
///   "version": "v2",
///   "range": "Books!A2:P",
///   "columns": { "TITLE": "A", "AUTHORS": "B", "...": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Version label the schema is registered under. Plain sheet-spec files
    /// omit it.
    #[serde(default = "default_descriptor_version")]
    pub version: String,
    /// Optional A1 range of the data rows, e.g. `Books!A2:P`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Field to column mapping.
    pub columns: ColumnLayout,
}

fn default_descriptor_version() -> String {
    "custom".to_string()
}

impl SchemaDescriptor {
    /// Creates a descriptor where list position implies the column.
    pub fn ordered<I, S>(version: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.into(),
            range: None,
            columns: ColumnLayout::Ordered(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Creates a descriptor from explicit `(field, column letter)` pairs.
    pub fn lettered<I, F, C>(version: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, C)>,
        F: Into<String>,
        C: Into<String>,
    {
        Self {
            version: version.into(),
            range: None,
            columns: ColumnLayout::Pairs(
                pairs
                    .into_iter()
                    .map(|(field, column)| ColumnEntry {
                        field: field.into(),
                        column: column.into(),
                    })
                    .collect(),
            ),
        }
    }

    /// Sets the data range.
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }
}

/// Validated, immutable mapping between fields and column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    version: String,
    range: Option<String>,
    by_column: Vec<Field>,
    by_field: HashMap<Field, ColumnId>,
}

impl ColumnSchema {
    /// Builds a schema from a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::SchemaIntegrity`] with the first violation when
    /// the descriptor is not a gap-free bijection covering the required
    /// fields. Use [`validate_descriptor`](crate::validate_descriptor) to see
    /// every violation.
    pub fn from_descriptor(descriptor: &SchemaDescriptor) -> Result<Self> {
        let by_column = resolve_layout(descriptor).map_err(|mut errors| {
            BookError::SchemaIntegrity(errors.swap_remove(0))
        })?;
        let by_field = by_column
            .iter()
            .enumerate()
            .map(|(i, field)| (*field, ColumnId::new(i)))
            .collect();

        debug!(
            version = %descriptor.version,
            width = by_column.len(),
            "column schema loaded"
        );

        Ok(Self {
            version: descriptor.version.clone(),
            range: descriptor.range.clone(),
            by_column,
            by_field,
        })
    }

    /// Returns a built-in schema.
    pub fn builtin(version: SchemaVersion) -> Self {
        let by_column = version.fields().to_vec();
        let by_field = by_column
            .iter()
            .enumerate()
            .map(|(i, field)| (*field, ColumnId::new(i)))
            .collect();
        Self {
            version: version.as_str().to_string(),
            range: None,
            by_column,
            by_field,
        }
    }

    /// Returns the latest built-in schema.
    pub fn latest() -> Self {
        Self::builtin(SchemaVersion::LATEST)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Data range named by the descriptor, if any.
    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }

    /// Number of columns in a row.
    pub fn width(&self) -> usize {
        self.by_column.len()
    }

    /// Fields in column order.
    pub fn fields(&self) -> &[Field] {
        &self.by_column
    }

    /// Returns `true` if the schema maps `field`.
    pub fn contains(&self, field: Field) -> bool {
        self.by_field.contains_key(&field)
    }

    /// Column of a typed field, if mapped.
    pub fn column_of(&self, field: Field) -> Option<ColumnId> {
        self.by_field.get(&field).copied()
    }

    /// Resolves a field name to its column.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::UnknownField`] if the name is not a field, or is a
    /// field this schema does not map.
    pub fn resolve_column(&self, name: &str) -> Result<ColumnId> {
        let field: Field = name.parse()?;
        self.column_of(field)
            .ok_or_else(|| BookError::UnknownField(name.to_string()))
    }

    /// Resolves a column to the field stored there.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::UnknownColumn`] if the column is outside the
    /// schema.
    pub fn resolve_field_name(&self, column: ColumnId) -> Result<Field> {
        self.by_column
            .get(column.index())
            .copied()
            .ok_or_else(|| BookError::UnknownColumn(column.to_string()))
    }

    /// Last column of the layout.
    pub fn last_column(&self) -> ColumnId {
        ColumnId::new(self.width().saturating_sub(1))
    }

    /// A1 range covering all data rows of `sheet`, starting at `first_row`
    /// (1-based spreadsheet row of the first record).
    pub fn data_range(&self, sheet: &str, first_row: usize) -> String {
        format!("{sheet}!A{first_row}:{}", self.last_column())
    }

    /// A1 range of a single data row.
    pub fn row_range(&self, sheet: &str, first_row: usize, row: usize) -> String {
        let n = first_row + row;
        format!("{sheet}!A{n}:{}{n}", self.last_column())
    }

    /// Fields of `older` that this schema moved or dropped.
    ///
    /// Any entry means rows written under `older` would be misread.
    pub fn drift(&self, older: &ColumnSchema) -> Vec<Field> {
        older
            .by_column
            .iter()
            .enumerate()
            .filter(|(i, field)| self.column_of(**field) != Some(ColumnId::new(*i)))
            .map(|(_, field)| *field)
            .collect()
    }

    /// Returns `true` if every field of `older` keeps its column here.
    pub fn is_compatible_with(&self, older: &ColumnSchema) -> bool {
        self.drift(older).is_empty()
    }

    /// Stable text form of the layout (`A=TITLE,B=AUTHORS,...`).
    pub fn canonical_layout(&self) -> String {
        self.by_column
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{}={}", ColumnId::new(i), field))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Converts back to a descriptor with explicit column letters.
    pub fn to_descriptor(&self) -> SchemaDescriptor {
        let mut descriptor = SchemaDescriptor::lettered(
            self.version.clone(),
            self.by_column
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name(), ColumnId::new(i).letters())),
        );
        descriptor.range = self.range.clone();
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_widths() {
        assert_eq!(ColumnSchema::builtin(SchemaVersion::V1).width(), 15);
        assert_eq!(ColumnSchema::builtin(SchemaVersion::V2).width(), 16);
        assert_eq!(ColumnSchema::builtin(SchemaVersion::V3).width(), 17);
    }

    #[test]
    fn test_builtin_matches_descriptor() {
        for version in SchemaVersion::ALL {
            let from_descriptor = ColumnSchema::from_descriptor(&version.descriptor()).unwrap();
            assert_eq!(from_descriptor, ColumnSchema::builtin(version));
        }
    }

    #[test]
    fn test_resolve_both_directions() {
        let schema = ColumnSchema::latest();
        for (i, field) in schema.fields().iter().enumerate() {
            let column = schema.resolve_column(field.name()).unwrap();
            assert_eq!(column.index(), i);
            assert_eq!(schema.resolve_field_name(column).unwrap(), *field);
        }
    }

    #[test]
    fn test_resolve_misses_are_errors() {
        let schema = ColumnSchema::builtin(SchemaVersion::V1);
        assert_eq!(
            schema.resolve_column("NOT_A_FIELD"),
            Err(BookError::UnknownField("NOT_A_FIELD".to_string()))
        );
        assert_eq!(
            schema.resolve_column("PUBLIC"),
            Err(BookError::UnknownField("PUBLIC".to_string()))
        );
        assert_eq!(
            schema.resolve_field_name(ColumnId::new(15)),
            Err(BookError::UnknownColumn("P".to_string()))
        );
    }

    #[test]
    fn test_sheet_spec_map_layout() {
        let json = r#"{
            "version": "sheet",
            "range": "Books!A2:E",
            "columns": {
                "TITLE": "A",
                "AUTHORS": "B",
                "CREATED_TIMESTAMP": "D",
                "UPDATED_TIMESTAMP": "E",
                "COMMENTS": "C"
            }
        }"#;
        let descriptor: SchemaDescriptor = serde_json::from_str(json).unwrap();
        let schema = ColumnSchema::from_descriptor(&descriptor).unwrap();
        assert_eq!(
            schema.fields(),
            &[
                Field::Title,
                Field::Authors,
                Field::Comments,
                Field::CreatedTimestamp,
                Field::UpdatedTimestamp
            ]
        );
        assert_eq!(schema.range(), Some("Books!A2:E"));
    }

    #[test]
    fn test_duplicate_column_is_fatal() {
        let descriptor = SchemaDescriptor::lettered(
            "broken",
            [
                ("TITLE", "A"),
                ("AUTHORS", "B"),
                ("GENRES", "B"),
                ("CREATED_TIMESTAMP", "C"),
                ("UPDATED_TIMESTAMP", "D"),
            ],
        );
        let err = ColumnSchema::from_descriptor(&descriptor).unwrap_err();
        assert!(matches!(
            err,
            BookError::SchemaIntegrity(IntegrityViolation::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_repeated_letter_map_key_is_duplicate_field() {
        let json = r#"{"version": "dup", "columns": {
            "TITLE": "A", "AUTHORS": "B", "CREATED_TIMESTAMP": "C",
            "UPDATED_TIMESTAMP": "D", "TITLE": "E"
        }}"#;
        let descriptor: SchemaDescriptor = serde_json::from_str(json).unwrap();
        assert!(matches!(descriptor.columns, ColumnLayout::Lettered(ref map) if map.0.len() == 5));

        let err = ColumnSchema::from_descriptor(&descriptor).unwrap_err();
        assert_eq!(
            err,
            BookError::SchemaIntegrity(IntegrityViolation::DuplicateField("TITLE".into()))
        );
    }

    #[test]
    fn test_letter_map_keeps_listing_order() {
        let json = r#"{"version": "x", "columns": {"TITLE": "A", "AUTHORS": "B"}}"#;
        let descriptor: SchemaDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            serde_json::to_string(&descriptor.columns).unwrap(),
            r#"{"TITLE":"A","AUTHORS":"B"}"#
        );
    }

    #[test]
    fn test_ranges() {
        let schema = ColumnSchema::builtin(SchemaVersion::V2);
        assert_eq!(schema.data_range("Books", 2), "Books!A2:P");
        assert_eq!(schema.row_range("Books", 2, 0), "Books!A2:P2");
        assert_eq!(schema.row_range("Books", 2, 9), "Books!A11:P11");
    }

    #[test]
    fn test_drift_detects_moved_columns() {
        let v2 = ColumnSchema::builtin(SchemaVersion::V2);
        let v3 = ColumnSchema::builtin(SchemaVersion::V3);
        assert!(v3.is_compatible_with(&v2));
        // narrowing drops STARRED and PUBLIC
        assert_eq!(
            ColumnSchema::builtin(SchemaVersion::V1).drift(&v3),
            vec![Field::Starred, Field::Public]
        );

        let mut fields: Vec<&str> = SchemaVersion::V2.fields().iter().map(|f| f.name()).collect();
        fields.swap(0, 1);
        let swapped = ColumnSchema::from_descriptor(&SchemaDescriptor::ordered("swapped", fields))
            .unwrap();
        assert_eq!(swapped.drift(&v2), vec![Field::Title, Field::Authors]);
    }

    #[test]
    fn test_descriptor_round_trip() {
        let schema = ColumnSchema::builtin(SchemaVersion::V2);
        let descriptor = schema.to_descriptor();
        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: SchemaDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(ColumnSchema::from_descriptor(&parsed).unwrap(), schema);
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("V2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert!("v9".parse::<SchemaVersion>().is_err());
    }
}
