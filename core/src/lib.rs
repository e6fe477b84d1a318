//! Column schema and typed book records for spreadsheet-backed book tracking.
//!
//! Books are stored one per spreadsheet row, positionally. This crate owns
//! the translation between those rows and typed records:
//!
//! - [`ColumnSchema`]: validated bijection between logical [`Field`]s and
//!   column positions, built from a [`SchemaDescriptor`] or a built-in
//!   [`SchemaVersion`].
//! - [`BookRecord`]: the typed book, parsed from and serialized to rows
//!   through a schema, with search and merge semantics.
//! - [`select`]: filtered, sorted views over records.
//! - [`CatalogQuery`] / [`VolumesResponse`]: the catalog enrichment adapter
//!   producing partial records for [`BookRecord::merge_from`].
//! - [`PublicBookEntry`]: the shareable view of records flagged public.
//!
//! # Example
//!
//! ```
//! use bookshelf_core::*;
//!
//! let schema = ColumnSchema::builtin(SchemaVersion::V3);
//!
//! let mut book = BookRecord::new("Dune", "Frank Herbert");
//! book.update(&schema, "READ", "TRUE").unwrap();
//! assert!(book.update(&schema, "NOT_A_FIELD", "x").is_err());
//!
//! let row = book.to_raw_row_at(&schema, TimestampPolicy::CREATE, 1_700_000_000);
//! let stored = BookRecord::parse(&schema, Some(0), &row).unwrap();
//! assert!(stored.read);
//! assert_eq!(stored.created_timestamp, 1_700_000_000);
//! assert!(stored.matches_search("herbert"));
//! ```

mod catalog;
mod cell;
mod error;
mod field;
mod merge;
mod public;
mod record;
mod schema;
mod validate;
mod view;

pub use catalog::{
    CatalogQuery, CatalogSearch, ImageLinks, VOLUMES_ENDPOINT, Volume, VolumeInfo,
    VolumesResponse,
};
pub use cell::{format_boolean, format_optional, parse_boolean, parse_timestamp, parse_year};
pub use error::{BookError, CatalogError, IntegrityViolation, Result};
pub use field::{ColumnId, Field, FieldKind};
pub use merge::MERGEABLE_FIELDS;
pub use public::{PublicBookEntry, public_entries};
pub use record::{BookRecord, LIST_DELIMITER, TimestampPolicy, join_list};
pub use schema::{
    ColumnEntry, ColumnLayout, ColumnSchema, LetterMap, SchemaDescriptor, SchemaVersion,
};
pub use validate::validate_descriptor;
pub use view::{Filter, Sort, SortBy, ViewOptions, select};
