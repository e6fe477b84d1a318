//! Logical field names and the physical column positions they map to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BookError, IntegrityViolation};

/// Logical name of a book record field.
///
/// These names are what schema descriptors refer to. They are stable across
/// schema versions; only their physical column changes between descriptors.
///
/// # Examples
///
/// ```
/// use bookshelf_core::{Field, FieldKind};
///
/// let field: Field = "WANT_TO_READ".parse().unwrap();
/// assert_eq!(field, Field::WantToRead);
/// assert_eq!(field.kind(), FieldKind::Flag);
/// assert!("NOT_A_FIELD".parse::<Field>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Title,
    Authors,
    Year,
    Genres,
    WantToRead,
    Read,
    WantToOwn,
    Owned,
    ImageUrl,
    DateRead,
    GoogleBooksId,
    Hidden,
    Comments,
    CreatedTimestamp,
    UpdatedTimestamp,
    Starred,
    Public,
}

/// How a field's cell is parsed and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Passed through unchanged.
    Text,
    /// Lenient boolean, written as `TRUE`/`FALSE`.
    Flag,
    /// Optional integer; unparsable input becomes absent.
    Year,
    /// Required Unix seconds; unparsable input rejects the row.
    Timestamp,
}

impl Field {
    /// Every field, in the column order of the latest built-in schema.
    pub const ALL: [Field; 17] = [
        Field::Title,
        Field::Authors,
        Field::Year,
        Field::Genres,
        Field::WantToRead,
        Field::Read,
        Field::WantToOwn,
        Field::Owned,
        Field::ImageUrl,
        Field::DateRead,
        Field::GoogleBooksId,
        Field::Hidden,
        Field::Comments,
        Field::CreatedTimestamp,
        Field::UpdatedTimestamp,
        Field::Starred,
        Field::Public,
    ];

    /// Fields a schema must map for records to be constructible.
    pub const REQUIRED: [Field; 4] = [
        Field::Title,
        Field::Authors,
        Field::CreatedTimestamp,
        Field::UpdatedTimestamp,
    ];

    /// Returns the descriptor name (e.g. `"GOOGLE_BOOKS_ID"`).
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "TITLE",
            Field::Authors => "AUTHORS",
            Field::Year => "YEAR",
            Field::Genres => "GENRES",
            Field::WantToRead => "WANT_TO_READ",
            Field::Read => "READ",
            Field::WantToOwn => "WANT_TO_OWN",
            Field::Owned => "OWNED",
            Field::ImageUrl => "IMAGE_URL",
            Field::DateRead => "DATE_READ",
            Field::GoogleBooksId => "GOOGLE_BOOKS_ID",
            Field::Hidden => "HIDDEN",
            Field::Comments => "COMMENTS",
            Field::CreatedTimestamp => "CREATED_TIMESTAMP",
            Field::UpdatedTimestamp => "UPDATED_TIMESTAMP",
            Field::Starred => "STARRED",
            Field::Public => "PUBLIC",
        }
    }

    /// Returns the semantic type of the field.
    pub fn kind(self) -> FieldKind {
        match self {
            Field::Year => FieldKind::Year,
            Field::CreatedTimestamp | Field::UpdatedTimestamp => FieldKind::Timestamp,
            Field::WantToRead
            | Field::Read
            | Field::WantToOwn
            | Field::Owned
            | Field::Hidden
            | Field::Starred
            | Field::Public => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| BookError::UnknownField(s.to_string()))
    }
}

/// Zero-based physical column position within a row.
///
/// Letter codes (`A`, `B`, ..., `Z`, `AA`, ...) only appear at the descriptor
/// and A1-range boundary; everything else works with the position.
///
/// # Examples
///
/// ```
/// use bookshelf_core::ColumnId;
///
/// let col: ColumnId = "C".parse().unwrap();
/// assert_eq!(col.index(), 2);
/// assert_eq!(ColumnId::new(26).to_string(), "AA");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl ColumnId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the zero-based position.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns the spreadsheet letter code for this column.
    pub fn letters(self) -> String {
        let mut n = self.0 + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8(out).unwrap_or_default()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl FromStr for ColumnId {
    type Err = IntegrityViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() || code.len() > 3 {
            return Err(IntegrityViolation::InvalidColumn(s.to_string()));
        }
        let mut n: usize = 0;
        for c in code.chars() {
            let upper = c.to_ascii_uppercase();
            if !upper.is_ascii_uppercase() {
                return Err(IntegrityViolation::InvalidColumn(s.to_string()));
            }
            n = n * 26 + (upper as usize - 'A' as usize + 1);
        }
        Ok(Self(n - 1))
    }
}
