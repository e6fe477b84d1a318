//! Typed book records and their row encoding.
//!
//! A [`BookRecord`] is parsed from a positional row through a
//! [`ColumnSchema`] and serialized back through the same schema. Fields the
//! schema does not map keep their defaults and are not written.

use serde::{Deserialize, Serialize};

use crate::cell::{format_boolean, format_optional, parse_boolean, parse_timestamp, parse_year};
use crate::error::{BookError, Result};
use crate::{ColumnSchema, Field, FieldKind};

/// Separator between multiple authors or genres inside one cell.
pub const LIST_DELIMITER: char = ';';

/// Which timestamp columns are stamped with the current time on write.
///
/// # Examples
///
/// ```
/// use bookshelf_core::TimestampPolicy;
///
/// assert!(!TimestampPolicy::KEEP.refresh_updated);
/// assert!(TimestampPolicy::TOUCH.refresh_updated);
/// assert!(TimestampPolicy::CREATE.refresh_created);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampPolicy {
    /// Write the current time into `UPDATED_TIMESTAMP`.
    pub refresh_updated: bool,
    /// Write the current time into `CREATED_TIMESTAMP`.
    pub refresh_created: bool,
}

impl TimestampPolicy {
    /// Write both timestamps as stored.
    pub const KEEP: Self = Self {
        refresh_updated: false,
        refresh_created: false,
    };
    /// Stamp the update time (edits to a saved record).
    pub const TOUCH: Self = Self {
        refresh_updated: true,
        refresh_created: false,
    };
    /// Stamp both times (first write of a new record).
    pub const CREATE: Self = Self {
        refresh_updated: true,
        refresh_created: true,
    };
}

/// One tracked book.
///
/// `row` is the data row index once the record has been saved, `None` for a
/// record that only exists locally.
///
/// # Examples
///
/// ```
/// use bookshelf_core::*;
///
/// let schema = ColumnSchema::builtin(SchemaVersion::V3);
/// let row = [
///     "Dune", "Frank Herbert", "1965", "Sci-Fi", "FALSE", "TRUE", "FALSE", "TRUE",
///     "", "2020-05", "", "FALSE", "classic", "1600000000", "1600000100", "TRUE",
/// ];
/// let book = BookRecord::parse(&schema, Some(3), &row).unwrap();
/// assert_eq!(book.year, Some(1965));
/// assert!(book.read && book.owned && book.starred);
/// assert!(!book.public); // trailing PUBLIC cell was missing
/// assert_eq!(book.to_raw_row(&schema, TimestampPolicy::KEEP)[16], "FALSE");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub title: String,
    /// `;`-joined author names.
    pub authors: String,
    pub year: Option<i32>,
    /// `;`-joined genre names.
    pub genres: String,
    pub want_to_read: bool,
    pub read: bool,
    pub want_to_own: bool,
    pub owned: bool,
    pub image_url: String,
    /// Free-form; never parsed as a date.
    pub date_read: String,
    /// External catalog identifier.
    pub google_books_id: String,
    pub hidden: bool,
    pub comments: String,
    pub created_timestamp: i64,
    pub updated_timestamp: i64,
    pub starred: bool,
    pub public: bool,
}

impl BookRecord {
    /// Creates an unsaved record.
    pub fn new(title: impl Into<String>, authors: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: authors.into(),
            ..Self::default()
        }
    }

    /// Parses a stored row.
    ///
    /// Every schema column is applied in order. Rows shorter than the schema
    /// are padded with empty cells, which keeps rows written before later
    /// columns were added readable.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::MalformedRow`] if the row has more cells than the
    /// schema has columns, or a timestamp cell is not an integer.
    pub fn parse<S: AsRef<str>>(
        schema: &ColumnSchema,
        row: Option<usize>,
        cells: &[S],
    ) -> Result<Self> {
        if cells.len() > schema.width() {
            return Err(BookError::malformed(
                row,
                format!(
                    "row has {} cells but schema {} has {} columns",
                    cells.len(),
                    schema.version(),
                    schema.width()
                ),
            ));
        }

        let mut record = Self {
            row,
            ..Self::default()
        };
        for (i, field) in schema.fields().iter().enumerate() {
            let value = cells.get(i).map(AsRef::as_ref).unwrap_or("");
            record.set(*field, value)?;
        }
        Ok(record)
    }

    /// Updates the field stored under `name` from its raw cell value.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::UnknownField`] if the active schema does not map
    /// `name`, and [`BookError::MalformedRow`] for a non-numeric timestamp.
    /// The record is unchanged on error.
    pub fn update(&mut self, schema: &ColumnSchema, name: &str, value: &str) -> Result<&mut Self> {
        let column = schema.resolve_column(name)?;
        let field = schema.resolve_field_name(column)?;
        self.set(field, value)
    }

    /// Updates a typed field from its raw cell value.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::MalformedRow`] if `field` is a timestamp and
    /// `value` is not an integer; the record is unchanged.
    pub fn set(&mut self, field: Field, value: &str) -> Result<&mut Self> {
        match field {
            Field::Title => self.title = value.to_string(),
            Field::Authors => self.authors = value.to_string(),
            Field::Year => self.year = parse_year(value),
            Field::Genres => self.genres = value.to_string(),
            Field::WantToRead => self.want_to_read = parse_boolean(value),
            Field::Read => self.read = parse_boolean(value),
            Field::WantToOwn => self.want_to_own = parse_boolean(value),
            Field::Owned => self.owned = parse_boolean(value),
            Field::ImageUrl => self.image_url = value.to_string(),
            Field::DateRead => self.date_read = value.to_string(),
            Field::GoogleBooksId => self.google_books_id = value.to_string(),
            Field::Hidden => self.hidden = parse_boolean(value),
            Field::Comments => self.comments = value.to_string(),
            Field::CreatedTimestamp => self.created_timestamp = self.timestamp(field, value)?,
            Field::UpdatedTimestamp => self.updated_timestamp = self.timestamp(field, value)?,
            Field::Starred => self.starred = parse_boolean(value),
            Field::Public => self.public = parse_boolean(value),
        }
        Ok(self)
    }

    fn timestamp(&self, field: Field, value: &str) -> Result<i64> {
        debug_assert_eq!(field.kind(), FieldKind::Timestamp);
        parse_timestamp(value).ok_or_else(|| {
            BookError::malformed(self.row, format!("{field} is not a timestamp: {value:?}"))
        })
    }

    /// Serialized cell value of one field.
    pub fn cell(&self, field: Field) -> String {
        let flag = |b: bool| format_boolean(b).to_string();
        match field {
            Field::Title => self.title.clone(),
            Field::Authors => self.authors.clone(),
            Field::Year => format_optional(self.year),
            Field::Genres => self.genres.clone(),
            Field::WantToRead => flag(self.want_to_read),
            Field::Read => flag(self.read),
            Field::WantToOwn => flag(self.want_to_own),
            Field::Owned => flag(self.owned),
            Field::ImageUrl => self.image_url.clone(),
            Field::DateRead => self.date_read.clone(),
            Field::GoogleBooksId => self.google_books_id.clone(),
            Field::Hidden => flag(self.hidden),
            Field::Comments => self.comments.clone(),
            Field::CreatedTimestamp => self.created_timestamp.to_string(),
            Field::UpdatedTimestamp => self.updated_timestamp.to_string(),
            Field::Starred => flag(self.starred),
            Field::Public => flag(self.public),
        }
    }

    /// Serializes the record into a row, stamping timestamps with the
    /// current time as `policy` asks.
    pub fn to_raw_row(&self, schema: &ColumnSchema, policy: TimestampPolicy) -> Vec<String> {
        self.to_raw_row_at(schema, policy, chrono::Utc::now().timestamp())
    }

    /// Like [`to_raw_row`](Self::to_raw_row) with an explicit current time
    /// (Unix seconds).
    pub fn to_raw_row_at(
        &self,
        schema: &ColumnSchema,
        policy: TimestampPolicy,
        now: i64,
    ) -> Vec<String> {
        schema
            .fields()
            .iter()
            .map(|field| match field {
                Field::UpdatedTimestamp if policy.refresh_updated => now.to_string(),
                Field::CreatedTimestamp if policy.refresh_created => now.to_string(),
                _ => self.cell(*field),
            })
            .collect()
    }

    /// Case-insensitive substring search over title, authors, year, genres
    /// and comments.
    ///
    /// The empty query matches every record.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&self.title)
            || contains(&self.authors)
            || self.year.is_some_and(|y| y.to_string().contains(&needle))
            || contains(&self.genres)
            || contains(&self.comments)
    }

    /// Individual author names.
    pub fn author_list(&self) -> Vec<&str> {
        split_list(&self.authors)
    }

    /// Individual genre names.
    pub fn genre_list(&self) -> Vec<&str> {
        split_list(&self.genres)
    }
}

fn split_list(value: &str) -> Vec<&str> {
    value
        .split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Joins names into a single `;`-delimited cell.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}
