//! Shareable entries for the public view of a shelf.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BookRecord;

/// The subset of a record published for records flagged public.
///
/// # Examples
///
/// ```
/// use bookshelf_core::*;
///
/// let mut book = BookRecord::new("Dune", "Frank Herbert");
/// book.row = Some(4);
/// book.year = Some(1965);
/// let entry = PublicBookEntry::from_record(&book);
/// assert_eq!(entry.to_string(), "Dune, by Frank Herbert (1965). Not read.");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicBookEntry {
    pub id: usize,
    pub title: String,
    pub authors: String,
    pub year: String,
    pub image_url: String,
    pub google_books_id: String,
    pub comments: String,
    pub date_read: String,
}

impl PublicBookEntry {
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            id: record.row.unwrap_or_default(),
            title: record.title.clone(),
            authors: record.authors.clone(),
            year: crate::cell::format_optional(record.year),
            image_url: record.image_url.clone(),
            google_books_id: record.google_books_id.clone(),
            comments: record.comments.clone(),
            date_read: record.date_read.clone(),
        }
    }
}

impl fmt::Display for PublicBookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, by {} ({}). ", self.title, self.authors, self.year)?;
        if self.date_read.is_empty() {
            f.write_str("Not read.")
        } else {
            write!(f, "Read: {}.", self.date_read)
        }
    }
}

/// Entries for every saved, visible record flagged public, in row order.
pub fn public_entries(records: &[BookRecord]) -> Vec<PublicBookEntry> {
    let mut entries: Vec<PublicBookEntry> = records
        .iter()
        .filter(|r| r.public && !r.hidden && r.row.is_some())
        .map(PublicBookEntry::from_record)
        .collect();
    entries.sort_by_key(|e| e.id);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_read() {
        let entry = PublicBookEntry {
            title: "Emma".into(),
            authors: "Jane Austen".into(),
            year: "1815".into(),
            date_read: "2021".into(),
            ..PublicBookEntry::default()
        };
        assert_eq!(entry.to_string(), "Emma, by Jane Austen (1815). Read: 2021.");
    }

    #[test]
    fn test_only_saved_public_records() {
        let mut shown = BookRecord::new("Shown", "A");
        shown.row = Some(3);
        shown.public = true;
        let mut first = BookRecord::new("First", "B");
        first.row = Some(1);
        first.public = true;
        let mut private = BookRecord::new("Private", "C");
        private.row = Some(2);
        let mut unsaved = BookRecord::new("Unsaved", "D");
        unsaved.public = true;
        let mut hidden = BookRecord::new("Hidden", "E");
        hidden.row = Some(4);
        hidden.public = true;
        hidden.hidden = true;

        let entries = public_entries(&[shown, first, private, unsaved, hidden]);
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Shown"]);
        assert_eq!(entries[1].id, 3);
    }

    #[test]
    fn test_json_shape() {
        let mut book = BookRecord::new("Dune", "Frank Herbert");
        book.row = Some(0);
        let json = serde_json::to_value(PublicBookEntry::from_record(&book)).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["year"], "");
        assert_eq!(json["google_books_id"], "");
    }
}
