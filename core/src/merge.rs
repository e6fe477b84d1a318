//! Overlaying catalog data onto existing records.
//!
//! Only catalog-sourced fields take part in a merge. Reading flags, comments,
//! visibility and timestamps are curated by the user and are never touched,
//! and an empty value in the partial record never clears a populated one.
//!
//! # Example
//!
//! ```
//! use bookshelf_core::BookRecord;
//!
//! let mut book = BookRecord::new("Old", "Someone");
//! book.year = Some(2000);
//! book.read = true;
//!
//! let mut partial = BookRecord::default();
//! partial.year = Some(2020);
//!
//! book.merge_from(&partial);
//! assert_eq!(book.title, "Old");
//! assert_eq!(book.year, Some(2020));
//! assert!(book.read);
//! ```

use crate::{BookRecord, Field};

/// Fields a merge may overwrite.
pub const MERGEABLE_FIELDS: [Field; 6] = [
    Field::Title,
    Field::Authors,
    Field::Genres,
    Field::Year,
    Field::GoogleBooksId,
    Field::ImageUrl,
];

impl BookRecord {
    /// Overwrites catalog-sourced fields with the non-empty values of
    /// `partial`.
    pub fn merge_from(&mut self, partial: &BookRecord) {
        overlay(&mut self.title, &partial.title);
        overlay(&mut self.authors, &partial.authors);
        overlay(&mut self.genres, &partial.genres);
        if partial.year.is_some() {
            self.year = partial.year;
        }
        overlay(&mut self.google_books_id, &partial.google_books_id);
        overlay(&mut self.image_url, &partial.image_url);
    }

    /// Returns the mergeable fields whose value `partial` would change.
    pub fn merge_changes(&self, partial: &BookRecord) -> Vec<Field> {
        let mut merged = self.clone();
        merged.merge_from(partial);
        MERGEABLE_FIELDS
            .into_iter()
            .filter(|field| merged.cell(*field) != self.cell(*field))
            .collect()
    }
}

fn overlay(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}
