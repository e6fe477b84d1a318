//! The loaded collection of book records.
//!
//! A [`Bookshelf`] reads every data row once, parses rows in parallel, and
//! keeps rows that fail to parse aside instead of aborting the load. Edits
//! are written through to the [`RowStore`] row by row.

use std::sync::Arc;

use bookshelf_core::{
    BookError, BookRecord, ColumnSchema, Field, PublicBookEntry, TimestampPolicy, ViewOptions,
    format_boolean, public_entries, select,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::SheetConfig;
use crate::error::{Result, StoreError};
use crate::session::AuthenticatedCall;
use crate::values::RowStore;

/// A data row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based data row index.
    pub row: usize,
    pub error: BookError,
}

/// Parses raw rows into records, splitting off the malformed ones.
///
/// Rows are parsed in parallel; the returned lists are in row order.
pub fn parse_rows(
    schema: &ColumnSchema,
    rows: &[Vec<String>],
) -> (Vec<BookRecord>, Vec<SkippedRow>) {
    let parsed: Vec<(usize, std::result::Result<BookRecord, BookError>)> = rows
        .par_iter()
        .enumerate()
        .map(|(row, cells)| (row, BookRecord::parse(schema, Some(row), cells)))
        .collect();

    let mut records = Vec::with_capacity(parsed.len());
    let mut skipped = Vec::new();
    for (row, result) in parsed {
        match result {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(row, %error, "skipping malformed row");
                skipped.push(SkippedRow { row, error });
            }
        }
    }
    (records, skipped)
}

/// Records of one sheet, bound to the store they came from.
pub struct Bookshelf<S, A> {
    schema: Arc<ColumnSchema>,
    sheet: SheetConfig,
    store: S,
    session: A,
    records: Vec<BookRecord>,
    skipped: Vec<SkippedRow>,
}

impl<S: RowStore, A: AuthenticatedCall> Bookshelf<S, A> {
    /// Reads and parses every data row of `store`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Session`] if the read fails. Malformed rows do
    /// not fail the load; see [`skipped`](Self::skipped).
    pub fn load(
        schema: Arc<ColumnSchema>,
        sheet: SheetConfig,
        session: A,
        store: S,
    ) -> Result<Self> {
        let rows = session.call(|token| store.read_rows(token))?;
        let (records, skipped) = parse_rows(&schema, &rows);
        info!(
            schema = schema.version(),
            records = records.len(),
            skipped = skipped.len(),
            "loaded bookshelf"
        );
        Ok(Self {
            schema,
            sheet,
            store,
            session,
            records,
            skipped,
        })
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record stored at data row `row`.
    pub fn get(&self, row: usize) -> Option<&BookRecord> {
        self.records.iter().find(|r| r.row == Some(row))
    }

    /// Filtered and sorted view of the records.
    pub fn view(&self, options: &ViewOptions) -> Vec<&BookRecord> {
        select(&self.records, options)
    }

    /// Public entries of every visible record flagged public.
    pub fn public_entries(&self) -> Vec<PublicBookEntry> {
        public_entries(&self.records)
    }

    /// Appends a new record, stamping both timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Session`] if the append fails.
    pub fn add(&mut self, record: &BookRecord) -> Result<&BookRecord> {
        let cells = record.to_raw_row(&self.schema, TimestampPolicy::CREATE);
        let row = self
            .session
            .call(|token| self.store.append_row(token, &cells))?;
        let stored = BookRecord::parse(&self.schema, Some(row), &cells)?;
        info!(row, title = %stored.title, "added book");
        self.records.push(stored);
        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    /// Sets one field of the record at `row` by column name and writes the
    /// row back with a fresh update timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowNotFound`] for an unknown row, or the
    /// record error for an unknown field or bad value. The stored record is
    /// unchanged on error.
    pub fn update_field(&mut self, row: usize, name: &str, value: &str) -> Result<&BookRecord> {
        let index = self.position(row)?;
        let mut updated = self.records[index].clone();
        updated.update(&self.schema, name, value)?;
        debug!(row, field = name, "updating field");
        self.write(index, updated)
    }

    /// Merges catalog data into the record at `row` and writes it back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowNotFound`] for an unknown row, or
    /// [`StoreError::Session`] if the write fails.
    pub fn merge(&mut self, row: usize, partial: &BookRecord) -> Result<&BookRecord> {
        let index = self.position(row)?;
        let mut merged = self.records[index].clone();
        let changed = merged.merge_changes(partial);
        merged.merge_from(partial);
        debug!(row, changed = changed.len(), "merging catalog data");
        self.write(index, merged)
    }

    /// Removes the record at `row` from the visible shelf by flagging it
    /// hidden and writing the row back. Views skip it unless they include
    /// hidden records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowNotFound`] for an unknown row, or
    /// [`StoreError::Session`] if the write fails.
    pub fn remove(&mut self, row: usize) -> Result<&BookRecord> {
        self.update_field(row, Field::Hidden.name(), format_boolean(true))
    }

    fn position(&self, row: usize) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.row == Some(row))
            .ok_or(StoreError::RowNotFound(row))
    }

    fn write(&mut self, index: usize, record: BookRecord) -> Result<&BookRecord> {
        let row = record.row.ok_or(StoreError::RowNotFound(index))?;
        let cells = record.to_raw_row(&self.schema, TimestampPolicy::TOUCH);
        let range = self
            .schema
            .row_range(&self.sheet.name, self.sheet.first_data_row, row);
        self.session
            .call(|token| self.store.write_row(token, row, &range, &cells))?;
        self.records[index] = BookRecord::parse(&self.schema, Some(row), &cells)?;
        Ok(&self.records[index])
    }
}
