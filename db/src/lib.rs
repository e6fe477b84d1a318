//! Schema loading, configuration and row storage for the bookshelf.
//!
//! This crate connects the record model of `bookshelf-core` to where rows
//! actually live: it loads column schema descriptors, reads the shelf
//! configuration, and reads and writes data rows through an authenticated
//! [`RowStore`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bookshelf_db::{Bookshelf, NoAuth, ShelfConfig, ValuesFile};
//!
//! let config = ShelfConfig::load("bookshelf.yml").unwrap();
//! let schema = Arc::new(config.load_schema().unwrap());
//! let store = ValuesFile::open("books.json").unwrap();
//!
//! let shelf = Bookshelf::load(schema, config.sheet.clone(), NoAuth, store).unwrap();
//! for book in shelf.records() {
//!     println!("{} by {}", book.title, book.authors);
//! }
//! ```

mod config;
mod error;
mod loader;
mod session;
mod shelf;
mod values;

pub use config::{PublicConfig, SchemaSelection, SheetConfig, ShelfConfig};
pub use error::{Result, StoreError};
pub use loader::{SchemaRegistry, fingerprint, load_descriptor, load_schema};
pub use session::{AccessToken, AuthenticatedCall, NoAuth, SessionError, TokenSession, TokenSource};
pub use shelf::{Bookshelf, SkippedRow, parse_rows};
pub use values::{RowStore, ValueRange, ValuesFile};
