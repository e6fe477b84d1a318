//! Filtered and sorted views over a set of records.
//!
//! # Example
//!
//! ```
//! use bookshelf_core::*;
//!
//! let mut a = BookRecord::new("Emma", "Austen");
//! a.starred = true;
//! let b = BookRecord::new("Dune", "Herbert");
//! let books = vec![a, b];
//!
//! let view = ViewOptions {
//!     filter: Filter::None,
//!     sort: Sort { by: SortBy::Title, desc: false },
//!     ..ViewOptions::default()
//! };
//! let titles: Vec<&str> = select(&books, &view).into_iter().map(|b| b.title.as_str()).collect();
//! assert_eq!(titles, vec!["Dune", "Emma"]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BookRecord;

/// Flag-based subset of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    None,
    Starred,
    WantToRead,
    WantToOwn,
}

impl Filter {
    pub fn accepts(self, record: &BookRecord) -> bool {
        match self {
            Filter::None => true,
            Filter::Starred => record.starred,
            Filter::WantToRead => record.want_to_read,
            Filter::WantToOwn => record.want_to_own,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Filter::None => "None",
            Filter::Starred => "Starred",
            Filter::WantToRead => "Want To Read",
            Filter::WantToOwn => "Want To Own",
        })
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" => Ok(Filter::None),
            "starred" => Ok(Filter::Starred),
            "wanttoread" => Ok(Filter::WantToRead),
            "wanttoown" => Ok(Filter::WantToOwn),
            _ => Err(format!("unknown filter '{s}'")),
        }
    }
}

/// Sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    Author,
    Title,
    Created,
    #[default]
    Updated,
    DateRead,
    Starred,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Author => "Author",
            SortBy::Title => "Title",
            SortBy::Created => "Creation Time",
            SortBy::Updated => "Last Updated",
            SortBy::DateRead => "Date Read",
            SortBy::Starred => "Starred",
        })
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "author" => Ok(SortBy::Author),
            "title" => Ok(SortBy::Title),
            "created" | "creationtime" => Ok(SortBy::Created),
            "updated" | "lastupdated" => Ok(SortBy::Updated),
            "dateread" => Ok(SortBy::DateRead),
            "starred" => Ok(SortBy::Starred),
            _ => Err(format!("unknown sort key '{s}'")),
        }
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Sort key and direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub by: SortBy,
    pub desc: bool,
}

impl Sort {
    /// Compares two records by this sort; ties fall back to row position.
    pub fn compare(&self, a: &BookRecord, b: &BookRecord) -> Ordering {
        let primary = match self.by {
            SortBy::Author => cmp_text(&a.authors, &b.authors),
            SortBy::Title => cmp_text(&a.title, &b.title),
            SortBy::Created => a.created_timestamp.cmp(&b.created_timestamp),
            SortBy::Updated => a.updated_timestamp.cmp(&b.updated_timestamp),
            SortBy::DateRead => cmp_text(&a.date_read, &b.date_read),
            // starred first in ascending order
            SortBy::Starred => b.starred.cmp(&a.starred),
        };
        let primary = if self.desc { primary.reverse() } else { primary };
        primary.then_with(|| a.row.cmp(&b.row))
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Everything that shapes a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Free-text query; empty matches everything.
    pub query: String,
    pub filter: Filter,
    pub sort: Sort,
    /// Include records flagged hidden.
    pub include_hidden: bool,
}

/// Returns the records visible under `options`, in sort order.
pub fn select<'a>(records: &'a [BookRecord], options: &ViewOptions) -> Vec<&'a BookRecord> {
    let mut selected: Vec<&BookRecord> = records
        .iter()
        .filter(|r| options.include_hidden || !r.hidden)
        .filter(|r| options.filter.accepts(r))
        .filter(|r| r.matches_search(&options.query))
        .collect();
    selected.sort_by(|a, b| options.sort.compare(a, b));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(row: usize, title: &str, authors: &str) -> BookRecord {
        BookRecord {
            row: Some(row),
            ..BookRecord::new(title, authors)
        }
    }

    fn shelf() -> Vec<BookRecord> {
        let mut emma = book(0, "Emma", "Jane Austen");
        emma.updated_timestamp = 30;
        emma.want_to_read = true;
        let mut dune = book(1, "dune", "Frank Herbert");
        dune.updated_timestamp = 10;
        dune.starred = true;
        let mut hidden = book(2, "Secret", "Anon");
        hidden.hidden = true;
        let mut ubik = book(3, "Ubik", "Philip K. Dick");
        ubik.updated_timestamp = 20;
        ubik.starred = true;
        vec![emma, dune, hidden, ubik]
    }

    fn titles<'a>(view: Vec<&'a BookRecord>) -> Vec<&'a str> {
        view.into_iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_hidden_excluded_by_default() {
        let books = shelf();
        let view = select(&books, &ViewOptions::default());
        assert_eq!(titles(view), vec!["dune", "Ubik", "Emma"]);

        let all = select(
            &books,
            &ViewOptions {
                include_hidden: true,
                ..ViewOptions::default()
            },
        );
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let books = shelf();
        let view = select(
            &books,
            &ViewOptions {
                sort: Sort {
                    by: SortBy::Title,
                    desc: true,
                },
                ..ViewOptions::default()
            },
        );
        assert_eq!(titles(view), vec!["Ubik", "Emma", "dune"]);
    }

    #[test]
    fn test_filter_and_query() {
        let books = shelf();
        let starred = select(
            &books,
            &ViewOptions {
                filter: Filter::Starred,
                sort: Sort {
                    by: SortBy::Author,
                    desc: false,
                },
                ..ViewOptions::default()
            },
        );
        assert_eq!(titles(starred), vec!["dune", "Ubik"]);

        let queried = select(
            &books,
            &ViewOptions {
                query: "austen".into(),
                ..ViewOptions::default()
            },
        );
        assert_eq!(titles(queried), vec!["Emma"]);
    }

    #[test]
    fn test_starred_sort_puts_starred_first() {
        let books = shelf();
        let view = select(
            &books,
            &ViewOptions {
                sort: Sort {
                    by: SortBy::Starred,
                    desc: false,
                },
                ..ViewOptions::default()
            },
        );
        assert_eq!(titles(view), vec!["dune", "Ubik", "Emma"]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Want To Read".parse::<Filter>().unwrap(), Filter::WantToRead);
        assert_eq!("want-to-own".parse::<Filter>().unwrap(), Filter::WantToOwn);
        assert_eq!("Last Updated".parse::<SortBy>().unwrap(), SortBy::Updated);
        assert_eq!("date_read".parse::<SortBy>().unwrap(), SortBy::DateRead);
        assert!("shelf".parse::<SortBy>().is_err());
    }
}
