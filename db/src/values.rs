//! Row storage.
//!
//! [`RowStore`] is the seam to whatever holds the spreadsheet. [`ValuesFile`]
//! implements it over a local JSON file in the spreadsheet API's value-range
//! shape:
//!
//! ```json
//! {
//!   "range": "Books!A2:Q",
//!   "majorDimension": "ROWS",
//!   "values": [["Dune", "Frank Herbert", "1965", "..."]]
//! }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::session::{AccessToken, SessionError};

/// Backend holding the data rows of one sheet.
///
/// Row indices are zero-based positions within the data range.
pub trait RowStore {
    /// Reads every data row.
    fn read_rows(&self, token: &AccessToken) -> std::result::Result<Vec<Vec<String>>, SessionError>;

    /// Overwrites the row at `row`; `range` is its A1 address.
    fn write_row(
        &mut self,
        token: &AccessToken,
        row: usize,
        range: &str,
        cells: &[String],
    ) -> std::result::Result<(), SessionError>;

    /// Appends a row and returns its index.
    fn append_row(
        &mut self,
        token: &AccessToken,
        cells: &[String],
    ) -> std::result::Result<usize, SessionError>;
}

fn default_dimension() -> String {
    "ROWS".to_string()
}

/// A block of rows as returned by the spreadsheet values API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default = "default_dimension")]
    pub major_dimension: String,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn new(range: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            major_dimension: default_dimension(),
            values: Vec::new(),
        }
    }
}

/// Local JSON file acting as the sheet.
///
/// Writes go to memory and are persisted immediately, so the file always
/// reflects the last successful write. A write that fails to persist is
/// undone in memory as well.
#[derive(Debug)]
pub struct ValuesFile {
    path: PathBuf,
    data: ValueRange,
}

impl ValuesFile {
    /// Opens an existing values file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`JsonError`](crate::StoreError::JsonError) if it is not a
    /// value range.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let data: ValueRange = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), rows = data.values.len(), "opened values file");
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Opens `path`, creating an empty file for `range` if it does not exist.
    pub fn open_or_create(path: impl AsRef<Path>, range: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::open(path);
        }
        let values = Self {
            path: path.to_path_buf(),
            data: ValueRange::new(range),
        };
        values.save()?;
        Ok(values)
    }

    /// Writes the current contents to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.data)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.data.values
    }

    fn persist(&self) -> std::result::Result<(), SessionError> {
        self.save()
            .map_err(|err| SessionError::Backend(err.to_string()))
    }
}

impl RowStore for ValuesFile {
    fn read_rows(&self, _token: &AccessToken) -> std::result::Result<Vec<Vec<String>>, SessionError> {
        Ok(self.data.values.clone())
    }

    fn write_row(
        &mut self,
        _token: &AccessToken,
        row: usize,
        range: &str,
        cells: &[String],
    ) -> std::result::Result<(), SessionError> {
        debug!(row, range, "writing row");
        let len = self.data.values.len();
        if len <= row {
            self.data.values.resize(row + 1, Vec::new());
        }
        let previous = std::mem::replace(&mut self.data.values[row], cells.to_vec());
        if let Err(err) = self.persist() {
            self.data.values[row] = previous;
            self.data.values.truncate(len);
            return Err(err);
        }
        Ok(())
    }

    fn append_row(
        &mut self,
        _token: &AccessToken,
        cells: &[String],
    ) -> std::result::Result<usize, SessionError> {
        let row = self.data.values.len();
        debug!(row, "appending row");
        self.data.values.push(cells.to_vec());
        if let Err(err) = self.persist() {
            self.data.values.pop();
            return Err(err);
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_deserialize_api_shape() {
        let json = r#"{"range": "Books!A2:Q", "values": [["Dune", "Frank Herbert"], []]}"#;
        let range: ValueRange = serde_json::from_str(json).unwrap();
        assert_eq!(range.major_dimension, "ROWS");
        assert_eq!(range.values.len(), 2);
        assert!(range.values[1].is_empty());
    }

    #[test]
    fn test_missing_values_key_is_empty() {
        let range: ValueRange = serde_json::from_str(r#"{"range": "Books!A2:Q"}"#).unwrap();
        assert!(range.values.is_empty());
    }

    #[test]
    fn test_write_append_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let token = AccessToken::new("");

        let mut file = ValuesFile::open_or_create(&path, "Books!A2:Q").unwrap();
        assert_eq!(file.append_row(&token, &cells(&["A"])).unwrap(), 0);
        assert_eq!(file.append_row(&token, &cells(&["B"])).unwrap(), 1);
        file.write_row(&token, 0, "Books!A2:Q2", &cells(&["A2"]))
            .unwrap();
        file.write_row(&token, 3, "Books!A5:Q5", &cells(&["D"]))
            .unwrap();

        let reopened = ValuesFile::open(&path).unwrap();
        assert_eq!(
            reopened.rows(),
            &[cells(&["A2"]), cells(&["B"]), Vec::new(), cells(&["D"])]
        );
        assert_eq!(reopened.read_rows(&token).unwrap().len(), 4);
    }

    #[test]
    fn test_failed_persist_leaves_rows_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let token = AccessToken::new("");

        let mut file = ValuesFile::open_or_create(sub.join("books.json"), "Books!A2:Q").unwrap();
        file.append_row(&token, &cells(&["A"])).unwrap();

        // A plain file where the parent directory was makes every save fail.
        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, "not a directory").unwrap();

        assert!(file.append_row(&token, &cells(&["B"])).is_err());
        assert!(file.write_row(&token, 0, "Books!A2:Q2", &cells(&["A2"])).is_err());
        assert!(file.write_row(&token, 3, "Books!A5:Q5", &cells(&["D"])).is_err());
        assert_eq!(file.rows(), &[cells(&["A"])]);

        std::fs::remove_file(&sub).unwrap();
        assert_eq!(file.append_row(&token, &cells(&["B"])).unwrap(), 1);
        assert_eq!(ValuesFile::open(file.path()).unwrap().rows().len(), 2);
    }
}
