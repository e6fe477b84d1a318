//! Shelf configuration.
//!
//! Selects the active column schema and where the rows live. Loaded from a
//! YAML file (typically `bookshelf.yml`) once at startup.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! schema:
//!   builtin: v3
//! sheet:
//!   name: Books
//!   first_data_row: 2
//!   values: books.json
//! public:
//!   external_path: my-shelf
//!   output: public/my-shelf.json
//! ```
//!
//! A custom descriptor replaces the built-in layout:
//!
//! ```yaml
//! version: "1.0"
//! schema:
//!   descriptor: sheet_spec.json
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use bookshelf_core::{ColumnSchema, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::load_schema;

/// Which column schema is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSelection {
    /// One of the built-in layouts.
    Builtin(SchemaVersion),
    /// A descriptor file (JSON or YAML).
    Descriptor(PathBuf),
}

impl Default for SchemaSelection {
    fn default() -> Self {
        SchemaSelection::Builtin(SchemaVersion::LATEST)
    }
}

/// Where the data rows are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Sheet (tab) name used in A1 ranges.
    #[serde(default = "default_sheet_name")]
    pub name: String,
    /// 1-based spreadsheet row holding the first record (row 1 is the header).
    #[serde(default = "default_first_data_row")]
    pub first_data_row: usize,
    /// Local values file standing in for the sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<PathBuf>,
}

fn default_sheet_name() -> String {
    "Books".to_string()
}

fn default_first_data_row() -> usize {
    2
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            name: default_sheet_name(),
            first_data_row: default_first_data_row(),
            values: None,
        }
    }
}

/// Public view settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Path segment the public view is served under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_path: Option<String>,
    /// File the public entries are exported to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Top-level configuration.
///
/// # Examples
///
/// ```no_run
/// use bookshelf_db::ShelfConfig;
///
/// let config = ShelfConfig::load("bookshelf.yml").unwrap();
/// let schema = config.load_schema().unwrap();
/// println!("{} columns", schema.width());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub schema: SchemaSelection,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub public: PublicConfig,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            schema: SchemaSelection::default(),
            sheet: SheetConfig::default(),
            public: PublicConfig::default(),
        }
    }
}

impl ShelfConfig {
    /// Loads configuration from a YAML file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::StoreError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: ShelfConfig = serde_yaml::from_reader(reader)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let SchemaSelection::Descriptor(path) = &mut self.schema {
            resolve(path);
        }
        if let Some(path) = self.sheet.values.as_mut() {
            resolve(path);
        }
        if let Some(path) = self.public.output.as_mut() {
            resolve(path);
        }
    }

    /// Builds the selected column schema.
    ///
    /// # Errors
    ///
    /// Returns descriptor load or validation errors for
    /// [`SchemaSelection::Descriptor`].
    pub fn load_schema(&self) -> Result<ColumnSchema> {
        match &self.schema {
            SchemaSelection::Builtin(version) => Ok(ColumnSchema::builtin(*version)),
            SchemaSelection::Descriptor(path) => load_schema(path),
        }
    }

    /// A1 range of all data rows under `schema`.
    pub fn data_range(&self, schema: &ColumnSchema) -> String {
        schema.data_range(&self.sheet.name, self.sheet.first_data_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
schema:
  builtin: v2
sheet:
  name: Library
  first_data_row: 3
  values: books.json
public:
  external_path: my-shelf
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: ShelfConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.schema, SchemaSelection::Builtin(SchemaVersion::V2));
        assert_eq!(config.sheet.name, "Library");
        assert_eq!(config.sheet.first_data_row, 3);
        assert_eq!(config.sheet.values, Some(PathBuf::from("books.json")));
        assert_eq!(config.public.external_path.as_deref(), Some("my-shelf"));
        assert_eq!(config.public.output, None);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: ShelfConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert_eq!(config, ShelfConfig::default());
        assert_eq!(config.load_schema().unwrap().width(), 17);
    }

    #[test]
    fn test_data_range() {
        let config: ShelfConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let schema = config.load_schema().unwrap();
        assert_eq!(config.data_range(&schema), "Library!A3:P");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookshelf.yml");
        std::fs::write(&path, sample_yaml()).unwrap();

        let config = ShelfConfig::load(&path).unwrap();
        assert_eq!(config.sheet.values, Some(dir.path().join("books.json")));
    }

    #[test]
    fn test_descriptor_selection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("layout.json"),
            r#"{"version": "layout", "columns": ["TITLE", "AUTHORS", "CREATED_TIMESTAMP", "UPDATED_TIMESTAMP"]}"#,
        )
        .unwrap();
        let path = dir.path().join("bookshelf.yml");
        std::fs::write(&path, "version: \"1.0\"\nschema:\n  descriptor: layout.json\n").unwrap();

        let schema = ShelfConfig::load(&path).unwrap().load_schema().unwrap();
        assert_eq!(schema.version(), "layout");
    }

    #[test]
    fn test_schema_selection_is_a_map() {
        let config = ShelfConfig {
            schema: SchemaSelection::Descriptor(PathBuf::from("layout.yaml")),
            ..ShelfConfig::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("schema:\n  descriptor: layout.yaml\n"));

        let parsed: ShelfConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);

        let builtin: ShelfConfig =
            serde_yaml::from_str("version: \"1.0\"\nschema:\n  builtin: v1\n").unwrap();
        assert_eq!(builtin.load_schema().unwrap().width(), 15);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let original: ShelfConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let mut loaded = ShelfConfig::load(&path).unwrap();
        loaded.sheet.values = Some(PathBuf::from("books.json"));
        assert_eq!(loaded, original);
    }
}
