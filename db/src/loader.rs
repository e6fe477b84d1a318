//! Schema descriptor loading and the version registry.
//!
//! Descriptors are read once at startup, validated into
//! [`ColumnSchema`]s, and shared read-only afterwards (`Arc<ColumnSchema>`).
//!
//! ```no_run
//! use bookshelf_db::{SchemaRegistry, load_schema};
//!
//! // A single descriptor file (JSON or YAML)
//! let schema = load_schema("sheet_spec.json").unwrap();
//!
//! // Bundled versions plus any descriptors found in a directory
//! let registry = SchemaRegistry::from_dir("schemas/").unwrap();
//! let latest = registry.latest();
//! println!("latest schema {} has {} columns", latest.version(), latest.width());
//! ```

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use bookshelf_core::{ColumnSchema, SchemaDescriptor};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Descriptors shipped with the crate, oldest first.
const BUNDLED: [&str; 3] = [
    include_str!("../schemas/v1.json"),
    include_str!("../schemas/v2.json"),
    include_str!("../schemas/v3.json"),
];

/// Reads a descriptor from a JSON or YAML file, chosen by extension.
///
/// # Errors
///
/// Returns [`StoreError::IoError`] if the file cannot be read, or a JSON/YAML
/// error if it is not a descriptor.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<SchemaDescriptor> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let descriptor = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_reader(reader)?,
        _ => serde_json::from_reader(reader)?,
    };
    Ok(descriptor)
}

/// Reads and validates a descriptor file.
///
/// # Errors
///
/// In addition to [`load_descriptor`]'s errors, returns
/// [`StoreError::Book`] wrapping the integrity violation if the descriptor is
/// not a valid bijection.
pub fn load_schema(path: impl AsRef<Path>) -> Result<ColumnSchema> {
    let path = path.as_ref();
    let descriptor = load_descriptor(path)?;
    let schema = ColumnSchema::from_descriptor(&descriptor)?;
    info!(
        path = %path.display(),
        version = schema.version(),
        width = schema.width(),
        "loaded schema descriptor"
    );
    Ok(schema)
}

/// SHA-256 hex digest of a schema's column layout.
///
/// Two schemas with the same fingerprint read and write rows identically.
pub fn fingerprint(schema: &ColumnSchema) -> String {
    let hash = Sha256::digest(schema.canonical_layout().as_bytes());
    format!("{:x}", hash)
}

/// Schemas by version, in registration order.
///
/// Registration enforces append-only evolution: every schema must keep the
/// columns of the one registered before it.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<ColumnSchema>>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a registry holding the bundled descriptors.
    ///
    /// # Errors
    ///
    /// Fails only if a bundled descriptor is broken.
    pub fn bundled() -> Result<Self> {
        let mut registry = Self::new();
        for raw in BUNDLED {
            let descriptor: SchemaDescriptor = serde_json::from_str(raw)?;
            registry.register(ColumnSchema::from_descriptor(&descriptor)?)?;
        }
        Ok(registry)
    }

    /// Bundled descriptors followed by every `*.json`, `*.yaml` and `*.yml`
    /// descriptor in `path`, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns the first load, validation or registration error.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self::bundled()?;
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path.as_ref())? {
            let file_path = entry?.path();
            if matches!(
                file_path.extension().and_then(|e| e.to_str()),
                Some("json" | "yaml" | "yml")
            ) {
                paths.push(file_path);
            }
        }
        paths.sort();
        for file_path in paths {
            registry.register(load_schema(&file_path)?)?;
        }
        Ok(registry)
    }

    /// Adds a schema as the newest version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSchemaVersion`] if the version is
    /// taken, or [`StoreError::IncompatibleSchema`] if it moves or drops a
    /// column of the current latest schema.
    pub fn register(&mut self, schema: ColumnSchema) -> Result<()> {
        let version = schema.version().to_string();
        if self.schemas.contains_key(&version) {
            return Err(StoreError::DuplicateSchemaVersion(version));
        }
        if let Some(previous) = self.order.last().and_then(|v| self.schemas.get(v)) {
            let drift = schema.drift(previous);
            if !drift.is_empty() {
                return Err(StoreError::IncompatibleSchema {
                    version,
                    previous: previous.version().to_string(),
                    fields: drift,
                });
            }
        }
        debug!(version = %version, fingerprint = %fingerprint(&schema), "registered schema");
        self.order.push(version.clone());
        self.schemas.insert(version, Arc::new(schema));
        Ok(())
    }

    /// Looks up a schema by version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSchemaVersion`] if nothing is registered
    /// under `version`.
    pub fn get(&self, version: &str) -> Result<Arc<ColumnSchema>> {
        self.schemas
            .get(version)
            .cloned()
            .ok_or_else(|| StoreError::UnknownSchemaVersion(version.to_string()))
    }

    /// Most recently registered schema, falling back to the latest built-in
    /// layout for an empty registry.
    pub fn latest(&self) -> Arc<ColumnSchema> {
        self.order
            .last()
            .and_then(|v| self.schemas.get(v))
            .cloned()
            .unwrap_or_else(|| Arc::new(ColumnSchema::latest()))
    }

    /// Registered versions, oldest first.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
