//! # Directory Classification
//!
//! Decides which schema a document is validated against from the names of
//! the directories that contain it. The nearest enclosing directory (relative
//! to the scanned root) that appears in the table wins; documents with no
//! matching ancestor are unclassified.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

use crate::validate::SchemaRegistry;

/// Suffix that marks a schema file.
const SCHEMA_SUFFIX: &str = ".schema.json";

/// Directory name → schema type (schema filename).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTable {
    entries: BTreeMap<String, String>,
}

impl DirectoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a table by convention: `<name>.schema.json` classifies
    /// directories named `<name>`.
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let entries = registry
            .filenames()
            .into_iter()
            .filter_map(|filename| {
                let dir = filename.strip_suffix(SCHEMA_SUFFIX)?;
                (!dir.is_empty()).then(|| (dir.to_string(), filename.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Map `directory` to `schema_type`, replacing any earlier entry.
    pub fn insert(&mut self, directory: impl Into<String>, schema_type: impl Into<String>) {
        self.entries.insert(directory.into(), schema_type.into());
    }

    pub fn get(&self, directory: &str) -> Option<&str> {
        self.entries.get(directory).map(|s| s.as_str())
    }

    /// Classify a document by its directory, given relative to the root.
    ///
    /// Walks the directory's components from innermost to outermost and
    /// returns the schema type of the first one in the table.
    pub fn classify(&self, relative_dir: &Path) -> Option<&str> {
        relative_dir
            .components()
            .rev()
            .filter_map(|component| match component {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .find_map(|name| self.get(name))
    }

    /// The distinct schema types the table refers to.
    pub fn schema_types(&self) -> BTreeSet<&str> {
        self.entries.values().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D, S> FromIterator<(D, S)> for DirectoryTable
where
    D: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (D, S)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(d, s)| (d.into(), s.into()))
                .collect(),
        }
    }
}
