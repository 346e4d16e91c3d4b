//! # Schema Registry & Validator Capability
//!
//! Loads JSON Schema definitions from a directory and compiles them into
//! validators that report [`StructuralError`]s.
//!
//! ## Schema resolution
//!
//! Every `*.schema.json` below the schema directory is registered under its
//! `$id`, or under a URI derived from its relative path when it has none.
//! Cross-schema `$ref`s are resolved by [`LocalSchemaRetriever`] from that
//! in-memory map, falling back to a lookup by trailing filename. No network
//! requests are ever made.
//!
//! ## Error ingestion
//!
//! `jsonschema` errors are converted exactly once. The instance pointer
//! becomes a [`StructuralPath`], with each segment typed by the value it
//! descends into; `required` and `additionalProperties`
//! failures carry the `missingProperty` / `additionalProperty` parameters
//! that decide their [`ErrorKind`](jsonloc_core::ErrorKind). An
//! `additionalProperties` failure naming several keys becomes one error per
//! key so each can be located on its own line.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use thiserror::Error;

use jsonloc_core::diagnostic::{ADDITIONAL_PROPERTY, MISSING_PROPERTY};
use jsonloc_core::{StructuralError, StructuralPath};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading or compiling schemas.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file or directory could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoadError {
        /// Path of the schema file or directory.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The schema could not be compiled into a validator.
    #[error("failed to compile schema {schema_id}: {reason}")]
    SchemaCompileError {
        /// The schema `$id` or filename.
        schema_id: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The requested schema was not found in the registry.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// I/O error during directory traversal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Validator capability
// ---------------------------------------------------------------------------

/// Anything that can check a parsed document and report structural errors.
///
/// Implemented by [`CompiledSchema`] and by plain closures, so the
/// orchestrator can be driven by any validation backend.
pub trait DocumentValidator {
    fn validate(&self, document: &Value) -> Vec<StructuralError>;
}

impl<F> DocumentValidator for F
where
    F: Fn(&Value) -> Vec<StructuralError>,
{
    fn validate(&self, document: &Value) -> Vec<StructuralError> {
        self(document)
    }
}

/// Compiled validators keyed by schema type.
#[derive(Default)]
pub struct ValidatorSet {
    validators: BTreeMap<String, Box<dyn DocumentValidator>>,
}

impl std::fmt::Debug for ValidatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorSet")
            .field("schema_types", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the validator for `schema_type`.
    pub fn insert(
        &mut self,
        schema_type: impl Into<String>,
        validator: impl DocumentValidator + 'static,
    ) {
        self.validators.insert(schema_type.into(), Box::new(validator));
    }

    pub fn get(&self, schema_type: &str) -> Option<&dyn DocumentValidator> {
        self.validators.get(schema_type).map(|v| v.as_ref())
    }

    pub fn contains(&self, schema_type: &str) -> bool {
        self.validators.contains_key(schema_type)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Schema retriever for $ref resolution
// ---------------------------------------------------------------------------

/// URI prefix for schemas that declare no `$id`.
const SCHEMA_URI_PREFIX: &str = "https://jsonloc.local/schemas/";

/// Resolves `$ref` URIs from the schemas already loaded in memory.
struct LocalSchemaRetriever {
    /// Map from full URI to parsed schema JSON.
    schemas: HashMap<String, Value>,
    /// Map from bare filename to parsed schema JSON.
    by_filename: HashMap<String, Value>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(schema) = self.schemas.get(uri_str) {
            return Ok(schema.clone());
        }

        // Relative `$ref`s resolve against whatever base the referring schema
        // had; the filename is the stable part.
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.by_filename
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// All schemas of one schema directory, ready to be compiled.
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    /// Schemas indexed by their `$id` URI.
    schema_map: HashMap<String, Value>,
    /// Schema filename (e.g. `page.schema.json`) to its `$id` URI.
    filename_to_id: BTreeMap<String, String>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schema_dir", &self.schema_dir)
            .field("schema_count", &self.schema_map.len())
            .finish()
    }
}

impl SchemaRegistry {
    /// Load every `*.schema.json` below `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaLoadError`] if the directory does not
    /// exist or any schema file cannot be read or parsed as JSON.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.into();
        if !schema_dir.is_dir() {
            return Err(SchemaError::SchemaLoadError {
                path: schema_dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let mut schema_map = HashMap::new();
        let mut filename_to_id = BTreeMap::new();
        for path in Self::glob_schemas(&schema_dir)? {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                SchemaError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;

            let schema: Value =
                serde_json::from_str(&content).map_err(|e| SchemaError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;

            let schema_id = match schema.get("$id").and_then(|v| v.as_str()) {
                Some(id) => id.to_string(),
                None => {
                    let rel = path.strip_prefix(&schema_dir).unwrap_or(&path);
                    format!("{SCHEMA_URI_PREFIX}{}", rel.display())
                }
            };

            if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
                filename_to_id.insert(filename.to_string(), schema_id.clone());
            }

            tracing::debug!(path = %path.display(), schema_id = %schema_id, "loaded schema");
            schema_map.insert(schema_id, schema);
        }

        Ok(Self {
            schema_dir,
            schema_map,
            filename_to_id,
        })
    }

    /// Returns the number of schemas loaded into the registry.
    pub fn schema_count(&self) -> usize {
        self.schema_map.len()
    }

    /// Schema filenames, sorted.
    pub fn filenames(&self) -> Vec<&str> {
        self.filename_to_id.keys().map(|s| s.as_str()).collect()
    }

    /// Compile the schema stored under `filename`, with every other loaded
    /// schema available for `$ref` resolution.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaNotFound`] if no such schema was loaded,
    /// [`SchemaError::SchemaCompileError`] if `jsonschema` rejects it.
    pub fn compile(&self, filename: &str) -> Result<CompiledSchema, SchemaError> {
        let schema_id = self
            .filename_to_id
            .get(filename)
            .ok_or_else(|| SchemaError::SchemaNotFound(filename.to_string()))?;
        let schema = self
            .schema_map
            .get(schema_id)
            .ok_or_else(|| SchemaError::SchemaNotFound(schema_id.clone()))?;

        let by_filename = self
            .filename_to_id
            .iter()
            .filter_map(|(name, id)| Some((name.clone(), self.schema_map.get(id)?.clone())))
            .collect();
        let retriever = LocalSchemaRetriever {
            schemas: self.schema_map.clone(),
            by_filename,
        };

        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .with_retriever(retriever)
            .build(schema)
            .map_err(|e| SchemaError::SchemaCompileError {
                schema_id: filename.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CompiledSchema {
            schema_id: schema_id.clone(),
            validator,
        })
    }

    /// Compile one validator per schema type.
    pub fn compile_all<'a>(
        &self,
        schema_types: impl IntoIterator<Item = &'a str>,
    ) -> Result<ValidatorSet, SchemaError> {
        let mut set = ValidatorSet::new();
        for schema_type in schema_types {
            if set.contains(schema_type) {
                continue;
            }
            set.insert(schema_type, self.compile(schema_type)?);
        }
        Ok(set)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Recursively collect `*.schema.json` file paths, sorted.
    fn glob_schemas(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
        let mut results = Vec::new();
        Self::walk_for_schemas(dir, &mut results)?;
        results.sort();
        Ok(results)
    }

    fn walk_for_schemas(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), SchemaError> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            // Directory symlinks are not followed.
            if entry.file_type()?.is_symlink() && path.is_dir() {
                continue;
            }
            if path.is_dir() {
                Self::walk_for_schemas(&path, acc)?;
            } else if path
                .file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|name| name.ends_with(".schema.json"))
            {
                acc.push(path);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CompiledSchema
// ---------------------------------------------------------------------------

/// A `jsonschema` validator for one schema.
pub struct CompiledSchema {
    schema_id: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema_id", &self.schema_id)
            .finish()
    }
}

impl CompiledSchema {
    /// Compile a standalone schema definition (no cross-schema `$ref`s).
    pub fn from_value(schema: &Value) -> Result<Self, SchemaError> {
        let schema_id = schema
            .get("$id")
            .and_then(|v| v.as_str())
            .unwrap_or("(inline)")
            .to_string();
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(schema)
            .map_err(|e| SchemaError::SchemaCompileError {
                schema_id: schema_id.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            schema_id,
            validator,
        })
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }
}

impl DocumentValidator for CompiledSchema {
    fn validate(&self, document: &Value) -> Vec<StructuralError> {
        self.validator
            .iter_errors(document)
            .flat_map(|err| {
                // Read against the document so `"200"` members stay keys.
                convert_error(
                    StructuralPath::from_pointer_in(&err.instance_path.to_string(), document),
                    err.to_string(),
                    &err.kind,
                )
            })
            .collect()
    }
}

/// Turn one `jsonschema` error into one or more structural errors.
fn convert_error(
    path: StructuralPath,
    message: String,
    kind: &ValidationErrorKind,
) -> Vec<StructuralError> {
    let mut params = BTreeMap::new();
    match kind {
        ValidationErrorKind::Required { property } => {
            let name = match property {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.insert(MISSING_PROPERTY.to_string(), Value::String(name));
        }
        ValidationErrorKind::AdditionalProperties { unexpected } if !unexpected.is_empty() => {
            return unexpected
                .iter()
                .map(|name| {
                    let mut params = BTreeMap::new();
                    params.insert(ADDITIONAL_PROPERTY.to_string(), Value::String(name.clone()));
                    StructuralError::new(
                        path.clone(),
                        format!("Additional properties are not allowed ('{name}' was unexpected)"),
                        params,
                    )
                })
                .collect();
        }
        ValidationErrorKind::Pattern { pattern } => {
            params.insert("pattern".to_string(), Value::String(pattern.clone()));
        }
        ValidationErrorKind::Enum { options } => {
            params.insert("allowedValues".to_string(), Value::String(options.to_string()));
        }
        ValidationErrorKind::MinLength { limit } | ValidationErrorKind::MaxLength { limit } => {
            params.insert("limit".to_string(), Value::from(*limit));
        }
        ValidationErrorKind::MinItems { limit } | ValidationErrorKind::MaxItems { limit } => {
            params.insert("limit".to_string(), Value::from(*limit));
        }
        _ => {}
    }
    vec![StructuralError::new(path, message, params)]
}
