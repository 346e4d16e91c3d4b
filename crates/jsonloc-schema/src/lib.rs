//! # jsonloc-schema: Tree-Wide Schema Validation
//!
//! Drives the resolver in `jsonloc-core` across a directory tree of JSON
//! documents.
//!
//! ## Responsibilities
//!
//! - **Validator capability (`validate`):** loads `*.schema.json` files,
//!   resolves cross-schema `$ref`s locally and compiles them with the
//!   `jsonschema` crate. Validator errors are converted into
//!   [`StructuralError`](jsonloc_core::StructuralError)s once, at ingestion.
//! - **Classification (`classify`):** maps the nearest enclosing directory
//!   name of each document to a schema type.
//! - **Orchestration (`pipeline`):** walks the roots depth-first in sorted
//!   order, validates each classified document, resolves every error to a
//!   source line and accumulates a [`ValidationSummary`].
//!
//! ## Failure policy
//!
//! A single unreadable, malformed or invalid document never aborts a run;
//! it is recorded in its [`FileReport`] and traversal continues. Only a root
//! directory that does not exist or cannot be listed is fatal.

pub mod classify;
pub mod pipeline;
pub mod report;
pub mod validate;

// Re-export primary types.
pub use classify::DirectoryTable;
pub use pipeline::{validate_document, Orchestrator, PipelineError};
pub use report::{Diagnostic, FileReport, ValidationSummary};
pub use validate::{CompiledSchema, DocumentValidator, SchemaError, SchemaRegistry, ValidatorSet};
