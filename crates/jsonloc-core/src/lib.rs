//! # jsonloc-core: Structural Paths to Source Lines
//!
//! Generic JSON parsers throw away source positions. Schema validators
//! report failures as *structural paths* (`/a/b/1`) into the parsed value.
//! This crate maps those paths back to the line (and, where it can, the
//! column) of the original text so diagnostics can point at the exact spot.
//!
//! ## Components
//!
//! - [`scanner`]: single-pass character automaton tracking string/escape
//!   state and brace/bracket depth.
//! - [`walker`]: descends a parsed [`serde_json::Value`] along a path.
//! - [`resolve`]: combines both into [`resolve()`], a total function that
//!   degrades from exact structural resolution to text search to `None`.
//! - [`diagnostic`]: the [`StructuralError`] model and the one-line
//!   formatter used by every presentation layer.
//!
//! ## Crate Policy
//!
//! - No filesystem I/O; callers hand in document text.
//! - No `panic!()` or `.unwrap()` outside tests. The resolver never fails,
//!   it returns `None`.
//! - Public data types derive `Serialize` so reports can be emitted as JSON.

pub mod diagnostic;
pub mod location;
pub mod path;
pub mod resolve;
pub mod scanner;
pub mod walker;

// Re-export primary types for ergonomic imports.
pub use diagnostic::{format_diagnostic, ErrorKind, StructuralError};
pub use location::SourceLocation;
pub use path::{Step, StructuralPath};
pub use resolve::{resolve, resolve_error};
pub use scanner::{ScanState, Scanner, Transition};
pub use walker::{walk, Walk};
