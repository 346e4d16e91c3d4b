//! # Validation Orchestrator
//!
//! Walks each root directory depth-first (entries sorted by path, so two runs
//! over an unchanged tree produce identical summaries), classifies every
//! document by its nearest enclosing directory, validates it and resolves
//! every reported error to a source line.
//!
//! ## Per-file outcomes
//!
//! - Unreadable file: one `Other` error, no location.
//! - Malformed JSON: one `Other` error at the parser's line/column. The
//!   validator is not invoked and the resolver is bypassed.
//! - Validator errors: each resolved with
//!   [`resolve_error_parsed`](jsonloc_core::resolve::resolve_error_parsed)
//!   and rendered with [`format_diagnostic`](jsonloc_core::format_diagnostic).
//!
//! None of these stop the run. The only fatal conditions are a root that does
//! not exist and a root that cannot be listed.
//!
//! Symlinks to directories below a root are not followed, so a link back to
//! an ancestor cannot make the walk revisit documents. Symlinked files are
//! validated like any other file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use jsonloc_core::resolve::resolve_error_parsed;
use jsonloc_core::{SourceLocation, StructuralError, StructuralPath};

use crate::classify::DirectoryTable;
use crate::report::{Diagnostic, FileReport, ValidationSummary};
use crate::validate::{DocumentValidator, ValidatorSet};

/// Directory names never descended into unless overridden.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "node_modules", "target"];

/// Fatal conditions that halt a run before any document is processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A root directory does not exist or is not a directory.
    #[error("root directory does not exist: {0}")]
    RootNotFound(String),

    /// A root directory exists but cannot be listed.
    #[error("cannot read root directory {path}: {source}")]
    RootUnreadable {
        /// The root that could not be listed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Drives classification, validation and resolution over document trees.
#[derive(Debug)]
pub struct Orchestrator<'a> {
    table: &'a DirectoryTable,
    validators: &'a ValidatorSet,
    extension: String,
    excluded: BTreeSet<String>,
}

impl<'a> Orchestrator<'a> {
    /// An orchestrator for `.json` documents with the default exclusions.
    pub fn new(table: &'a DirectoryTable, validators: &'a ValidatorSet) -> Self {
        Self {
            table,
            validators,
            extension: "json".to_string(),
            excluded: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Document extension, with or without the leading dot.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Replace the set of directory names that are never descended into.
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate every document below `roots`.
    ///
    /// All roots are checked before any of them is walked, so an unusable
    /// root halts the run before partial results exist.
    ///
    /// # Errors
    ///
    /// [`PipelineError::RootNotFound`] or [`PipelineError::RootUnreadable`].
    /// Problems with individual documents are recorded in the summary.
    pub fn run<P: AsRef<Path>>(&self, roots: &[P]) -> Result<ValidationSummary, PipelineError> {
        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                return Err(PipelineError::RootNotFound(root.display().to_string()));
            }
        }

        let mut summary = ValidationSummary::new();
        for root in roots {
            let root = root.as_ref();
            tracing::info!(root = %root.display(), "scanning document tree");
            let entries = sorted_entries(root).map_err(|source| PipelineError::RootUnreadable {
                path: root.display().to_string(),
                source,
            })?;
            let mut root_summary = ValidationSummary::new();
            self.visit_entries(root, entries, &mut root_summary);
            tracing::debug!(
                root = %root.display(),
                validated = root_summary.files_validated,
                failed = root_summary.failed,
                "root scanned"
            );
            summary.merge(root_summary);
        }

        tracing::info!(
            visited = summary.files_visited,
            validated = summary.files_validated,
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.error_count(),
            "validation run complete"
        );
        Ok(summary)
    }

    fn visit_dir(&self, root: &Path, dir: &Path, summary: &mut ValidationSummary) {
        match sorted_entries(dir) {
            Ok(entries) => self.visit_entries(root, entries, summary),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory during walk");
            }
        }
    }

    fn visit_entries(&self, root: &Path, entries: Vec<PathBuf>, summary: &mut ValidationSummary) {
        for path in entries {
            let metadata = match std::fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot stat directory entry");
                    continue;
                }
            };
            if metadata.is_symlink() && path.is_dir() {
                tracing::debug!(path = %path.display(), "not following directory symlink");
            } else if metadata.is_dir() {
                let excluded = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.excluded.contains(n));
                if !excluded {
                    self.visit_dir(root, &path, summary);
                }
            } else if self.is_document(&path) {
                self.visit_file(root, &path, summary);
            }
        }
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }

    fn visit_file(&self, root: &Path, path: &Path, summary: &mut ValidationSummary) {
        let relative_dir = path
            .strip_prefix(root)
            .ok()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""));

        let Some(schema_type) = self.table.classify(relative_dir) else {
            tracing::debug!(path = %path.display(), "unclassified document");
            summary.record_unclassified(path);
            return;
        };
        let Some(validator) = self.validators.get(schema_type) else {
            tracing::warn!(
                path = %path.display(),
                schema_type,
                "no validator registered for schema type"
            );
            summary.record_unclassified(path);
            return;
        };

        let report = validate_document(path, schema_type, validator);
        tracing::debug!(
            path = %path.display(),
            schema_type,
            passed = report.passed,
            errors = report.errors.len(),
            "validated document"
        );
        summary.record(report);
    }
}

/// Read, parse, validate and locate the errors of one document.
pub fn validate_document(
    path: &Path,
    schema_type: &str,
    validator: &dyn DocumentValidator,
) -> FileReport {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read document");
            let error = StructuralError::other(StructuralPath::root(), format!("cannot read file: {e}"));
            return FileReport::new(path, schema_type, vec![Diagnostic::new(error, None)]);
        }
    };

    let document: Value = match serde_json::from_str(&text) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed JSON");
            return FileReport::new(path, schema_type, vec![parse_failure(&e)]);
        }
    };

    let diagnostics = validator
        .validate(&document)
        .into_iter()
        .map(|error| {
            let location = resolve_error_parsed(&text, Some(&document), &error);
            Diagnostic::new(error, location)
        })
        .collect();
    FileReport::new(path, schema_type, diagnostics)
}

/// A parse error as a diagnostic at the parser's own position.
fn parse_failure(e: &serde_json::Error) -> Diagnostic {
    let location = (e.line() > 0).then(|| SourceLocation::at(e.line(), e.column()));
    let full = e.to_string();
    let suffix = format!(" at line {} column {}", e.line(), e.column());
    let message = full.strip_suffix(&suffix).unwrap_or(&full);
    Diagnostic::new(
        StructuralError::other(StructuralPath::root(), format!("invalid JSON: {message}")),
        location,
    )
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        match entry {
            Ok(entry) => entries.push(entry.path()),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
            }
        }
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonloc_core::ErrorKind;
    use serde_json::json;

    fn never_fails() -> impl DocumentValidator {
        |_: &Value| Vec::<StructuralError>::new()
    }

    #[test]
    fn parse_failure_strips_position_from_message() {
        let e = serde_json::from_str::<Value>("{\n  \"a\": nope\n}").unwrap_err();
        let diagnostic = parse_failure(&e);
        assert_eq!(diagnostic.location.map(|l| l.line), Some(2));
        assert!(!diagnostic.error.message.contains("at line"), "{}", diagnostic.error.message);
        assert!(diagnostic.rendered.starts_with("invalid JSON: "));
        assert!(diagnostic.rendered.ends_with("(line 2)"));
    }

    #[test]
    fn unreadable_file_is_recorded_without_location() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_document(&dir.path().join("missing.json"), "t", &never_fails());
        assert!(!report.passed);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].location, None);
        assert!(report.errors[0].rendered.starts_with("cannot read file"));
    }

    #[test]
    fn validator_errors_are_located() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\n  \"title\": 1,\n  \"extra\": true\n}").unwrap();

        let validator = |_: &Value| {
            let mut params = std::collections::BTreeMap::new();
            params.insert("additionalProperty".to_string(), json!("extra"));
            vec![
                StructuralError::other(StructuralPath::from_pointer("/title"), "must be string"),
                StructuralError::new(StructuralPath::root(), "no extras", params),
            ]
        };
        let report = validate_document(&path, "t", &validator);
        assert!(!report.passed);
        let rendered: Vec<&str> = report.errors.iter().map(|d| d.rendered.as_str()).collect();
        assert_eq!(
            rendered,
            vec![
                "must be string (line 2)",
                "must NOT have additional property \"extra\" (line 3)"
            ]
        );
        assert!(matches!(report.errors[1].error.kind, ErrorKind::AdditionalProperty { .. }));
    }

    #[test]
    fn missing_root_is_fatal() {
        let table = DirectoryTable::new();
        let validators = ValidatorSet::new();
        let err = Orchestrator::new(&table, &validators)
            .run(&["/nonexistent/jsonloc-root"])
            .unwrap_err();
        assert!(matches!(err, PipelineError::RootNotFound(_)));
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join("node_modules").join("pages");
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(&hidden).unwrap();
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(hidden.join("a.json"), "{}").unwrap();
        std::fs::write(pages.join("b.json"), "{}").unwrap();

        let table: DirectoryTable = [("pages", "page")].into_iter().collect();
        let mut validators = ValidatorSet::new();
        validators.insert("page", never_fails());

        let summary = Orchestrator::new(&table, &validators).run(&[dir.path()]).unwrap();
        assert_eq!(summary.files_visited, 1);

        let summary = Orchestrator::new(&table, &validators)
            .with_excluded(Vec::<String>::new())
            .run(&[dir.path()])
            .unwrap();
        assert_eq!(summary.files_visited, 2);
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlink_loops_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("a.json"), "{}").unwrap();
        std::os::unix::fs::symlink(dir.path(), pages.join("loop")).unwrap();
        std::os::unix::fs::symlink(pages.join("a.json"), pages.join("b.json")).unwrap();

        let table: DirectoryTable = [("pages", "page")].into_iter().collect();
        let mut validators = ValidatorSet::new();
        validators.insert("page", never_fails());

        let summary = Orchestrator::new(&table, &validators).run(&[dir.path()]).unwrap();
        assert_eq!(summary.files_visited, 2);
        assert_eq!(summary.files_validated, 2);
        let names: Vec<_> = summary
            .reports
            .iter()
            .map(|r| r.file_path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("pages/a.json"), PathBuf::from("pages/b.json")]
        );
    }

    #[test]
    fn extension_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("a.json"), "{}").unwrap();
        std::fs::write(pages.join("b.jsonc"), "{}").unwrap();

        let table: DirectoryTable = [("pages", "page")].into_iter().collect();
        let mut validators = ValidatorSet::new();
        validators.insert("page", never_fails());

        let summary = Orchestrator::new(&table, &validators)
            .with_extension(".jsonc")
            .run(&[dir.path()])
            .unwrap();
        assert_eq!(summary.files_validated, 1);
        assert!(summary.reports[0].file_path.ends_with("b.jsonc"));
    }

    #[test]
    fn classified_type_without_validator_is_not_validated() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("a.json"), "{}").unwrap();

        let table: DirectoryTable = [("pages", "page")].into_iter().collect();
        let validators = ValidatorSet::new();
        let summary = Orchestrator::new(&table, &validators).run(&[dir.path()]).unwrap();
        assert_eq!(summary.files_visited, 1);
        assert_eq!(summary.files_validated, 0);
        assert_eq!(summary.unclassified.len(), 1);
    }
}
