//! # Validation Report Types
//!
//! Per-file reports and the run-wide summary. All of them are plain data,
//! created fresh per run and serialisable for machine-readable output.
//!
//! ## Invariants
//!
//! - `FileReport::passed` is true exactly when `errors` is empty; both are
//!   set together by [`FileReport::new`].
//! - `files_validated == passed + failed`, and `failed` equals the number of
//!   reports with `passed == false`. [`ValidationSummary::record`] is the only
//!   way counts change.

use std::path::{Path, PathBuf};

use serde::Serialize;

use jsonloc_core::{format_diagnostic, SourceLocation, StructuralError};

/// One structural error with its resolution attempt and rendered text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub error: StructuralError,
    /// `None` when the resolver could not place the error.
    pub location: Option<SourceLocation>,
    /// The one-line human-readable form, location suffix included.
    pub rendered: String,
}

impl Diagnostic {
    pub fn new(error: StructuralError, location: Option<SourceLocation>) -> Self {
        let rendered = format_diagnostic(&error, location);
        Self {
            error,
            location,
            rendered,
        }
    }
}

/// Outcome for one classified document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file_path: PathBuf,
    pub schema_type: String,
    pub passed: bool,
    pub errors: Vec<Diagnostic>,
}

impl FileReport {
    pub fn new(file_path: impl Into<PathBuf>, schema_type: impl Into<String>, errors: Vec<Diagnostic>) -> Self {
        Self {
            file_path: file_path.into(),
            schema_type: schema_type.into(),
            passed: errors.is_empty(),
            errors,
        }
    }
}

/// Aggregate of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    /// Every document with the configured extension.
    pub files_visited: usize,
    /// Documents that were classified and run through a validator.
    pub files_validated: usize,
    pub passed: usize,
    pub failed: usize,
    /// One report per validated document, in traversal order.
    pub reports: Vec<FileReport>,
    /// Visited documents no schema type applied to, in traversal order.
    pub unclassified: Vec<PathBuf>,
}

impl ValidationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a validated document.
    pub fn record(&mut self, report: FileReport) {
        self.files_visited += 1;
        self.files_validated += 1;
        if report.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.reports.push(report);
    }

    /// Account for a document that was visited but not validated.
    pub fn record_unclassified(&mut self, path: &Path) {
        self.files_visited += 1;
        self.unclassified.push(path.to_path_buf());
    }

    /// Fold the summary of another root into this one, keeping order.
    pub fn merge(&mut self, other: ValidationSummary) {
        self.files_visited += other.files_visited;
        self.files_validated += other.files_validated;
        self.passed += other.passed;
        self.failed += other.failed;
        self.reports.extend(other.reports);
        self.unclassified.extend(other.unclassified);
    }

    /// True when no validated document failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Reports of documents that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| !r.passed)
    }

    /// Total number of diagnostics across all failed documents.
    pub fn error_count(&self) -> usize {
        self.reports.iter().map(|r| r.errors.len()).sum()
    }
}
