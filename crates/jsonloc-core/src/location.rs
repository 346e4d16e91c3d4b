//! Source positions in document text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based line, optionally with a 1-based character column.
///
/// A location with no column means the line is known but the column was not
/// determined. "Nothing known" is `Option::<SourceLocation>::None`, never a
/// partially filled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<usize>,
}

impl SourceLocation {
    /// A location with only the line known. Line 0 is clamped to 1.
    pub fn line(line: usize) -> Self {
        Self {
            line: line.max(1),
            column: None,
        }
    }

    /// A location with both line and column known. Zeroes are clamped to 1.
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            line: line.max(1),
            column: Some(column.max(1)),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}", self.line, column),
            None => write!(f, "{}", self.line),
        }
    }
}
