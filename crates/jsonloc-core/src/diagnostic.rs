//! # Structural Errors & Diagnostic Formatting
//!
//! A [`StructuralError`] is one schema-validation failure: a structural path,
//! the validator's message and optional scalar parameters. The error's
//! [`ErrorKind`] is decided once, when the error is constructed, from
//! parameter presence first and message text second. Formatting then only
//! matches on the kind.
//!
//! ## Rendering rules
//!
//! - `MissingRequired` → `must have required property "<name>"`
//! - `AdditionalProperty` → `must NOT have additional property "<name>"`
//! - anything else → the validator's message verbatim
//!
//! Parameters whose value does not already appear in the rendered text are
//! appended as a bracketed annotation, then ` (line <n>)` when a location is
//! known.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::location::SourceLocation;
use crate::path::StructuralPath;

/// Parameter naming the property a `required` keyword found missing.
pub const MISSING_PROPERTY: &str = "missingProperty";
/// Parameter naming the property an `additionalProperties` keyword rejected.
pub const ADDITIONAL_PROPERTY: &str = "additionalProperty";

/// The two failure shapes that get dedicated rendering, plus everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    MissingRequired { property: String },
    AdditionalProperty { property: String },
    Other,
}

impl ErrorKind {
    /// Decide the kind of an incoming error.
    ///
    /// Parameter presence wins; message text is only consulted when the
    /// validator supplied no recognised parameter.
    pub fn classify(message: &str, params: &BTreeMap<String, Value>) -> Self {
        if let Some(property) = params.get(MISSING_PROPERTY).and_then(Value::as_str) {
            return ErrorKind::MissingRequired {
                property: property.to_string(),
            };
        }
        if let Some(property) = params.get(ADDITIONAL_PROPERTY).and_then(Value::as_str) {
            return ErrorKind::AdditionalProperty {
                property: property.to_string(),
            };
        }
        Self::classify_message(message)
    }

    fn classify_message(message: &str) -> Self {
        let message = message.trim();

        // jsonschema: `"name" is a required property`
        if let Some(name) = message.strip_suffix(" is a required property") {
            return ErrorKind::MissingRequired {
                property: unquote(name).to_string(),
            };
        }
        // ajv: `must have required property 'name'`
        if let Some(name) = message.strip_prefix("must have required property ") {
            return ErrorKind::MissingRequired {
                property: unquote(name).to_string(),
            };
        }
        // jsonschema: `Additional properties are not allowed ('x' was unexpected)`
        if let Some(rest) = message.strip_prefix("Additional properties are not allowed (") {
            if let Some(name) = rest.strip_suffix(" was unexpected)") {
                return ErrorKind::AdditionalProperty {
                    property: unquote(name).to_string(),
                };
            }
        }
        ErrorKind::Other
    }

    /// The property name carried by the two special kinds.
    pub fn property(&self) -> Option<&str> {
        match self {
            ErrorKind::MissingRequired { property } | ErrorKind::AdditionalProperty { property } => {
                Some(property)
            }
            ErrorKind::Other => None,
        }
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

/// A single schema-validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralError {
    pub path: StructuralPath,
    pub message: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl StructuralError {
    /// Ingest a validator error, classifying its kind.
    pub fn new(
        path: StructuralPath,
        message: impl Into<String>,
        params: BTreeMap<String, Value>,
    ) -> Self {
        let message = message.into();
        let kind = ErrorKind::classify(&message, &params);
        Self {
            path,
            message,
            kind,
            params,
        }
    }

    /// An error that is never one of the special kinds (parse and read
    /// failures, pipeline notices).
    pub fn other(path: StructuralPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind: ErrorKind::Other,
            params: BTreeMap::new(),
        }
    }
}

/// Render one error as a single human-readable line.
pub fn format_diagnostic(error: &StructuralError, location: Option<SourceLocation>) -> String {
    let mut out = match &error.kind {
        ErrorKind::MissingRequired { property } => {
            format!("must have required property \"{property}\"")
        }
        ErrorKind::AdditionalProperty { property } => {
            format!("must NOT have additional property \"{property}\"")
        }
        ErrorKind::Other => error.message.clone(),
    };

    let extras: Vec<String> = error
        .params
        .iter()
        .filter_map(|(name, value)| {
            let rendered = render_param(value);
            (!out.contains(&rendered)).then(|| format!("{name}: {rendered}"))
        })
        .collect();
    if !extras.is_empty() {
        let _ = write!(out, " [{}]", extras.join(", "));
    }

    if let Some(location) = location {
        let _ = write!(out, " (line {})", location.line);
    }
    out
}

fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
