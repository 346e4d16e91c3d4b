//! # Structural Paths
//!
//! A [`StructuralPath`] is the ordered list of object-key / array-index
//! steps a schema validator uses to name a value inside a document. It is
//! independent of how the document text is formatted.
//!
//! Paths are usually derived from a JSON Pointer string. Splitting follows
//! the validator convention rather than strict RFC 6901: the pointer is
//! split on `/` and empty segments are discarded, so `""`, `"/"` and
//! `"//"` all denote the document root. Canonical decimal segments (`0`,
//! `17`, not `017`) become [`Step::Index`]; everything else is a
//! [`Step::Key`] with `~1` and `~0` unescaped. When the document is at hand,
//! [`StructuralPath::from_pointer_in`] decides key or index from the value
//! each segment descends into instead.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Array element by zero-based position.
    Index(usize),
    /// Object member by property name.
    Key(String),
}

impl Step {
    /// The member name this step selects when it meets an object.
    ///
    /// Index steps name their decimal form, so `/responses/200` reaches the
    /// `"200"` member of an object as well as element 200 of an array.
    pub fn member_name(&self) -> Cow<'_, str> {
        match self {
            Step::Key(k) => Cow::Borrowed(k.as_str()),
            Step::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    fn from_segment(segment: &str) -> Self {
        match canonical_index(segment) {
            Some(index) => Step::Index(index),
            None => Step::Key(unescape(segment)),
        }
    }
}

/// `0` or a digit run without leading zeros.
fn canonical_index(segment: &str) -> Option<usize> {
    let digits = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
    if !digits || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    segment.parse().ok()
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Index(i) => write!(f, "{i}"),
            Step::Key(k) => write!(f, "{}", k.replace('~', "~0").replace('/', "~1")),
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Step::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Step::Key(key)
    }
}

impl From<usize> for Step {
    fn from(index: usize) -> Self {
        Step::Index(index)
    }
}

/// Ordered sequence of [`Step`]s. The empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath(Vec<Step>);

impl StructuralPath {
    /// The empty path, naming the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from explicit steps.
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Parse a slash-delimited pointer such as `/items/0/name`.
    pub fn from_pointer(pointer: &str) -> Self {
        Self(
            pointer
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Step::from_segment)
                .collect(),
        )
    }

    /// Parse a pointer against the document it points into.
    ///
    /// Each segment becomes a [`Step::Key`] where the value it descends from
    /// is an object and a [`Step::Index`] where it is an array, so all-digit
    /// member names such as `"200"` stay keys. Past the point where the
    /// document no longer has the path, segments are read as in
    /// [`from_pointer`](Self::from_pointer).
    pub fn from_pointer_in(pointer: &str, document: &Value) -> Self {
        let mut current = Some(document);
        let mut steps = Vec::new();
        for segment in pointer.split('/').filter(|s| !s.is_empty()) {
            let step = match current {
                Some(Value::Object(map)) => {
                    let key = unescape(segment);
                    current = map.get(&key);
                    Step::Key(key)
                }
                Some(Value::Array(items)) => {
                    let step = Step::from_segment(segment);
                    current = match &step {
                        Step::Index(i) => items.get(*i),
                        Step::Key(_) => None,
                    };
                    step
                }
                _ => {
                    current = None;
                    Step::from_segment(segment)
                }
            };
            steps.push(step);
        }
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the document root.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.0.last()
    }

    /// A new path with `step` appended.
    pub fn child(&self, step: impl Into<Step>) -> Self {
        let mut steps = self.0.clone();
        steps.push(step.into());
        Self(steps)
    }

    /// The first `len` steps (clamped to the path length).
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl From<Vec<Step>> for StructuralPath {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

impl FromIterator<Step> for StructuralPath {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
