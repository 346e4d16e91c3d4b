//! # Path-to-Line Resolver
//!
//! Maps a [`StructuralPath`] back to the place in the original text where the
//! value it names begins. Resolution is total: every input, including text
//! that is not JSON at all, yields either a location or `None`.
//!
//! ## Strategy, in priority order
//!
//! 1. **Exact structural resolution.** The text is parsed and the path is
//!    confirmed with the [walker](crate::walker). The text is then re-scanned
//!    with the [tokenizing scanner](crate::scanner) while a path cursor keeps
//!    one frame per open container (current key for objects, current element
//!    index for arrays). A key step matches when its key closes at exactly
//!    the depth the path names; an index step matches at the first token of
//!    that element, or at an object member named by its decimal form.
//!    Repeated key names at other depths are never confused.
//! 2. **Root-level property search.** For errors at the root that name a
//!    property ([`resolve_error`]), the first line holding `"<property>":`.
//! 3. **Text search.** When the path does not resolve structurally, the last
//!    step is searched textually, starting from the line of the deepest
//!    prefix that did resolve. A key step finds the first `"<name>":`; an
//!    index step finds the parent key and counts `{` openings among the
//!    array's direct elements, then falls back to a member named by the
//!    index's decimal form.
//! 4. `None`. Callers render the diagnostic without a line reference.

use serde_json::Value;

use crate::diagnostic::{ErrorKind, StructuralError};
use crate::location::SourceLocation;
use crate::path::{Step, StructuralPath};
use crate::scanner::{scan_from, Transition};
use crate::walker::{walk, Walk};

/// Resolve `path` against `text`, parsing the text first.
pub fn resolve(text: &str, path: &StructuralPath) -> Option<SourceLocation> {
    let document = serde_json::from_str::<Value>(text).ok();
    resolve_parsed(text, document.as_ref(), path)
}

/// Resolve `path` against `text` when the caller already holds the parse
/// result. `document` is `None` when the text failed to parse.
pub fn resolve_parsed(
    text: &str,
    document: Option<&Value>,
    path: &StructuralPath,
) -> Option<SourceLocation> {
    let mut context_line = 1;

    match document.map(|doc| walk(doc, path)) {
        Some(Walk::Found(_)) => {
            if let Some(location) = locate_structural(text, path.steps()) {
                return Some(location);
            }
        }
        Some(Walk::NotFound { resolved }) if resolved > 0 => {
            if let Some(location) = locate_structural(text, &path.steps()[..resolved]) {
                context_line = location.line;
            }
        }
        _ => {}
    }

    text_search(text, path.steps(), context_line)
}

/// Resolve the location a diagnostic should point at for `error`.
pub fn resolve_error(text: &str, error: &StructuralError) -> Option<SourceLocation> {
    let document = serde_json::from_str::<Value>(text).ok();
    resolve_error_parsed(text, document.as_ref(), error)
}

/// [`resolve_error`] with a pre-parsed document.
///
/// - Additional property: the offending key itself (`path + [property]`),
///   then the object holding it.
/// - Missing required property at the root: the first `"<property>":` line,
///   then the root value.
/// - Everything else: [`resolve_parsed`] on the error's path.
pub fn resolve_error_parsed(
    text: &str,
    document: Option<&Value>,
    error: &StructuralError,
) -> Option<SourceLocation> {
    match &error.kind {
        ErrorKind::AdditionalProperty { property } => {
            resolve_parsed(text, document, &error.path.child(property.as_str()))
                .or_else(|| resolve_parsed(text, document, &error.path))
        }
        ErrorKind::MissingRequired { property } if error.path.is_empty() => {
            let lines: Vec<&str> = text.split('\n').collect();
            find_key(&lines, property, 1).or_else(|| resolve_parsed(text, document, &error.path))
        }
        _ => resolve_parsed(text, document, &error.path),
    }
}

// ---------------------------------------------------------------------------
// Tier 1: structural cursor
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Frame {
    Object { key: Option<String>, expecting_key: bool },
    Array { index: usize, started: bool },
}

#[derive(Debug)]
struct PendingKey {
    raw: String,
    line: usize,
    column: usize,
}

/// Tracks where in the document structure the scan currently is.
#[derive(Debug)]
struct PathCursor<'p> {
    target: &'p [Step],
    frames: Vec<Frame>,
    root_started: bool,
    pending: Option<PendingKey>,
}

impl<'p> PathCursor<'p> {
    fn new(target: &'p [Step]) -> Self {
        Self {
            target,
            frames: Vec::new(),
            root_started: false,
            pending: None,
        }
    }

    /// True when the open frames spell exactly the target path.
    fn at_target(&self) -> bool {
        self.frames.len() == self.target.len()
            && self
                .frames
                .iter()
                .zip(self.target)
                .all(|(frame, step)| match (frame, step) {
                    (Frame::Object { key: Some(key), .. }, want) => {
                        want.member_name() == key.as_str()
                    }
                    (Frame::Array { index, .. }, Step::Index(want)) => index == want,
                    _ => false,
                })
    }

    /// A value token begins. Returns true if that value is the target
    /// element of an array (or the root, for the empty path).
    fn value_started(&mut self) -> bool {
        let fresh = match self.frames.last_mut() {
            None => !std::mem::replace(&mut self.root_started, true),
            Some(Frame::Array { started, .. }) => !std::mem::replace(started, true),
            Some(Frame::Object { .. }) => false,
        };
        fresh && self.at_target()
    }

    fn expecting_key(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame::Object {
                expecting_key: true,
                ..
            })
        )
    }

    fn key_closed(&mut self, name: String) {
        if let Some(Frame::Object { key, expecting_key }) = self.frames.last_mut() {
            *key = Some(name);
            *expecting_key = false;
        }
    }

    fn comma(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Object { key, expecting_key }) => {
                *key = None;
                *expecting_key = true;
            }
            Some(Frame::Array { index, started }) => {
                *index += 1;
                *started = false;
            }
            None => {}
        }
    }
}

fn locate_structural(text: &str, target: &[Step]) -> Option<SourceLocation> {
    let mut cursor = PathCursor::new(target);

    for s in scan_from(text, 1) {
        let here = SourceLocation::at(s.line, s.column);
        match s.transition {
            Transition::StringOpened => {
                if cursor.expecting_key() {
                    cursor.pending = Some(PendingKey {
                        raw: String::new(),
                        line: s.line,
                        column: s.column,
                    });
                } else if cursor.value_started() {
                    return Some(here);
                }
            }
            Transition::EscapeStarted | Transition::StringChar => {
                if let Some(pending) = cursor.pending.as_mut() {
                    pending.raw.push(s.ch);
                }
            }
            Transition::StringClosed => {
                if let Some(pending) = cursor.pending.take() {
                    cursor.key_closed(decode_key(&pending.raw));
                    if cursor.at_target() {
                        return Some(SourceLocation::at(pending.line, pending.column));
                    }
                }
            }
            Transition::OpenBrace | Transition::OpenBracket => {
                if cursor.value_started() {
                    return Some(here);
                }
                cursor.frames.push(if s.transition == Transition::OpenBrace {
                    Frame::Object {
                        key: None,
                        expecting_key: true,
                    }
                } else {
                    Frame::Array {
                        index: 0,
                        started: false,
                    }
                });
            }
            Transition::CloseBrace | Transition::CloseBracket => {
                cursor.frames.pop();
            }
            Transition::Comma => cursor.comma(),
            Transition::Scalar => {
                if cursor.value_started() {
                    return Some(here);
                }
            }
            Transition::Colon | Transition::Whitespace => {}
        }
    }
    None
}

/// Decode the raw characters between a key's quotes, escapes included.
fn decode_key(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// Tiers 2 and 3: text search
// ---------------------------------------------------------------------------

fn text_search(text: &str, steps: &[Step], context_line: usize) -> Option<SourceLocation> {
    let lines: Vec<&str> = text.split('\n').collect();
    let (last, parents) = steps.split_last()?;

    match last {
        Step::Key(name) => find_key_from_context(&lines, name, context_line),
        Step::Index(index) => {
            let element = match parents.last() {
                Some(Step::Key(parent)) => find_key_from_context(&lines, parent, context_line)
                    .and_then(|start| nth_object_element(text, start, *index, true)),
                _ => nth_object_element(text, SourceLocation::at(context_line, 1), *index, false),
            };
            // `/200` may just as well name an object member.
            element.or_else(|| find_key_from_context(&lines, &index.to_string(), context_line))
        }
    }
}

fn find_key_from_context(lines: &[&str], name: &str, context_line: usize) -> Option<SourceLocation> {
    find_key(lines, name, context_line).or_else(|| {
        if context_line > 1 {
            find_key(lines, name, 1)
        } else {
            None
        }
    })
}

/// First `"<name>"` followed by a colon at or after 1-based `from_line`.
fn find_key(lines: &[&str], name: &str, from_line: usize) -> Option<SourceLocation> {
    let needle = serde_json::to_string(name).ok()?;
    lines
        .iter()
        .enumerate()
        .skip(from_line.saturating_sub(1))
        .find_map(|(idx, line)| {
            line.match_indices(needle.as_str()).find_map(|(pos, _)| {
                let rest = &line[pos + needle.len()..];
                rest.trim_start().starts_with(':').then(|| {
                    SourceLocation::at(idx + 1, line[..pos].chars().count() + 1)
                })
            })
        })
}

/// Count `{` openings among the direct elements of the first array that
/// starts at or after `start`, returning the `index`-th one.
///
/// With `after_key`, the scan begins at a key and gives up if that key's
/// value turns out not to be an array.
fn nth_object_element(
    text: &str,
    start: SourceLocation,
    index: usize,
    after_key: bool,
) -> Option<SourceLocation> {
    let start_column = start.column.unwrap_or(1);
    let mut array_depth: Option<i64> = None;
    let mut seen = 0usize;

    let positions = scan_from(text, start.line)
        .skip_while(|s| s.line == start.line && s.column < start_column);

    for s in positions {
        match array_depth {
            None => match s.transition {
                Transition::OpenBracket => array_depth = Some(s.after.depth()),
                Transition::OpenBrace | Transition::Scalar if after_key => return None,
                _ => {}
            },
            Some(depth) => {
                if s.after.depth() < depth {
                    return None;
                }
                if s.transition == Transition::OpenBrace && s.after.depth() == depth + 1 {
                    if seen == index {
                        return Some(SourceLocation::at(s.line, s.column));
                    }
                    seen += 1;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use serde_json::json;

    use crate::diagnostic::{ADDITIONAL_PROPERTY, MISSING_PROPERTY};

    fn path(pointer: &str) -> StructuralPath {
        StructuralPath::from_pointer(pointer)
    }

    fn line_of(text: &str, pointer: &str) -> Option<usize> {
        resolve(text, &path(pointer)).map(|l| l.line)
    }

    const PRETTY: &str = r#"{
  "name": "demo",
  "meta": {
    "tags": ["a", "b"],
    "owner": {
      "name": "root"
    }
  },
  "items": [
    {
      "id": 1
    },
    {
      "id": 2,
      "name": "second"
    }
  ]
}"#;

    #[test]
    fn single_line_array_element_resolves_to_line_one() {
        let text = r#"{"a": {"b": [1,2,3]}}"#;
        let location = resolve(text, &path("/a/b/1")).unwrap();
        assert_eq!(location, SourceLocation::at(1, 16));
    }

    #[test]
    fn key_steps_resolve_to_key_lines() {
        assert_eq!(line_of(PRETTY, "/name"), Some(2));
        assert_eq!(line_of(PRETTY, "/meta"), Some(3));
        assert_eq!(line_of(PRETTY, "/meta/tags"), Some(4));
        assert_eq!(line_of(PRETTY, "/meta/owner/name"), Some(6));
    }

    #[test]
    fn index_steps_resolve_to_element_lines() {
        assert_eq!(line_of(PRETTY, "/items/0"), Some(10));
        assert_eq!(line_of(PRETTY, "/items/1"), Some(13));
        assert_eq!(line_of(PRETTY, "/items/1/id"), Some(14));
        assert_eq!(line_of(PRETTY, "/meta/tags/1"), Some(4));
    }

    #[test]
    fn repeated_key_resolves_at_the_named_depth() {
        // "name" appears at depths 1, 3 and 2; each path gets its own line.
        assert_eq!(line_of(PRETTY, "/items/1/name"), Some(15));
        assert_eq!(line_of(PRETTY, "/meta/owner/name"), Some(6));
        assert_eq!(line_of(PRETTY, "/name"), Some(2));
    }

    #[test]
    fn nested_key_before_top_level_key_is_skipped() {
        let text = "{\n  \"inner\": {\n    \"id\": 1\n  },\n  \"id\": 2\n}";
        assert_eq!(line_of(text, "/id"), Some(5));
        assert_eq!(line_of(text, "/inner/id"), Some(3));
    }

    #[test]
    fn empty_path_is_the_root_value() {
        let text = "\n\n  {\"a\": 1}";
        assert_eq!(resolve(text, &StructuralPath::root()), Some(SourceLocation::at(3, 3)));
    }

    #[test]
    fn braces_in_strings_do_not_confuse_the_cursor() {
        let text = "{\n  \"a\": \"{[\\\"x\\\"]}\",\n  \"b\": [\n    \"}\",\n    7\n  ]\n}";
        assert_eq!(line_of(text, "/b"), Some(3));
        assert_eq!(line_of(text, "/b/1"), Some(5));
    }

    #[test]
    fn escaped_keys_are_decoded() {
        let text = "{\n  \"a\\\"b\": 1,\n  \"c/d\": 2\n}";
        assert_eq!(line_of(text, "/a\"b"), Some(2));
        assert_eq!(line_of(text, "/c~1d"), Some(3));
    }

    #[test]
    fn missing_path_falls_back_to_text_search_from_context() {
        // `/meta/owner/email` does not exist; the deepest resolved prefix is
        // `/meta/owner`, and the last step is searched from there on.
        let text = "{\n  \"email\": \"top\",\n  \"meta\": {\n    \"owner\": {\n      \"x\": 1\n    }\n  }\n}";
        assert_eq!(line_of(text, "/meta/owner/email"), Some(2));
        let text = "{\n  \"meta\": {\n    \"owner\": {\n      \"email\": 1\n    }\n  },\n  \"x\": {\"email\": 2}\n}";
        assert_eq!(line_of(text, "/x/zzz/email"), Some(7));
    }

    #[test]
    fn malformed_document_uses_text_search() {
        let text = "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": oops\n  }\n";
        assert_eq!(line_of(text, "/b/c"), Some(4));
        assert_eq!(line_of(text, "/b"), Some(3));
        assert_eq!(line_of(text, "/zzz"), None);
    }

    #[test]
    fn malformed_array_counts_object_openings() {
        let text = "{\n  \"list\": [\n    {\"a\": 1},\n    {\"a\": {\"n\": 2}},\n    {\"a\": 3}\n  ],,\n}";
        assert_eq!(line_of(text, "/list/0"), Some(3));
        assert_eq!(line_of(text, "/list/2"), Some(5));
        assert_eq!(line_of(text, "/list/9"), None);
    }

    #[test]
    fn index_fallback_gives_up_when_value_is_not_an_array() {
        let text = "{\n  \"list\": {\"a\": [{}]},\n";
        assert_eq!(line_of(text, "/list/0"), None);
    }

    #[test]
    fn digit_member_names_resolve_like_keys() {
        let text = "{\n  \"responses\": {\n    \"200\": {\n      \"x\": 1\n    },\n    \"404\": {}\n  }\n}";
        let doc: Value = serde_json::from_str(text).unwrap();
        let typed = StructuralPath::from_pointer_in("/responses/200", &doc);
        assert_eq!(resolve(text, &typed), Some(SourceLocation::at(3, 5)));
        assert_eq!(resolve(text, &path("/responses/200")), Some(SourceLocation::at(3, 5)));
        assert_eq!(line_of(text, "/responses/404"), Some(6));
        assert_eq!(line_of(text, "/responses/200/x"), Some(4));
    }

    #[test]
    fn digit_member_of_malformed_document_uses_text_search() {
        let text = "{\n  \"codes\": {\n    \"7\": true,,\n  }\n}";
        assert_eq!(line_of(text, "/codes/7"), Some(3));
    }

    #[test]
    fn garbage_never_panics() {
        for text in ["", "}", "]]]", "\"", "\\", "{\"a\":", "[{", "null", "\u{feff}{}"] {
            for pointer in ["", "/a", "/0", "/a/0/b", "/~1"] {
                let _ = resolve(text, &path(pointer));
            }
        }
    }

    #[test]
    fn missing_required_at_root_uses_first_key_line() {
        let text = "{\n  \"a\": {\n    \"b\": 1,\n    \"c\": 2,\n    \"name\": \"x\"\n  }\n}";
        let mut params = BTreeMap::new();
        params.insert(MISSING_PROPERTY.to_string(), json!("name"));
        let error = StructuralError::new(StructuralPath::root(), "required", params);
        assert_eq!(resolve_error(text, &error).map(|l| l.line), Some(5));
    }

    #[test]
    fn missing_required_absent_everywhere_points_at_root() {
        let text = "{\n  \"a\": 1\n}";
        let mut params = BTreeMap::new();
        params.insert(MISSING_PROPERTY.to_string(), json!("name"));
        let error = StructuralError::new(StructuralPath::root(), "required", params);
        assert_eq!(resolve_error(text, &error), Some(SourceLocation::at(1, 1)));
    }

    #[test]
    fn missing_required_nested_points_at_parent() {
        let text = "{\n  \"items\": [\n    {\n      \"x\": 1\n    }\n  ]\n}";
        let mut params = BTreeMap::new();
        params.insert(MISSING_PROPERTY.to_string(), json!("id"));
        let error = StructuralError::new(path("/items/0"), "required", params);
        assert_eq!(resolve_error(text, &error).map(|l| l.line), Some(3));
    }

    #[test]
    fn additional_property_points_at_offending_key() {
        let text = "{\n  \"meta\": {\n    \"ok\": 1,\n    \"extra\": 2\n  },\n  \"extra\": 3\n}";
        let mut params = BTreeMap::new();
        params.insert(ADDITIONAL_PROPERTY.to_string(), json!("extra"));
        let nested = StructuralError::new(path("/meta"), "extra", params.clone());
        assert_eq!(resolve_error(text, &nested).map(|l| l.line), Some(4));
        let root = StructuralError::new(StructuralPath::root(), "extra", params);
        assert_eq!(resolve_error(text, &root).map(|l| l.line), Some(6));
    }

    #[test]
    fn other_errors_resolve_their_path() {
        let error = StructuralError::other(path("/items/1/id"), "bad");
        assert_eq!(resolve_error(PRETTY, &error).map(|l| l.line), Some(14));
    }
}
