//! # Resolver Properties
//!
//! Property tests for the path-to-line resolver:
//!
//! 1. For every path that exists in a document, the resolved line holds the
//!    key (for a key step) or the opening token (for an index step or the
//!    root) of that path's value, in both pretty and compact layouts.
//!    The same holds when the path is rebuilt from its pointer string.
//! 2. Resolution is total: arbitrary text and arbitrary pointers never
//!    panic.

use jsonloc_core::{resolve, SourceLocation, Step, StructuralPath};
use proptest::prelude::*;
use serde_json::Value;

/// JSON values with a tiny key alphabet so key names repeat across levels.
/// Digit keys (`"0"`, `"12"`, `"01"`) look like array indices in a pointer.
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| serde_json::json!(n)),
        "[a-z{}\\[\\]\":, ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-c0-2]{1,2}", inner, 0..6).prop_map(|m| {
                let map: serde_json::Map<String, Value> = m.into_iter().collect();
                Value::Object(map)
            }),
        ]
    })
}

fn all_paths<'a>(value: &'a Value, prefix: StructuralPath, out: &mut Vec<(StructuralPath, &'a Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                all_paths(child, prefix.child(key.as_str()), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                all_paths(child, prefix.child(index), out);
            }
        }
        _ => {}
    }
    out.push((prefix, value));
}

fn check_located(text: &str, path: &StructuralPath, value: &Value, location: SourceLocation) {
    let line = text
        .split('\n')
        .nth(location.line - 1)
        .unwrap_or_else(|| panic!("line {} out of range for {path}", location.line));
    let column = location.column.expect("structural resolution reports a column");
    let from_column: String = line.chars().skip(column - 1).collect();

    match path.last() {
        Some(Step::Key(key)) => {
            let quoted = serde_json::to_string(key).unwrap();
            assert!(
                from_column.starts_with(&quoted),
                "path {path}: expected key {quoted} at {location}, line was {line:?}"
            );
        }
        _ => {
            let compact = serde_json::to_string(value).unwrap();
            let opening = compact.chars().next().unwrap();
            assert_eq!(
                from_column.chars().next(),
                Some(opening),
                "path {path}: expected opening {opening:?} at {location}, line was {line:?}"
            );
        }
    }
}

proptest! {
    #[test]
    fn existing_paths_resolve_to_their_key_or_opening(value in json_value()) {
        let mut paths = Vec::new();
        all_paths(&value, StructuralPath::root(), &mut paths);

        for text in [
            serde_json::to_string_pretty(&value).unwrap(),
            serde_json::to_string(&value).unwrap(),
        ] {
            for (path, target) in &paths {
                let location = resolve(&text, path);
                prop_assert!(location.is_some(), "path {} did not resolve in {}", path, text);
                check_located(&text, path, target, location.unwrap());

                let pointer = path.to_string();
                prop_assert_eq!(resolve(&text, &StructuralPath::from_pointer(&pointer)), location);
                prop_assert_eq!(
                    resolve(&text, &StructuralPath::from_pointer_in(&pointer, &value)),
                    location
                );
            }
        }
    }

    #[test]
    fn resolve_is_total_on_arbitrary_text(text in any::<String>(), pointer in "[a-z0-9/~]{0,12}") {
        let _ = resolve(&text, &StructuralPath::from_pointer(&pointer));
    }

    #[test]
    fn resolve_is_total_on_truncated_documents(value in json_value(), cut in 0usize..200) {
        let text = serde_json::to_string_pretty(&value).unwrap();
        let truncated: String = text.chars().take(cut).collect();
        let mut paths = Vec::new();
        all_paths(&value, StructuralPath::root(), &mut paths);
        for (path, _) in &paths {
            if let Some(location) = resolve(&truncated, path) {
                prop_assert!(location.line >= 1);
                prop_assert!(location.line <= truncated.split('\n').count());
            }
        }
    }
}

#[test]
fn resolution_is_deterministic() {
    let text = "{\n  \"a\": [\n    {\"b\": 1},\n    {\"b\": 2}\n  ]\n}";
    let path = StructuralPath::from_pointer("/a/1/b");
    let first = resolve(text, &path);
    assert_eq!(first, Some(SourceLocation::at(4, 6)));
    for _ in 0..3 {
        assert_eq!(resolve(text, &path), first);
    }
}
