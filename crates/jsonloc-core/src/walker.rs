//! # Structural Walker
//!
//! Descends a parsed document along a [`StructuralPath`]. Pure and
//! side-effect free. A key step against a non-object, or an index step
//! against a scalar or out of range, stops the walk: no partial-path
//! value is ever handed back, only how many leading steps did resolve so
//! the resolver can seed its fallback with the deepest known context.
//!
//! An index step against an object selects the member named by its decimal
//! form, since a pointer such as `/responses/200` cannot tell the two apart.

use serde_json::Value;

use crate::path::{Step, StructuralPath};

/// Outcome of [`walk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Walk<'a> {
    Found(&'a Value),
    NotFound {
        /// Number of leading steps that resolved before the walk stopped.
        resolved: usize,
    },
}

/// Follow `path` through `document`.
pub fn walk<'a>(document: &'a Value, path: &StructuralPath) -> Walk<'a> {
    let mut current = document;
    for (resolved, step) in path.steps().iter().enumerate() {
        let next = match (step, current) {
            (step, Value::Object(map)) => map.get(&*step.member_name()),
            (Step::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Walk::NotFound { resolved },
        }
    }
    Walk::Found(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_path_is_the_document() {
        let doc = json!({"a": 1});
        assert_eq!(walk(&doc, &StructuralPath::root()), Walk::Found(&doc));
    }

    #[test]
    fn descends_keys_and_indices() {
        let doc = json!({"a": {"b": [1, 2, 3]}});
        let path = StructuralPath::from_pointer("/a/b/1");
        assert_eq!(walk(&doc, &path), Walk::Found(&json!(2)));
    }

    #[test]
    fn key_against_array_is_not_found() {
        let doc = json!({"a": [1]});
        let path = StructuralPath::from_pointer("/a/x");
        assert_eq!(walk(&doc, &path), Walk::NotFound { resolved: 1 });
    }

    #[test]
    fn index_against_object_selects_decimal_member() {
        let doc = json!({"responses": {"200": {"x": 1}}});
        let path = StructuralPath::from_pointer("/responses/200/x");
        assert_eq!(walk(&doc, &path), Walk::Found(&json!(1)));

        let missing = StructuralPath::from_pointer("/responses/404");
        assert_eq!(walk(&doc, &missing), Walk::NotFound { resolved: 1 });
    }

    #[test]
    fn index_against_scalar_is_not_found() {
        let doc = json!({"a": 1});
        let path = StructuralPath::from_pointer("/a/0");
        assert_eq!(walk(&doc, &path), Walk::NotFound { resolved: 1 });
    }

    #[test]
    fn out_of_range_index_is_not_found() {
        let doc = json!([[1, 2]]);
        let path = StructuralPath::from_pointer("/0/5");
        assert_eq!(walk(&doc, &path), Walk::NotFound { resolved: 1 });
    }

    #[test]
    fn missing_first_step_resolves_nothing() {
        let doc = json!({"a": 1});
        let path = StructuralPath::from_pointer("/b/c");
        assert_eq!(walk(&doc, &path), Walk::NotFound { resolved: 0 });
    }
}
