//! Pure deep merge over JSON values.

use serde_json::{Map as JsonMap, Value};

/// Merge `overlay` onto `base` without mutating either.
///
/// Objects merge key by key, recursively. Any other overlay value (arrays
/// included) replaces the base value outright.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(deep_merge_maps(base, overlay)),
        (_, overlay) => overlay.clone(),
    }
}

/// Map form of [`deep_merge`].
pub fn deep_merge_maps(base: &JsonMap<String, Value>, overlay: &JsonMap<String, Value>) -> JsonMap<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match merged.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let base = json!({"request": {"path": "/a", "query": {"page": 1}}, "x": 1});
        let overlay = json!({"request": {"query": {"size": 10}}, "x": 3});
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({"request": {"path": "/a", "query": {"page": 1, "size": 10}}, "x": 3})
        );
    }

    #[test]
    fn arrays_and_type_changes_replace() {
        assert_eq!(deep_merge(&json!({"a": [1, 2]}), &json!({"a": [3]})), json!({"a": [3]}));
        assert_eq!(deep_merge(&json!({"a": {"b": 1}}), &json!({"a": 5})), json!({"a": 5}));
        assert_eq!(deep_merge(&json!(5), &json!({"b": 1})), json!({"b": 1}));
    }

    #[test]
    fn inputs_are_left_untouched() {
        let base = json!({"a": {"b": 1}});
        let overlay = json!({"a": {"c": 2}});
        let _ = deep_merge(&base, &overlay);
        assert_eq!(base, json!({"a": {"b": 1}}));
        assert_eq!(overlay, json!({"a": {"c": 2}}));
    }
}
