//! Candidate field lookup for heterogeneous records.

use serde_json::Value;

/// Conventional label field names, highest priority first.
pub const DEFAULT_LABEL_CANDIDATES: &[&str] = &["label", "name", "title"];
/// Conventional value field names, highest priority first.
pub const DEFAULT_VALUE_CANDIDATES: &[&str] = &["value", "id", "key"];

/// Return the first candidate that is a key of `record`.
///
/// A key holding JSON `null` still counts as present. Records that are not
/// JSON objects have no keys, so the result is `None` and callers treat it
/// as "no mapping available".
///
/// ```rust
/// use dictum_engine::field_resolver::resolve_field;
/// use serde_json::json;
///
/// let record = json!({"id": 2, "name": "Closed"});
/// assert_eq!(resolve_field(&record, &["label", "name", "title"]), Some("name"));
/// assert_eq!(resolve_field(&record, &["code"]), None);
/// ```
pub fn resolve_field<'a, S: AsRef<str>>(record: &Value, candidates: &'a [S]) -> Option<&'a str> {
    let fields = record.as_object()?;
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .find(|candidate| fields.contains_key(*candidate))
}

pub(crate) fn default_candidates(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candidate_order_encodes_priority() {
        let record = json!({"title": "t", "name": "n"});
        assert_eq!(resolve_field(&record, DEFAULT_LABEL_CANDIDATES), Some("name"));
        assert_eq!(resolve_field(&record, &["title", "name"]), Some("title"));
    }

    #[test]
    fn null_valued_keys_are_present() {
        let record = json!({"label": null, "name": "n"});
        assert_eq!(resolve_field(&record, DEFAULT_LABEL_CANDIDATES), Some("label"));
    }

    #[test]
    fn non_objects_resolve_nothing() {
        assert_eq!(resolve_field(&json!("label"), DEFAULT_LABEL_CANDIDATES), None);
        assert_eq!(resolve_field(&json!([{"label": 1}]), DEFAULT_LABEL_CANDIDATES), None);
        let empty: [&str; 0] = [];
        assert_eq!(resolve_field(&json!({"label": 1}), &empty), None);
    }
}
