//! Normalized dictionary entries.

use serde::Serialize;
use serde_json::Value;

/// One normalized record of a dictionary type.
///
/// `label` and `value` are derived from `raw` when the entry is built and are
/// `None` when no matching field exists on the record. Entries are never
/// mutated after construction; caches share them behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    raw: Value,
}

impl DictionaryEntry {
    pub fn new(label: Option<Value>, value: Option<Value>, raw: Value) -> Self {
        Self { label, value, raw }
    }

    pub fn label(&self) -> Option<&Value> {
        self.label.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The unmodified source record.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Best-effort display text for the label.
    ///
    /// Strings are returned as-is, numbers and booleans are rendered, and any
    /// other shape (including a missing label) yields `None`.
    pub fn label_text(&self) -> Option<String> {
        match self.label.as_ref()? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Whether this entry's value equals `candidate`.
    ///
    /// Backends frequently mix `"1"` and `1` for the same code, so a string and
    /// a number compare equal when their textual forms match.
    pub fn has_value(&self, candidate: &Value) -> bool {
        match (self.value.as_ref(), candidate) {
            (Some(own), other) if own == other => true,
            (Some(Value::String(text)), Value::Number(number)) | (Some(Value::Number(number)), Value::String(text)) => {
                *text == number.to_string()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_text_renders_scalars() {
        let raw = json!({"label": 7});
        let numeric = DictionaryEntry::new(Some(json!(7)), None, raw.clone());
        assert_eq!(numeric.label_text().as_deref(), Some("7"));

        let missing = DictionaryEntry::new(None, None, raw);
        assert!(missing.label_text().is_none());
    }

    #[test]
    fn has_value_matches_string_and_number_forms() {
        let entry = DictionaryEntry::new(Some(json!("Active")), Some(json!(1)), json!({}));
        assert!(entry.has_value(&json!(1)));
        assert!(entry.has_value(&json!("1")));
        assert!(!entry.has_value(&json!(2)));
    }

    #[test]
    fn missing_fields_are_omitted_when_serialized() {
        let entry = DictionaryEntry::new(None, Some(json!("x")), json!({"key": "x"}));
        let serialized = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(serialized, json!({"value": "x", "raw": {"key": "x"}}));
    }
}
