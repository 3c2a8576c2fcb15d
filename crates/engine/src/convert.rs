//! Record and response conversion.
//!
//! - [`convert_record`] turns one backend record into a [`DictionaryEntry`].
//! - [`ResponseConverter`] turns a whole response payload into entries; the
//!   default [`ListConverter`] extracts the record list and converts each
//!   element.

use dictum_types::DictionaryEntry;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::field_resolver::{DEFAULT_LABEL_CANDIDATES, DEFAULT_VALUE_CANDIDATES, default_candidates, resolve_field};

/// Field of an object response that holds the record list by default.
pub const DEFAULT_LIST_FIELD: &str = "rows";

/// How label and value fields are located on a record.
///
/// Explicit field names win; otherwise the first candidate present on the
/// record is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub label_field: Option<String>,
    pub value_field: Option<String>,
    pub label_candidates: Vec<String>,
    pub value_candidates: Vec<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            label_field: None,
            value_field: None,
            label_candidates: default_candidates(DEFAULT_LABEL_CANDIDATES),
            value_candidates: default_candidates(DEFAULT_VALUE_CANDIDATES),
        }
    }
}

impl FieldMapping {
    /// Mapping with both fields fixed; candidates stay at their defaults.
    pub fn explicit(label_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        Self {
            label_field: Some(label_field.into()),
            value_field: Some(value_field.into()),
            ..Self::default()
        }
    }

    fn label_field_for<'a>(&'a self, record: &Value) -> Option<&'a str> {
        self.label_field
            .as_deref()
            .or_else(|| resolve_field(record, &self.label_candidates))
    }

    fn value_field_for<'a>(&'a self, record: &Value) -> Option<&'a str> {
        self.value_field
            .as_deref()
            .or_else(|| resolve_field(record, &self.value_candidates))
    }
}

/// Convert one raw record into a normalized entry.
///
/// Never fails: a field that cannot be resolved, or an explicit field the
/// record lacks, leaves the corresponding output empty.
pub fn convert_record(record: Value, mapping: &FieldMapping) -> DictionaryEntry {
    let label = mapping
        .label_field_for(&record)
        .and_then(|field| record.get(field))
        .cloned();
    let value = mapping
        .value_field_for(&record)
        .and_then(|field| record.get(field))
        .cloned();
    DictionaryEntry::new(label, value, record)
}

/// Per-call inputs available to a [`ResponseConverter`].
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    pub dict_type: &'a str,
    pub fields: &'a FieldMapping,
    pub list_field: &'a str,
}

/// Turns a request's response payload into dictionary entries.
pub trait ResponseConverter: Send + Sync {
    fn convert(&self, response: Value, context: &ConvertContext<'_>) -> Vec<DictionaryEntry>;
}

impl<F> ResponseConverter for F
where
    F: Fn(Value, &ConvertContext<'_>) -> Vec<DictionaryEntry> + Send + Sync,
{
    fn convert(&self, response: Value, context: &ConvertContext<'_>) -> Vec<DictionaryEntry> {
        self(response, context)
    }
}

/// Default converter: extract the record list, then convert every record.
///
/// A payload whose list cannot be found converts to no entries and logs a
/// warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListConverter;

impl ResponseConverter for ListConverter {
    fn convert(&self, response: Value, context: &ConvertContext<'_>) -> Vec<DictionaryEntry> {
        let shape = shape_name(&response);
        match extract_list(response, context.list_field) {
            Some(records) => records
                .into_iter()
                .map(|record| convert_record(record, context.fields))
                .collect(),
            None => {
                warn!(
                    dict_type = %context.dict_type,
                    list_field = %context.list_field,
                    shape,
                    "dictionary response is not list-like; using empty entries"
                );
                Vec::new()
            }
        }
    }
}

/// Locate the record list inside a response payload.
///
/// A bare array is the list. An object carrying `list_field` yields that
/// member; any other payload is taken as the list itself. `None` when the
/// chosen value is not an array.
pub fn extract_list(response: Value, list_field: &str) -> Option<Vec<Value>> {
    let candidate = match response {
        Value::Object(mut members) if members.contains_key(list_field) => members.remove(list_field).unwrap_or(Value::Null),
        other => other,
    };
    match candidate {
        Value::Array(records) => Some(records),
        _ => None,
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
