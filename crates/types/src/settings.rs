//! Declarative dictionary settings.
//!
//! The settings document mirrors the options object installed once per
//! process:
//!
//! ```yaml
//! "*":
//!   labelField: dictLabel
//!   request:
//!     path: /sys/dict/{type}
//! status:
//!   valueField: code
//!   listField: items
//! ```
//!
//! Recognized keys map onto typed fields; anything else is preserved in
//! [`DictionaryTypeSettings::options`] so it can be deep-merged later.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Key of the configuration entry that supplies defaults for every type.
pub const WILDCARD_TYPE: &str = "*";

/// Settings for every configured dictionary type, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionarySettings {
    pub types: IndexMap<String, DictionaryTypeSettings>,
}

impl DictionarySettings {
    /// Parse settings from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn wildcard(&self) -> Option<&DictionaryTypeSettings> {
        self.types.get(WILDCARD_TYPE)
    }
}

/// Per-type settings. Every field is optional; absent fields inherit from the
/// wildcard entry when the configuration is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryTypeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    /// Field of an object response that holds the record list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSettings>,
    /// Unrecognized keys, kept verbatim.
    #[serde(flatten)]
    pub options: JsonMap<String, Value>,
}

/// Declarative HTTP request for a dictionary type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// API-relative path; `{type}` is replaced by the encoded type name.
    pub path: String,
}
