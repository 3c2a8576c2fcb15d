use std::fmt;
use std::sync::Arc;

use dictum_types::WILDCARD_TYPE;
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value, json};

use super::merge::deep_merge_maps;
use crate::convert::{ConvertContext, DEFAULT_LIST_FIELD, FieldMapping, ListConverter, ResponseConverter};
use crate::field_resolver::{DEFAULT_LABEL_CANDIDATES, DEFAULT_VALUE_CANDIDATES, default_candidates};
use crate::request::{DictionaryRequest, NoopRequest};

/// Configuration for one dictionary type, or for the wildcard entry.
///
/// Every field is optional. Absent fields inherit from the wildcard when the
/// configuration is resolved, never when it is merged.
#[derive(Clone, Default)]
pub struct DictionaryTypeConfig {
    pub request: Option<Arc<dyn DictionaryRequest>>,
    pub converter: Option<Arc<dyn ResponseConverter>>,
    pub label_field: Option<String>,
    pub value_field: Option<String>,
    pub label_candidates: Option<Vec<String>>,
    pub value_candidates: Option<Vec<String>>,
    pub list_field: Option<String>,
    /// Free-form options; deep-merged key by key.
    pub options: JsonMap<String, Value>,
}

impl fmt::Debug for DictionaryTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryTypeConfig")
            .field("request", &self.request.as_ref().map(|request| request.describe()))
            .field("converter", &self.converter.is_some())
            .field("label_field", &self.label_field)
            .field("value_field", &self.value_field)
            .field("label_candidates", &self.label_candidates)
            .field("value_candidates", &self.value_candidates)
            .field("list_field", &self.list_field)
            .field("options", &self.options)
            .finish()
    }
}

impl DictionaryTypeConfig {
    pub fn with_request(mut self, request: impl DictionaryRequest + 'static) -> Self {
        self.request = Some(Arc::new(request));
        self
    }

    pub fn with_converter(mut self, converter: impl ResponseConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn with_label_field(mut self, field: impl Into<String>) -> Self {
        self.label_field = Some(field.into());
        self
    }

    pub fn with_value_field(mut self, field: impl Into<String>) -> Self {
        self.value_field = Some(field.into());
        self
    }

    pub fn with_list_field(mut self, field: impl Into<String>) -> Self {
        self.list_field = Some(field.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Layer `overlay` over `self`, returning a new configuration.
    ///
    /// Set fields of the overlay replace ours (functions included);
    /// `options` merge recursively.
    pub fn merged_with(&self, overlay: &DictionaryTypeConfig) -> DictionaryTypeConfig {
        DictionaryTypeConfig {
            request: overlay.request.clone().or_else(|| self.request.clone()),
            converter: overlay.converter.clone().or_else(|| self.converter.clone()),
            label_field: overlay.label_field.clone().or_else(|| self.label_field.clone()),
            value_field: overlay.value_field.clone().or_else(|| self.value_field.clone()),
            label_candidates: overlay.label_candidates.clone().or_else(|| self.label_candidates.clone()),
            value_candidates: overlay.value_candidates.clone().or_else(|| self.value_candidates.clone()),
            list_field: overlay.list_field.clone().or_else(|| self.list_field.clone()),
            options: deep_merge_maps(&self.options, &overlay.options),
        }
    }
}

/// Caller-supplied overrides keyed by type name (`"*"` targets the wildcard).
#[derive(Debug, Clone, Default)]
pub struct DictionaryOverrides {
    pub(crate) types: IndexMap<String, DictionaryTypeConfig>,
}

impl DictionaryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or merge into) the override for `dict_type`.
    pub fn with_type(mut self, dict_type: impl Into<String>, config: DictionaryTypeConfig) -> Self {
        let dict_type = dict_type.into();
        let merged = match self.types.get(&dict_type) {
            Some(existing) => existing.merged_with(&config),
            None => config,
        };
        self.types.insert(dict_type, merged);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DictionaryTypeConfig)> {
        self.types.iter().map(|(name, config)| (name.as_str(), config))
    }
}

/// Effective configuration of one type after layering it over the wildcard.
#[derive(Clone)]
pub struct ResolvedTypeConfig {
    pub dict_type: String,
    pub request: Arc<dyn DictionaryRequest>,
    pub converter: Arc<dyn ResponseConverter>,
    pub fields: FieldMapping,
    pub list_field: String,
    pub options: JsonMap<String, Value>,
}

impl fmt::Debug for ResolvedTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTypeConfig")
            .field("dict_type", &self.dict_type)
            .field("request", &self.request.describe())
            .field("fields", &self.fields)
            .field("list_field", &self.list_field)
            .field("options", &self.options)
            .finish()
    }
}

impl ResolvedTypeConfig {
    pub fn convert_context(&self) -> ConvertContext<'_> {
        ConvertContext {
            dict_type: &self.dict_type,
            fields: &self.fields,
            list_field: &self.list_field,
        }
    }

    /// JSON description for diagnostics and the `config` command.
    pub fn describe(&self) -> Value {
        json!({
            "type": self.dict_type,
            "request": self.request.describe(),
            "fields": self.fields,
            "listField": self.list_field,
            "options": self.options,
        })
    }
}

/// Merged dictionary configuration: the wildcard plus per-type entries.
///
/// The wildcard is held apart from the per-type map, so it cannot be removed.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    wildcard: DictionaryTypeConfig,
    types: IndexMap<String, DictionaryTypeConfig>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConfigStore {
    /// Store seeded with the default wildcard entry: no-op request, list
    /// converter, conventional candidates, and `rows` as the list field.
    pub fn with_defaults() -> Self {
        let wildcard = DictionaryTypeConfig {
            request: Some(Arc::new(NoopRequest)),
            converter: Some(Arc::new(ListConverter)),
            label_candidates: Some(default_candidates(DEFAULT_LABEL_CANDIDATES)),
            value_candidates: Some(default_candidates(DEFAULT_VALUE_CANDIDATES)),
            list_field: Some(DEFAULT_LIST_FIELD.to_string()),
            ..DictionaryTypeConfig::default()
        };
        Self {
            wildcard,
            types: IndexMap::new(),
        }
    }

    /// Return a new store with `overrides` merged in; `self` is unchanged.
    pub fn merged(&self, overrides: &DictionaryOverrides) -> Self {
        let mut wildcard = self.wildcard.clone();
        let mut types = self.types.clone();
        for (dict_type, overlay) in overrides.iter() {
            if dict_type == WILDCARD_TYPE {
                wildcard = wildcard.merged_with(overlay);
                continue;
            }
            let merged = match types.get(dict_type) {
                Some(existing) => existing.merged_with(overlay),
                None => overlay.clone(),
            };
            types.insert(dict_type.to_string(), merged);
        }
        Self { wildcard, types }
    }

    /// Merge `overrides` into this store.
    pub fn merge_overrides(&mut self, overrides: &DictionaryOverrides) {
        *self = self.merged(overrides);
    }

    pub fn wildcard(&self) -> &DictionaryTypeConfig {
        &self.wildcard
    }

    /// Explicit entry for `dict_type`, without wildcard inheritance.
    pub fn entry(&self, dict_type: &str) -> Option<&DictionaryTypeConfig> {
        if dict_type == WILDCARD_TYPE {
            return Some(&self.wildcard);
        }
        self.types.get(dict_type)
    }

    pub fn configured_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Effective configuration for `dict_type`.
    ///
    /// Each field independently falls back to the wildcard's; `options` are
    /// deep-merged wildcard first. A wildcard without a request function
    /// still resolves to the no-op request.
    pub fn resolve_config(&self, dict_type: &str) -> ResolvedTypeConfig {
        let layered = match self.types.get(dict_type) {
            Some(explicit) => self.wildcard.merged_with(explicit),
            None => self.wildcard.clone(),
        };
        let mut fields = FieldMapping {
            label_field: layered.label_field,
            value_field: layered.value_field,
            ..FieldMapping::default()
        };
        if let Some(candidates) = layered.label_candidates {
            fields.label_candidates = candidates;
        }
        if let Some(candidates) = layered.value_candidates {
            fields.value_candidates = candidates;
        }
        ResolvedTypeConfig {
            dict_type: dict_type.to_string(),
            request: layered.request.unwrap_or_else(|| Arc::new(NoopRequest)),
            converter: layered.converter.unwrap_or_else(|| Arc::new(ListConverter)),
            fields,
            list_field: layered.list_field.unwrap_or_else(|| DEFAULT_LIST_FIELD.to_string()),
            options: layered.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::StaticRequest;
    use serde_json::json;

    fn overrides(value: Value) -> DictionaryOverrides {
        DictionaryOverrides::from_value(value).expect("overrides")
    }

    fn options(value: Value) -> JsonMap<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn merge_law_accumulates_and_scalars_replace() {
        let mut store = ConfigStore::with_defaults();
        store.merge_overrides(&overrides(json!({"A": {"x": 1}})));
        store.merge_overrides(&overrides(json!({"A": {"y": 2}})));
        assert_eq!(store.entry("A").expect("A").options, options(json!({"x": 1, "y": 2})));

        store.merge_overrides(&overrides(json!({"A": {"x": 3}})));
        assert_eq!(store.entry("A").expect("A").options, options(json!({"x": 3, "y": 2})));
    }

    #[test]
    fn merged_leaves_the_original_store_untouched() {
        let store = ConfigStore::with_defaults();
        let next = store.merged(&overrides(json!({"status": {"labelField": "dictLabel"}})));
        assert!(store.entry("status").is_none());
        assert_eq!(next.entry("status").and_then(|entry| entry.label_field.as_deref()), Some("dictLabel"));
    }

    #[test]
    fn merging_does_not_copy_wildcard_fields_into_types() {
        let mut store = ConfigStore::with_defaults();
        store.merge_overrides(&overrides(json!({"*": {"labelField": "dictLabel"}, "status": {"valueField": "code"}})));

        let explicit = store.entry("status").expect("status entry");
        assert!(explicit.label_field.is_none());
        assert!(explicit.request.is_none());

        let resolved = store.resolve_config("status");
        assert_eq!(resolved.fields.label_field.as_deref(), Some("dictLabel"));
        assert_eq!(resolved.fields.value_field.as_deref(), Some("code"));
    }

    #[test]
    fn unknown_types_resolve_entirely_from_the_wildcard() {
        let store = ConfigStore::with_defaults();
        let resolved = store.resolve_config("category");
        assert_eq!(resolved.dict_type, "category");
        assert_eq!(resolved.request.describe(), "noop");
        assert_eq!(resolved.list_field, "rows");
        assert_eq!(resolved.fields, FieldMapping::default());
    }

    #[test]
    fn functions_replace_rather_than_merge() {
        let mut store = ConfigStore::with_defaults();
        let first = DictionaryOverrides::new().with_type(
            "status",
            DictionaryTypeConfig::default().with_request(StaticRequest::new(json!([]))),
        );
        store.merge_overrides(&first);
        assert_eq!(store.resolve_config("status").request.describe(), "static");

        let second = DictionaryOverrides::new().with_type("status", DictionaryTypeConfig::default().with_list_field("items"));
        store.merge_overrides(&second);
        let resolved = store.resolve_config("status");
        assert_eq!(resolved.request.describe(), "static");
        assert_eq!(resolved.list_field, "items");
    }

    #[test]
    fn options_layer_wildcard_then_type() {
        let mut store = ConfigStore::with_defaults();
        store.merge_overrides(&overrides(json!({
            "*": {"query": {"page": 1, "size": 20}},
            "status": {"query": {"size": 100}}
        })));
        assert_eq!(
            store.resolve_config("status").options,
            options(json!({"query": {"page": 1, "size": 100}}))
        );
        assert_eq!(
            store.resolve_config("category").options,
            options(json!({"query": {"page": 1, "size": 20}}))
        );
    }

    #[test]
    fn wildcard_without_request_still_resolves_to_noop() {
        let store = ConfigStore {
            wildcard: DictionaryTypeConfig::default(),
            types: IndexMap::new(),
        };
        let resolved = store.resolve_config("status");
        assert_eq!(resolved.request.describe(), "noop");
        assert_eq!(resolved.fields, FieldMapping::default());
    }
}
