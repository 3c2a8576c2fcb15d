//! Loading dictionary settings and turning them into configuration overrides.
//!
//! Settings files are YAML (JSON documents parse as well). The file is looked
//! up, in order, from an explicit path, the `DICTUM_CONFIG` environment
//! variable, and `<config dir>/dictum/dictionaries.yaml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dictum_types::{DictionarySettings, DictionaryTypeSettings};
use dirs_next::config_dir;
use serde_json::Value;
use tracing::debug;

use crate::config::{DictionaryOverrides, DictionaryTypeConfig};
use crate::error::SettingsError;
use crate::request::{HttpDictionaryRequest, JsonTransport};

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "DICTUM_CONFIG";
/// Default settings filename inside the `dictum` config directory.
pub const SETTINGS_FILE_NAME: &str = "dictionaries.yaml";

/// Settings path from `DICTUM_CONFIG`, else the platform config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(path) = env::var(CONFIG_PATH_ENV).ok().filter(|path| !path.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join("dictum").join(SETTINGS_FILE_NAME))
}

/// Read and parse a settings file.
pub fn load_settings(path: &Path) -> Result<DictionarySettings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(&content)?;
    debug!(path = %path.display(), type_count = settings.types.len(), "loaded dictionary settings");
    Ok(settings)
}

/// Parse a YAML or JSON settings document. An empty document yields empty
/// settings.
pub fn parse_settings(content: &str) -> Result<DictionarySettings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(DictionarySettings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

impl DictionaryOverrides {
    /// Build overrides from settings.
    ///
    /// `request` sections become [`HttpDictionaryRequest`]s over `transport`;
    /// declaring one without a transport is an error.
    pub fn from_settings(settings: &DictionarySettings, transport: Option<&Arc<dyn JsonTransport>>) -> Result<Self, SettingsError> {
        settings
            .types
            .iter()
            .try_fold(DictionaryOverrides::new(), |overrides, (dict_type, type_settings)| {
                let config = type_config_from_settings(dict_type, type_settings, transport)?;
                Ok(overrides.with_type(dict_type.clone(), config))
            })
    }

    /// Build overrides from a JSON options object such as
    /// `{"*": {"labelField": "dictLabel"}, "status": {"x": 1}}`.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        let settings = DictionarySettings::from_value(value)?;
        Self::from_settings(&settings, None)
    }
}

fn type_config_from_settings(
    dict_type: &str,
    settings: &DictionaryTypeSettings,
    transport: Option<&Arc<dyn JsonTransport>>,
) -> Result<DictionaryTypeConfig, SettingsError> {
    let mut config = DictionaryTypeConfig {
        label_field: settings.label_field.clone(),
        value_field: settings.value_field.clone(),
        label_candidates: settings.label_candidates.clone(),
        value_candidates: settings.value_candidates.clone(),
        list_field: settings.list_field.clone(),
        options: settings.options.clone(),
        ..DictionaryTypeConfig::default()
    };
    if let Some(request) = &settings.request {
        let transport = transport.ok_or_else(|| SettingsError::TransportRequired {
            dict_type: dict_type.to_string(),
        })?;
        config = config.with_request(HttpDictionaryRequest::new(Arc::clone(transport), request.path.clone()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    struct EmptyTransport;

    #[async_trait]
    impl JsonTransport for EmptyTransport {
        async fn get_json(&self, _path: &str) -> Result<Value> {
            Ok(json!({"rows": []}))
        }
    }

    const SETTINGS: &str = r#"
"*":
  labelField: dictLabel
  valueField: dictValue
  request:
    path: /sys/dict/{type}
status:
  listField: items
  valueCandidates: [code]
"#;

    #[test]
    fn settings_file_round_trips_into_a_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, SETTINGS).expect("write settings");

        let settings = load_settings(&path).expect("load settings");
        let transport: Arc<dyn JsonTransport> = Arc::new(EmptyTransport);
        let overrides = DictionaryOverrides::from_settings(&settings, Some(&transport)).expect("overrides");
        let store = ConfigStore::with_defaults().merged(&overrides);

        let status = store.resolve_config("status");
        assert_eq!(status.request.describe(), "GET /sys/dict/{type}");
        assert_eq!(status.fields.label_field.as_deref(), Some("dictLabel"));
        assert_eq!(status.fields.value_candidates, vec!["code".to_string()]);
        assert_eq!(status.list_field, "items");

        let other = store.resolve_config("category");
        assert_eq!(other.list_field, "rows");
    }

    #[test]
    fn request_sections_need_a_transport() {
        let settings = parse_settings(SETTINGS).expect("parse settings");
        let error = DictionaryOverrides::from_settings(&settings, None).expect_err("transport required");
        assert!(matches!(error, SettingsError::TransportRequired { ref dict_type } if dict_type == "*"));
    }

    #[test]
    fn json_documents_and_empty_files_parse() {
        let settings = parse_settings(r#"{"status": {"labelField": "text"}}"#).expect("json settings");
        assert_eq!(settings.types["status"].label_field.as_deref(), Some("text"));
        assert!(parse_settings("  \n").expect("empty settings").types.is_empty());
    }

    #[test]
    fn missing_files_report_their_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.yaml");
        let error = load_settings(&path).expect_err("missing file");
        assert!(error.to_string().contains("absent.yaml"));
    }
}
