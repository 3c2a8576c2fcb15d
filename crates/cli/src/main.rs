use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dictum_api::ConsoleClient;
use dictum_engine::{
    ConfigStore, DictionaryCache, DictionaryConsumer, DictionaryOverrides, DictionarySession, DictionaryTypeConfig, HttpDictionaryRequest,
    JsonTransport, default_settings_path, load_settings,
};
use dictum_types::{DictionaryEntry, DictionarySettings, WILDCARD_TYPE};
use serde_json::{Map as JsonMap, Value};
use tokio::sync::OnceCell;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Resolve dictionaries from the console backend.
#[derive(Parser, Debug)]
#[command(name = "dictum", version, about)]
struct Cli {
    /// Settings file (YAML or JSON); defaults to $DICTUM_CONFIG, then the user config directory
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve dictionary types and print their entries
    Resolve {
        /// Dictionary types to resolve
        #[arg(required = true, value_name = "TYPE")]
        types: Vec<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration of a dictionary type
    Config {
        #[arg(value_name = "TYPE")]
        dict_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = read_settings(cli.config.as_deref())?;
    let console = Arc::new(EnvConsoleClient::default());
    let transport: Arc<dyn JsonTransport> = console.clone();
    let store = Arc::new(build_store(&settings, transport)?);

    match cli.command {
        Command::Resolve { types, json } => {
            console.client().await?;
            run_resolve(store, types, json).await
        }
        Command::Config { dict_type } => {
            let described = store.resolve_config(&dict_type).describe();
            println!("{}", serde_json::to_string_pretty(&described)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Console client built from the environment on first use, so commands that
/// never reach the backend do not depend on its settings.
#[derive(Default)]
struct EnvConsoleClient {
    client: OnceCell<ConsoleClient>,
}

impl EnvConsoleClient {
    async fn client(&self) -> Result<&ConsoleClient> {
        self.client
            .get_or_try_init(|| async { ConsoleClient::new_from_env() })
            .await
            .context("failed to create console client")
    }
}

#[async_trait]
impl JsonTransport for EnvConsoleClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        Ok(self.client().await?.get_json(path).await?)
    }
}

/// Settings from `explicit`, else the default location when that file exists.
fn read_settings(explicit: Option<&Path>) -> Result<DictionarySettings> {
    if let Some(path) = explicit {
        return load_settings(path).with_context(|| format!("failed to load settings from {}", path.display()));
    }
    match default_settings_path() {
        Some(path) if path.is_file() => load_settings(&path).with_context(|| format!("failed to load settings from {}", path.display())),
        other => {
            debug!(path = ?other, "no settings file found; using defaults");
            Ok(DictionarySettings::default())
        }
    }
}

/// Configuration store for `settings`. Without a wildcard `request` section,
/// every type is fetched from the default dictionary endpoint.
fn build_store(settings: &DictionarySettings, transport: Arc<dyn JsonTransport>) -> Result<ConfigStore> {
    let mut store = ConfigStore::with_defaults();
    if settings.wildcard().and_then(|wildcard| wildcard.request.as_ref()).is_none() {
        let endpoint = HttpDictionaryRequest::with_default_path(Arc::clone(&transport));
        store.merge_overrides(&DictionaryOverrides::new().with_type(WILDCARD_TYPE, DictionaryTypeConfig::default().with_request(endpoint)));
    }
    let overrides = DictionaryOverrides::from_settings(settings, Some(&transport)).context("invalid dictionary settings")?;
    store.merge_overrides(&overrides);
    Ok(store)
}

/// Captures the entries a session reports when it becomes ready.
#[derive(Default)]
struct ReadyReport {
    dictionaries: Mutex<Vec<(String, Vec<DictionaryEntry>)>>,
}

impl DictionaryConsumer for ReadyReport {
    fn dictionaries_ready(&self, session: &DictionarySession) {
        let mut dictionaries = self.dictionaries.lock().unwrap_or_else(PoisonError::into_inner);
        dictionaries.extend(
            session
                .requested_types()
                .map(|dict_type| (dict_type.to_string(), session.entries_for(dict_type).to_vec())),
        );
    }
}

impl ReadyReport {
    fn take(&self) -> Vec<(String, Vec<DictionaryEntry>)> {
        std::mem::take(&mut *self.dictionaries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

async fn run_resolve(store: Arc<ConfigStore>, types: Vec<String>, json: bool) -> Result<()> {
    let report = Arc::new(ReadyReport::default());
    let mut session = DictionarySession::new(store, DictionaryCache::new(), types).owned_by(&report);
    session.init().await;

    let dictionaries = report.take();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries_json(&dictionaries))?);
    } else {
        print!("{}", render_table(&dictionaries));
    }
    Ok(())
}

fn entries_json(dictionaries: &[(String, Vec<DictionaryEntry>)]) -> Value {
    let mut out = JsonMap::new();
    for (dict_type, entries) in dictionaries {
        out.insert(dict_type.clone(), serde_json::to_value(entries).unwrap_or(Value::Null));
    }
    Value::Object(out)
}

fn render_table(dictionaries: &[(String, Vec<DictionaryEntry>)]) -> String {
    let mut out = String::new();
    for (dict_type, entries) in dictionaries {
        out.push_str(&format!("{} ({} entries)\n", dict_type, entries.len()));
        let rows: Vec<(String, String)> = entries
            .iter()
            .map(|entry| (display_value(entry.value()), entry.label_text().unwrap_or_else(|| "-".into())))
            .collect();
        let width = rows.iter().map(|(value, _)| value.chars().count()).max().unwrap_or(0);
        for (value, label) in rows {
            out.push_str(&format!("  {:<width$}  {}\n", value, label, width = width));
        }
    }
    out
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> Arc<dyn JsonTransport> {
        Arc::new(ConsoleClient::new("http://localhost:8080", None).expect("client"))
    }

    fn entry(label: Value, value: Value) -> DictionaryEntry {
        DictionaryEntry::new(Some(label.clone()), Some(value.clone()), json!({"label": label, "value": value}))
    }

    #[test]
    fn stores_default_to_the_dictionary_endpoint() {
        let store = build_store(&DictionarySettings::default(), transport()).expect("store");
        assert_eq!(store.resolve_config("status").request.describe(), "GET /sys/dict/{type}");
    }

    #[test]
    fn settings_request_paths_replace_the_default_endpoint() {
        let settings = DictionarySettings::from_value(json!({
            "*": {"request": {"path": "/api/dicts/{type}"}},
            "status": {"labelField": "dictLabel"}
        }))
        .expect("settings");
        let store = build_store(&settings, transport()).expect("store");
        let status = store.resolve_config("status");
        assert_eq!(status.request.describe(), "GET /api/dicts/{type}");
        assert_eq!(status.fields.label_field.as_deref(), Some("dictLabel"));
    }

    #[test]
    fn describing_a_type_does_not_build_the_console_client() {
        let console = Arc::new(EnvConsoleClient::default());
        let transport: Arc<dyn JsonTransport> = console.clone();
        let store = build_store(&DictionarySettings::default(), transport).expect("store");

        let described = store.resolve_config("status").describe();
        assert_eq!(described["request"], json!("GET /sys/dict/{type}"));
        assert!(console.client.get().is_none());
    }

    #[test]
    fn explicit_settings_paths_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = read_settings(Some(&dir.path().join("missing.yaml"))).expect_err("missing settings");
        assert!(format!("{:#}", error).contains("missing.yaml"));
    }

    #[test]
    fn tables_align_values_and_mark_missing_labels() {
        let dictionaries = vec![(
            "status".to_string(),
            vec![
                entry(json!("Enabled"), json!(1)),
                DictionaryEntry::new(None, Some(json!("archived")), json!({"value": "archived"})),
            ],
        )];
        assert_eq!(
            render_table(&dictionaries),
            "status (2 entries)\n  1         Enabled\n  archived  -\n"
        );
    }

    #[test]
    fn json_output_keys_entries_by_type() {
        let dictionaries = vec![("category".to_string(), vec![entry(json!("Hardware"), json!("hw"))]), ("region".to_string(), vec![])];
        let out = entries_json(&dictionaries);
        assert_eq!(out["category"][0]["label"], json!("Hardware"));
        assert_eq!(out["region"], json!([]));
    }
}
