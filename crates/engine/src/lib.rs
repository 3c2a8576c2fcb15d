//! # Dictum Engine
//!
//! The Dictum engine resolves dictionaries (lookup tables of label/value pairs
//! keyed by a dictionary type such as `status` or `category`) from a backend,
//! normalizes their records, and caches them so every consumer shares one
//! request per type.
//!
//! ## Key Features
//!
//! - **Layered configuration**: a wildcard `*` configuration merged under
//!   per-type overrides, resolved on demand
//! - **Field resolution**: label/value fields picked from candidate lists when
//!   not named explicitly
//! - **Shared fetches**: one in-flight request per type, joined by every
//!   concurrent caller, with invalidation
//! - **Sessions**: component-scoped resolution that signals readiness exactly
//!   once, degrading failed types to empty entries
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dictum_engine::{ConfigStore, DictionaryCache, DictionaryOverrides, DictionarySession, DictionaryTypeConfig, StaticRequest};
//! use serde_json::json;
//!
//! # tokio_test_runtime(async {
//! let overrides = DictionaryOverrides::new().with_type(
//!     "status",
//!     DictionaryTypeConfig::default().with_request(StaticRequest::new(json!({
//!         "rows": [{"name": "Enabled", "id": 1}, {"name": "Disabled", "id": 0}]
//!     }))),
//! );
//! let config = Arc::new(ConfigStore::with_defaults().merged(&overrides));
//!
//! let mut session = DictionarySession::new(config, DictionaryCache::new(), ["status"]);
//! session.init().await;
//! assert_eq!(session.label_for("status", &json!(1)).as_deref(), Some("Enabled"));
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().expect("runtime").block_on(future)
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`config`**: wildcard + per-type configuration and deep merging
//! - **`field_resolver`**: candidate-based field name resolution
//! - **`convert`**: response-to-entry conversion
//! - **`request`**: request functions, including the HTTP-backed default
//! - **`cache`**: the shared, deduplicating dictionary cache
//! - **`session`**: per-component resolution lifecycle
//! - **`settings`**: settings files and their translation to overrides

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod field_resolver;
pub mod request;
pub mod session;
pub mod settings;

pub use cache::{DictionaryCache, Entries};
pub use config::{ConfigStore, DictionaryOverrides, DictionaryTypeConfig, ResolvedTypeConfig, deep_merge, deep_merge_maps};
pub use convert::{ConvertContext, DEFAULT_LIST_FIELD, FieldMapping, ListConverter, ResponseConverter, convert_record, extract_list};
pub use error::{DictionaryError, SettingsError};
pub use field_resolver::{DEFAULT_LABEL_CANDIDATES, DEFAULT_VALUE_CANDIDATES, resolve_field};
pub use request::{DEFAULT_DICTIONARY_PATH, DictionaryRequest, HttpDictionaryRequest, JsonTransport, NoopRequest, StaticRequest};
pub use session::{DictionaryConsumer, DictionarySession, SessionState};
pub use settings::{CONFIG_PATH_ENV, SETTINGS_FILE_NAME, default_settings_path, load_settings, parse_settings};
