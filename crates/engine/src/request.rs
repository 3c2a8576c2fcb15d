//! Request functions that fetch raw dictionary payloads.
//!
//! A [`DictionaryRequest`] is the per-type "request function" of the
//! configuration. Built-ins:
//! - [`NoopRequest`]: wildcard default; answers an empty list
//! - [`HttpDictionaryRequest`]: GETs a path template through a [`JsonTransport`]
//! - [`StaticRequest`]: answers a fixed payload, for local dictionaries

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dictum_api::ConsoleClient;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::{debug, warn};

/// Console endpoint answering `{ total, rows }` for a dictionary type.
pub const DEFAULT_DICTIONARY_PATH: &str = "/sys/dict/{type}";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Fetches the raw payload for a dictionary type.
///
/// Any error is treated the same way by the cache: nothing is stored and the
/// requesting session degrades to empty entries.
#[async_trait]
pub trait DictionaryRequest: Send + Sync {
    async fn request(&self, dict_type: &str) -> Result<Value>;

    /// Short human-readable description used by diagnostics.
    fn describe(&self) -> String {
        "custom".into()
    }
}

/// Request function installed on the wildcard entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRequest;

#[async_trait]
impl DictionaryRequest for NoopRequest {
    async fn request(&self, dict_type: &str) -> Result<Value> {
        warn!(dict_type = %dict_type, "no request function configured for dictionary type; answering an empty list");
        Ok(Value::Array(Vec::new()))
    }

    fn describe(&self) -> String {
        "noop".into()
    }
}

/// Answers the same payload for every call.
#[derive(Debug, Clone)]
pub struct StaticRequest {
    payload: Value,
}

impl StaticRequest {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl DictionaryRequest for StaticRequest {
    async fn request(&self, _dict_type: &str) -> Result<Value> {
        Ok(self.payload.clone())
    }

    fn describe(&self) -> String {
        "static".into()
    }
}

/// Minimal JSON GET capability the HTTP request function depends on.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value>;
}

#[async_trait]
impl JsonTransport for ConsoleClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        Ok(ConsoleClient::get_json(self, path).await?)
    }
}

/// GETs `path_template` with `{type}` replaced by the encoded type name.
#[derive(Clone)]
pub struct HttpDictionaryRequest {
    transport: Arc<dyn JsonTransport>,
    path_template: String,
}

impl fmt::Debug for HttpDictionaryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDictionaryRequest")
            .field("path_template", &self.path_template)
            .finish()
    }
}

impl HttpDictionaryRequest {
    pub fn new(transport: Arc<dyn JsonTransport>, path_template: impl Into<String>) -> Self {
        Self {
            transport,
            path_template: path_template.into(),
        }
    }

    /// Request against [`DEFAULT_DICTIONARY_PATH`].
    pub fn with_default_path(transport: Arc<dyn JsonTransport>) -> Self {
        Self::new(transport, DEFAULT_DICTIONARY_PATH)
    }

    pub fn path_for(&self, dict_type: &str) -> String {
        let encoded = utf8_percent_encode(dict_type, PATH_SEGMENT).to_string();
        self.path_template.replace("{type}", &encoded)
    }
}

#[async_trait]
impl DictionaryRequest for HttpDictionaryRequest {
    async fn request(&self, dict_type: &str) -> Result<Value> {
        let path = self.path_for(dict_type);
        debug!(dict_type = %dict_type, %path, "requesting dictionary over http");
        self.transport.get_json(&path).await
    }

    fn describe(&self) -> String {
        format!("GET {}", self.path_template)
    }
}
