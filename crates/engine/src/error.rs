use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single dictionary fetch.
///
/// Cloneable because every caller joined on the same in-flight fetch receives
/// the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DictionaryError {
    /// The request function returned an error.
    #[error("dictionary '{dict_type}' request failed: {message}")]
    Request { dict_type: String, message: String },
    /// The task running the fetch panicked or was cancelled.
    #[error("dictionary '{dict_type}' fetch did not complete: {message}")]
    Aborted { dict_type: String, message: String },
}

/// Errors surfaced while loading dictionary settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure while reading the settings file.
    #[error("failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid YAML/JSON of the expected shape.
    #[error("invalid dictionary settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A JSON options value did not match the expected shape.
    #[error("invalid dictionary options: {0}")]
    Options(#[from] serde_json::Error),
    /// A `request` section was declared but no HTTP transport was supplied.
    #[error("dictionary type '{dict_type}' declares a request but no transport is configured")]
    TransportRequired { dict_type: String },
}
