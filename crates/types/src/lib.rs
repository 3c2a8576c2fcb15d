//! Shared type definitions for the dictum workspace.
//!
//! - [`DictionaryEntry`]: a normalized `(label, value, raw)` triple.
//! - [`DictionarySettings`]: the declarative settings document that
//!   configures how each dictionary type is requested and mapped.

pub mod entry;
pub mod settings;

pub use entry::DictionaryEntry;
pub use settings::{DictionarySettings, DictionaryTypeSettings, RequestSettings, WILDCARD_TYPE};
