//! Dictionary configuration.
//!
//! Modules:
//! - `merge`: pure deep merge over JSON values
//! - `store`: the wildcard + per-type configuration store and its resolution

mod merge;
mod store;

pub use merge::{deep_merge, deep_merge_maps};
pub use store::{ConfigStore, DictionaryOverrides, DictionaryTypeConfig, ResolvedTypeConfig};
