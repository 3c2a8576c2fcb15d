//! Component-scoped dictionary sessions.
//!
//! A component that needs dictionaries constructs a [`DictionarySession`]
//! during its own setup, calls [`DictionarySession::init`], and reads
//! [`DictionarySession::entries_for`] once it has been told the session is
//! ready. The session moves through `Created -> Loading -> Ready` exactly
//! once; `Ready` is terminal.

use std::fmt;
use std::sync::{Arc, Weak};

use dictum_types::DictionaryEntry;
use futures_util::future::join_all;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{DictionaryCache, Entries};
use crate::config::ConfigStore;

/// Lifecycle of a [`DictionarySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Loading,
    Ready,
}

/// Receives the single readiness notification of a session it owns.
pub trait DictionaryConsumer: Send + Sync {
    fn dictionaries_ready(&self, session: &DictionarySession);
}

/// Coordinates resolution of one component's dictionary types.
pub struct DictionarySession {
    owner: Option<Weak<dyn DictionaryConsumer>>,
    config: Arc<ConfigStore>,
    cache: DictionaryCache,
    requested: IndexSet<String>,
    resolved: IndexMap<String, Entries>,
    state: SessionState,
}

impl fmt::Debug for DictionarySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionarySession")
            .field("requested", &self.requested)
            .field("state", &self.state)
            .field("has_owner", &self.owner.is_some())
            .finish()
    }
}

impl DictionarySession {
    /// Create a session for `requested_types`; duplicates are ignored.
    pub fn new<I, S>(config: Arc<ConfigStore>, cache: DictionaryCache, requested_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owner: None,
            config,
            cache,
            requested: requested_types.into_iter().map(Into::into).collect(),
            resolved: IndexMap::new(),
            state: SessionState::Created,
        }
    }

    /// Attach the component notified when the session becomes ready.
    ///
    /// Only a weak handle is kept: a session never keeps its owner alive.
    pub fn owned_by<C>(mut self, owner: &Arc<C>) -> Self
    where
        C: DictionaryConsumer + 'static,
    {
        let owner: Arc<dyn DictionaryConsumer> = owner.clone();
        self.owner = Some(Arc::downgrade(&owner));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn requested_types(&self) -> impl Iterator<Item = &str> {
        self.requested.iter().map(String::as_str)
    }

    /// Resolve every requested type concurrently, then signal readiness.
    ///
    /// Never fails: a type whose fetch fails resolves to no entries. Calling
    /// `init` on a session that already left `Created` does nothing.
    pub async fn init(&mut self) {
        if self.state != SessionState::Created {
            debug!(state = ?self.state, "dictionary session already initialized");
            return;
        }
        self.state = SessionState::Loading;
        debug!(types = ?self.requested, "dictionary session loading");

        let fetches = self.requested.iter().map(|dict_type| {
            let config = self.config.resolve_config(dict_type);
            let fetch = self.cache.fetch(dict_type, &config);
            let dict_type = dict_type.clone();
            async move {
                let entries = match fetch.await {
                    Ok(entries) => entries,
                    Err(error) => {
                        warn!(dict_type = %dict_type, %error, "dictionary unavailable; continuing with empty entries");
                        Entries::from(Vec::new())
                    }
                };
                (dict_type, entries)
            }
        });
        let settled = join_all(fetches).await;

        self.resolved.extend(settled);
        self.state = SessionState::Ready;
        self.notify_owner();
    }

    fn notify_owner(&self) {
        let Some(owner) = &self.owner else {
            return;
        };
        match owner.upgrade() {
            Some(owner) => owner.dictionaries_ready(self),
            None => debug!("dictionary session owner dropped before readiness; notification skipped"),
        }
    }

    /// Entries resolved for `dict_type`; empty when it was not requested or
    /// has not resolved yet.
    pub fn entries_for(&self, dict_type: &str) -> &[DictionaryEntry] {
        self.resolved.get(dict_type).map(|entries| &entries[..]).unwrap_or(&[])
    }

    /// Label text of the entry of `dict_type` whose value matches `value`.
    pub fn label_for(&self, dict_type: &str, value: &Value) -> Option<String> {
        self.entries_for(dict_type)
            .iter()
            .find(|entry| entry.has_value(value))
            .and_then(DictionaryEntry::label_text)
    }
}
