//! Shared dictionary cache.
//!
//! The cache maps a dictionary type to either its settled entries or the
//! single in-flight fetch for it. Callers that arrive while a fetch is in
//! flight join the same shared future, so each type is requested at most
//! once until it is invalidated. Failed fetches are not cached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dictum_types::DictionaryEntry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::config::ResolvedTypeConfig;
use crate::error::DictionaryError;

/// Settled entries of one dictionary type, shared between sessions.
pub type Entries = Arc<[DictionaryEntry]>;

type SharedFetch = Shared<BoxFuture<'static, Result<Entries, DictionaryError>>>;

enum Slot {
    Ready(Entries),
    Pending { generation: u64, fetch: SharedFetch },
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

enum Lookup {
    Hit(Entries),
    Join(SharedFetch),
}

/// Process-wide dictionary cache handle.
///
/// Cloning is cheap and every clone shares the same state; construct one per
/// process (or per test) and hand clones to sessions.
#[derive(Clone, Default)]
pub struct DictionaryCache {
    state: Arc<Mutex<CacheState>>,
}

impl std::fmt::Debug for DictionaryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryCache")
            .field("cached_types", &self.cached_types())
            .finish()
    }
}

impl DictionaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Settled entries for `dict_type`, if any.
    pub fn get(&self, dict_type: &str) -> Option<Entries> {
        match self.lock().slots.get(dict_type) {
            Some(Slot::Ready(entries)) => Some(Arc::clone(entries)),
            _ => None,
        }
    }

    /// Whether a fetch for `dict_type` is currently in flight.
    pub fn is_pending(&self, dict_type: &str) -> bool {
        matches!(self.lock().slots.get(dict_type), Some(Slot::Pending { .. }))
    }

    /// Fetch entries for `dict_type`, reusing cached or in-flight results.
    ///
    /// The cache is consulted, and a new fetch recorded, when this method is
    /// called rather than when the returned future is first polled. New
    /// fetches run on a spawned task, so dropping the returned future does not
    /// abort them and their result still lands in the cache. Must be called
    /// from within a tokio runtime.
    pub fn fetch(&self, dict_type: &str, config: &ResolvedTypeConfig) -> BoxFuture<'static, Result<Entries, DictionaryError>> {
        match self.lookup_or_begin(dict_type, config) {
            Lookup::Hit(entries) => futures_util::future::ready(Ok(entries)).boxed(),
            Lookup::Join(fetch) => fetch.boxed(),
        }
    }

    /// Drop cached entries for one type, or for every type when `None`.
    ///
    /// In-flight fetches for dropped types keep running for their current
    /// callers, but their results are no longer stored.
    pub fn invalidate(&self, dict_type: Option<&str>) {
        let mut state = self.lock();
        match dict_type {
            Some(dict_type) => {
                let removed = state.slots.remove(dict_type).is_some();
                debug!(dict_type = %dict_type, removed, "dictionary cache invalidated");
            }
            None => {
                let removed = state.slots.len();
                state.slots.clear();
                debug!(removed, "dictionary cache cleared");
            }
        }
    }

    /// Number of types with settled entries.
    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Types with settled entries, sorted by name.
    pub fn cached_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .lock()
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(dict_type, _)| dict_type.clone())
            .collect();
        types.sort();
        types
    }

    fn lookup_or_begin(&self, dict_type: &str, config: &ResolvedTypeConfig) -> Lookup {
        let mut state = self.lock();
        match state.slots.get(dict_type) {
            Some(Slot::Ready(entries)) => {
                debug!(dict_type = %dict_type, entry_count = entries.len(), "dictionary cache hit");
                return Lookup::Hit(Arc::clone(entries));
            }
            Some(Slot::Pending { fetch, .. }) => {
                debug!(dict_type = %dict_type, "dictionary fetch in flight; joining");
                return Lookup::Join(fetch.clone());
            }
            None => {}
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        debug!(dict_type = %dict_type, generation, "dictionary cache miss");
        let fetch = self.spawn_fetch(dict_type, config, generation);
        state.slots.insert(
            dict_type.to_string(),
            Slot::Pending {
                generation,
                fetch: fetch.clone(),
            },
        );
        Lookup::Join(fetch)
    }

    fn spawn_fetch(&self, dict_type: &str, config: &ResolvedTypeConfig, generation: u64) -> SharedFetch {
        let task = {
            let cache = self.clone();
            let dict_type = dict_type.to_string();
            let config = config.clone();
            tokio::spawn(async move {
                let outcome = run_fetch(&dict_type, &config).await;
                cache.settle(&dict_type, generation, &outcome);
                outcome
            })
        };

        let cache = self.clone();
        let dict_type = dict_type.to_string();
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let outcome = Err(DictionaryError::Aborted {
                        dict_type: dict_type.clone(),
                        message: join_error.to_string(),
                    });
                    cache.settle(&dict_type, generation, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Record the outcome of fetch `generation` if it is still the current one.
    fn settle(&self, dict_type: &str, generation: u64, outcome: &Result<Entries, DictionaryError>) {
        let mut state = self.lock();
        let is_current = matches!(
            state.slots.get(dict_type),
            Some(Slot::Pending { generation: pending, .. }) if *pending == generation
        );
        if !is_current {
            debug!(dict_type = %dict_type, generation, "dictionary fetch settled after invalidation; result discarded");
            return;
        }
        match outcome {
            Ok(entries) => {
                state.slots.insert(dict_type.to_string(), Slot::Ready(Arc::clone(entries)));
            }
            Err(error) => {
                state.slots.remove(dict_type);
                warn!(dict_type = %dict_type, %error, "dictionary fetch failed; nothing cached");
            }
        }
    }
}

async fn run_fetch(dict_type: &str, config: &ResolvedTypeConfig) -> Result<Entries, DictionaryError> {
    debug!(dict_type = %dict_type, request = %config.request.describe(), "dictionary fetch started");
    let response = config
        .request
        .request(dict_type)
        .await
        .map_err(|error| DictionaryError::Request {
            dict_type: dict_type.to_string(),
            message: format!("{:#}", error),
        })?;
    let entries: Entries = config.converter.convert(response, &config.convert_context()).into();
    info!(dict_type = %dict_type, entry_count = entries.len(), "dictionary fetch completed");
    Ok(entries)
}
