// Path: crates/store/src/cache.rs

//! A bounded, access-ordered record cache.
//!
//! Three namespaces (records by id, senses by key, sense entries by key)
//! each hold an [`lru::LruCache`]. A namespace starts at the initial
//! capacity and doubles on demand until it reaches the maximum; from then on
//! every insert of a new key evicts the least recently accessed entry.

use crate::lifecycle::{Lifecycle, Transition};
use lexdb_types::{
    CacheConfig, ExceptionRecord, IndexRecord, LexError, PrimaryRecord, Record, RecordId, Sense,
    SenseEntryRecord, SenseKey,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// A record held in the id namespace.
#[derive(Debug, Clone)]
pub enum CachedRecord {
    /// An index record.
    Index(Arc<IndexRecord>),
    /// A primary record.
    Primary(Arc<PrimaryRecord>),
    /// An exception record.
    Exception(Arc<ExceptionRecord>),
}

impl CachedRecord {
    /// The identifier the record is cached under.
    pub fn record_id(&self) -> RecordId {
        match self {
            Self::Index(r) => r.record_id(),
            Self::Primary(r) => r.record_id(),
            Self::Exception(r) => r.record_id(),
        }
    }
}

fn slots(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

struct Namespace<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq, V: Clone> Namespace<K, V> {
    fn new(initial: usize) -> Self {
        Self {
            entries: LruCache::new(slots(initial)),
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    fn insert(&mut self, key: K, value: V, maximum: usize) {
        let cap = self.entries.cap().get();
        let full = self.entries.len() >= cap && !self.entries.contains(&key);
        if full && (maximum == 0 || cap < maximum) {
            let grown = if maximum == 0 {
                cap.saturating_mul(2)
            } else {
                cap.saturating_mul(2).min(maximum)
            };
            self.entries.resize(slots(grown));
        }
        self.entries.put(key, value);
    }

    /// Evicts down to one below `maximum` and caps the namespace there.
    fn shrink(&mut self, maximum: usize) -> usize {
        if maximum == 0 {
            return 0;
        }
        let mut evicted = 0;
        while self.entries.len() >= maximum {
            if self.entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        if self.entries.cap().get() > maximum {
            self.entries.resize(slots(maximum));
        }
        evicted
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

struct Namespaces {
    items: Namespace<RecordId, CachedRecord>,
    senses: Namespace<SenseKey, Arc<Sense>>,
    entries: Namespace<SenseKey, Arc<SenseEntryRecord>>,
}

impl Namespaces {
    fn new(initial: usize) -> Self {
        Self {
            items: Namespace::new(initial),
            senses: Namespace::new(initial),
            entries: Namespace::new(initial),
        }
    }
}

struct CacheState {
    lifecycle: Lifecycle,
    enabled: bool,
    initial_capacity: usize,
    maximum_capacity: usize,
    namespaces: Option<Namespaces>,
}

impl CacheState {
    fn open_namespaces(&mut self) -> Result<&mut Namespaces, LexError> {
        self.lifecycle.require_open()?;
        self.namespaces.as_mut().ok_or(LexError::ObjectClosed)
    }
}

/// Bounded record cache. All operations fail with [`LexError::ObjectClosed`]
/// unless the cache is open.
pub struct RecordCache {
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RecordCache")
            .field("state", &state.lifecycle.state())
            .field("enabled", &state.enabled)
            .field("maximum_capacity", &state.maximum_capacity)
            .finish()
    }
}

impl RecordCache {
    /// A closed cache.
    pub fn new(config: &CacheConfig) -> Self {
        let initial = if config.maximum_capacity > 0 {
            config.initial_capacity.min(config.maximum_capacity)
        } else {
            config.initial_capacity
        };
        Self {
            state: Mutex::new(CacheState {
                lifecycle: Lifecycle::new(),
                enabled: config.enabled,
                initial_capacity: initial,
                maximum_capacity: config.maximum_capacity,
                namespaces: None,
            }),
        }
    }

    /// Allocates the namespaces.
    pub fn open(&self) -> Result<(), LexError> {
        let mut state = self.state.lock();
        if state.lifecycle.begin_open()? == Transition::Noop {
            return Ok(());
        }
        state.namespaces = Some(Namespaces::new(state.initial_capacity));
        state.lifecycle.finish_open()
    }

    /// Drops every entry and the namespaces.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !matches!(state.lifecycle.begin_close(), Ok(Transition::Proceed)) {
            return;
        }
        state.namespaces = None;
        if let Err(e) = state.lifecycle.finish_close() {
            tracing::warn!(target: "cache", error = %e, "close did not complete");
        }
    }

    /// Whether the cache is open.
    pub fn is_open(&self) -> bool {
        self.state.lock().lifecycle.is_open()
    }

    /// Whether inserts are accepted.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Turns inserts on or off. Existing entries stay readable.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    /// The per-namespace entry bound; zero means unbounded.
    pub fn maximum_capacity(&self) -> usize {
        self.state.lock().maximum_capacity
    }

    /// Changes the bound. Shrinking evicts least-recently-used entries until
    /// each namespace holds fewer than the new bound.
    pub fn set_maximum_capacity(&self, maximum: usize) {
        let mut state = self.state.lock();
        let shrinking =
            maximum > 0 && (state.maximum_capacity == 0 || maximum < state.maximum_capacity);
        state.maximum_capacity = maximum;
        if !shrinking {
            return;
        }
        if let Some(ns) = state.namespaces.as_mut() {
            let evicted =
                ns.items.shrink(maximum) + ns.senses.shrink(maximum) + ns.entries.shrink(maximum);
            tracing::debug!(target: "cache", maximum, evicted, "cache shrunk");
        }
    }

    /// Total entries across namespaces.
    pub fn size(&self) -> Result<usize, LexError> {
        let mut state = self.state.lock();
        let ns = state.open_namespaces()?;
        Ok(ns.items.len() + ns.senses.len() + ns.entries.len())
    }

    /// Removes every entry.
    pub fn clear(&self) -> Result<(), LexError> {
        let mut state = self.state.lock();
        let ns = state.open_namespaces()?;
        ns.items.clear();
        ns.senses.clear();
        ns.entries.clear();
        Ok(())
    }

    fn insert_with<F>(&self, apply: F) -> Result<(), LexError>
    where
        F: FnOnce(&mut Namespaces, usize),
    {
        let mut state = self.state.lock();
        let (enabled, maximum) = (state.enabled, state.maximum_capacity);
        let ns = state.open_namespaces()?;
        if enabled {
            apply(ns, maximum);
        }
        Ok(())
    }

    /// Caches a record under its id.
    pub fn cache_item(&self, record: CachedRecord) -> Result<(), LexError> {
        self.insert_with(|ns, max| ns.items.insert(record.record_id(), record, max))
    }

    /// A cached record, refreshing its recency.
    pub fn item(&self, id: &RecordId) -> Result<Option<CachedRecord>, LexError> {
        Ok(self.state.lock().open_namespaces()?.items.get(id))
    }

    /// Whether a record is cached, without touching its recency.
    pub fn contains_item(&self, id: &RecordId) -> Result<bool, LexError> {
        Ok(self.state.lock().open_namespaces()?.items.contains(id))
    }

    /// Caches a sense under its key.
    pub fn cache_sense(&self, sense: Arc<Sense>) -> Result<(), LexError> {
        self.insert_with(|ns, max| ns.senses.insert(sense.key.clone(), sense, max))
    }

    /// A cached sense.
    pub fn sense(&self, key: &SenseKey) -> Result<Option<Arc<Sense>>, LexError> {
        Ok(self.state.lock().open_namespaces()?.senses.get(key))
    }

    /// Caches a sense entry under its key.
    pub fn cache_sense_entry(&self, entry: Arc<SenseEntryRecord>) -> Result<(), LexError> {
        self.insert_with(|ns, max| ns.entries.insert(entry.key.clone(), entry, max))
    }

    /// A cached sense entry.
    pub fn sense_entry(&self, key: &SenseKey) -> Result<Option<Arc<SenseEntryRecord>>, LexError> {
        Ok(self.state.lock().open_namespaces()?.entries.get(key))
    }
}
