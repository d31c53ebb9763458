// Path: crates/store/src/catalog/mod.rs

//! The content catalog: a lifecycle-managed map from content types to line stores.

mod discovery;

use crate::lifecycle::{Lifecycle, LifecycleState, Transition};
use crate::line::{
    AccessStrategy, BinarySearchStore, DirectOffsetStore, LineBuffer, LineComparator, LineStore,
    TokenComparator,
};
use crate::task::BackgroundTask;
use ahash::AHashMap;
use lexdb_types::{Charset, ContentKind, ContentType, LexConfig, LexError, Version};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static VERSION_MARKER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"WordNet\s+(\d+)\.(\d+)(?:\.(\d+))?").ok());

/// Extracts a `WordNet X.Y[.Z]` marker from a header line.
pub(crate) fn parse_version(line: &str) -> Option<Version> {
    let caps = VERSION_MARKER.as_ref()?.captures(line)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u16>().ok());
    Some(Version {
        major: number(1)?,
        minor: number(2)?,
        patch: number(3),
    })
}

type Bindings = AHashMap<ContentType, Arc<dyn LineStore>>;

#[derive(Debug)]
struct CatalogSettings {
    source_dir: PathBuf,
    charset: Option<Charset>,
    direct_access: bool,
    patterns: Vec<(ContentType, Regex)>,
    comparators: AHashMap<ContentKind, Arc<dyn LineComparator>>,
}

impl CatalogSettings {
    fn comparator(&self, kind: ContentKind) -> Arc<dyn LineComparator> {
        self.comparators
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(TokenComparator::for_kind(kind)))
    }
}

/// Binds each content type to one file in a source directory and hands out
/// line stores while open.
///
/// Configuration setters fail with [`LexError::ObjectOpen`] unless the
/// catalog is closed; lookups fail with [`LexError::ObjectClosed`] unless it
/// is open. The binding table is replaced wholesale on open and close, so
/// readers never observe a partially built table.
#[derive(Debug)]
pub struct ContentCatalog {
    settings: RwLock<CatalogSettings>,
    lifecycle: Mutex<Lifecycle>,
    bindings: RwLock<Option<Arc<Bindings>>>,
    prefetch: Mutex<Option<Arc<BackgroundTask>>>,
}

impl ContentCatalog {
    /// A closed catalog over `source_dir` with default settings.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings: RwLock::new(CatalogSettings {
                source_dir: source_dir.into(),
                charset: None,
                direct_access: true,
                patterns: Vec::new(),
                comparators: AHashMap::new(),
            }),
            lifecycle: Mutex::new(Lifecycle::new()),
            bindings: RwLock::new(None),
            prefetch: Mutex::new(None),
        }
    }

    /// A closed catalog configured from `config`.
    pub fn from_config(config: &LexConfig) -> Result<Self, LexError> {
        let catalog = Self::new(config.source_dir.clone());
        catalog.set_charset(config.charset)?;
        catalog.set_direct_access(config.direct_access)?;
        for (content_type, pattern) in config.patterns()? {
            catalog.register_pattern(content_type, &pattern)?;
        }
        Ok(catalog)
    }

    fn configure<F>(&self, apply: F) -> Result<(), LexError>
    where
        F: FnOnce(&mut CatalogSettings),
    {
        let lifecycle = self.lifecycle.lock();
        lifecycle.require_closed()?;
        apply(&mut self.settings.write());
        Ok(())
    }

    /// The configured source directory.
    pub fn source_dir(&self) -> PathBuf {
        self.settings.read().source_dir.clone()
    }

    /// Changes the source directory.
    pub fn set_source_dir(&self, dir: impl Into<PathBuf>) -> Result<(), LexError> {
        let dir = dir.into();
        self.configure(|s| s.source_dir = dir)
    }

    /// Changes the charset used to decode lines.
    pub fn set_charset(&self, charset: Option<Charset>) -> Result<(), LexError> {
        self.configure(|s| s.charset = charset)
    }

    /// Enables or disables direct byte-offset access for primary files.
    pub fn set_direct_access(&self, enabled: bool) -> Result<(), LexError> {
        self.configure(|s| s.direct_access = enabled)
    }

    /// Registers an explicit filename pattern for one content type.
    pub fn register_pattern(&self, content_type: ContentType, pattern: &str) -> Result<(), LexError> {
        let re = Regex::new(pattern)
            .map_err(|e| LexError::Config(format!("pattern for {content_type}: {e}")))?;
        self.configure(|s| {
            s.patterns.retain(|(ct, _)| *ct != content_type);
            s.patterns.push((content_type, re));
        })
    }

    /// Overrides the comparator for one content kind.
    pub fn set_comparator(
        &self,
        kind: ContentKind,
        comparator: Arc<dyn LineComparator>,
    ) -> Result<(), LexError> {
        self.configure(|s| {
            s.comparators.insert(kind, comparator);
        })
    }

    /// The lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.lock().state()
    }

    /// Whether the catalog is open.
    pub fn is_open(&self) -> bool {
        self.lifecycle.lock().is_open()
    }

    /// Discovers and binds the source files.
    ///
    /// Opening an open catalog does nothing. On failure the catalog stays
    /// closed.
    pub fn open(&self) -> Result<(), LexError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.begin_open()? == Transition::Noop {
            return Ok(());
        }
        match self.bind() {
            Ok(bindings) => {
                tracing::info!(
                    target: "catalog",
                    dir = %self.source_dir().display(),
                    bound = bindings.len(),
                    "catalog opened"
                );
                *self.bindings.write() = Some(Arc::new(bindings));
                lifecycle.finish_open()
            }
            Err(e) => {
                lifecycle.abort_open();
                Err(e)
            }
        }
    }

    fn bind(&self) -> Result<Bindings, LexError> {
        let settings = self.settings.read();
        let dir = &settings.source_dir;
        if !dir.is_dir() {
            return Err(LexError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source directory {} does not exist", dir.display()),
            )));
        }
        let mut bindings = Bindings::new();
        for (content_type, path) in discovery::discover(dir, &settings.patterns)? {
            let store = Self::make_store(&settings, content_type, &path)?;
            bindings.insert(content_type, store);
        }
        Ok(bindings)
    }

    fn make_store(
        settings: &CatalogSettings,
        content_type: ContentType,
        path: &Path,
    ) -> Result<Arc<dyn LineStore>, LexError> {
        let buffer = Arc::new(LineBuffer::map(path, settings.charset)?);
        let comparator = settings.comparator(content_type.kind);

        if content_type.kind == ContentKind::Primary && settings.direct_access {
            let direct =
                DirectOffsetStore::new(content_type, Arc::clone(&buffer), Arc::clone(&comparator));
            match direct.self_check() {
                Ok(true) => return Ok(Arc::new(direct)),
                Ok(false) => tracing::warn!(
                    target: "catalog",
                    path = %path.display(),
                    "offsets do not address their lines; falling back to binary search"
                ),
                Err(e) => tracing::warn!(
                    target: "catalog",
                    path = %path.display(),
                    error = %e,
                    "direct access self-check failed; falling back to binary search"
                ),
            }
        }
        Ok(Arc::new(BinarySearchStore::new(content_type, buffer, comparator)))
    }

    /// Cancels any prefetch and releases every store.
    pub fn close(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.begin_close() {
            Ok(Transition::Proceed) => {}
            Ok(Transition::Noop) => return,
            Err(e) => {
                tracing::warn!(target: "catalog", error = %e, "close ignored");
                return;
            }
        }
        if let Some(task) = self.prefetch.lock().take() {
            task.cancel();
            match task.wait() {
                Ok(()) | Err(LexError::Interrupted) => {}
                Err(e) => tracing::warn!(target: "catalog", error = %e, "prefetch failed"),
            }
        }
        *self.bindings.write() = None;
        if let Err(e) = lifecycle.finish_close() {
            tracing::warn!(target: "catalog", error = %e, "close did not complete");
        }
        tracing::info!(target: "catalog", "catalog closed");
    }

    fn bindings(&self) -> Result<Arc<Bindings>, LexError> {
        self.bindings.read().clone().ok_or(LexError::ObjectClosed)
    }

    /// The bound content types, in discovery order.
    pub fn content_types(&self) -> Result<Vec<ContentType>, LexError> {
        let bindings = self.bindings()?;
        Ok(ContentType::all()
            .into_iter()
            .filter(|ct| bindings.contains_key(ct))
            .collect())
    }

    /// The store bound to `content_type`, or `None` if no file matched.
    pub fn store(&self, content_type: ContentType) -> Result<Option<Arc<dyn LineStore>>, LexError> {
        Ok(self.bindings()?.get(&content_type).cloned())
    }

    /// The access strategy each bound store ended up with.
    pub fn strategies(&self) -> Result<Vec<(ContentType, AccessStrategy)>, LexError> {
        let bindings = self.bindings()?;
        Ok(self
            .content_types()?
            .into_iter()
            .filter_map(|ct| bindings.get(&ct).map(|store| (ct, store.strategy())))
            .collect())
    }

    /// The data-set version announced in the file headers.
    ///
    /// Stores without a marker are ignored. Returns `None` if no store has a
    /// marker or if two stores disagree.
    pub fn version(&self) -> Result<Option<Version>, LexError> {
        let bindings = self.bindings()?;
        let mut common: Option<Version> = None;
        for content_type in ContentType::all() {
            let Some(store) = bindings.get(&content_type) else {
                continue;
            };
            let found = store.header()?.iter().find_map(|line| parse_version(line));
            match (found, common) {
                (None, _) => {}
                (Some(v), None) => common = Some(v),
                (Some(v), Some(c)) if v != c => {
                    tracing::debug!(target: "catalog", %content_type, found = %v, expected = %c, "version mismatch");
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(common)
    }

    /// Promotes every store from its OS mapping to a heap copy.
    ///
    /// A single prefetch thread runs at a time. With `block`, waits for it
    /// and reports its failure.
    pub fn load(&self, block: bool) -> Result<(), LexError> {
        let task = {
            // Held until the task is in the slot, so a concurrent close always sees it.
            let lifecycle = self.lifecycle.lock();
            lifecycle.require_open()?;
            let bindings = self.bindings()?;
            if bindings.values().all(|store| store.is_promoted()) {
                return Ok(());
            }
            let mut slot = self.prefetch.lock();
            match slot.as_ref() {
                Some(task) if !task.is_finished() => Arc::clone(task),
                _ => {
                    let stores: Vec<Arc<dyn LineStore>> = bindings.values().cloned().collect();
                    let task = BackgroundTask::spawn("lexdb-prefetch", move |token| {
                        for store in stores {
                            token.checkpoint()?;
                            store.promote()?;
                        }
                        tracing::info!(target: "catalog", "all stores promoted to heap");
                        Ok(())
                    })?;
                    *slot = Some(Arc::clone(&task));
                    task
                }
            }
        };
        if block {
            task.wait()?;
        }
        Ok(())
    }

    /// Whether every bound store has been promoted. `false` while closed.
    pub fn is_loaded(&self) -> bool {
        self.bindings()
            .map(|b| b.values().all(|store| store.is_promoted()))
            .unwrap_or(false)
    }
}

impl Drop for ContentCatalog {
    fn drop(&mut self) {
        self.close();
    }
}
