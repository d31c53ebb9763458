// Path: crates/store/src/materialize/mod.rs

//! The memory-resident dictionary.
//!
//! A [`MaterializedDictionary`] serves from its backing dictionary until a
//! background loader has copied every record into a [`Snapshot`]. The
//! snapshot is installed with a single atomic store; from then on every
//! lookup and iteration is answered from memory and the backing is closed.

mod hotswap;
mod image;
mod loader;
mod snapshot;

pub use hotswap::HotSwapIter;
pub use image::{read_image, write_image, ImageHeader, HEADER_SIZE, IMAGE_MAGIC, IMAGE_VERSION};
pub use snapshot::{Snapshot, SnapshotTable, Table, TableIter};

use crate::dictionary::{Dictionary, RecordIter};
use crate::lifecycle::{Lifecycle, Transition};
use crate::task::BackgroundTask;
use arc_swap::ArcSwapOption;
use lexdb_types::{
    Category, ExceptionId, ExceptionRecord, IndexId, IndexRecord, LexError, LoadPolicy,
    PrimaryId, PrimaryRecord, Sense, SenseEntryRecord, SenseKey, Version,
};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

enum DataSource {
    Backing(Arc<dyn Dictionary>),
    Image(PathBuf),
}

/// A dictionary that materializes its backing dictionary into memory.
pub struct MaterializedDictionary {
    source: DataSource,
    policy: Mutex<LoadPolicy>,
    lifecycle: Mutex<Lifecycle>,
    slot: Arc<ArcSwapOption<Snapshot>>,
    loader: Mutex<Option<Arc<BackgroundTask>>>,
}

impl MaterializedDictionary {
    /// A closed dictionary over `backing`. `policy` decides what `open` does
    /// about loading.
    pub fn new(backing: Arc<dyn Dictionary>, policy: LoadPolicy) -> Self {
        Self::with_source(DataSource::Backing(backing), policy)
    }

    /// A closed dictionary that imports a snapshot image when opened.
    pub fn from_image(path: impl Into<PathBuf>) -> Self {
        Self::with_source(DataSource::Image(path.into()), LoadPolicy::Immediate)
    }

    fn with_source(source: DataSource, policy: LoadPolicy) -> Self {
        Self {
            source,
            policy: Mutex::new(policy),
            lifecycle: Mutex::new(Lifecycle::new()),
            slot: Arc::new(ArcSwapOption::empty()),
            loader: Mutex::new(None),
        }
    }

    /// The load policy.
    pub fn load_policy(&self) -> LoadPolicy {
        *self.policy.lock()
    }

    /// Changes the load policy. Fails while open.
    pub fn set_load_policy(&self, policy: LoadPolicy) -> Result<(), LexError> {
        let lifecycle = self.lifecycle.lock();
        lifecycle.require_closed()?;
        *self.policy.lock() = policy;
        Ok(())
    }

    fn require_open(&self) -> Result<(), LexError> {
        self.lifecycle.lock().require_open()
    }

    /// Whether a snapshot is installed.
    pub fn is_loaded(&self) -> bool {
        self.slot.load().is_some()
    }

    /// The installed snapshot.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.slot.load_full()
    }

    /// Starts materialization if it is neither done nor running.
    ///
    /// Never starts a second loader. With `block`, waits for the running
    /// loader and reports its failure.
    pub fn load(&self, block: bool) -> Result<(), LexError> {
        let task = {
            // Held until the task is in its slot, so close cannot miss it.
            let lifecycle = self.lifecycle.lock();
            lifecycle.require_open()?;
            if self.is_loaded() {
                return Ok(());
            }
            let DataSource::Backing(backing) = &self.source else {
                return Ok(());
            };
            let mut slot = self.loader.lock();
            match slot.as_ref() {
                Some(task) if !task.is_finished() => Arc::clone(task),
                _ => {
                    let task = Self::spawn_loader(Arc::clone(backing), Arc::clone(&self.slot))?;
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

    fn spawn_loader(
        backing: Arc<dyn Dictionary>,
        slot: Arc<ArcSwapOption<Snapshot>>,
    ) -> Result<Arc<BackgroundTask>, LexError> {
        BackgroundTask::spawn("lexdb-loader", move |token| {
            tracing::info!(target: "loader", "materialization started");
            let snapshot = match loader::build_snapshot(backing.as_ref(), &token) {
                Ok(snapshot) => snapshot,
                Err(LexError::Interrupted) => {
                    tracing::info!(target: "loader", "materialization interrupted");
                    return Err(LexError::Interrupted);
                }
                Err(e) => {
                    tracing::warn!(target: "loader", error = %e, "materialization failed");
                    return Err(e);
                }
            };
            token.checkpoint()?;
            slot.store(Some(Arc::new(snapshot)));
            backing.close();
            tracing::info!(target: "loader", "snapshot installed; backing closed");
            Ok(())
        })
    }

    /// Writes the snapshot as an image, loading first if needed.
    /// Returns the number of bytes written.
    pub fn export<W: Write>(&self, out: W) -> Result<u64, LexError> {
        if !self.is_loaded() {
            self.load(true)?;
        }
        let snapshot = self.slot.load_full().ok_or(LexError::ObjectClosed)?;
        write_image(&snapshot, out)
    }

    /// Writes the snapshot image to a file.
    pub fn export_to(&self, path: &Path) -> Result<u64, LexError> {
        self.export(BufWriter::new(File::create(path)?))
    }

    fn lookup<T, S, B>(&self, from_snapshot: S, from_backing: B) -> Result<Option<Arc<T>>, LexError>
    where
        S: Fn(&Snapshot) -> Option<Arc<T>>,
        B: FnOnce(&dyn Dictionary) -> Result<Option<Arc<T>>, LexError>,
    {
        self.require_open()?;
        if let Some(snapshot) = self.slot.load_full() {
            return Ok(from_snapshot(&snapshot));
        }
        let DataSource::Backing(backing) = &self.source else {
            return Err(LexError::ObjectClosed);
        };
        match from_backing(backing.as_ref()) {
            // The loader installed the snapshot and closed the backing in between.
            Err(LexError::ObjectClosed) => match self.slot.load_full() {
                Some(snapshot) => Ok(from_snapshot(&snapshot)),
                None => Err(LexError::ObjectClosed),
            },
            other => other,
        }
    }

    fn iterate<T, B>(
        &self,
        category: Option<Category>,
        start: Option<&str>,
        from_backing: B,
    ) -> Result<RecordIter<T>, LexError>
    where
        T: SnapshotTable,
        B: FnOnce(&dyn Dictionary) -> Result<RecordIter<T>, LexError>,
    {
        fn from_snapshot<T: SnapshotTable>(
            snapshot: &Snapshot,
            category: Option<Category>,
            start: Option<&str>,
        ) -> RecordIter<T> {
            match T::table(snapshot, category) {
                Some(table) => Box::new(table.iter_from(start).map(Ok)),
                None => Box::new(std::iter::empty()),
            }
        }

        self.require_open()?;
        if let Some(snapshot) = self.slot.load_full() {
            return Ok(from_snapshot(&snapshot, category, start));
        }
        let DataSource::Backing(backing) = &self.source else {
            return Err(LexError::ObjectClosed);
        };
        let current = match from_backing(backing.as_ref()) {
            Ok(iter) => iter,
            Err(LexError::ObjectClosed) => match self.slot.load_full() {
                Some(snapshot) => return Ok(from_snapshot(&snapshot, category, start)),
                None => return Err(LexError::ObjectClosed),
            },
            Err(e) => return Err(e),
        };
        Ok(Box::new(HotSwapIter::new(
            Arc::clone(&self.slot),
            current,
            category,
            start,
        )))
    }
}

impl Dictionary for MaterializedDictionary {
    /// Opens the backing (or imports the image) and applies the load policy.
    ///
    /// A failed immediate load is logged and leaves the dictionary open and
    /// serving from its backing.
    fn open(&self) -> Result<(), LexError> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.begin_open()? == Transition::Noop {
                return Ok(());
            }
            let opened = match &self.source {
                DataSource::Backing(backing) => backing.open(),
                DataSource::Image(path) => File::open(path)
                    .map_err(LexError::from)
                    .and_then(|file| read_image(BufReader::new(file)))
                    .map(|snapshot| self.slot.store(Some(Arc::new(snapshot)))),
            };
            if let Err(e) = opened {
                lifecycle.abort_open();
                return Err(e);
            }
            lifecycle.finish_open()?;
        }
        match self.load_policy() {
            LoadPolicy::NoLoad => Ok(()),
            LoadPolicy::Background => self.load(false),
            LoadPolicy::Immediate => {
                if let Err(e) = self.load(true) {
                    tracing::warn!(target: "loader", error = %e, "immediate load failed; serving from backing");
                }
                Ok(())
            }
        }
    }

    fn close(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(lifecycle.begin_close(), Ok(Transition::Proceed)) {
            return;
        }
        let running = self.loader.lock().take();
        if let Some(task) = running {
            task.cancel();
            match task.wait() {
                Ok(()) | Err(LexError::Interrupted) => {}
                Err(e) => tracing::debug!(target: "loader", error = %e, "loader had failed"),
            }
        }
        self.slot.store(None);
        if let DataSource::Backing(backing) = &self.source {
            backing.close();
        }
        if let Err(e) = lifecycle.finish_close() {
            tracing::warn!(target: "loader", error = %e, "close did not complete");
        }
    }

    fn is_open(&self) -> bool {
        self.lifecycle.lock().is_open()
    }

    fn version(&self) -> Result<Option<Version>, LexError> {
        self.require_open()?;
        if let Some(snapshot) = self.slot.load_full() {
            return Ok(snapshot.version());
        }
        match &self.source {
            DataSource::Backing(backing) => match backing.version() {
                Err(LexError::ObjectClosed) => self
                    .slot
                    .load_full()
                    .map(|s| s.version())
                    .ok_or(LexError::ObjectClosed),
                other => other,
            },
            DataSource::Image(_) => Err(LexError::ObjectClosed),
        }
    }

    fn index_record(&self, id: &IndexId) -> Result<Option<Arc<IndexRecord>>, LexError> {
        self.lookup(|s| s.index_record(id), |d| d.index_record(id))
    }

    fn primary_record(&self, id: &PrimaryId) -> Result<Option<Arc<PrimaryRecord>>, LexError> {
        self.lookup(|s| s.primary_record(id), |d| d.primary_record(id))
    }

    fn exception_record(
        &self,
        id: &ExceptionId,
    ) -> Result<Option<Arc<ExceptionRecord>>, LexError> {
        self.lookup(|s| s.exception_record(id), |d| d.exception_record(id))
    }

    fn sense(&self, key: &SenseKey) -> Result<Option<Arc<Sense>>, LexError> {
        self.lookup(|s| s.sense(key), |d| d.sense(key))
    }

    fn sense_entry(&self, key: &SenseKey) -> Result<Option<Arc<SenseEntryRecord>>, LexError> {
        self.lookup(|s| s.sense_entry(key), |d| d.sense_entry(key))
    }

    fn index_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<IndexRecord>, LexError> {
        self.iterate(Some(category), start, |d| d.index_records(category, start))
    }

    fn primary_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<PrimaryRecord>, LexError> {
        self.iterate(Some(category), start, |d| d.primary_records(category, start))
    }

    fn exception_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<ExceptionRecord>, LexError> {
        self.iterate(Some(category), start, |d| d.exception_records(category, start))
    }

    fn sense_entries(&self, start: Option<&str>) -> Result<RecordIter<SenseEntryRecord>, LexError> {
        self.iterate(None, start, |d| d.sense_entries(start))
    }
}

impl Drop for MaterializedDictionary {
    fn drop(&mut self) {
        self.close();
    }
}
