// Path: crates/store/src/dictionary/mod.rs

//! Typed record access over a catalog.
//!
//! Every implementation of [`Dictionary`] answers the same point lookups and
//! ordered iterations; they differ only in where the records come from.

mod caching;
mod source;

pub use caching::CachingDictionary;
pub use source::SourceDictionary;

use crate::materialize::MaterializedDictionary;
use lexdb_types::{
    Category, ExceptionId, ExceptionRecord, IndexId, IndexRecord, LexConfig, LexError,
    LoadPolicy, PrimaryId, PrimaryRecord, Sense, SenseEntryRecord, SenseKey, Version,
};
use std::sync::Arc;

/// An ordered, fallible stream of records.
pub type RecordIter<T> = Box<dyn Iterator<Item = Result<Arc<T>, LexError>> + Send>;

/// Read access to a lexical database.
///
/// Lookups return `Ok(None)` for absent records and
/// [`LexError::ObjectClosed`] while the dictionary is closed. Iterators
/// yield records in file order, optionally starting at the first record
/// whose line key is at or after `start`.
pub trait Dictionary: Send + Sync {
    /// Opens the dictionary and whatever it is built on.
    fn open(&self) -> Result<(), LexError>;

    /// Closes the dictionary. Closing a closed dictionary does nothing.
    fn close(&self);

    /// Whether the dictionary is open.
    fn is_open(&self) -> bool;

    /// The data-set version, if the source announces one.
    fn version(&self) -> Result<Option<Version>, LexError>;

    /// The index record for a lemma.
    fn index_record(&self, id: &IndexId) -> Result<Option<Arc<IndexRecord>>, LexError>;

    /// The primary record at an offset.
    fn primary_record(&self, id: &PrimaryId) -> Result<Option<Arc<PrimaryRecord>>, LexError>;

    /// The exception record for a surface form.
    fn exception_record(&self, id: &ExceptionId)
        -> Result<Option<Arc<ExceptionRecord>>, LexError>;

    /// The sense named by a sense key.
    fn sense(&self, key: &SenseKey) -> Result<Option<Arc<Sense>>, LexError>;

    /// The sense-entry line for a sense key.
    fn sense_entry(&self, key: &SenseKey) -> Result<Option<Arc<SenseEntryRecord>>, LexError>;

    /// Index records of one category.
    fn index_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<IndexRecord>, LexError>;

    /// Primary records of one category.
    fn primary_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<PrimaryRecord>, LexError>;

    /// Exception records of one category.
    fn exception_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<ExceptionRecord>, LexError>;

    /// Every sense entry.
    fn sense_entries(&self, start: Option<&str>) -> Result<RecordIter<SenseEntryRecord>, LexError>;
}

/// Assembles the dictionary stack a configuration describes:
/// a [`SourceDictionary`], wrapped in a [`CachingDictionary`] when the cache
/// is enabled, wrapped in a [`MaterializedDictionary`] unless the load policy
/// is [`LoadPolicy::NoLoad`]. The result is closed.
pub fn build_dictionary(config: &LexConfig) -> Result<Arc<dyn Dictionary>, LexError> {
    config.validate()?;
    let source: Arc<dyn Dictionary> = Arc::new(SourceDictionary::new(config)?);
    let backing: Arc<dyn Dictionary> = if config.cache.enabled {
        Arc::new(CachingDictionary::new(source, &config.cache))
    } else {
        source
    };
    Ok(match config.load_policy {
        LoadPolicy::NoLoad => backing,
        policy => Arc::new(MaterializedDictionary::new(backing, policy)),
    })
}
