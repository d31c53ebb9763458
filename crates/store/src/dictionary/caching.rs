// Path: crates/store/src/dictionary/caching.rs

use super::{Dictionary, RecordIter};
use crate::cache::{CachedRecord, RecordCache};
use lexdb_types::{
    CacheConfig, Category, ExceptionId, ExceptionRecord, IndexId, IndexRecord, LexError,
    PrimaryId, PrimaryRecord, RecordId, Sense, SenseEntryRecord, SenseKey, Version,
};
use std::sync::Arc;

/// A dictionary that answers point lookups from a [`RecordCache`] and falls
/// through to its backing dictionary on a miss. Iteration is never cached.
pub struct CachingDictionary {
    backing: Arc<dyn Dictionary>,
    cache: RecordCache,
}

impl CachingDictionary {
    /// Wraps `backing` with a cache sized by `config`.
    pub fn new(backing: Arc<dyn Dictionary>, config: &CacheConfig) -> Self {
        Self {
            backing,
            cache: RecordCache::new(config),
        }
    }

    /// The cache.
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// The backing dictionary.
    pub fn backing(&self) -> &Arc<dyn Dictionary> {
        &self.backing
    }

    fn cached<T, F>(
        &self,
        id: RecordId,
        unwrap: fn(CachedRecord) -> Option<Arc<T>>,
        wrap: fn(Arc<T>) -> CachedRecord,
        fetch: F,
    ) -> Result<Option<Arc<T>>, LexError>
    where
        F: FnOnce(&dyn Dictionary) -> Result<Option<Arc<T>>, LexError>,
    {
        if let Some(hit) = self.cache.item(&id)?.and_then(unwrap) {
            return Ok(Some(hit));
        }
        let found = fetch(self.backing.as_ref())?;
        if let Some(record) = &found {
            self.cache.cache_item(wrap(Arc::clone(record)))?;
        }
        Ok(found)
    }
}

impl Dictionary for CachingDictionary {
    fn open(&self) -> Result<(), LexError> {
        self.backing.open()?;
        self.cache.open()
    }

    fn close(&self) {
        self.cache.close();
        self.backing.close();
    }

    fn is_open(&self) -> bool {
        self.backing.is_open() && self.cache.is_open()
    }

    fn version(&self) -> Result<Option<Version>, LexError> {
        self.backing.version()
    }

    fn index_record(&self, id: &IndexId) -> Result<Option<Arc<IndexRecord>>, LexError> {
        self.cached(
            RecordId::Index(id.clone()),
            |r| match r {
                CachedRecord::Index(r) => Some(r),
                _ => None,
            },
            CachedRecord::Index,
            |d| d.index_record(id),
        )
    }

    fn primary_record(&self, id: &PrimaryId) -> Result<Option<Arc<PrimaryRecord>>, LexError> {
        self.cached(
            RecordId::Primary(*id),
            |r| match r {
                CachedRecord::Primary(r) => Some(r),
                _ => None,
            },
            CachedRecord::Primary,
            |d| d.primary_record(id),
        )
    }

    fn exception_record(
        &self,
        id: &ExceptionId,
    ) -> Result<Option<Arc<ExceptionRecord>>, LexError> {
        self.cached(
            RecordId::Exception(id.clone()),
            |r| match r {
                CachedRecord::Exception(r) => Some(r),
                _ => None,
            },
            CachedRecord::Exception,
            |d| d.exception_record(id),
        )
    }

    fn sense(&self, key: &SenseKey) -> Result<Option<Arc<Sense>>, LexError> {
        if let Some(hit) = self.cache.sense(key)? {
            return Ok(Some(hit));
        }
        let found = self.backing.sense(key)?;
        if let Some(sense) = &found {
            self.cache.cache_sense(Arc::clone(sense))?;
        }
        Ok(found)
    }

    fn sense_entry(&self, key: &SenseKey) -> Result<Option<Arc<SenseEntryRecord>>, LexError> {
        if let Some(hit) = self.cache.sense_entry(key)? {
            return Ok(Some(hit));
        }
        let found = self.backing.sense_entry(key)?;
        if let Some(entry) = &found {
            self.cache.cache_sense_entry(Arc::clone(entry))?;
        }
        Ok(found)
    }

    fn index_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<IndexRecord>, LexError> {
        self.backing.index_records(category, start)
    }

    fn primary_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<PrimaryRecord>, LexError> {
        self.backing.primary_records(category, start)
    }

    fn exception_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<ExceptionRecord>, LexError> {
        self.backing.exception_records(category, start)
    }

    fn sense_entries(&self, start: Option<&str>) -> Result<RecordIter<SenseEntryRecord>, LexError> {
        self.backing.sense_entries(start)
    }
}
