// Path: crates/store/src/dictionary/source.rs

use super::{Dictionary, RecordIter};
use crate::catalog::ContentCatalog;
use crate::codec::{RecordCodec, WordnetCodec};
use crate::line::Lines;
use lexdb_types::{
    Category, ContentType, ExceptionId, ExceptionRecord, IndexId, IndexRecord, LexConfig,
    LexError, ParseOptions, PrimaryId, PrimaryRecord, Sense, SenseEntryRecord, SenseKey, Version,
};
use std::sync::Arc;

#[derive(Debug)]
struct SourceInner {
    catalog: ContentCatalog,
    codec: Arc<dyn RecordCodec>,
    options: ParseOptions,
}

impl SourceInner {
    fn line(&self, content_type: ContentType, key: &str) -> Result<Option<String>, LexError> {
        match self.catalog.store(content_type)? {
            Some(store) => store.line(key),
            None => Ok(None),
        }
    }

    fn lines(&self, content_type: ContentType, start: Option<&str>) -> Result<Option<Lines>, LexError> {
        let Some(store) = self.catalog.store(content_type)? else {
            return Ok(None);
        };
        Ok(Some(match start {
            Some(key) => store.lines_from(key)?,
            None => store.lines(),
        }))
    }

    fn read_primary(&self, id: &PrimaryId, resolve: bool) -> Result<Option<PrimaryRecord>, LexError> {
        let Some(line) = self.line(ContentType::primary(id.category), &id.line_key())? else {
            return Ok(None);
        };
        let mut record = self.codec.parse_primary(&line, id.category, &self.options)?;
        if record.id != *id {
            return Ok(None);
        }
        if resolve {
            self.resolve_satellite(&mut record)?;
        }
        Ok(Some(record))
    }

    /// Stamps a satellite's words with the first word of its head synset.
    fn resolve_satellite(&self, record: &mut PrimaryRecord) -> Result<(), LexError> {
        if !record.needs_head() {
            return Ok(());
        }
        let Some(head_id) = record.head_ref() else {
            tracing::debug!(target: "store", id = %record.id.line_key(), "satellite without a head pointer");
            return Ok(());
        };
        match self.read_primary(&head_id, false)? {
            Some(head) => {
                record.resolve_head(&head);
            }
            None => tracing::warn!(
                target: "store",
                id = %record.id.line_key(),
                head = %head_id.line_key(),
                "satellite head not found"
            ),
        }
        Ok(())
    }

    fn parse_index(&self, line: &str) -> Result<IndexRecord, LexError> {
        self.codec.parse_index(line, &self.options)
    }

    fn parse_primary(&self, line: &str, category: Category) -> Result<PrimaryRecord, LexError> {
        let mut record = self.codec.parse_primary(line, category, &self.options)?;
        self.resolve_satellite(&mut record)?;
        Ok(record)
    }

    fn parse_exception(&self, line: &str, category: Category) -> Result<ExceptionRecord, LexError> {
        self.codec.parse_exception(line, category, &self.options)
    }

    fn parse_sense_entry(&self, line: &str) -> Result<SenseEntryRecord, LexError> {
        self.codec.parse_sense_entry(line, &self.options)
    }
}

/// Turns a line stream into a record stream.
struct Parsed<T> {
    lines: Lines,
    parse: Box<dyn Fn(&str) -> Result<T, LexError> + Send>,
}

impl<T> Iterator for Parsed<T> {
    type Item = Result<Arc<T>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(line.and_then(|line| (self.parse)(&line)).map(Arc::new))
    }
}

/// A dictionary that parses records straight out of the catalog's files.
///
/// Point lookups check that the parsed record carries the requested id, so
/// a prefix match from the line store never answers for a different lemma.
#[derive(Debug, Clone)]
pub struct SourceDictionary {
    inner: Arc<SourceInner>,
}

impl SourceDictionary {
    /// A closed dictionary over the directory in `config`, using [`WordnetCodec`].
    pub fn new(config: &LexConfig) -> Result<Self, LexError> {
        Self::with_codec(config, Arc::new(WordnetCodec))
    }

    /// A closed dictionary with a custom codec.
    pub fn with_codec(config: &LexConfig, codec: Arc<dyn RecordCodec>) -> Result<Self, LexError> {
        Ok(Self {
            inner: Arc::new(SourceInner {
                catalog: ContentCatalog::from_config(config)?,
                codec,
                options: config.parse_options(),
            }),
        })
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &ContentCatalog {
        &self.inner.catalog
    }

    /// Promotes every file from its mapping to the heap. See [`ContentCatalog::load`].
    pub fn load(&self, block: bool) -> Result<(), LexError> {
        self.inner.catalog.load(block)
    }

    /// Whether every file has been promoted.
    pub fn is_loaded(&self) -> bool {
        self.inner.catalog.is_loaded()
    }

    fn iterate<T, F>(
        &self,
        content_type: ContentType,
        start: Option<&str>,
        parse: F,
    ) -> Result<RecordIter<T>, LexError>
    where
        T: Send + Sync + 'static,
        F: Fn(&SourceInner, &str) -> Result<T, LexError> + Send + 'static,
    {
        match self.inner.lines(content_type, start)? {
            Some(lines) => {
                let inner = Arc::clone(&self.inner);
                Ok(Box::new(Parsed {
                    lines,
                    parse: Box::new(move |line| parse(&inner, line)),
                }))
            }
            None => Ok(Box::new(std::iter::empty())),
        }
    }
}

impl Dictionary for SourceDictionary {
    fn open(&self) -> Result<(), LexError> {
        self.inner.catalog.open()
    }

    fn close(&self) {
        self.inner.catalog.close();
    }

    fn is_open(&self) -> bool {
        self.inner.catalog.is_open()
    }

    fn version(&self) -> Result<Option<Version>, LexError> {
        self.inner.catalog.version()
    }

    fn index_record(&self, id: &IndexId) -> Result<Option<Arc<IndexRecord>>, LexError> {
        let Some(line) = self.inner.line(ContentType::index(id.category), &id.lemma)? else {
            return Ok(None);
        };
        let record = self.inner.parse_index(&line)?;
        Ok((record.id == *id).then(|| Arc::new(record)))
    }

    fn primary_record(&self, id: &PrimaryId) -> Result<Option<Arc<PrimaryRecord>>, LexError> {
        Ok(self.inner.read_primary(id, true)?.map(Arc::new))
    }

    fn exception_record(
        &self,
        id: &ExceptionId,
    ) -> Result<Option<Arc<ExceptionRecord>>, LexError> {
        let Some(line) = self.inner.line(ContentType::exception(id.category), &id.surface)? else {
            return Ok(None);
        };
        let record = self.inner.parse_exception(&line, id.category)?;
        Ok((record.id == *id).then(|| Arc::new(record)))
    }

    fn sense(&self, key: &SenseKey) -> Result<Option<Arc<Sense>>, LexError> {
        let Some(line) = self.inner.line(ContentType::SENSE, &key.to_string())? else {
            return Ok(None);
        };
        let entry = self.inner.parse_sense_entry(&line)?;
        if entry.key != *key {
            return Ok(None);
        }
        let Some(primary_id) = entry.primary_id() else {
            return Ok(None);
        };
        let Some(record) = self.inner.read_primary(&primary_id, true)? else {
            return Ok(None);
        };
        let found = Sense::from_primary(&record)
            .find(|sense| sense.key == *key)
            .map(Arc::new);
        Ok(found)
    }

    fn sense_entry(&self, key: &SenseKey) -> Result<Option<Arc<SenseEntryRecord>>, LexError> {
        let Some(line) = self.inner.line(ContentType::SENSE_ENTRY, &key.to_string())? else {
            return Ok(None);
        };
        let record = self.inner.parse_sense_entry(&line)?;
        Ok((record.key == *key).then(|| Arc::new(record)))
    }

    fn index_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<IndexRecord>, LexError> {
        self.iterate(ContentType::index(category), start, |inner, line| {
            inner.parse_index(line)
        })
    }

    fn primary_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<PrimaryRecord>, LexError> {
        self.iterate(ContentType::primary(category), start, move |inner, line| {
            inner.parse_primary(line, category)
        })
    }

    fn exception_records(
        &self,
        category: Category,
        start: Option<&str>,
    ) -> Result<RecordIter<ExceptionRecord>, LexError> {
        self.iterate(ContentType::exception(category), start, move |inner, line| {
            inner.parse_exception(line, category)
        })
    }

    fn sense_entries(&self, start: Option<&str>) -> Result<RecordIter<SenseEntryRecord>, LexError> {
        self.iterate(ContentType::SENSE_ENTRY, start, |inner, line| {
            inner.parse_sense_entry(line)
        })
    }
}
