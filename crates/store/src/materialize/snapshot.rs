// Path: crates/store/src/materialize/snapshot.rs

use ahash::AHashMap;
use lexdb_types::{
    Category, ExceptionId, ExceptionRecord, IndexId, IndexRecord, PrimaryId, PrimaryRecord,
    Record, Sense, SenseEntryRecord, SenseKey, Version,
};
use std::fmt;
use std::sync::Arc;

/// One content type's records in backing order, with a key index.
pub struct Table<T> {
    rows: Arc<Vec<Arc<T>>>,
    positions: AHashMap<String, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            positions: AHashMap::new(),
        }
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("len", &self.rows.len()).finish()
    }
}

impl<T: Record> Table<T> {
    pub(crate) fn from_rows(rows: Vec<Arc<T>>) -> Self {
        let positions = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.line_key(), i))
            .collect();
        Self {
            rows: Arc::new(rows),
            positions,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The record stored under a line key.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.positions
            .get(key)
            .and_then(|&i| self.rows.get(i))
            .cloned()
    }

    /// Every record, in order.
    pub fn iter(&self) -> TableIter<T> {
        self.iter_from(None)
    }

    /// Records whose line key is at or after `start`.
    pub fn iter_from(&self, start: Option<&str>) -> TableIter<T> {
        let next = match start {
            Some(key) => self
                .rows
                .partition_point(|row| row.line_key().as_str() < key),
            None => 0,
        };
        TableIter {
            rows: Arc::clone(&self.rows),
            next,
        }
    }

    /// Records after `last`, which must be present with an equal id.
    pub fn iter_after(&self, last: &T) -> Option<TableIter<T>> {
        let position = *self.positions.get(&last.line_key())?;
        let row = self.rows.get(position)?;
        (row.record_id() == last.record_id()).then(|| TableIter {
            rows: Arc::clone(&self.rows),
            next: position + 1,
        })
    }
}

/// An owning cursor over a [`Table`].
pub struct TableIter<T> {
    rows: Arc<Vec<Arc<T>>>,
    next: usize,
}

impl<T> Iterator for TableIter<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = Arc::clone(self.rows.get(self.next)?);
        self.next += 1;
        Some(row)
    }
}

/// An immutable, memory-resident copy of a whole dictionary.
#[derive(Debug, Default)]
pub struct Snapshot {
    version: Option<Version>,
    index: AHashMap<Category, Table<IndexRecord>>,
    primary: AHashMap<Category, Table<PrimaryRecord>>,
    exception: AHashMap<Category, Table<ExceptionRecord>>,
    senses: AHashMap<SenseKey, Arc<Sense>>,
    sense_entries: Table<SenseEntryRecord>,
}

impl Snapshot {
    /// The data-set version captured at load time.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Index records of one category.
    pub fn index(&self, category: Category) -> Option<&Table<IndexRecord>> {
        self.index.get(&category)
    }

    /// Primary records of one category.
    pub fn primary(&self, category: Category) -> Option<&Table<PrimaryRecord>> {
        self.primary.get(&category)
    }

    /// Exception records of one category.
    pub fn exception(&self, category: Category) -> Option<&Table<ExceptionRecord>> {
        self.exception.get(&category)
    }

    /// The sense-entry table.
    pub fn sense_entries(&self) -> &Table<SenseEntryRecord> {
        &self.sense_entries
    }

    /// Looks up an index record.
    pub fn index_record(&self, id: &IndexId) -> Option<Arc<IndexRecord>> {
        self.index(id.category)?.get(&id.lemma)
    }

    /// Looks up a primary record.
    pub fn primary_record(&self, id: &PrimaryId) -> Option<Arc<PrimaryRecord>> {
        self.primary(id.category)?.get(&id.line_key())
    }

    /// Looks up an exception record.
    pub fn exception_record(&self, id: &ExceptionId) -> Option<Arc<ExceptionRecord>> {
        self.exception(id.category)?.get(&id.surface)
    }

    /// Looks up a sense.
    pub fn sense(&self, key: &SenseKey) -> Option<Arc<Sense>> {
        self.senses.get(key).cloned()
    }

    /// Looks up a sense entry.
    pub fn sense_entry(&self, key: &SenseKey) -> Option<Arc<SenseEntryRecord>> {
        self.sense_entries.get(&key.to_string())
    }

    /// Number of senses projected from the primary records.
    pub fn sense_count(&self) -> usize {
        self.senses.len()
    }

    /// Total records across every table, senses excluded.
    pub fn record_count(&self) -> usize {
        self.index.values().map(Table::len).sum::<usize>()
            + self.primary.values().map(Table::len).sum::<usize>()
            + self.exception.values().map(Table::len).sum::<usize>()
            + self.sense_entries.len()
    }

    pub(crate) fn index_tables(&self) -> impl Iterator<Item = &Table<IndexRecord>> {
        Category::ALL.into_iter().filter_map(|c| self.index.get(&c))
    }

    pub(crate) fn primary_tables(&self) -> impl Iterator<Item = &Table<PrimaryRecord>> {
        Category::ALL.into_iter().filter_map(|c| self.primary.get(&c))
    }

    pub(crate) fn exception_tables(&self) -> impl Iterator<Item = &Table<ExceptionRecord>> {
        Category::ALL.into_iter().filter_map(|c| self.exception.get(&c))
    }
}

/// A table a hot-swappable iterator can rebase onto.
pub trait SnapshotTable: Record + Sized {
    /// The table holding this record kind (and category, where it has one).
    fn table(snapshot: &Snapshot, category: Option<Category>) -> Option<&Table<Self>>;
}

impl SnapshotTable for IndexRecord {
    fn table(snapshot: &Snapshot, category: Option<Category>) -> Option<&Table<Self>> {
        snapshot.index(category?)
    }
}

impl SnapshotTable for PrimaryRecord {
    fn table(snapshot: &Snapshot, category: Option<Category>) -> Option<&Table<Self>> {
        snapshot.primary(category?)
    }
}

impl SnapshotTable for ExceptionRecord {
    fn table(snapshot: &Snapshot, category: Option<Category>) -> Option<&Table<Self>> {
        snapshot.exception(category?)
    }
}

impl SnapshotTable for SenseEntryRecord {
    fn table(snapshot: &Snapshot, _category: Option<Category>) -> Option<&Table<Self>> {
        Some(snapshot.sense_entries())
    }
}

/// Accumulates records in backing order and freezes them into a [`Snapshot`].
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuilder {
    version: Option<Version>,
    index: AHashMap<Category, Vec<Arc<IndexRecord>>>,
    primary: AHashMap<Category, Vec<Arc<PrimaryRecord>>>,
    exception: AHashMap<Category, Vec<Arc<ExceptionRecord>>>,
    senses: AHashMap<SenseKey, Arc<Sense>>,
    sense_entries: Vec<Arc<SenseEntryRecord>>,
}

impl SnapshotBuilder {
    pub(crate) fn new(version: Option<Version>) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub(crate) fn push_index(&mut self, record: Arc<IndexRecord>) {
        self.index.entry(record.id.category).or_default().push(record);
    }

    pub(crate) fn push_primary(&mut self, record: Arc<PrimaryRecord>) {
        self.primary.entry(record.id.category).or_default().push(record);
    }

    pub(crate) fn push_exception(&mut self, record: Arc<ExceptionRecord>) {
        self.exception.entry(record.id.category).or_default().push(record);
    }

    /// Derives the sense table from the primary records gathered so far.
    pub(crate) fn project_senses(&mut self) -> usize {
        for rows in self.primary.values() {
            for record in rows {
                for sense in Sense::from_primary(record) {
                    self.senses.insert(sense.key.clone(), Arc::new(sense));
                }
            }
        }
        self.senses.len()
    }

    /// Adds a sense entry. Returns whether a sense was projected for its key.
    pub(crate) fn project_sense_entry(&mut self, entry: Arc<SenseEntryRecord>) -> bool {
        let matched = self.senses.contains_key(&entry.key);
        self.sense_entries.push(entry);
        matched
    }

    pub(crate) fn finish(self) -> Snapshot {
        fn freeze<T: Record>(tables: AHashMap<Category, Vec<Arc<T>>>) -> AHashMap<Category, Table<T>> {
            tables
                .into_iter()
                .map(|(category, rows)| (category, Table::from_rows(rows)))
                .collect()
        }
        Snapshot {
            version: self.version,
            index: freeze(self.index),
            primary: freeze(self.primary),
            exception: freeze(self.exception),
            senses: self.senses,
            sense_entries: Table::from_rows(self.sense_entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exc(surface: &str) -> Arc<ExceptionRecord> {
        Arc::new(ExceptionRecord {
            id: ExceptionId::new(surface, Category::Verb),
            stems: vec!["x".into()],
        })
    }

    fn table() -> Table<ExceptionRecord> {
        Table::from_rows(vec![exc("ate"), exc("began"), exc("came"), exc("dove")])
    }

    fn surfaces(iter: TableIter<ExceptionRecord>) -> Vec<String> {
        iter.map(|r| r.id.surface.clone()).collect()
    }

    #[test]
    fn iter_from_starts_at_the_first_key_at_or_after() {
        let t = table();
        assert_eq!(surfaces(t.iter_from(Some("began"))), vec!["began", "came", "dove"]);
        assert_eq!(surfaces(t.iter_from(Some("bz"))), vec!["came", "dove"]);
        assert!(surfaces(t.iter_from(Some("zz"))).is_empty());
        assert_eq!(surfaces(t.iter()).len(), 4);
    }

    #[test]
    fn iter_after_resumes_past_the_last_element() {
        let t = table();
        let last = exc("began");
        assert_eq!(surfaces(t.iter_after(&last).unwrap()), vec!["came", "dove"]);
        assert!(t.iter_after(&exc("missing")).is_none());
    }

    #[test]
    fn builder_projects_senses_and_joins_entries() {
        let mut builder = SnapshotBuilder::new(Some(Version::new(3, 0)));
        let key = SenseKey::new("dog", 1, 5, 0);
        builder.push_primary(Arc::new(PrimaryRecord {
            id: PrimaryId::new(0, Category::Noun),
            lex_file: 5,
            satellite: false,
            words: vec![lexdb_types::Word {
                lemma: "dog".into(),
                lex_id: 0,
                sense_key: key.clone(),
            }],
            pointers: vec![],
            gloss: String::new(),
        }));
        assert_eq!(builder.project_senses(), 1);
        let entry = |key: SenseKey| {
            Arc::new(SenseEntryRecord {
                key,
                offset: 0,
                sense_number: 1,
                tag_count: 0,
            })
        };
        assert!(builder.project_sense_entry(entry(key.clone())));
        let unmatched = SenseKey::new("cat", 1, 5, 0);
        assert!(!builder.project_sense_entry(entry(unmatched.clone())));

        let snapshot = builder.finish();
        assert_eq!(snapshot.version(), Some(Version::new(3, 0)));
        assert_eq!(snapshot.record_count(), 3);
        assert!(snapshot.sense(&key).is_some());
        assert!(snapshot.sense_entry(&key).is_some());
        // Entries are kept even when no primary word carries their key.
        assert!(snapshot.sense(&unmatched).is_none());
        assert!(snapshot.sense_entry(&unmatched).is_some());
        assert!(snapshot
            .primary_record(&PrimaryId::new(0, Category::Noun))
            .is_some());
    }
}
