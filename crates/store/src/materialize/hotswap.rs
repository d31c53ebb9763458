// Path: crates/store/src/materialize/hotswap.rs

use super::snapshot::{Snapshot, SnapshotTable};
use crate::dictionary::RecordIter;
use arc_swap::ArcSwapOption;
use lexdb_types::{Category, LexError};
use std::sync::Arc;

/// An iterator that starts on the backing dictionary and moves onto the
/// snapshot the moment one is installed.
///
/// On its first step after installation it locates the last element it
/// returned in the snapshot table (by line key, confirmed by id) and carries
/// on from the following row, so the combined sequence has no gaps and no
/// repeats. If the last element cannot be located the iterator yields
/// [`LexError::Resync`] once and then ends.
pub struct HotSwapIter<T: SnapshotTable> {
    slot: Arc<ArcSwapOption<Snapshot>>,
    current: RecordIter<T>,
    category: Option<Category>,
    start: Option<String>,
    last: Option<Arc<T>>,
    rebased: bool,
}

impl<T: SnapshotTable> HotSwapIter<T> {
    pub(crate) fn new(
        slot: Arc<ArcSwapOption<Snapshot>>,
        current: RecordIter<T>,
        category: Option<Category>,
        start: Option<&str>,
    ) -> Self {
        Self {
            slot,
            current,
            category,
            start: start.map(str::to_owned),
            last: None,
            rebased: false,
        }
    }

    /// Whether the iterator has moved onto the snapshot.
    pub fn is_rebased(&self) -> bool {
        self.rebased
    }

    /// Switches to the snapshot if one has been installed. Returns whether it did.
    fn rebase(&mut self) -> Result<bool, LexError> {
        if self.rebased {
            return Ok(false);
        }
        let Some(snapshot) = self.slot.load_full() else {
            return Ok(false);
        };
        self.rebased = true;
        let table = T::table(&snapshot, self.category);
        let rows = match (&self.last, table) {
            (None, Some(table)) => table.iter_from(self.start.as_deref()),
            (Some(last), Some(table)) => table
                .iter_after(last)
                .ok_or_else(|| LexError::Resync(last.record_id().to_string()))?,
            (None, None) => {
                self.current = Box::new(std::iter::empty());
                return Ok(true);
            }
            (Some(last), None) => return Err(LexError::Resync(last.record_id().to_string())),
        };
        self.current = Box::new(rows.map(Ok));
        tracing::debug!(target: "loader", "iterator rebased onto snapshot");
        Ok(true)
    }
}

impl<T: SnapshotTable> Iterator for HotSwapIter<T> {
    type Item = Result<Arc<T>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Err(e) = self.rebase() {
                self.current = Box::new(std::iter::empty());
                return Some(Err(e));
            }
            match self.current.next() {
                Some(Ok(item)) => {
                    self.last = Some(Arc::clone(&item));
                    return Some(Ok(item));
                }
                // The backing closed under us after the snapshot went in.
                Some(Err(LexError::ObjectClosed))
                    if !self.rebased && self.slot.load().is_some() =>
                {
                    continue
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::snapshot::SnapshotBuilder;
    use super::*;
    use lexdb_types::{ExceptionId, ExceptionRecord};

    fn exc(surface: &str) -> Arc<ExceptionRecord> {
        Arc::new(ExceptionRecord {
            id: ExceptionId::new(surface, Category::Noun),
            stems: vec!["x".into()],
        })
    }

    fn snapshot(surfaces: &[&str]) -> Arc<Snapshot> {
        let mut builder = SnapshotBuilder::new(None);
        for s in surfaces {
            builder.push_exception(exc(s));
        }
        Arc::new(builder.finish())
    }

    fn disk(surfaces: &[&'static str]) -> RecordIter<ExceptionRecord> {
        Box::new(surfaces.to_vec().into_iter().map(|s| Ok(exc(s))))
    }

    fn surfaces(iter: impl Iterator<Item = Result<Arc<ExceptionRecord>, LexError>>) -> Vec<String> {
        iter.map(|r| r.unwrap().id.surface.clone()).collect()
    }

    #[test]
    fn swaps_mid_iteration_without_gaps_or_repeats() {
        let all = ["a", "b", "c", "d", "e"];
        let slot = Arc::new(ArcSwapOption::empty());
        let mut iter = HotSwapIter::new(Arc::clone(&slot), disk(&all), Some(Category::Noun), None);

        let head: Vec<String> = (&mut iter).take(2).map(|r| r.unwrap().id.surface.clone()).collect();
        slot.store(Some(snapshot(&all)));
        let tail = surfaces(&mut iter);

        assert!(iter.is_rebased());
        assert_eq!(head, vec!["a", "b"]);
        assert_eq!(tail, vec!["c", "d", "e"]);
    }

    #[test]
    fn rebasing_before_the_first_element_honours_the_start_key() {
        let all = ["a", "b", "c", "d"];
        let slot = Arc::new(ArcSwapOption::empty());
        let iter = HotSwapIter::new(Arc::clone(&slot), disk(&["c", "d"]), Some(Category::Noun), Some("c"));
        slot.store(Some(snapshot(&all)));
        assert_eq!(surfaces(iter), vec!["c", "d"]);
    }

    #[test]
    fn missing_last_element_fails_resync() {
        let slot = Arc::new(ArcSwapOption::empty());
        let mut iter = HotSwapIter::new(Arc::clone(&slot), disk(&["a", "b"]), Some(Category::Noun), None);
        assert!(iter.next().unwrap().is_ok());
        slot.store(Some(snapshot(&["b"])));
        assert!(matches!(iter.next(), Some(Err(LexError::Resync(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn closed_backing_falls_over_to_the_snapshot() {
        let slot = Arc::new(ArcSwapOption::empty());
        let first = Arc::clone(&slot);
        let backing: RecordIter<ExceptionRecord> = Box::new(
            vec![Ok(exc("a")), Err(LexError::ObjectClosed)]
                .into_iter()
                .inspect(move |r| {
                    if r.is_err() {
                        first.store(Some(snapshot(&["a", "b"])));
                    }
                }),
        );
        let iter = HotSwapIter::new(slot, backing, Some(Category::Noun), None);
        assert_eq!(surfaces(iter), vec!["a", "b"]);
    }
}
