// Path: crates/store/src/line/iter.rs

use super::buffer::{read_line, LineBuffer, Region};
use super::comparator::LineComparator;
use lexdb_types::LexError;
use std::fmt;
use std::sync::Arc;

/// A look-ahead iterator over the non-comment, non-blank lines of a store.
///
/// The next line is decoded one step early so that [`Lines::peek`] can
/// report it. If the underlying buffer is promoted while the iterator is
/// live, the iterator continues at the same byte position in the new region.
pub struct Lines {
    buffer: Arc<LineBuffer>,
    region: Arc<Region>,
    comparator: Arc<dyn LineComparator>,
    position: usize,
    next: Option<Result<String, LexError>>,
}

impl fmt::Debug for Lines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lines")
            .field("path", &self.buffer.path())
            .field("position", &self.position)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

impl Lines {
    /// Starts iterating at byte `position`, which must be a line start.
    pub(crate) fn at(
        buffer: Arc<LineBuffer>,
        comparator: Arc<dyn LineComparator>,
        position: usize,
    ) -> Self {
        let region = buffer.region();
        let mut lines = Self {
            buffer,
            region,
            comparator,
            position,
            next: None,
        };
        lines.advance();
        lines
    }

    /// The next line, without consuming it.
    pub fn peek(&self) -> Option<&Result<String, LexError>> {
        self.next.as_ref()
    }

    /// Whether another line is available.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn advance(&mut self) {
        let current = self.buffer.region();
        if !Arc::ptr_eq(&current, &self.region) {
            self.region = current;
        }
        self.next = loop {
            let Some((raw, next)) = read_line(self.region.bytes(), self.position) else {
                break None;
            };
            self.position = next;
            match self.buffer.decode(raw) {
                Ok(line) if line.is_empty() || self.comparator.is_comment(&line) => continue,
                decoded => break Some(decoded),
            }
        };
    }
}

impl Iterator for Lines {
    type Item = Result<String, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next.take()?;
        self.advance();
        Some(item)
    }
}
