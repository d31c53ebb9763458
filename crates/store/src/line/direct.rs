// Path: crates/store/src/line/direct.rs

use super::binary::{search, Located};
use super::buffer::{read_line, LineBuffer};
use super::comparator::{leading_token, LineComparator};
use super::iter::Lines;
use super::{AccessStrategy, LineStore};
use lexdb_types::{ContentType, LexError};
use std::sync::Arc;

/// A line store whose keys are the byte offsets of their own lines.
///
/// `line("00001740")` reads the line starting at byte 1740 and accepts it
/// only if it starts with the key literally. Keys that are not decimal
/// numbers, point past the end, or land on a line with a different key
/// are absent.
#[derive(Debug)]
pub struct DirectOffsetStore {
    content_type: ContentType,
    buffer: Arc<LineBuffer>,
    comparator: Arc<dyn LineComparator>,
}

impl DirectOffsetStore {
    /// Creates a store. The comparator orders keys for `lines_from` and
    /// detects comments.
    pub fn new(
        content_type: ContentType,
        buffer: Arc<LineBuffer>,
        comparator: Arc<dyn LineComparator>,
    ) -> Self {
        Self {
            content_type,
            buffer,
            comparator,
        }
    }

    fn locate(&self, key: &str) -> Result<Option<(usize, String)>, LexError> {
        let Ok(offset) = key.parse::<usize>() else {
            return Ok(None);
        };
        let region = self.buffer.region();
        let Some((raw, _)) = read_line(region.bytes(), offset) else {
            return Ok(None);
        };
        let line = self.buffer.decode(raw)?;
        Ok(line.starts_with(key).then_some((offset, line)))
    }

    /// Checks that the file really is offset-addressed: the first data line
    /// must be reachable through its own leading token.
    pub fn self_check(&self) -> Result<bool, LexError> {
        let first = match self.lines().next() {
            None => return Ok(true),
            Some(line) => line?,
        };
        let token = leading_token(&first)?;
        Ok(self.locate(token)?.map(|(_, line)| line) == Some(first))
    }
}

impl LineStore for DirectOffsetStore {
    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::DirectOffset
    }

    fn buffer(&self) -> &Arc<LineBuffer> {
        &self.buffer
    }

    fn comparator(&self) -> &Arc<dyn LineComparator> {
        &self.comparator
    }

    fn line(&self, key: &str) -> Result<Option<String>, LexError> {
        Ok(self.locate(key)?.map(|(_, line)| line))
    }

    fn lines_from(&self, key: &str) -> Result<Lines, LexError> {
        if let Some((start, _)) = self.locate(key)? {
            return Ok(Lines::at(
                Arc::clone(&self.buffer),
                Arc::clone(&self.comparator),
                start,
            ));
        }
        // No line at that offset: position by search under the comparator.
        let region = self.buffer.region();
        let found = search(&self.buffer, region.bytes(), self.comparator.as_ref(), key)?;
        let start = match found.located {
            Located::Exact { start } => start,
            Located::Missing { lower_bound, .. } => lower_bound,
        };
        Ok(Lines::at(
            Arc::clone(&self.buffer),
            Arc::clone(&self.comparator),
            start,
        ))
    }
}
