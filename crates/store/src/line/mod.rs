// Path: crates/store/src/line/mod.rs

//! Line-oriented access to one sorted text file.
//!
//! A [`LineStore`] answers three questions about its file: which line
//! carries a key, which lines follow a key, and which lines exist at all.
//! Two strategies implement it: [`BinarySearchStore`] for lexically or
//! numerically sorted files and [`DirectOffsetStore`] for files whose keys
//! are the byte offsets of their own lines.

mod binary;
mod buffer;
mod comparator;
mod direct;
mod iter;

pub use binary::BinarySearchStore;
pub use buffer::{LineBuffer, Region};
pub use comparator::{leading_token, LineComparator, TokenComparator, TokenOrder, COMMENT_PREFIX};
pub use direct::DirectOffsetStore;
pub use iter::Lines;

use buffer::read_line;
use lexdb_types::{ContentType, LexError};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// How a store locates a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Binary search under the store's comparator.
    BinarySearch,
    /// The key is the byte offset of its line.
    DirectOffset,
}

/// Read access to one content type's file.
pub trait LineStore: Send + Sync + fmt::Debug {
    /// The content type bound to this store.
    fn content_type(&self) -> ContentType;

    /// How keys are located.
    fn strategy(&self) -> AccessStrategy;

    /// The underlying buffer.
    fn buffer(&self) -> &Arc<LineBuffer>;

    /// The comparator (ordering and comment predicate).
    fn comparator(&self) -> &Arc<dyn LineComparator>;

    /// The line carrying `key`, if any.
    fn line(&self, key: &str) -> Result<Option<String>, LexError>;

    /// Every line at or after `key`, in file order.
    fn lines_from(&self, key: &str) -> Result<Lines, LexError>;

    /// Every non-comment line, in file order.
    fn lines(&self) -> Lines {
        Lines::at(Arc::clone(self.buffer()), Arc::clone(self.comparator()), 0)
    }

    /// The leading comment block.
    fn header(&self) -> Result<Vec<String>, LexError> {
        let buffer = self.buffer();
        let region = buffer.region();
        let mut header = Vec::new();
        let mut position = 0;
        while let Some((raw, next)) = read_line(region.bytes(), position) {
            let line = buffer.decode(raw)?;
            if !self.comparator().is_comment(&line) {
                break;
            }
            header.push(line);
            position = next;
        }
        Ok(header)
    }

    /// The file this store reads.
    fn path(&self) -> &Path {
        self.buffer().path()
    }

    /// Replaces the OS mapping with a heap copy.
    fn promote(&self) -> Result<bool, LexError> {
        self.buffer().promote()
    }

    /// Whether the store has been promoted to the heap.
    fn is_promoted(&self) -> bool {
        self.buffer().is_promoted()
    }
}
