// Path: crates/store/src/line/buffer.rs

//! The byte region behind a line store and the primitives for walking it.

use lexdb_types::{Charset, LexError};
use memmap2::Mmap;
use parking_lot::RwLock;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The bytes a store reads from: an OS mapping, or a heap copy after promotion.
pub enum Region {
    /// Read-only memory map of the file.
    Mapped(Mmap),
    /// Process-owned copy of the file.
    Heap(Box<[u8]>),
}

impl Region {
    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap.as_ref(),
            Self::Heap(bytes) => bytes,
        }
    }

    /// Whether the region is a heap copy.
    pub fn is_heap(&self) -> bool {
        matches!(self, Self::Heap(_))
    }
}

/// A file's bytes plus the charset used to decode its lines.
///
/// The region is swapped wholesale on promotion. Readers hold an `Arc` to the
/// region they started with, so the old mapping is released only once the
/// last reader has moved on.
pub struct LineBuffer {
    path: PathBuf,
    charset: Option<Charset>,
    region: RwLock<Arc<Region>>,
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("path", &self.path)
            .field("charset", &self.charset)
            .field("len", &self.len())
            .field("promoted", &self.is_promoted())
            .finish()
    }
}

impl LineBuffer {
    /// Memory-maps a file.
    pub fn map(path: &Path, charset: Option<Charset>) -> Result<Self, LexError> {
        let file = File::open(path)?;
        let region = if file.metadata()?.len() == 0 {
            // Zero-length mappings are rejected on some platforms.
            Region::Heap(Box::default())
        } else {
            // SAFETY: the engine is read-only; files are not expected to be
            // truncated while a catalog is open.
            Region::Mapped(unsafe { Mmap::map(&file)? })
        };
        Ok(Self {
            path: path.to_path_buf(),
            charset,
            region: RwLock::new(Arc::new(region)),
        })
    }

    /// Wraps bytes that already live on the heap.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>, charset: Option<Charset>) -> Self {
        Self {
            path: path.into(),
            charset,
            region: RwLock::new(Arc::new(Region::Heap(bytes.into_boxed_slice()))),
        }
    }

    /// The file this buffer was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current region.
    pub fn region(&self) -> Arc<Region> {
        Arc::clone(&self.region.read())
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.region.read().bytes().len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the mapping has been replaced by a heap copy.
    pub fn is_promoted(&self) -> bool {
        self.region.read().is_heap()
    }

    /// Copies the mapped region onto the heap and swaps it in.
    /// Returns `false` if the buffer was already promoted.
    pub fn promote(&self) -> Result<bool, LexError> {
        let mut region = self.region.write();
        if region.is_heap() {
            return Ok(false);
        }
        let copy: Box<[u8]> = region.bytes().to_vec().into_boxed_slice();
        *region = Arc::new(Region::Heap(copy));
        tracing::debug!(target: "store", path = %self.path.display(), "promoted mapping to heap");
        Ok(true)
    }

    /// Decodes one line's bytes.
    pub fn decode(&self, raw: &[u8]) -> Result<String, LexError> {
        match self.charset {
            None => Ok(raw.iter().map(|&b| char::from(b)).collect()),
            Some(Charset::Utf8) => std::str::from_utf8(raw)
                .map(str::to_owned)
                .map_err(|e| LexError::misformatted(&String::from_utf8_lossy(raw), e.to_string())),
            Some(Charset::Utf8Lossy) => Ok(String::from_utf8_lossy(raw).into_owned()),
        }
    }
}

pub(crate) fn is_terminator(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// Moves `pos` back to the start of the line containing it.
pub(crate) fn rewind(bytes: &[u8], pos: usize) -> usize {
    let mut start = pos.min(bytes.len());
    // A position on the `\n` of a `\r\n` pair belongs to the line the pair ends.
    if start > 0 && bytes.get(start) == Some(&b'\n') && bytes.get(start - 1) == Some(&b'\r') {
        start -= 1;
    }
    while start > 0 {
        match bytes.get(start - 1) {
            Some(&b) if is_terminator(b) => break,
            _ => start -= 1,
        }
    }
    start
}

/// Reads the line starting at `start`.
/// Returns the line's bytes (without terminator) and the start of the next line.
pub(crate) fn read_line(bytes: &[u8], start: usize) -> Option<(&[u8], usize)> {
    if start >= bytes.len() {
        return None;
    }
    let mut end = start;
    while let Some(&b) = bytes.get(end) {
        if is_terminator(b) {
            break;
        }
        end += 1;
    }
    let next = match bytes.get(end) {
        Some(b'\r') if bytes.get(end + 1) == Some(&b'\n') => end + 2,
        Some(_) => end + 1,
        None => end,
    };
    Some((bytes.get(start..end)?, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_lines_with_mixed_terminators() {
        let bytes = b"ant\nbee\r\ncat\rdog";
        let (line, next) = read_line(bytes, 0).unwrap();
        assert_eq!((line, next), (&b"ant"[..], 4));
        let (line, next) = read_line(bytes, next).unwrap();
        assert_eq!((line, next), (&b"bee"[..], 9));
        let (line, next) = read_line(bytes, next).unwrap();
        assert_eq!((line, next), (&b"cat"[..], 13));
        let (line, next) = read_line(bytes, next).unwrap();
        assert_eq!((line, next), (&b"dog"[..], 16));
        assert!(read_line(bytes, next).is_none());
    }

    #[test]
    fn rewinds_to_line_start() {
        let bytes = b"ant\nbee\r\ncat\n";
        assert_eq!(rewind(bytes, 0), 0);
        assert_eq!(rewind(bytes, 2), 0);
        assert_eq!(rewind(bytes, 3), 0);
        assert_eq!(rewind(bytes, 5), 4);
        // On the '\r' and on the '\n' of the CRLF pair ending "bee".
        assert_eq!(rewind(bytes, 7), 4);
        assert_eq!(rewind(bytes, 8), 4);
        assert_eq!(rewind(bytes, 10), 9);
    }

    #[test]
    fn decodes_bytes_one_to_one_without_charset() {
        let buffer = LineBuffer::from_bytes("mem", vec![], None);
        assert_eq!(buffer.decode(&[0x63, 0x61, 0x66, 0xe9]).unwrap(), "caf\u{e9}");

        let strict = LineBuffer::from_bytes("mem", vec![], Some(Charset::Utf8));
        assert!(strict.decode(&[0xff, 0x41]).is_err());
        assert_eq!(strict.decode("café".as_bytes()).unwrap(), "café");

        let lossy = LineBuffer::from_bytes("mem", vec![], Some(Charset::Utf8Lossy));
        assert_eq!(lossy.decode(&[0xff, 0x41]).unwrap(), "\u{fffd}A");
    }

    #[test]
    fn promotion_swaps_region_and_keeps_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ant\nbee\n").unwrap();
        let buffer = LineBuffer::map(file.path(), None).unwrap();
        let before = buffer.region();
        assert!(!buffer.is_promoted());

        assert!(buffer.promote().unwrap());
        assert!(!buffer.promote().unwrap());
        assert!(buffer.is_promoted());

        let after = buffer.region();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.bytes(), after.bytes());
    }

    #[test]
    fn empty_files_map_to_an_empty_heap_region() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let buffer = LineBuffer::map(file.path(), None).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.is_promoted());
    }
}
