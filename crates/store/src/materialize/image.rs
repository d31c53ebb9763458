// Path: crates/store/src/materialize/image.rs

//! Binary layout of an exported snapshot image.
//!
//! An image is a fixed 32-byte header followed by a zstd-compressed bincode
//! payload holding every table in backing order. Senses are not stored; they
//! are projected again from the primary records on import.

use super::snapshot::{Snapshot, SnapshotBuilder};
use lexdb_types::{
    ExceptionRecord, IndexRecord, LexError, PrimaryRecord, SenseEntryRecord, Version,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;

/// Magic bytes "LEXSNAP!".
pub const IMAGE_MAGIC: &[u8; 8] = b"LEXSNAP!";

/// The version of the image format.
pub const IMAGE_VERSION: u16 = 1;

/// The fixed size of the image header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Payload is zstd-compressed.
const FLAG_ZSTD: u16 = 0x0001;

const ZSTD_LEVEL: i32 = 3;

fn corrupt(reason: impl Into<String>) -> LexError {
    LexError::Snapshot(reason.into())
}

/// The header at the start of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Format version number.
    pub version: u16,
    /// Payload flags.
    pub flags: u16,
    /// Records stored in the payload.
    pub record_count: u64,
    /// Length of the payload in bytes.
    pub payload_length: u64,
}

impl ImageHeader {
    /// Serializes the header to its fixed layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let fields: [&[u8]; 6] = [
            IMAGE_MAGIC,
            &self.version.to_le_bytes(),
            &self.flags.to_le_bytes(),
            &0u32.to_le_bytes(),
            &self.record_count.to_le_bytes(),
            &self.payload_length.to_le_bytes(),
        ];
        let mut out = bytes.iter_mut();
        for byte in fields.iter().flat_map(|f| f.iter()) {
            if let Some(slot) = out.next() {
                *slot = *byte;
            }
        }
        bytes
    }

    /// Deserializes and validates a header.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Result<Self, LexError> {
        fn field<const N: usize>(bytes: &[u8], at: usize) -> Result<[u8; N], LexError> {
            bytes
                .get(at..at + N)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| corrupt("truncated header"))
        }

        if field::<8>(bytes, 0)? != *IMAGE_MAGIC {
            return Err(corrupt("invalid magic bytes"));
        }
        let version = u16::from_le_bytes(field(bytes, 8)?);
        if version != IMAGE_VERSION {
            return Err(corrupt(format!("unsupported image version {version}")));
        }
        Ok(Self {
            version,
            flags: u16::from_le_bytes(field(bytes, 10)?),
            record_count: u64::from_le_bytes(field(bytes, 16)?),
            payload_length: u64::from_le_bytes(field(bytes, 24)?),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotImage {
    version: Option<Version>,
    index: Vec<IndexRecord>,
    primary: Vec<PrimaryRecord>,
    exception: Vec<ExceptionRecord>,
    sense_entries: Vec<SenseEntryRecord>,
}

impl SnapshotImage {
    fn capture(snapshot: &Snapshot) -> Self {
        fn rows<'a, T: Clone + 'a>(
            tables: impl Iterator<Item = &'a super::snapshot::Table<T>>,
        ) -> Vec<T>
        where
            T: lexdb_types::Record,
        {
            tables
                .flat_map(|table| table.iter())
                .map(|row| T::clone(&row))
                .collect()
        }
        Self {
            version: snapshot.version(),
            index: rows(snapshot.index_tables()),
            primary: rows(snapshot.primary_tables()),
            exception: rows(snapshot.exception_tables()),
            sense_entries: rows(std::iter::once(snapshot.sense_entries())),
        }
    }

    fn record_count(&self) -> usize {
        self.index.len() + self.primary.len() + self.exception.len() + self.sense_entries.len()
    }

    fn restore(self) -> Snapshot {
        let mut builder = SnapshotBuilder::new(self.version);
        for record in self.index {
            builder.push_index(Arc::new(record));
        }
        for record in self.primary {
            builder.push_primary(Arc::new(record));
        }
        for record in self.exception {
            builder.push_exception(Arc::new(record));
        }
        builder.project_senses();
        for entry in self.sense_entries {
            builder.project_sense_entry(Arc::new(entry));
        }
        builder.finish()
    }
}

/// Writes `snapshot` as an image. Returns the number of bytes written.
pub fn write_image<W: Write>(snapshot: &Snapshot, mut out: W) -> Result<u64, LexError> {
    let image = SnapshotImage::capture(snapshot);
    let raw = bincode::serialize(&image).map_err(|e| corrupt(e.to_string()))?;
    let payload = zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)?;
    let header = ImageHeader {
        version: IMAGE_VERSION,
        flags: FLAG_ZSTD,
        record_count: image.record_count() as u64,
        payload_length: payload.len() as u64,
    };
    out.write_all(&header.to_bytes())?;
    out.write_all(&payload)?;
    out.flush()?;
    tracing::info!(
        target: "loader",
        records = header.record_count,
        bytes = HEADER_SIZE as u64 + header.payload_length,
        "snapshot exported"
    );
    Ok(HEADER_SIZE as u64 + header.payload_length)
}

/// Reads an image written by [`write_image`].
pub fn read_image<R: Read>(mut input: R) -> Result<Snapshot, LexError> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    input
        .read_exact(&mut header_bytes)
        .map_err(|e| corrupt(format!("reading header: {e}")))?;
    let header = ImageHeader::from_bytes(&header_bytes)?;
    if header.flags & FLAG_ZSTD == 0 {
        return Err(corrupt(format!("unsupported flags {:#06x}", header.flags)));
    }

    let mut payload = Vec::new();
    input
        .take(header.payload_length)
        .read_to_end(&mut payload)?;
    if payload.len() as u64 != header.payload_length {
        return Err(corrupt(format!(
            "payload truncated: {} of {} bytes",
            payload.len(),
            header.payload_length
        )));
    }

    let raw = zstd::decode_all(payload.as_slice()).map_err(|e| corrupt(e.to_string()))?;
    let image: SnapshotImage = bincode::deserialize(&raw).map_err(|e| corrupt(e.to_string()))?;
    if image.record_count() as u64 != header.record_count {
        return Err(corrupt(format!(
            "header announces {} records, payload holds {}",
            header.record_count,
            image.record_count()
        )));
    }
    let snapshot = image.restore();
    tracing::info!(target: "loader", records = snapshot.record_count(), "snapshot imported");
    Ok(snapshot)
}
