// Path: crates/types/src/record/mod.rs

//! Record identifiers and the lean record model moved around by the engine.
//!
//! The engine itself only ever needs two things from a record: its typed
//! identifier (for caching, snapshot tables and iterator resynchronisation)
//! and its line key (the leading token of the line it was parsed from).

mod ids;
mod sense_key;

pub use ids::{ExceptionId, IndexId, PrimaryId, RecordId};
pub use sense_key::{HeadWord, SenseKey, MAX_STRICT_LEX_ID, SATELLITE_TYPE};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common surface of every record kind the engine stores and iterates.
pub trait Record: fmt::Debug + Send + Sync + 'static {
    /// The typed identifier of this record.
    fn record_id(&self) -> RecordId;
    /// The leading token of the line this record is stored under.
    fn line_key(&self) -> String;
}

/// A data-set version marker, e.g. `3.0` or `2.1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
    /// Optional patch level.
    pub patch: Option<u16>,
}

impl Version {
    /// Creates a version without a patch level.
    pub fn new(major: u16, minor: u16) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

/// One lemma's entry in a category index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Lemma and category.
    pub id: IndexId,
    /// Pointer symbols the lemma participates in.
    pub pointer_symbols: Vec<String>,
    /// Number of senses ranked by tagged frequency.
    pub tagged_sense_count: u32,
    /// Offsets of the primary records, in sense order.
    pub offsets: Vec<u32>,
}

impl IndexRecord {
    /// Identifiers of the primary records this lemma appears in, in sense order.
    pub fn primary_ids(&self) -> impl Iterator<Item = PrimaryId> + '_ {
        self.offsets
            .iter()
            .map(move |&offset| PrimaryId::new(offset, self.id.category))
    }
}

impl Record for IndexRecord {
    fn record_id(&self) -> RecordId {
        RecordId::Index(self.id.clone())
    }
    fn line_key(&self) -> String {
        self.id.lemma.clone()
    }
}

/// A word inside a primary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Lemma as written in the record (case preserved, markers stripped).
    pub lemma: String,
    /// Lexical id.
    pub lex_id: u8,
    /// The word's sense key; satellites receive their head word in a
    /// second resolution pass.
    pub sense_key: SenseKey,
}

/// A relation from one primary record to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    /// Pointer symbol, e.g. `@` (hypernym) or `&` (similar to).
    pub symbol: String,
    /// Target record.
    pub target: PrimaryId,
    /// Source word number (0 for a semantic pointer).
    pub source: u8,
    /// Target word number (0 for a semantic pointer).
    pub target_word: u8,
}

/// The symbol that links an adjective satellite to its head.
pub const SIMILAR_TO: &str = "&";

/// A primary record (synset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRecord {
    /// Offset and category.
    pub id: PrimaryId,
    /// Lexicographer file number.
    pub lex_file: u8,
    /// Whether this is an adjective satellite.
    pub satellite: bool,
    /// Member words, in order.
    pub words: Vec<Word>,
    /// Outgoing pointers.
    pub pointers: Vec<Pointer>,
    /// Gloss text.
    pub gloss: String,
}

impl PrimaryRecord {
    /// The head synset of a satellite, reached through its similar-to pointer.
    pub fn head_ref(&self) -> Option<PrimaryId> {
        if !self.satellite {
            return None;
        }
        self.pointers
            .iter()
            .find(|p| p.symbol == SIMILAR_TO)
            .map(|p| p.target)
    }

    /// Whether any satellite word still lacks its head word.
    pub fn needs_head(&self) -> bool {
        self.satellite && self.words.iter().any(|w| w.sense_key.head.is_none())
    }

    /// Stamps the head synset's first word onto every word's sense key.
    /// Returns `false` if the head has no words.
    pub fn resolve_head(&mut self, head: &PrimaryRecord) -> bool {
        let Some(first) = head.words.first() else {
            return false;
        };
        let head_word = HeadWord {
            lemma: first.lemma.to_lowercase(),
            lex_id: first.lex_id,
        };
        for word in &mut self.words {
            word.sense_key.head = Some(head_word.clone());
        }
        true
    }
}

impl Record for PrimaryRecord {
    fn record_id(&self) -> RecordId {
        RecordId::Primary(self.id)
    }
    fn line_key(&self) -> String {
        self.id.line_key()
    }
}

/// A morphological exception: an irregular surface form and its stems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    /// Surface form and category.
    pub id: ExceptionId,
    /// Base forms.
    pub stems: Vec<String>,
}

impl Record for ExceptionRecord {
    fn record_id(&self) -> RecordId {
        RecordId::Exception(self.id.clone())
    }
    fn line_key(&self) -> String {
        self.id.surface.clone()
    }
}

/// A sense-entry line: where a sense lives and how often it was tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseEntryRecord {
    /// The sense key.
    pub key: SenseKey,
    /// Offset of the primary record holding the sense.
    pub offset: u32,
    /// Sense number within the lemma's index entry.
    pub sense_number: u32,
    /// Tagged occurrence count.
    pub tag_count: u32,
}

impl SenseEntryRecord {
    /// The primary record holding this sense.
    pub fn primary_id(&self) -> Option<PrimaryId> {
        self.key
            .category()
            .map(|category| PrimaryId::new(self.offset, category))
    }
}

impl Record for SenseEntryRecord {
    fn record_id(&self) -> RecordId {
        RecordId::SenseEntry(self.key.clone())
    }
    fn line_key(&self) -> String {
        self.key.to_string()
    }
}

/// A word sense addressed by its sense key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    /// The sense key.
    pub key: SenseKey,
    /// The primary record holding the word.
    pub primary: PrimaryId,
    /// Lemma as written in the record.
    pub lemma: String,
    /// Lexical id.
    pub lex_id: u8,
    /// One-based word number inside the primary record.
    pub number: u8,
}

impl Sense {
    /// Projects the senses of one primary record.
    pub fn from_primary(record: &PrimaryRecord) -> impl Iterator<Item = Sense> + '_ {
        record.words.iter().enumerate().map(move |(i, word)| Sense {
            key: word.sense_key.clone(),
            primary: record.id,
            lemma: word.lemma.clone(),
            lex_id: word.lex_id,
            number: u8::try_from(i + 1).unwrap_or(u8::MAX),
        })
    }
}
