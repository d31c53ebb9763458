// Path: crates/types/src/record/ids.rs

use super::sense_key::SenseKey;
use crate::content::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalizes a lemma or surface form the way the text files store it:
/// trimmed, lowercased, inner spaces replaced by underscores.
pub fn normalize_lemma(lemma: &str) -> String {
    lemma
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Identifies an index record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexId {
    /// Normalized lemma.
    pub lemma: String,
    /// Category.
    pub category: Category,
}

impl IndexId {
    /// Creates an identifier, normalizing the lemma.
    pub fn new(lemma: &str, category: Category) -> Self {
        Self {
            lemma: normalize_lemma(lemma),
            category,
        }
    }
}

/// Identifies a primary record by byte offset and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimaryId {
    /// Byte offset of the record's line in its data file.
    pub offset: u32,
    /// Category.
    pub category: Category,
}

impl PrimaryId {
    /// Creates an identifier.
    pub fn new(offset: u32, category: Category) -> Self {
        Self { offset, category }
    }

    /// The zero-padded eight-digit key the record's line starts with.
    pub fn line_key(&self) -> String {
        format!("{:08}", self.offset)
    }
}

/// Identifies an exception record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExceptionId {
    /// Normalized surface form.
    pub surface: String,
    /// Category.
    pub category: Category,
}

impl ExceptionId {
    /// Creates an identifier, normalizing the surface form.
    pub fn new(surface: &str, category: Category) -> Self {
        Self {
            surface: normalize_lemma(surface),
            category,
        }
    }
}

/// Any record identifier. Identifier spaces overlap across kinds (a lemma
/// may be both an index entry and an exception), so the kind is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordId {
    /// An index record.
    Index(IndexId),
    /// A primary record.
    Primary(PrimaryId),
    /// An exception record.
    Exception(ExceptionId),
    /// A sense-entry record.
    SenseEntry(SenseKey),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(id) => write!(f, "index:{}:{}", id.category.tag(), id.lemma),
            Self::Primary(id) => write!(f, "primary:{}:{:08}", id.category.tag(), id.offset),
            Self::Exception(id) => {
                write!(f, "exception:{}:{}", id.category.tag(), id.surface)
            }
            Self::SenseEntry(key) => write!(f, "sense-entry:{key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemmas_are_normalized() {
        assert_eq!(normalize_lemma("  Domestic Dog "), "domestic_dog");
        assert_eq!(IndexId::new("Hot Dog", Category::Noun).lemma, "hot_dog");
    }

    #[test]
    fn primary_line_key_is_zero_padded() {
        assert_eq!(PrimaryId::new(1740, Category::Noun).line_key(), "00001740");
    }

    #[test]
    fn record_ids_display_with_kind() {
        let id = RecordId::Primary(PrimaryId::new(42, Category::Verb));
        assert_eq!(id.to_string(), "primary:v:00000042");
    }
}
