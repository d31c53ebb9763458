// Path: crates/types/src/content.rs

//! Logical content kinds and the grammatical categories that scope them.
//!
//! A [`ContentType`] is the unit a catalog binds to exactly one physical
//! file: `index.noun`, `primary.verb`, `exception.adjective`, `sense`, ...

use crate::error::LexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A grammatical category (part of speech).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Nouns.
    Noun,
    /// Verbs.
    Verb,
    /// Adjectives, including adjective satellites.
    Adjective,
    /// Adverbs.
    Adverb,
}

impl Category {
    /// All categories, in file and discovery order.
    pub const ALL: [Category; 4] = [
        Category::Noun,
        Category::Verb,
        Category::Adjective,
        Category::Adverb,
    ];

    /// The single-character tag used in index and data lines.
    pub fn tag(self) -> char {
        match self {
            Self::Noun => 'n',
            Self::Verb => 'v',
            Self::Adjective => 'a',
            Self::Adverb => 'r',
        }
    }

    /// The synset type number used in sense keys (satellites use 5).
    pub fn number(self) -> u8 {
        match self {
            Self::Noun => 1,
            Self::Verb => 2,
            Self::Adjective => 3,
            Self::Adverb => 4,
        }
    }

    /// Resolves a line tag. The satellite tag `s` maps to [`Category::Adjective`].
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag.to_ascii_lowercase() {
            'n' => Some(Self::Noun),
            'v' => Some(Self::Verb),
            'a' | 's' => Some(Self::Adjective),
            'r' => Some(Self::Adverb),
            _ => None,
        }
    }

    /// Resolves a synset type number. The satellite type 5 maps to [`Category::Adjective`].
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Noun),
            2 => Some(Self::Verb),
            3 | 5 => Some(Self::Adjective),
            4 => Some(Self::Adverb),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
        }
    }

    /// Lowercase filename fragments that identify this category during discovery.
    pub fn file_hints(self) -> &'static [&'static str] {
        match self {
            Self::Noun => &["noun"],
            Self::Verb => &["verb"],
            Self::Adjective => &["adj"],
            Self::Adverb => &["adv"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A logical record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    /// Lemma index lines, one per lemma and category.
    Index,
    /// Primary records (synsets) addressed by byte offset.
    Primary,
    /// Morphological exception lines.
    Exception,
    /// Sense lookups by sense key. Shares its file with [`ContentKind::SenseEntry`].
    Sense,
    /// Sense-entry lines keyed by sense key.
    SenseEntry,
}

impl ContentKind {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Primary => "primary",
            Self::Exception => "exception",
            Self::Sense => "sense",
            Self::SenseEntry => "sense-entry",
        }
    }

    /// Lowercase filename fragments that identify this kind during discovery.
    pub fn file_hints(self) -> &'static [&'static str] {
        match self {
            Self::Index => &["index", "idx"],
            Self::Primary => &["data", "dat"],
            Self::Exception => &["exc"],
            Self::Sense | Self::SenseEntry => &["sense"],
        }
    }

    /// Whether the kind is scoped to a grammatical category.
    pub fn has_category(self) -> bool {
        matches!(self, Self::Index | Self::Primary | Self::Exception)
    }

    /// Kinds that intentionally bind the same physical file as another kind.
    /// Discovery leaves their file in the candidate list.
    pub fn shares_source(self) -> bool {
        matches!(self, Self::Sense | Self::SenseEntry)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A content kind, optionally scoped to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentType {
    /// The record kind.
    pub kind: ContentKind,
    /// The category, for kinds that have one.
    pub category: Option<Category>,
}

impl ContentType {
    /// The sense-by-key content type.
    pub const SENSE: ContentType = ContentType {
        kind: ContentKind::Sense,
        category: None,
    };
    /// The sense-entry content type.
    pub const SENSE_ENTRY: ContentType = ContentType {
        kind: ContentKind::SenseEntry,
        category: None,
    };

    /// Index lines for one category.
    pub const fn index(category: Category) -> Self {
        Self {
            kind: ContentKind::Index,
            category: Some(category),
        }
    }

    /// Primary records for one category.
    pub const fn primary(category: Category) -> Self {
        Self {
            kind: ContentKind::Primary,
            category: Some(category),
        }
    }

    /// Exception lines for one category.
    pub const fn exception(category: Category) -> Self {
        Self {
            kind: ContentKind::Exception,
            category: Some(category),
        }
    }

    /// Every content type, in the stable order used by discovery.
    pub fn all() -> Vec<ContentType> {
        let mut all = Vec::with_capacity(14);
        for kind in [ContentKind::Index, ContentKind::Primary, ContentKind::Exception] {
            for category in Category::ALL {
                all.push(ContentType {
                    kind,
                    category: Some(category),
                });
            }
        }
        all.push(Self::SENSE);
        all.push(Self::SENSE_ENTRY);
        all
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(f, "{}.{}", self.kind, category),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for ContentType {
    type Err = LexError;

    /// Parses the [`Display`](fmt::Display) form, e.g. `index.noun` or `sense-entry`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::all()
            .into_iter()
            .find(|ct| ct.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LexError::Config(format!("unknown content type: {s}")))
    }
}
