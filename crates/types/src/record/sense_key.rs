// Path: crates/types/src/record/sense_key.rs

use crate::content::Category;
use crate::error::LexError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The synset type number of an adjective satellite.
pub const SATELLITE_TYPE: u8 = 5;

/// The highest lexical id accepted when identifiers are checked strictly.
pub const MAX_STRICT_LEX_ID: u8 = 15;

/// The head word of an adjective satellite cluster, as embedded in sense keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadWord {
    /// Lemma of the first word of the head synset.
    pub lemma: String,
    /// Lexical id of that word.
    pub lex_id: u8,
}

/// A sense key: `lemma%ss_type:lex_file:lex_id:head_word:head_id`.
///
/// Satellite keys carry a [`HeadWord`]; it is `None` until the satellite's
/// head synset has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenseKey {
    /// Lowercased lemma.
    pub lemma: String,
    /// Synset type (1..=5).
    pub ss_type: u8,
    /// Lexicographer file number.
    pub lex_file: u8,
    /// Lexical id distinguishing identical lemmas within one lexicographer file.
    pub lex_id: u8,
    /// Head word, for satellites.
    pub head: Option<HeadWord>,
}

impl SenseKey {
    /// Builds an unresolved key.
    pub fn new(lemma: &str, ss_type: u8, lex_file: u8, lex_id: u8) -> Self {
        Self {
            lemma: lemma.to_lowercase(),
            ss_type,
            lex_file,
            lex_id,
            head: None,
        }
    }

    /// The category this key belongs to.
    pub fn category(&self) -> Option<Category> {
        Category::from_number(self.ss_type)
    }

    /// Whether this key names an adjective satellite.
    pub fn is_satellite(&self) -> bool {
        self.ss_type == SATELLITE_TYPE
    }

    /// Parses the textual form. With `strict`, lexical ids above 15 and head
    /// words on non-satellite keys are rejected.
    pub fn parse(s: &str, strict: bool) -> Result<Self, LexError> {
        let bad = |reason: &str| LexError::misformatted(s, reason);
        let (lemma, rest) = s.split_once('%').ok_or_else(|| bad("missing '%'"))?;
        if lemma.is_empty() {
            return Err(bad("empty lemma"));
        }
        let fields: Vec<&str> = rest.split(':').collect();
        let [ss_type, lex_file, lex_id, head_lemma, head_id] = fields.as_slice() else {
            return Err(bad("expected five ':'-separated fields"));
        };
        let ss_type: u8 = ss_type.parse().map_err(|_| bad("bad synset type"))?;
        if Category::from_number(ss_type).is_none() {
            return Err(bad("synset type out of range"));
        }
        let lex_file: u8 = lex_file.parse().map_err(|_| bad("bad lexicographer file"))?;
        let lex_id: u8 = lex_id.parse().map_err(|_| bad("bad lexical id"))?;
        if strict && lex_id > MAX_STRICT_LEX_ID {
            return Err(bad("lexical id out of strict range"));
        }
        let head = if head_lemma.is_empty() {
            None
        } else {
            if strict && ss_type != SATELLITE_TYPE {
                return Err(bad("head word on non-satellite key"));
            }
            let lex_id: u8 = head_id.parse().map_err(|_| bad("bad head id"))?;
            Some(HeadWord {
                lemma: head_lemma.to_lowercase(),
                lex_id,
            })
        };
        Ok(Self {
            lemma: lemma.to_lowercase(),
            ss_type,
            lex_file,
            lex_id,
            head,
        })
    }
}

impl fmt::Display for SenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}%{}:{:02}:{:02}:",
            self.lemma, self.ss_type, self.lex_file, self.lex_id
        )?;
        match &self.head {
            Some(head) => write!(f, "{}:{:02}", head.lemma, head.lex_id),
            None => f.write_str(":"),
        }
    }
}
