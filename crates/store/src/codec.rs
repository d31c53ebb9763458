// Path: crates/store/src/codec.rs

//! Parsing of raw lines into records.
//!
//! The engine never inspects line contents beyond the leading token; every
//! other field is interpreted by a [`RecordCodec`]. [`WordnetCodec`] reads
//! the classic Princeton layout:
//!
//! | kind       | line                                                                   |
//! |------------|------------------------------------------------------------------------|
//! | index      | `lemma pos synset_cnt p_cnt [sym...] sense_cnt tagsense_cnt [offset...]` |
//! | primary    | `offset lex_file ss_type w_cnt [word lex_id...] p_cnt [ptr...] [frames] \| gloss` |
//! | exception  | `surface stem [stem...]`                                               |
//! | sense      | `sense_key offset sense_number tag_count`                              |

use lexdb_types::{
    Category, ExceptionId, ExceptionRecord, IndexId, IndexRecord, LexError, ParseOptions,
    Pointer, PrimaryId, PrimaryRecord, SenseEntryRecord, SenseKey, Word, MAX_STRICT_LEX_ID,
    SATELLITE_TYPE,
};
use std::fmt;
use std::str::{FromStr, SplitWhitespace};

/// Turns raw lines into records.
pub trait RecordCodec: Send + Sync + fmt::Debug {
    /// Parses an index line.
    fn parse_index(&self, line: &str, options: &ParseOptions) -> Result<IndexRecord, LexError>;

    /// Parses a primary line from the file bound to `category`.
    fn parse_primary(
        &self,
        line: &str,
        category: Category,
        options: &ParseOptions,
    ) -> Result<PrimaryRecord, LexError>;

    /// Parses an exception line from the file bound to `category`.
    fn parse_exception(
        &self,
        line: &str,
        category: Category,
        options: &ParseOptions,
    ) -> Result<ExceptionRecord, LexError>;

    /// Parses a sense-index line.
    fn parse_sense_entry(
        &self,
        line: &str,
        options: &ParseOptions,
    ) -> Result<SenseEntryRecord, LexError>;
}

/// The Princeton WordNet database layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordnetCodec;

struct Tokens<'a> {
    line: &'a str,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str, body: &'a str) -> Self {
        Self {
            line,
            inner: body.split_whitespace(),
        }
    }

    fn bad(&self, reason: String) -> LexError {
        LexError::misformatted(self.line, reason)
    }

    fn next(&mut self, what: &str) -> Result<&'a str, LexError> {
        match self.inner.next() {
            Some(token) => Ok(token),
            None => Err(self.bad(format!("missing {what}"))),
        }
    }

    fn number<T: FromStr>(&mut self, what: &str) -> Result<T, LexError> {
        let token = self.next(what)?;
        token
            .parse()
            .map_err(|_| self.bad(format!("bad {what} {token:?}")))
    }

    fn hex(&mut self, what: &str) -> Result<u32, LexError> {
        let token = self.next(what)?;
        u32::from_str_radix(token, 16).map_err(|_| self.bad(format!("bad {what} {token:?}")))
    }

    fn category(&mut self) -> Result<(Category, bool), LexError> {
        let token = self.next("category")?;
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(tag), None) => Category::from_tag(tag)
                .map(|category| (category, tag == 's'))
                .ok_or_else(|| self.bad(format!("unknown category {token:?}"))),
            _ => Err(self.bad(format!("unknown category {token:?}"))),
        }
    }

    fn rest(&mut self) -> Vec<String> {
        self.inner.by_ref().map(str::to_owned).collect()
    }
}

/// Removes a syntactic marker such as `(a)`, `(p)` or `(ip)` from an adjective.
fn strip_marker(lemma: &str) -> &str {
    match lemma.strip_suffix(')').and_then(|s| s.rfind('(')) {
        Some(open) if open > 0 => lemma.get(..open).unwrap_or(lemma),
        _ => lemma,
    }
}

impl RecordCodec for WordnetCodec {
    fn parse_index(&self, line: &str, _options: &ParseOptions) -> Result<IndexRecord, LexError> {
        let mut t = Tokens::new(line, line);
        let lemma = t.next("lemma")?;
        let (category, _) = t.category()?;
        let synset_count: usize = t.number("synset count")?;
        let pointer_count: usize = t.number("pointer count")?;
        let pointer_symbols = (0..pointer_count)
            .map(|_| t.next("pointer symbol").map(str::to_owned))
            .collect::<Result<Vec<_>, _>>()?;
        let _sense_count: u32 = t.number("sense count")?;
        let tagged_sense_count: u32 = t.number("tagged sense count")?;
        let offsets = (0..synset_count)
            .map(|_| t.number::<u32>("synset offset"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IndexRecord {
            id: IndexId::new(lemma, category),
            pointer_symbols,
            tagged_sense_count,
            offsets,
        })
    }

    fn parse_primary(
        &self,
        line: &str,
        category: Category,
        options: &ParseOptions,
    ) -> Result<PrimaryRecord, LexError> {
        let (body, gloss) = match line.split_once('|') {
            Some((body, gloss)) => (body, gloss.trim().to_string()),
            None => (line, String::new()),
        };
        let mut t = Tokens::new(line, body);
        let offset: u32 = t.number("offset")?;
        let lex_file: u8 = t.number("lexicographer file")?;
        let (found, satellite) = t.category()?;
        if found != category {
            return Err(t.bad(format!("{found} record in {category} file")));
        }
        let ss_type = if satellite {
            SATELLITE_TYPE
        } else {
            category.number()
        };

        let word_count = t.hex("word count")?;
        let mut words = Vec::with_capacity(word_count as usize);
        for _ in 0..word_count {
            let raw = t.next("word")?;
            let lex_token = t.next("lexical id")?;
            if options.strict_ids && lex_token.len() != 1 {
                return Err(t.bad(format!("lexical id {lex_token:?} is not one hex digit")));
            }
            let lex_id = u8::from_str_radix(lex_token, 16)
                .map_err(|_| t.bad(format!("bad lexical id {lex_token:?}")))?;
            if options.strict_ids && lex_id > MAX_STRICT_LEX_ID {
                return Err(t.bad(format!("lexical id {lex_id} out of range")));
            }
            let lemma = strip_marker(raw);
            words.push(Word {
                lemma: lemma.to_string(),
                lex_id,
                sense_key: SenseKey::new(lemma, ss_type, lex_file, lex_id),
            });
        }

        let pointer_count: usize = t.number("pointer count")?;
        let mut pointers = Vec::with_capacity(pointer_count);
        for _ in 0..pointer_count {
            let symbol = t.next("pointer symbol")?.to_string();
            let target_offset: u32 = t.number("pointer offset")?;
            let (target_category, _) = t.category()?;
            let source_target = t.next("source/target")?;
            let (source, target_word) = match (source_target.get(..2), source_target.get(2..)) {
                (Some(s), Some(w)) if source_target.len() == 4 => (
                    u8::from_str_radix(s, 16).ok(),
                    u8::from_str_radix(w, 16).ok(),
                ),
                _ => (None, None),
            };
            let (Some(source), Some(target_word)) = (source, target_word) else {
                return Err(t.bad(format!("bad source/target {source_target:?}")));
            };
            pointers.push(Pointer {
                symbol,
                target: PrimaryId::new(target_offset, target_category),
                source,
                target_word,
            });
        }

        Ok(PrimaryRecord {
            id: PrimaryId::new(offset, category),
            lex_file,
            satellite,
            words,
            pointers,
            gloss,
        })
    }

    fn parse_exception(
        &self,
        line: &str,
        category: Category,
        _options: &ParseOptions,
    ) -> Result<ExceptionRecord, LexError> {
        let mut t = Tokens::new(line, line);
        let surface = t.next("surface form")?;
        let stems = t.rest();
        if stems.is_empty() {
            return Err(t.bad("missing stem".to_string()));
        }
        Ok(ExceptionRecord {
            id: ExceptionId::new(surface, category),
            stems,
        })
    }

    fn parse_sense_entry(
        &self,
        line: &str,
        options: &ParseOptions,
    ) -> Result<SenseEntryRecord, LexError> {
        let mut t = Tokens::new(line, line);
        let key = SenseKey::parse(t.next("sense key")?, options.strict_ids)?;
        Ok(SenseEntryRecord {
            key,
            offset: t.number("offset")?,
            sense_number: t.number("sense number")?,
            tag_count: t.number("tag count")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTS: ParseOptions = ParseOptions { strict_ids: false };
    const STRICT: ParseOptions = ParseOptions { strict_ids: true };

    #[test]
    fn parses_index_line() {
        let rec = WordnetCodec
            .parse_index("dog n 2 3 @ ~ #m 2 1 02084071 10114209  ", &OPTS)
            .unwrap();
        assert_eq!(rec.id, IndexId::new("dog", Category::Noun));
        assert_eq!(rec.pointer_symbols, vec!["@", "~", "#m"]);
        assert_eq!(rec.tagged_sense_count, 1);
        assert_eq!(rec.offsets, vec![2084071, 10114209]);
    }

    #[test]
    fn parses_noun_data_line() {
        let line = "02084071 05 n 02 dog 0 domestic_dog 0 002 @ 02083346 n 0000 #m 02083863 n 0102 | a member of the genus Canis  ";
        let rec = WordnetCodec.parse_primary(line, Category::Noun, &OPTS).unwrap();
        assert_eq!(rec.id, PrimaryId::new(2084071, Category::Noun));
        assert_eq!(rec.lex_file, 5);
        assert!(!rec.satellite);
        assert_eq!(rec.words.len(), 2);
        assert_eq!(rec.words[1].sense_key.to_string(), "domestic_dog%1:05:00::");
        assert_eq!(rec.pointers[1].source, 1);
        assert_eq!(rec.pointers[1].target_word, 2);
        assert_eq!(rec.gloss, "a member of the genus Canis");
    }

    #[test]
    fn parses_satellite_and_markers() {
        let line = "00002000 00 s 02 swift(a) 0 Speedy 1 001 & 00001000 a 0000 | moving quickly";
        let rec = WordnetCodec.parse_primary(line, Category::Adjective, &OPTS).unwrap();
        assert!(rec.satellite);
        assert_eq!(rec.words[0].lemma, "swift");
        assert_eq!(rec.words[1].lemma, "Speedy");
        assert_eq!(rec.words[1].sense_key.lemma, "speedy");
        assert_eq!(rec.words[0].sense_key.ss_type, SATELLITE_TYPE);
        assert!(rec.needs_head());
        assert_eq!(rec.head_ref(), Some(PrimaryId::new(1000, Category::Adjective)));
    }

    #[test]
    fn verb_frames_are_tolerated() {
        let line = "00001740 29 v 01 breathe 0 001 @ 00002000 v 0000 01 + 02 00 | draw air";
        let rec = WordnetCodec.parse_primary(line, Category::Verb, &OPTS).unwrap();
        assert_eq!(rec.words[0].sense_key.to_string(), "breathe%2:29:00::");
        assert_eq!(rec.pointers.len(), 1);
    }

    #[test]
    fn strict_mode_rejects_wide_lexical_ids() {
        let line = "00000010 05 n 01 dog 1a 000 | x";
        assert!(WordnetCodec.parse_primary(line, Category::Noun, &OPTS).is_ok());
        assert!(matches!(
            WordnetCodec.parse_primary(line, Category::Noun, &STRICT),
            Err(LexError::MisformattedLine { .. })
        ));

        let widest = format!("00000010 05 n 01 dog {MAX_STRICT_LEX_ID:x} 000 | x");
        let rec = WordnetCodec.parse_primary(&widest, Category::Noun, &STRICT).unwrap();
        assert_eq!(rec.words[0].lex_id, MAX_STRICT_LEX_ID);
    }

    #[test]
    fn category_mismatch_is_misformatted() {
        let line = "00000010 05 v 01 run 0 000 | x";
        assert!(WordnetCodec.parse_primary(line, Category::Noun, &OPTS).is_err());
    }

    #[test]
    fn parses_exception_and_sense_lines() {
        let exc = WordnetCodec
            .parse_exception("geese goose", Category::Noun, &OPTS)
            .unwrap();
        assert_eq!(exc.id.surface, "geese");
        assert_eq!(exc.stems, vec!["goose"]);
        assert!(WordnetCodec.parse_exception("lonely", Category::Noun, &OPTS).is_err());

        let entry = WordnetCodec
            .parse_sense_entry("dog%1:05:00:: 02084071 1 42", &OPTS)
            .unwrap();
        assert_eq!(entry.offset, 2084071);
        assert_eq!(entry.tag_count, 42);
        assert_eq!(entry.primary_id(), Some(PrimaryId::new(2084071, Category::Noun)));
    }

    #[test]
    fn truncated_lines_report_the_missing_field() {
        let err = WordnetCodec.parse_index("dog n 2", &OPTS).unwrap_err();
        match err {
            LexError::MisformattedLine { reason, .. } => assert_eq!(reason, "missing pointer count"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
