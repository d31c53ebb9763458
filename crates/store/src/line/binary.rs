// Path: crates/store/src/line/binary.rs

use super::buffer::{read_line, rewind, LineBuffer};
use super::comparator::LineComparator;
use super::iter::Lines;
use super::{AccessStrategy, LineStore};
use lexdb_types::{ContentType, LexError};
use std::cmp::Ordering;
use std::sync::Arc;

/// Where a key landed in a sorted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Located {
    /// A line compares equal to the key.
    Exact { start: usize },
    /// No line compares equal. `lower_bound` is the start of the first line
    /// ordering after the key; `prefix` is the last probed line that begins
    /// with the key, if any.
    Missing {
        lower_bound: usize,
        prefix: Option<usize>,
    },
}

/// The result of one search, with the number of lines probed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Search {
    pub(crate) located: Located,
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) probes: usize,
}

/// Binary search over variable-length lines.
///
/// The window `[lo, hi)` always begins and ends on line boundaries. Each
/// probe jumps to the byte midpoint, rewinds to the start of that line and
/// compares it to the key. A probe landing on a comment or blank line moves
/// forward to the next real line in the window; if there is none, the window
/// shrinks from above.
pub(crate) fn search(
    buffer: &LineBuffer,
    bytes: &[u8],
    comparator: &dyn LineComparator,
    key: &str,
) -> Result<Search, LexError> {
    let (mut lo, mut hi) = (0usize, bytes.len());
    let mut prefix = None;
    let mut probes = 0usize;

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let landed = rewind(bytes, mid).max(lo);
        let mut start = landed;
        let probe = loop {
            if start >= hi {
                break None;
            }
            let Some((raw, next)) = read_line(bytes, start) else {
                break None;
            };
            let line = buffer.decode(raw)?;
            if line.is_empty() || comparator.is_comment(&line) {
                start = next;
                continue;
            }
            break Some((line, next));
        };
        let Some((line, next)) = probe else {
            hi = landed;
            continue;
        };
        probes += 1;
        if line.starts_with(key) {
            prefix = Some(start);
        }
        match comparator.compare(&line, key)? {
            Ordering::Equal => {
                return Ok(Search {
                    located: Located::Exact { start },
                    probes,
                })
            }
            Ordering::Greater => hi = start,
            Ordering::Less => lo = next,
        }
    }

    Ok(Search {
        located: Located::Missing {
            lower_bound: lo,
            prefix,
        },
        probes,
    })
}

/// A line store answering lookups by binary search over a sorted file.
#[derive(Debug)]
pub struct BinarySearchStore {
    content_type: ContentType,
    buffer: Arc<LineBuffer>,
    comparator: Arc<dyn LineComparator>,
}

impl BinarySearchStore {
    /// Creates a store over `buffer`, which must be sorted under `comparator`.
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

    pub(crate) fn locate(&self, key: &str) -> Result<Search, LexError> {
        let region = self.buffer.region();
        search(&self.buffer, region.bytes(), self.comparator.as_ref(), key)
    }

    fn line_at(&self, start: usize) -> Result<Option<String>, LexError> {
        let region = self.buffer.region();
        match read_line(region.bytes(), start) {
            Some((raw, _)) => self.buffer.decode(raw).map(Some),
            None => Ok(None),
        }
    }
}

impl LineStore for BinarySearchStore {
    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::BinarySearch
    }

    fn buffer(&self) -> &Arc<LineBuffer> {
        &self.buffer
    }

    fn comparator(&self) -> &Arc<dyn LineComparator> {
        &self.comparator
    }

    fn line(&self, key: &str) -> Result<Option<String>, LexError> {
        match self.locate(key)?.located {
            Located::Exact { start }
            | Located::Missing {
                prefix: Some(start),
                ..
            } => self.line_at(start),
            Located::Missing { prefix: None, .. } => Ok(None),
        }
    }

    fn lines_from(&self, key: &str) -> Result<Lines, LexError> {
        let start = match self.locate(key)?.located {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::TokenComparator;
    use lexdb_types::Category;
    use proptest::prelude::*;

    fn store(text: &str) -> BinarySearchStore {
        BinarySearchStore::new(
            ContentType::index(Category::Noun),
            Arc::new(LineBuffer::from_bytes("mem", text.as_bytes().to_vec(), None)),
            Arc::new(TokenComparator::lexical()),
        )
    }

    #[test]
    fn finds_exact_match_on_the_first_comparison() {
        let store = store("ant\nbee\ncat\ndog\n");
        let search = store.locate("cat").unwrap();
        assert_eq!(search.located, Located::Exact { start: 8 });
        assert_eq!(search.probes, 1);
        assert_eq!(store.line("cat").unwrap().as_deref(), Some("cat"));
    }

    #[test]
    fn missing_key_reports_lower_bound() {
        let store = store("ant\nbee\ncat\ndog\n");
        let search = store.locate("cow").unwrap();
        assert_eq!(
            search.located,
            Located::Missing {
                lower_bound: 12,
                prefix: None
            }
        );
        assert_eq!(search.probes, 2);
        assert_eq!(store.line("cow").unwrap(), None);

        let rest: Vec<String> = store.lines_from("cow").unwrap().map(Result::unwrap).collect();
        assert_eq!(rest, vec!["dog"]);
    }

    #[test]
    fn prefix_line_answers_when_no_exact_match() {
        let store = store("ant 1\ndog 2\ndogma 3\nzebra 4\n");
        // "do" has no exact line; the probed line beginning with "do" is returned.
        let line = store.line("do").unwrap().unwrap();
        assert!(line.starts_with("do"));
        assert_eq!(store.line("dog").unwrap().as_deref(), Some("dog 2"));
    }

    #[test]
    fn skips_header_comments_and_handles_crlf() {
        let store = store("  1 license text\r\n  2 more\r\nant x\r\nbee y\r\ncat z\r\n");
        assert_eq!(store.line("ant").unwrap().as_deref(), Some("ant x"));
        assert_eq!(store.line("bee").unwrap().as_deref(), Some("bee y"));
        assert_eq!(store.line("cat").unwrap().as_deref(), Some("cat z"));
        assert_eq!(store.line("aardvark").unwrap(), None);
        let header = store.header().unwrap();
        assert_eq!(header, vec!["  1 license text", "  2 more"]);
    }

    #[test]
    fn lines_from_start_and_end() {
        let store = store("bee\ncat\n");
        let all: Vec<String> = store.lines_from("ant").unwrap().map(Result::unwrap).collect();
        assert_eq!(all, vec!["bee", "cat"]);
        assert!(!store.lines_from("zebra").unwrap().has_next());
        assert!(store.line("x").unwrap().is_none());
        assert!(self::store("").line("x").unwrap().is_none());
    }

    proptest! {
        #[test]
        fn present_keys_are_found_within_the_logarithmic_bound(n in 1usize..300, width in 4usize..9) {
            let keys: Vec<String> = (0..n).map(|i| format!("{i:0width$}")).collect();
            let text = keys.iter().map(|k| format!("{k} gloss\n")).collect::<String>();
            let store = store(&text);
            let bound = (usize::BITS - (n - 1).leading_zeros()) as usize + 1;
            for key in &keys {
                let search = store.locate(key).unwrap();
                prop_assert!(matches!(search.located, Located::Exact { .. }), "{} not found", key);
                prop_assert!(search.probes <= bound, "{} took {} comparisons, bound {}", key, search.probes, bound);
            }
        }

        #[test]
        fn lines_from_yields_exactly_the_lines_at_or_after_the_key(
            mut words in proptest::collection::btree_set("[a-z]{1,6}", 1..40),
            key in "[a-z]{1,6}",
        ) {
            let sorted: Vec<String> = std::mem::take(&mut words).into_iter().collect();
            let text = sorted.iter().map(|w| format!("{w} payload\n")).collect::<String>();
            let store = store(&text);

            let expected: Vec<String> = sorted
                .iter()
                .filter(|w| w.as_str() >= key.as_str())
                .map(|w| format!("{w} payload"))
                .collect();
            let got: Vec<String> = store.lines_from(&key).unwrap().map(Result::unwrap).collect();
            prop_assert_eq!(got, expected);

            let hit = store.line(&key).unwrap();
            if sorted.contains(&key) {
                prop_assert_eq!(hit, Some(format!("{key} payload")));
            } else if let Some(line) = hit {
                prop_assert!(line.starts_with(&key));
            }
        }
    }
}
