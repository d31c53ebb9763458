// Path: crates/store/src/line/comparator.rs

use lexdb_types::{ContentKind, LexError};
use std::cmp::Ordering;
use std::fmt;

/// Lines starting with this prefix are comments (license headers, version banners).
pub const COMMENT_PREFIX: &str = "  ";

/// Total order over lines plus a comment predicate.
///
/// A store's file must be sorted under its comparator. Both the probe line
/// and the search key go through [`LineComparator::compare`]; a key is just a
/// line that ends after its leading token.
pub trait LineComparator: Send + Sync + fmt::Debug {
    /// Orders two lines.
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, LexError>;

    /// Whether a line is a comment and should be skipped by search and iteration.
    fn is_comment(&self, line: &str) -> bool {
        line.starts_with(COMMENT_PREFIX)
    }
}

/// How leading tokens are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrder {
    /// Byte-wise lexical order.
    Lexical,
    /// Lexical order after ASCII lowercasing.
    CaseInsensitive,
    /// Unsigned decimal order.
    Numeric,
}

/// Compares lines by their leading space-delimited token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenComparator {
    order: TokenOrder,
}

impl TokenComparator {
    /// A comparator using `order`.
    pub const fn new(order: TokenOrder) -> Self {
        Self { order }
    }

    /// Lexical ordering.
    pub const fn lexical() -> Self {
        Self::new(TokenOrder::Lexical)
    }

    /// Numeric ordering.
    pub const fn numeric() -> Self {
        Self::new(TokenOrder::Numeric)
    }

    /// The default comparator for a content kind: numeric for primary files
    /// (keyed by byte offset), lexical otherwise.
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Primary => Self::numeric(),
            _ => Self::lexical(),
        }
    }

    /// The token order.
    pub fn order(&self) -> TokenOrder {
        self.order
    }
}

/// The leading token of a line: everything before the first space.
pub fn leading_token(line: &str) -> Result<&str, LexError> {
    match line.split(' ').next() {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(LexError::misformatted(line, "no leading token")),
    }
}

impl LineComparator for TokenComparator {
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, LexError> {
        let (ta, tb) = (leading_token(a)?, leading_token(b)?);
        match self.order {
            TokenOrder::Lexical => Ok(ta.cmp(tb)),
            TokenOrder::CaseInsensitive => Ok(ta
                .bytes()
                .map(|b| b.to_ascii_lowercase())
                .cmp(tb.bytes().map(|b| b.to_ascii_lowercase()))),
            TokenOrder::Numeric => {
                let na: u64 = ta
                    .parse()
                    .map_err(|_| LexError::misformatted(a, "leading token is not numeric"))?;
                let nb: u64 = tb
                    .parse()
                    .map_err(|_| LexError::misformatted(b, "leading token is not numeric"))?;
                Ok(na.cmp(&nb))
            }
        }
    }
}
