// Path: crates/types/src/error/mod.rs
//! Core error types for the lexdb engine.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the line stores, the catalog, the caches and the
/// materialized dictionary.
///
/// An absent record is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum LexError {
    /// The operation was attempted outside the open lifecycle window.
    #[error("object is closed")]
    ObjectClosed,
    /// A configuration mutation was attempted while the object is open.
    #[error("object is open; configuration cannot change until it is closed")]
    ObjectOpen,
    /// A line could not be tokenized by a comparator or parsed by a codec.
    #[error("misformatted line ({reason}): {line:?}")]
    MisformattedLine {
        /// The offending line, as decoded.
        line: String,
        /// What the parser expected.
        reason: String,
    },
    /// A background load observed cancellation at a phase checkpoint.
    #[error("load interrupted")]
    Interrupted,
    /// A lifecycle transition was requested from a state that forbids it.
    #[error("illegal lifecycle transition from {from} to {to}")]
    IllegalTransition {
        /// The state the object was in.
        from: &'static str,
        /// The state that was requested.
        to: &'static str,
    },
    /// A hot-swappable iterator could not relocate its last element in the snapshot.
    #[error("iterator could not resume after {0}")]
    Resync(String),
    /// A snapshot image failed framing, decompression or decoding.
    #[error("snapshot image error: {0}")]
    Snapshot(String),
    /// Configuration was invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// A background task failed or panicked.
    #[error("background task failed: {0}")]
    Background(String),
    /// An I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LexError {
    /// Shorthand for [`LexError::MisformattedLine`].
    pub fn misformatted(line: &str, reason: impl Into<String>) -> Self {
        Self::MisformattedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for LexError {
    fn code(&self) -> &'static str {
        match self {
            Self::ObjectClosed => "LEX_OBJECT_CLOSED",
            Self::ObjectOpen => "LEX_OBJECT_OPEN",
            Self::MisformattedLine { .. } => "LEX_MISFORMATTED_LINE",
            Self::Interrupted => "LEX_INTERRUPTED",
            Self::IllegalTransition { .. } => "LEX_ILLEGAL_TRANSITION",
            Self::Resync(_) => "LEX_RESYNC_FAILED",
            Self::Snapshot(_) => "LEX_SNAPSHOT_ERROR",
            Self::Config(_) => "LEX_CONFIG_ERROR",
            Self::Background(_) => "LEX_BACKGROUND_FAILED",
            Self::Io(_) => "LEX_IO_ERROR",
        }
    }
}
