// Path: crates/types/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # lexdb Types
//!
//! Shared vocabulary for the lexdb engine: the logical content kinds a
//! lexical database is made of, the typed identifiers used to address
//! records of each kind, the lean record model the engine moves around,
//! and the error and configuration types every other crate speaks.

pub mod config;
pub mod content;
pub mod error;
pub mod record;

pub use config::{CacheConfig, Charset, LexConfig, LoadPolicy, ParseOptions};
pub use content::{Category, ContentKind, ContentType};
pub use error::{ErrorCode, LexError};
pub use record::{
    ExceptionId, ExceptionRecord, HeadWord, IndexId, IndexRecord, Pointer, PrimaryId,
    PrimaryRecord, Record, RecordId, Sense, SenseEntryRecord, SenseKey, Version, Word,
    MAX_STRICT_LEX_ID, SATELLITE_TYPE,
};
