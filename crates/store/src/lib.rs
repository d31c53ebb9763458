// Path: crates/store/src/lib.rs
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

//! # lexdb Store
//!
//! A read-only lexical database engine serving records from a fixed set of
//! sorted, line-oriented text files.
//!
//! ## Operating modes
//!
//! *   **Direct from disk:** [`SourceDictionary`] memory-maps one file per
//!     [`ContentType`](lexdb_types::ContentType) and answers lookups by
//!     binary search (or direct byte-offset addressing for primary records).
//!
//! *   **Cached:** [`CachingDictionary`] puts a bounded, access-ordered
//!     [`RecordCache`] in front of any other dictionary.
//!
//! *   **Memory-resident:** [`MaterializedDictionary`] walks its backing
//!     dictionary on a background thread, installs an immutable
//!     [`Snapshot`] atomically, and hands out iterators that rebase onto the
//!     snapshot mid-traversal without skipping or repeating elements.
//!     Snapshots can be exported to and imported from a compressed image.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod dictionary;
pub mod lifecycle;
pub mod line;
pub mod materialize;
pub mod task;

// Re-export primary types for consumer ergonomics
pub use cache::{CachedRecord, RecordCache};
pub use catalog::ContentCatalog;
pub use codec::{RecordCodec, WordnetCodec};
pub use dictionary::{
    build_dictionary, CachingDictionary, Dictionary, RecordIter, SourceDictionary,
};
pub use lifecycle::{Lifecycle, LifecycleState, Transition};
pub use line::{
    AccessStrategy, BinarySearchStore, DirectOffsetStore, LineBuffer, LineComparator, LineStore,
    Lines, TokenComparator, TokenOrder,
};
pub use materialize::{HotSwapIter, MaterializedDictionary, Snapshot, Table};
pub use task::CancelToken;
