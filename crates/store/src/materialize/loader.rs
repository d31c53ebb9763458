// Path: crates/store/src/materialize/loader.rs

use super::snapshot::{Snapshot, SnapshotBuilder};
use crate::dictionary::Dictionary;
use crate::task::CancelToken;
use lexdb_types::{Category, LexError};
use std::time::Instant;

/// Walks every record of `backing` into a new snapshot.
///
/// Phases run in a fixed order: index, primary and exception records per
/// category, the sense projection, then the sense entries. Cancellation
/// is checked after every category and every phase.
pub(crate) fn build_snapshot(
    backing: &dyn Dictionary,
    token: &CancelToken,
) -> Result<Snapshot, LexError> {
    let started = Instant::now();
    let mut builder = SnapshotBuilder::new(backing.version()?);

    for category in Category::ALL {
        for record in backing.index_records(category, None)? {
            builder.push_index(record?);
        }
        token.checkpoint()?;
    }
    tracing::debug!(target: "loader", "index records loaded");

    for category in Category::ALL {
        for record in backing.primary_records(category, None)? {
            builder.push_primary(record?);
        }
        token.checkpoint()?;
    }
    tracing::debug!(target: "loader", "primary records loaded");

    for category in Category::ALL {
        for record in backing.exception_records(category, None)? {
            builder.push_exception(record?);
        }
        token.checkpoint()?;
    }
    tracing::debug!(target: "loader", "exception records loaded");

    let senses = builder.project_senses();
    token.checkpoint()?;

    let mut unmatched = 0usize;
    for entry in backing.sense_entries(None)? {
        if !builder.project_sense_entry(entry?) {
            unmatched += 1;
        }
    }
    token.checkpoint()?;
    if unmatched > 0 {
        tracing::warn!(target: "loader", unmatched, "sense entries without a matching primary word");
    }

    let snapshot = builder.finish();
    tracing::info!(
        target: "loader",
        records = snapshot.record_count(),
        senses,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "snapshot built"
    );
    Ok(snapshot)
}
