// Path: crates/store/src/catalog/discovery.rs

//! Binds content types to files in a source directory.

use lexdb_types::{ContentType, LexError};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Whether a lowercase filename carries the kind hint and, for categorized
/// kinds, the category hint.
fn matches_hints(content_type: ContentType, lower: &str) -> bool {
    let kind = content_type
        .kind
        .file_hints()
        .iter()
        .any(|hint| lower.contains(hint));
    let category = content_type.category.map_or(true, |category| {
        category.file_hints().iter().any(|hint| lower.contains(hint))
    });
    kind && category
}

/// Lists the regular files of `dir`, sorted by name.
fn candidates(dir: &Path) -> Result<Vec<PathBuf>, LexError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(LexError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no data files in {}", dir.display()),
        )));
    }
    files.sort();
    Ok(files)
}

/// Walks [`ContentType::all`] in order and binds each type to the first
/// remaining candidate that matches its explicit pattern (if registered) or
/// its filename hints. A bound file leaves the candidate list unless the
/// type shares its source with another.
pub(crate) fn discover(
    dir: &Path,
    patterns: &[(ContentType, Regex)],
) -> Result<Vec<(ContentType, PathBuf)>, LexError> {
    let mut candidates = candidates(dir)?;
    let mut bound = Vec::new();

    for content_type in ContentType::all() {
        let pattern = patterns
            .iter()
            .find(|(ct, _)| *ct == content_type)
            .map(|(_, re)| re);
        let pick = candidates.iter().position(|path| {
            let Some(name) = file_name(path) else {
                return false;
            };
            match pattern {
                Some(re) => re.is_match(name),
                None => matches_hints(content_type, &name.to_lowercase()),
            }
        });
        let Some(index) = pick else {
            tracing::debug!(target: "catalog", %content_type, "no file matched");
            continue;
        };
        let path = if content_type.kind.shares_source() {
            candidates.get(index).cloned()
        } else {
            Some(candidates.remove(index))
        };
        if let Some(path) = path {
            tracing::debug!(target: "catalog", %content_type, path = %path.display(), "bound content type");
            bound.push((content_type, path));
        }
    }
    Ok(bound)
}
