//! Include directive extraction
//!
//! A rule file may pull in another category's rules with a line of the form
//! `include:<name>`. Every other line (domain entries, attributes, comments) is
//! opaque here.

use std::path::Path;

use tracing::trace;

use crate::domain::error::{DomainError, DomainResult};

/// Literal marker that starts an include directive.
pub const INCLUDE_MARKER: &str = "include:";

/// Read `path` and return its include targets in file order.
///
/// Duplicates are kept; callers decide how to treat repeated targets.
/// Bytes that are not valid UTF-8 are replaced rather than failing the file.
pub fn parse_includes(path: &Path) -> DomainResult<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|source| DomainError::FileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let includes = parse_str(&String::from_utf8_lossy(&bytes));
    trace!(path = %path.display(), count = includes.len(), "parsed includes");
    Ok(includes)
}

/// Extract include targets from in-memory file content.
pub fn parse_str(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(include_target)
        .map(str::to_string)
        .collect()
}

fn include_target(line: &str) -> Option<&str> {
    let target = line.trim().strip_prefix(INCLUDE_MARKER)?.trim();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}
