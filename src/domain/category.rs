//! Category names and nodes

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use generational_arena::Index;
use serde::Serialize;

use crate::util::path::PathExt;

/// Canonical key of a rule file: relative path, `/`-separated, extension stripped.
///
/// Compared case-sensitively; ordering is plain lexicographic byte order so that
/// rendered output is identical across platforms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive the name of a file from its path relative to the dataset root.
    pub fn from_relative_path(relative: &Path) -> Self {
        Self(relative.to_category_key())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CategoryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One category in the arena.
#[derive(Debug)]
pub struct CategoryNode {
    /// Canonical name, never changes after the registry scan
    pub name: CategoryName,
    /// File this category was discovered from
    pub source: PathBuf,
    /// Claiming parent; a back-reference only, never an ownership edge
    pub parent: Option<Index>,
    /// Included categories keyed by name, iterated in sorted order
    pub children: BTreeMap<CategoryName, Index>,
}

impl CategoryNode {
    pub fn new(name: CategoryName, source: PathBuf) -> Self {
        Self {
            name,
            source,
            parent: None,
            children: BTreeMap::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
