//! Category registry: one arena node per rule file under the dataset root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::domain::category::{CategoryName, CategoryNode};
use crate::domain::error::{DomainError, DomainResult};

/// Arena-backed store of all categories discovered in one build.
///
/// Nodes are addressed by arena [`Index`]; the name map is ordered so that every
/// walk over the registry visits categories in lexicographic order.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    arena: Arena<CategoryNode>,
    by_name: BTreeMap<CategoryName, Index>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_name: BTreeMap::new(),
        }
    }

    /// Walk `root` recursively and register every regular file as a category.
    ///
    /// File contents are not read. Any directory entry error aborts the scan.
    #[instrument(level = "debug")]
    pub fn scan(root: &Path) -> DomainResult<Self> {
        if !root.exists() {
            return Err(DomainError::DirectoryNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(DomainError::NotADirectory(root.to_path_buf()));
        }

        let mut registry = Self::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| DomainError::DirectoryScan {
                path: e.path().unwrap_or(root).to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| DomainError::DirectoryScan {
                    path: entry.path().to_path_buf(),
                    message: e.to_string(),
                })?;
            let name = CategoryName::from_relative_path(relative);
            registry.insert(name, entry.path().to_path_buf());
        }

        debug!(root = %root.display(), categories = registry.len(), "scan complete");
        Ok(registry)
    }

    /// Register a category; an already known name keeps its first source.
    pub fn insert(&mut self, name: CategoryName, source: PathBuf) -> Index {
        if let Some(&existing) = self.by_name.get(&name) {
            warn!(
                category = %name,
                ignored = %source.display(),
                "duplicate category name, keeping first file"
            );
            return existing;
        }
        let idx = self.arena.insert(CategoryNode::new(name.clone(), source));
        self.by_name.insert(name, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<Index> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, idx: Index) -> Option<&CategoryNode> {
        self.arena.get(idx)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&CategoryNode> {
        self.lookup(name).and_then(|idx| self.get(idx))
    }

    /// Indices in sorted name order.
    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.by_name.values().copied()
    }

    /// Nodes in sorted name order.
    pub fn nodes(&self) -> impl Iterator<Item = (Index, &CategoryNode)> + '_ {
        self.by_name
            .values()
            .filter_map(move |&idx| self.arena.get(idx).map(|node| (idx, node)))
    }

    pub(crate) fn name_of(&self, idx: Index) -> CategoryName {
        self.get(idx)
            .map(|node| node.name.clone())
            .unwrap_or_else(|| CategoryName::new("<unknown>"))
    }

    pub(crate) fn parent_of(&self, idx: Index) -> Option<Index> {
        self.get(idx).and_then(|node| node.parent)
    }

    /// Make `child` a child of `parent`, overwriting its parent reference.
    pub(crate) fn attach(&mut self, parent: Index, child: Index) {
        let name = match self.arena.get_mut(child) {
            Some(node) => {
                node.parent = Some(parent);
                node.name.clone()
            }
            None => return,
        };
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.insert(name, child);
        }
    }

    /// Remove `child` from its current parent, returning the former parent.
    pub(crate) fn detach(&mut self, child: Index) -> Option<Index> {
        let (parent, name) = {
            let node = self.arena.get_mut(child)?;
            (node.parent.take()?, node.name.clone())
        };
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.remove(&name);
        }
        Some(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach_keep_both_sides_in_sync() {
        let mut registry = CategoryRegistry::new();
        let a = registry.insert("a".into(), PathBuf::from("/data/a"));
        let b = registry.insert("b".into(), PathBuf::from("/data/b"));
        let c = registry.insert("c".into(), PathBuf::from("/data/c"));

        registry.attach(a, b);
        registry.attach(b, c);
        assert_eq!(registry.parent_of(c), Some(b));
        assert_eq!(registry.parent_of(b), Some(a));

        assert_eq!(registry.detach(b), Some(a));
        assert!(registry.get(a).unwrap().children.is_empty());
        assert_eq!(registry.get(b).unwrap().parent, None);
        assert_eq!(registry.detach(b), None);
    }

    #[test]
    fn test_insert_duplicate_name_keeps_first_source() {
        let mut registry = CategoryRegistry::new();
        let first = registry.insert("apple".into(), PathBuf::from("/data/apple"));
        let second = registry.insert("apple".into(), PathBuf::from("/data/apple.txt"));

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get_by_name("apple").unwrap().source,
            PathBuf::from("/data/apple")
        );
    }

    #[test]
    fn test_indices_follow_name_order() {
        let mut registry = CategoryRegistry::new();
        registry.insert("zoom".into(), PathBuf::from("/data/zoom"));
        registry.insert("apple".into(), PathBuf::from("/data/apple"));
        let names: Vec<String> = registry
            .nodes()
            .map(|(_, node)| node.name.to_string())
            .collect();
        assert_eq!(names, vec!["apple", "zoom"]);
    }
}
