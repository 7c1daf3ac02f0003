use std::collections::BTreeMap;

use generational_arena::Index;
use tracing::instrument;

use crate::domain::builder::BuildReport;
use crate::domain::category::{CategoryName, CategoryNode};
use crate::domain::registry::CategoryRegistry;

/// Result of one build: every category reachable from a synthetic, unnamed
/// anchor whose direct children are the un-parented categories.
#[derive(Debug)]
pub struct Forest {
    /// Display label of the synthetic anchor; never a category
    label: String,
    registry: CategoryRegistry,
    roots: BTreeMap<CategoryName, Index>,
    report: BuildReport,
}

impl Forest {
    pub(crate) fn new(
        label: String,
        registry: CategoryRegistry,
        roots: BTreeMap<CategoryName, Index>,
        report: BuildReport,
    ) -> Self {
        Self {
            label,
            registry,
            roots,
            report,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn category_count(&self) -> usize {
        self.registry.len()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryNode> {
        self.registry.get_by_name(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&CategoryNode> {
        self.get(name)
            .and_then(|node| node.parent)
            .and_then(|idx| self.registry.get(idx))
    }

    /// Root-level categories in sorted order.
    pub fn roots(&self) -> impl Iterator<Item = &CategoryNode> + '_ {
        self.roots
            .values()
            .filter_map(move |&idx| self.registry.get(idx))
    }

    pub fn root_names(&self) -> Vec<&str> {
        self.roots.keys().map(CategoryName::as_str).collect()
    }

    /// Children of `node` in sorted order.
    pub fn children<'a>(
        &'a self,
        node: &'a CategoryNode,
    ) -> impl Iterator<Item = &'a CategoryNode> + 'a {
        node.children
            .values()
            .filter_map(move |&idx| self.registry.get(idx))
    }

    /// Depth-first pre-order walk over all categories, yielding `(depth, node)`
    /// with root-level categories at depth 0.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Number of category levels below the synthetic anchor.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Names of all categories without children, in walk order.
    pub fn leaf_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.name.as_str())
            .collect()
    }
}

pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(usize, Index)>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        // Push in reverse so that the smallest name is popped first
        let stack = forest.roots.values().rev().map(|&idx| (0, idx)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (usize, &'a CategoryNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, idx)) = self.stack.pop() {
            if let Some(node) = self.forest.registry.get(idx) {
                for &child in node.children.values().rev() {
                    self.stack.push((depth + 1, child));
                }
                return Some((depth, node));
            }
        }
        None
    }
}
