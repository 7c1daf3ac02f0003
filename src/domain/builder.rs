//! Tree builder turning a flat category registry into a forest.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::domain::category::CategoryName;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::forest::Forest;
use crate::domain::includes;
use crate::domain::registry::CategoryRegistry;

/// Label of the synthetic anchor above all root categories.
pub const DEFAULT_ROOT_LABEL: &str = "domain-list-community";

/// What to do when a category is included by more than one parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The parent processed later in name order claims the child.
    #[default]
    LastWriterWins,
    /// Abort the build with [`DomainError::MultipleParents`].
    Reject,
}

/// Include directive naming a category that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingInclude {
    pub category: CategoryName,
    pub target: String,
}

/// Category file that could not be read; treated as having no includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableCategory {
    pub category: CategoryName,
    pub message: String,
}

/// Child claimed by a later parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub child: CategoryName,
    pub from: CategoryName,
    pub to: CategoryName,
}

/// Include edge dropped because its target already sits above the includer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEdge {
    pub from: CategoryName,
    pub to: CategoryName,
}

/// Diagnostics collected during a build. None of these abort the build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub dangling: Vec<DanglingInclude>,
    pub unreadable: Vec<UnreadableCategory>,
    pub reassigned: Vec<Reassignment>,
    pub cycles: Vec<SkippedEdge>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
            && self.unreadable.is_empty()
            && self.reassigned.is_empty()
            && self.cycles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Per-build traversal state, handed down explicitly instead of living on the builder.
#[derive(Debug, Default)]
struct Traversal {
    states: HashMap<Index, VisitState>,
    report: BuildReport,
}

impl Traversal {
    fn is_unvisited(&self, idx: Index) -> bool {
        !self.states.contains_key(&idx)
    }

    /// Nodes on the DFS stack are exactly the current node and its ancestors.
    fn is_visiting(&self, idx: Index) -> bool {
        self.states.get(&idx) == Some(&VisitState::Visiting)
    }

    fn mark(&mut self, idx: Index, state: VisitState) {
        self.states.insert(idx, state);
    }
}

/// Pending includes of a category currently being processed.
struct Frame {
    node: Index,
    includes: std::vec::IntoIter<String>,
}

/// Wires categories under the categories that include them.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    policy: ConflictPolicy,
    root_label: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Scan `directory_path` and build its forest.
    pub fn build_from_directory(&self, directory_path: &Path) -> DomainResult<Forest> {
        let registry = CategoryRegistry::scan(directory_path)?;
        self.build(registry)
    }

    /// Process every category in name order, then anchor the un-parented ones.
    #[instrument(level = "debug", skip(self, registry), fields(categories = registry.len()))]
    pub fn build(&self, mut registry: CategoryRegistry) -> DomainResult<Forest> {
        let mut traversal = Traversal::default();

        let order: Vec<Index> = registry.indices().collect();
        for idx in order {
            self.process(idx, &mut registry, &mut traversal)?;
        }

        let roots: BTreeMap<CategoryName, Index> = registry
            .nodes()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, node)| (node.name.clone(), idx))
            .collect();
        debug!(roots = roots.len(), "forest built");

        Ok(Forest::new(
            self.root_label.clone(),
            registry,
            roots,
            traversal.report,
        ))
    }

    /// Depth-first processing with an explicit stack.
    fn process(
        &self,
        start: Index,
        registry: &mut CategoryRegistry,
        traversal: &mut Traversal,
    ) -> DomainResult<()> {
        if !traversal.is_unvisited(start) {
            return Ok(());
        }
        let mut stack = vec![Self::enter(start, registry, traversal)];

        loop {
            let (current, next) = match stack.last_mut() {
                Some(frame) => (frame.node, frame.includes.next()),
                None => break,
            };

            let Some(target_name) = next else {
                traversal.mark(current, VisitState::Visited);
                stack.pop();
                continue;
            };

            let Some(target) = registry.lookup(&target_name) else {
                let category = registry.name_of(current);
                warn!(category = %category, include = %target_name, "dangling include");
                traversal.report.dangling.push(DanglingInclude {
                    category,
                    target: target_name,
                });
                continue;
            };

            if self.wire(current, target, registry, traversal)?
                && traversal.is_unvisited(target)
            {
                stack.push(Self::enter(target, registry, traversal));
            }
        }
        Ok(())
    }

    /// Mark `idx` as visiting and load its include list.
    fn enter(idx: Index, registry: &CategoryRegistry, traversal: &mut Traversal) -> Frame {
        traversal.mark(idx, VisitState::Visiting);

        let includes = match registry.get(idx) {
            Some(node) => match includes::parse_includes(&node.source) {
                Ok(includes) => includes,
                Err(e) => {
                    warn!(category = %node.name, error = %e, "treating unreadable category as having no includes");
                    traversal.report.unreadable.push(UnreadableCategory {
                        category: node.name.clone(),
                        message: e.to_string(),
                    });
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Frame {
            node: idx,
            includes: includes.into_iter(),
        }
    }

    /// Record `child` under `parent`. Returns whether the edge exists afterwards.
    fn wire(
        &self,
        parent: Index,
        child: Index,
        registry: &mut CategoryRegistry,
        traversal: &mut Traversal,
    ) -> DomainResult<bool> {
        if parent == child {
            trace!(category = %registry.name_of(parent), "self include ignored");
            return Ok(false);
        }
        if traversal.is_visiting(child) {
            let edge = SkippedEdge {
                from: registry.name_of(parent),
                to: registry.name_of(child),
            };
            warn!(from = %edge.from, to = %edge.to, "include would close a cycle, edge skipped");
            traversal.report.cycles.push(edge);
            return Ok(false);
        }

        match registry.parent_of(child) {
            Some(previous) if previous == parent => return Ok(true),
            Some(previous) => match self.policy {
                ConflictPolicy::Reject => {
                    return Err(DomainError::MultipleParents {
                        child: registry.name_of(child),
                        first: registry.name_of(previous),
                        second: registry.name_of(parent),
                    });
                }
                ConflictPolicy::LastWriterWins => {
                    registry.detach(child);
                    let reassignment = Reassignment {
                        child: registry.name_of(child),
                        from: registry.name_of(previous),
                        to: registry.name_of(parent),
                    };
                    debug!(
                        child = %reassignment.child,
                        from = %reassignment.from,
                        to = %reassignment.to,
                        "child reassigned to later parent"
                    );
                    traversal.report.reassigned.push(reassignment);
                }
            },
            None => {}
        }

        registry.attach(parent, child);
        Ok(true)
    }
}
