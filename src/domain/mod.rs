//! Domain layer: category model and tree construction
//!
//! This layer is independent of configuration, rendering and the CLI.

pub mod builder;
pub mod category;
pub mod classify;
pub mod error;
pub mod forest;
pub mod includes;
pub mod registry;

pub use builder::{BuildReport, ConflictPolicy, TreeBuilder, DEFAULT_ROOT_LABEL};
pub use category::{CategoryName, CategoryNode};
pub use classify::{Classifier, NodeKind};
pub use error::{DomainError, DomainResult};
pub use forest::Forest;
pub use registry::CategoryRegistry;
