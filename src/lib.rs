//! cattree: include-graph tree builder for domain-list-community style datasets
//!
//! Layers, from inside out:
//! - [`domain`]: category registry, include parsing, tree construction
//! - [`application`]: renderers and the export service
//! - [`infrastructure`]: dataset/sink implementations and DI container
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
