//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (DatasetProvider, Sink)
//! but are themselves concrete structs, not traits.

mod export;

pub use export::{
    ArtifactNames, ExportReport, ExportService, Written, DEFAULT_HTML_ARTIFACT,
    DEFAULT_JSON_ARTIFACT,
};
