//! Export service
//!
//! Runs one build end to end: dataset provider → registry scan → tree builder →
//! renderers → sink. Each artifact is rendered and written independently so a
//! failure in one format does not prevent the other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::application::render::TreeRenderer;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{BuildReport, Forest, TreeBuilder};
use crate::infrastructure::traits::{DatasetProvider, Sink};

pub const DEFAULT_JSON_ARTIFACT: &str = "domain_tree.json";
pub const DEFAULT_HTML_ARTIFACT: &str = "domain_tree.html";

/// File names the two artifacts are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub json: String,
    pub html: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            json: DEFAULT_JSON_ARTIFACT.to_string(),
            html: DEFAULT_HTML_ARTIFACT.to_string(),
        }
    }
}

/// A written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub location: String,
    pub bytes: usize,
}

/// Outcome of an export: the build succeeded, each artifact may have failed on its own.
#[derive(Debug)]
pub struct ExportReport {
    pub categories: usize,
    pub roots: usize,
    pub depth: usize,
    pub diagnostics: BuildReport,
    pub json: ApplicationResult<Written>,
    pub html: ApplicationResult<Written>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.json.is_ok() && self.html.is_ok()
    }
}

/// Service producing the JSON and HTML artifacts for a dataset.
pub struct ExportService {
    provider: Arc<dyn DatasetProvider>,
    sink: Arc<dyn Sink>,
    builder: TreeBuilder,
    renderer: TreeRenderer,
    artifacts: ArtifactNames,
}

impl ExportService {
    pub fn new(
        provider: Arc<dyn DatasetProvider>,
        sink: Arc<dyn Sink>,
        builder: TreeBuilder,
        renderer: TreeRenderer,
        artifacts: ArtifactNames,
    ) -> Self {
        Self {
            provider,
            sink,
            builder,
            renderer,
            artifacts,
        }
    }

    /// Prepare the dataset and build its forest. Fails only if the dataset
    /// root cannot be scanned.
    #[instrument(level = "debug", skip(self))]
    pub fn build_forest(&self) -> ApplicationResult<Forest> {
        let root = self
            .provider
            .prepare()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "prepare dataset".to_string(),
                source: Box::new(e),
            })?;
        debug!(root = %root.display(), "dataset ready");

        let forest = self.builder.build_from_directory(&root)?;
        let report = forest.report();
        if !report.is_clean() {
            info!(
                dangling = report.dangling.len(),
                unreadable = report.unreadable.len(),
                reassigned = report.reassigned.len(),
                cycles = report.cycles.len(),
                "build finished with diagnostics"
            );
        }
        Ok(forest)
    }

    pub fn render_json(&self, forest: &Forest) -> ApplicationResult<Vec<u8>> {
        self.renderer.to_structured_document(forest).to_json_bytes()
    }

    pub fn render_html(
        &self,
        forest: &Forest,
        generated_at: DateTime<Utc>,
    ) -> ApplicationResult<Vec<u8>> {
        self.renderer
            .to_annotated_markup(forest, generated_at)
            .map(String::into_bytes)
    }

    /// Build once, then render and write both artifacts independently.
    #[instrument(level = "debug", skip(self))]
    pub fn export(&self, generated_at: DateTime<Utc>) -> ApplicationResult<ExportReport> {
        let forest = self.build_forest()?;

        let json = self
            .render_json(&forest)
            .and_then(|bytes| self.write(&self.artifacts.json, &bytes));
        let html = self
            .render_html(&forest, generated_at)
            .and_then(|bytes| self.write(&self.artifacts.html, &bytes));

        for (artifact, result) in [(&self.artifacts.json, &json), (&self.artifacts.html, &html)] {
            if let Err(e) = result {
                warn!(artifact = %artifact, error = %e, "artifact not written");
            }
        }

        Ok(ExportReport {
            categories: forest.category_count(),
            roots: forest.roots().count(),
            depth: forest.depth(),
            diagnostics: forest.report().clone(),
            json,
            html,
        })
    }

    fn write(&self, artifact: &str, bytes: &[u8]) -> ApplicationResult<Written> {
        self.sink.write(artifact, bytes).with_artifact(artifact)?;
        Ok(Written {
            location: self.sink.location(artifact),
            bytes: bytes.len(),
        })
    }
}

