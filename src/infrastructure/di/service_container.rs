//! Service container for dependency injection
//!
//! Wires up the export service with its dependencies.

use std::sync::Arc;

use crate::application::services::ExportService;
use crate::config::Settings;
use crate::infrastructure::traits::{DatasetProvider, FileSink, LocalDataset, Sink};
use crate::infrastructure::InfraResult;

/// Container holding the application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Source of the category files
    pub provider: Arc<dyn DatasetProvider>,

    /// Destination of the rendered artifacts
    pub sink: Arc<dyn Sink>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let provider = Arc::new(LocalDataset::new(settings.data_dir.clone()));
        let sink = Arc::new(FileSink::new(settings.output_dir.clone()));
        Self::with_deps(settings, provider, sink)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        provider: Arc<dyn DatasetProvider>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            provider,
            sink,
        }
    }

    /// Build the export service from the current settings.
    ///
    /// Fails if the page template cannot be read or the render settings are invalid.
    pub fn export_service(&self) -> InfraResult<ExportService> {
        let renderer = self.settings.tree_renderer()?;
        Ok(ExportService::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.sink),
            self.settings.tree_builder(),
            renderer,
            self.settings.artifact_names(),
        ))
    }
}
