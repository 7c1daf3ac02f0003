//! Tests for ExportService with in-memory collaborators

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use cattree::application::render::TreeRenderer;
use cattree::application::services::{ArtifactNames, ExportService};
use cattree::application::ApplicationError;
use cattree::domain::{DomainError, TreeBuilder};
use cattree::infrastructure::traits::{DatasetProvider, FileSink, LocalDataset, Sink};

/// Sink that keeps every artifact in memory.
#[derive(Default)]
struct RecordingSink {
    written: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl RecordingSink {
    fn get(&self, artifact: &str) -> Option<Vec<u8>> {
        self.written.lock().unwrap().get(artifact).cloned()
    }
}

impl Sink for RecordingSink {
    fn write(&self, artifact: &str, bytes: &[u8]) -> io::Result<()> {
        self.written
            .lock()
            .unwrap()
            .insert(artifact.to_string(), bytes.to_vec());
        Ok(())
    }

    fn location(&self, artifact: &str) -> String {
        format!("memory://{artifact}")
    }
}

/// Sink rejecting one artifact name and recording the rest.
struct SelectiveSink {
    reject: String,
    inner: RecordingSink,
}

impl Sink for SelectiveSink {
    fn write(&self, artifact: &str, bytes: &[u8]) -> io::Result<()> {
        if artifact == self.reject {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.inner.write(artifact, bytes)
    }
}

struct BrokenProvider;

impl DatasetProvider for BrokenProvider {
    fn prepare(&self) -> io::Result<PathBuf> {
        Err(io::Error::new(io::ErrorKind::NotFound, "clone failed"))
    }
}

fn create_ads_dataset(dir: &Path) {
    std::fs::write(
        dir.join("category-ads"),
        "include:geolocation-cn\ninclude:ads-google\n",
    )
    .unwrap();
    std::fs::write(dir.join("geolocation-cn"), "").unwrap();
    std::fs::write(dir.join("ads-google"), "").unwrap();
}

fn service(provider: Arc<dyn DatasetProvider>, sink: Arc<dyn Sink>) -> ExportService {
    ExportService::new(
        provider,
        sink,
        TreeBuilder::new(),
        TreeRenderer::default(),
        ArtifactNames::default(),
    )
}

#[test]
fn given_dataset_when_exporting_then_writes_both_artifacts() {
    let temp = TempDir::new().unwrap();
    create_ads_dataset(temp.path());
    let sink = Arc::new(RecordingSink::default());
    let service = service(Arc::new(LocalDataset::new(temp.path())), sink.clone());

    let report = service.export(Utc::now()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.categories, 3);
    assert_eq!(report.roots, 1);
    assert_eq!(report.depth, 2);
    let json = report.json.as_ref().unwrap();
    assert_eq!(json.location, "memory://domain_tree.json");

    let stored = sink.get("domain_tree.json").unwrap();
    assert_eq!(stored.len(), json.bytes);
    let value: serde_json::Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(value["name"], "domain-list-community");
    assert_eq!(
        value["children"]["category-ads"]["children"]["ads-google"]["name"],
        "ads-google"
    );
    assert!(value["children"]["category-ads"]["children"]["ads-google"]
        .get("children")
        .is_none());

    let html = String::from_utf8(sink.get("domain_tree.html").unwrap()).unwrap();
    assert!(html.contains(r#"<div class="node collapsible collapsed category">"#));
}

#[test]
fn given_fixed_timestamp_when_exporting_twice_then_bytes_are_identical() {
    let temp = TempDir::new().unwrap();
    create_ads_dataset(temp.path());
    let generated_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let first = Arc::new(RecordingSink::default());
    service(Arc::new(LocalDataset::new(temp.path())), first.clone())
        .export(generated_at)
        .unwrap();
    let second = Arc::new(RecordingSink::default());
    service(Arc::new(LocalDataset::new(temp.path())), second.clone())
        .export(generated_at)
        .unwrap();

    assert_eq!(first.get("domain_tree.json"), second.get("domain_tree.json"));
    assert_eq!(first.get("domain_tree.html"), second.get("domain_tree.html"));
}

#[test]
fn given_html_write_fails_when_exporting_then_json_is_still_written() {
    let temp = TempDir::new().unwrap();
    create_ads_dataset(temp.path());
    let sink = Arc::new(SelectiveSink {
        reject: "domain_tree.html".to_string(),
        inner: RecordingSink::default(),
    });
    let service = service(Arc::new(LocalDataset::new(temp.path())), sink.clone());

    let report = service.export(Utc::now()).unwrap();

    assert!(!report.is_success());
    assert!(report.json.is_ok());
    match &report.html {
        Err(ApplicationError::SinkWrite { artifact, .. }) => {
            assert_eq!(artifact, "domain_tree.html")
        }
        other => panic!("expected SinkWrite, got {:?}", other),
    }
    assert!(sink.inner.get("domain_tree.json").is_some());
    assert!(sink.inner.get("domain_tree.html").is_none());
}

#[test]
fn given_missing_dataset_root_when_exporting_then_fails_with_directory_not_found() {
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let service = service(
        Arc::new(LocalDataset::new(temp.path().join("data"))),
        sink.clone(),
    );

    let result = service.export(Utc::now());

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DirectoryNotFound(_)))
    ));
    assert!(sink.get("domain_tree.json").is_none());
}

#[test]
fn given_failing_provider_when_building_then_operation_failed() {
    let service = service(Arc::new(BrokenProvider), Arc::new(RecordingSink::default()));

    let result = service.build_forest();

    assert!(matches!(
        result,
        Err(ApplicationError::OperationFailed { .. })
    ));
}

#[test]
fn given_custom_artifact_names_when_exporting_to_directory_then_files_exist() {
    let data = TempDir::new().unwrap();
    create_ads_dataset(data.path());
    let out = TempDir::new().unwrap();
    let service = ExportService::new(
        Arc::new(LocalDataset::new(data.path())),
        Arc::new(FileSink::new(out.path().join("site"))),
        TreeBuilder::new(),
        TreeRenderer::default(),
        ArtifactNames {
            json: "tree.json".to_string(),
            html: "index.html".to_string(),
        },
    );

    let report = service.export(Utc::now()).unwrap();

    assert!(report.is_success());
    assert!(out.path().join("site/tree.json").is_file());
    assert!(out.path().join("site/index.html").is_file());
    assert!(report.html.unwrap().location.ends_with("index.html"));
}
