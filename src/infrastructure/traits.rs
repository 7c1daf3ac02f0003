//! I/O boundary traits for testability
//!
//! The dataset source and the artifact destination sit behind these traits so
//! the export service can be tested with in-memory implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Supplies the directory holding the complete set of category files.
pub trait DatasetProvider: Send + Sync {
    /// Make the dataset available and return its root directory.
    ///
    /// Must return only once every category file is in place.
    fn prepare(&self) -> io::Result<PathBuf>;
}

/// Persists rendered artifacts.
pub trait Sink: Send + Sync {
    /// Store `bytes` under the artifact name (e.g. `domain_tree.json`).
    fn write(&self, artifact: &str, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location of an artifact, for reporting.
    fn location(&self, artifact: &str) -> String {
        artifact.to_string()
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Dataset that already lives in a local directory (e.g. a cloned repository's `data/`).
#[derive(Debug, Clone)]
pub struct LocalDataset {
    root: PathBuf,
}

impl LocalDataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetProvider for LocalDataset {
    fn prepare(&self) -> io::Result<PathBuf> {
        // Existence is checked by the registry scan so that a missing root
        // surfaces as DirectoryNotFound.
        Ok(self.root.clone())
    }
}

/// Writes artifacts into a directory, replacing existing files atomically.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, artifact: &str) -> PathBuf {
        self.dir.join(artifact)
    }
}

impl Sink for FileSink {
    fn write(&self, artifact: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.target(artifact);
        let parent = target.parent().unwrap_or(&self.dir);
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename, so readers never see a partial file
        let dir = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        debug!(path = %target.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }

    fn location(&self, artifact: &str) -> String {
        self.target(artifact).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_creates_directory_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let sink = FileSink::new(temp.path().join("out"));

        sink.write("tree.json", b"first").unwrap();
        sink.write("tree.json", b"second").unwrap();

        let written = std::fs::read_to_string(temp.path().join("out/tree.json")).unwrap();
        assert_eq!(written, "second");
        assert!(sink.location("tree.json").ends_with("tree.json"));
    }

    #[test]
    fn test_file_sink_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let sink = FileSink::new(&blocker);
        assert!(sink.write("tree.json", b"{}").is_err());
    }

    #[test]
    fn test_local_dataset_returns_root() {
        let dataset = LocalDataset::new("/srv/data");
        assert_eq!(dataset.prepare().unwrap(), PathBuf::from("/srv/data"));
    }
}
