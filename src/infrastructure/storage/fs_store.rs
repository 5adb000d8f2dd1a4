//! Filesystem-backed artifact store: `<root>/<run_id>/<name>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::ArtifactStore;

/// Writes each artifact as a plain file under a per-run directory.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one run's artifacts.
    pub fn run_dir(&self, run_id: &str) -> DomainResult<PathBuf> {
        Ok(self.root.join(single_component(run_id)?))
    }

    fn artifact_path(&self, run_id: &str, name: &str) -> DomainResult<PathBuf> {
        Ok(self.run_dir(run_id)?.join(single_component(name)?))
    }
}

/// Reject names that would escape the run namespace.
fn single_component(name: &str) -> DomainResult<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(DomainError::InvalidInput(format!(
            "artifact path segment must be a plain name: {name:?}"
        ))),
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn put(&self, run_id: &str, name: &str, contents: &str) -> DomainResult<()> {
        let path = self.artifact_path(run_id, name)?;
        fs::create_dir_all(self.run_dir(run_id)?).await?;
        fs::write(&path, contents).await?;
        Ok(())
    }

    async fn get(&self, run_id: &str, name: &str) -> DomainResult<Option<String>> {
        let path = self.artifact_path(run_id, name)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_line(&self, run_id: &str, name: &str, line: &str) -> DomainResult<()> {
        let path = self.artifact_path(run_id, name)?;
        fs::create_dir_all(self.run_dir(run_id)?).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list_runs(&self) -> DomainResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    runs.push(name.to_string());
                }
            }
        }
        runs.sort();
        Ok(runs)
    }
}
