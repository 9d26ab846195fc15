// Map document stores - in-memory slot and on-disk file
use crate::application::document_store::MapDocumentStore;
use crate::domain::map_document::MapDocument;
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryMapStore {
    slot: RwLock<Option<Arc<MapDocument>>>,
}

impl MemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MapDocumentStore for MemoryMapStore {
    async fn publish(&self, document: MapDocument) -> anyhow::Result<()> {
        let document = Arc::new(document);
        *self.slot.write().await = Some(document);
        Ok(())
    }

    async fn current(&self) -> anyhow::Result<Option<MapDocument>> {
        let slot = self.slot.read().await;
        Ok(slot.as_deref().cloned())
    }
}

/// Keeps the map at a well-known path. Writes land in a sibling temp file
/// that is renamed over the target, so readers never see a partial page.
#[derive(Debug, Clone)]
pub struct FileMapStore {
    path: PathBuf,
}

impl FileMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MapDocumentStore for FileMapStore {
    async fn publish(&self, document: MapDocument) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, document.as_str())
            .await
            .with_context(|| format!("failed to write {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        Ok(())
    }

    async fn current(&self) -> anyhow::Result<Option<MapDocument>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(html) => Ok(Some(MapDocument::new(html))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }
}
