// Store trait for the single published map document
use crate::domain::map_document::MapDocument;
use async_trait::async_trait;

/// Single-slot holder for the latest map. Writers replace the whole slot;
/// readers observe either the previous or the new document, never a mix.
#[async_trait]
pub trait MapDocumentStore: Send + Sync {
    async fn publish(&self, document: MapDocument) -> anyhow::Result<()>;

    /// Latest published document, `None` before the first publish.
    async fn current(&self) -> anyhow::Result<Option<MapDocument>>;
}
