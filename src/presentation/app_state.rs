// Application state for HTTP handlers
use crate::application::credentials::CredentialVerifier;
use crate::application::document_store::MapDocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialVerifier>,
    pub documents: Arc<dyn MapDocumentStore>,
}
