//! System backend collaborator: file creation, app launch, URL opening,
//! and the client-side download fallback.
//!
//! A backend failure is a capability gap, not a transient fault — callers
//! report it with a friendly message and never retry.

use crate::error::{AssistantError, Result};
use async_trait::async_trait;

/// Operations delegated to the host system.
#[async_trait]
pub trait SystemBridge: Send + Sync {
    /// Create a file with the given content on the backend.
    async fn create_file(&self, name: &str, content: &str) -> Result<()>;

    /// Launch a local application by name.
    async fn open_application(&self, name: &str) -> Result<()>;

    /// Client-side save fallback when the backend cannot write files.
    fn download_file(&self, name: &str, content: &str);

    /// Open a URL in the user's browser.
    fn open_url(&self, url: &str);
}

/// Bridge for deployments without a system backend.
///
/// File and app operations fail (the dispatcher falls back to downloads or
/// capability messages); downloads and URL opens are logged only.
#[derive(Debug, Default)]
pub struct NoBackend;

#[async_trait]
impl SystemBridge for NoBackend {
    async fn create_file(&self, name: &str, _content: &str) -> Result<()> {
        Err(AssistantError::Backend(format!(
            "no backend available to create {name}"
        )))
    }

    async fn open_application(&self, name: &str) -> Result<()> {
        Err(AssistantError::Backend(format!(
            "no backend available to open {name}"
        )))
    }

    fn download_file(&self, name: &str, content: &str) {
        tracing::info!(name, bytes = content.len(), "download fallback");
    }

    fn open_url(&self, url: &str) {
        tracing::info!(url, "open url");
    }
}
