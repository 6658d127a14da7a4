//! Where the client manifest comes from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::manifest::{ClientManifest, ManifestError};

/// Supplies the current client manifest.
///
/// `None` means no manifest is available; resource hints are then skipped.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Load the manifest.
    async fn load(&self) -> Option<Arc<ClientManifest>>;
}

/// Manifest held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticManifest {
    manifest: Option<Arc<ClientManifest>>,
}

impl StaticManifest {
    /// Wrap a manifest.
    pub fn new(manifest: ClientManifest) -> Self {
        Self {
            manifest: Some(Arc::new(manifest)),
        }
    }

    /// A source that never has a manifest.
    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManifestSource for StaticManifest {
    async fn load(&self) -> Option<Arc<ClientManifest>> {
        self.manifest.clone()
    }
}

/// Manifest read from the build output on every load.
///
/// Rebuilt manifests are picked up without restarting.
#[derive(Debug, Clone)]
pub struct FileManifest {
    path: PathBuf,
}

impl FileManifest {
    /// Read the manifest at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the manifest, reporting failures.
    pub async fn read(&self) -> Result<ClientManifest, ManifestError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ManifestError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        ClientManifest::from_json_str(&content)
    }
}

#[async_trait]
impl ManifestSource for FileManifest {
    async fn load(&self) -> Option<Arc<ClientManifest>> {
        match self.read().await {
            Ok(manifest) => Some(Arc::new(manifest)),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "client manifest unavailable, skipping resource hints");
                None
            }
        }
    }
}

#[async_trait]
impl<T: ManifestSource + ?Sized> ManifestSource for Arc<T> {
    async fn load(&self) -> Option<Arc<ClientManifest>> {
        (**self).load().await
    }
}
