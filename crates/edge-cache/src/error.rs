//! Render error types.

use std::sync::Arc;
use std::time::Duration;

use edge_core::{ConfigError, PageId};
use thiserror::Error;

/// Errors surfaced by the fragment cache.
///
/// Cloneable so that every caller coalesced onto one computation receives
/// the same failure.
#[derive(Error, Debug, Clone)]
pub enum MetaError {
    /// The metadata renderer failed. Nothing was cached.
    #[error("Metadata extraction failed for {page}: {source}")]
    Extraction {
        page: PageId,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Cache capacity must be at least one entry.
    #[error("Cache capacity misconfigured: {capacity} (must be at least 1, or omitted for unbounded)")]
    CacheCapacityMisconfigured { capacity: u64 },

    /// Invalid configuration other than the capacity.
    #[error("Invalid configuration: {0}")]
    Config(#[source] ConfigError),

    /// The caller stopped waiting. The computation keeps running.
    #[error("Rendering {page} timed out after {after:?}")]
    Timeout { page: PageId, after: Duration },

    /// The computation was dropped before finishing (runtime shutdown).
    #[error("Rendering {page} was aborted")]
    Aborted { page: PageId },
}

impl MetaError {
    /// Page the error relates to, if any.
    pub fn page(&self) -> Option<&PageId> {
        match self {
            Self::Extraction { page, .. } | Self::Timeout { page, .. } | Self::Aborted { page } => {
                Some(page)
            }
            Self::CacheCapacityMisconfigured { .. } | Self::Config(_) => None,
        }
    }

    /// Check if this is an extraction failure.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Check if this is a caller-side timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<ConfigError> for MetaError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidCapacity(capacity) => Self::CacheCapacityMisconfigured { capacity },
            other => Self::Config(other),
        }
    }
}
