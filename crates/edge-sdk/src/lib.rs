//! Public SDK for the edge document metadata composer.
//!
//! This crate re-exports all composer functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! async fn shell(cache: &FragmentCache, url: &str) -> Result<String, MetaError> {
//!     let record = cache.render(url).await?;
//!     Ok(format!(
//!         "<!DOCTYPE html><html {}><head>{}</head><body {}><div id=\"app\"></div>{}</body></html>",
//!         record.html_attrs(),
//!         record.head(),
//!         record.body_attrs(),
//!         record.body_scripts(),
//!     ))
//! }
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_head;
pub use edge_manifest;
pub use edge_observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_head::*;
    pub use edge_manifest::*;
    pub use edge_observability::*;
}
