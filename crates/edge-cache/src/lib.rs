//! Fragment composition and caching for the edge document metadata composer.
//!
//! This crate provides:
//! - `FragmentRecord` - The composed, cacheable set of document fragments
//! - `compose` - Merges a metadata context with resource hints
//! - `FragmentCache` - LRU cache of records with per-page request coalescing
//! - `MetaError` - Failures surfaced by `FragmentCache::render`
//!
//! # Example
//!
//! ```ignore
//! use edge_cache::FragmentCache;
//! use edge_core::{CacheCapacity, RenderOptions};
//! use edge_head::{HeadConfig, StaticHeadExtractor};
//! use edge_manifest::FileManifest;
//!
//! let cache = FragmentCache::builder(StaticHeadExtractor::new())
//!     .head(HeadConfig::new("Acme").with_meta("description", "Acme store"))
//!     .manifest(FileManifest::new(".nuxt/dist/client-manifest.json"))
//!     .options(RenderOptions::default().with_capacity(CacheCapacity::Bounded(500)))
//!     .build()?;
//!
//! let record = cache.render("/products/42").await?;
//! println!("<head>{}</head>", record.head());
//! ```

mod error;
mod fragment;
mod record;

pub use error::*;
pub use fragment::*;
pub use record::*;
