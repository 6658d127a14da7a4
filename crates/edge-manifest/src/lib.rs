//! Client asset manifest handling for the edge document metadata composer.
//!
//! This crate provides:
//! - `ClientManifest` - Build-time catalogue of initial and async bundles
//! - `ManifestSource` - Where the manifest comes from (memory, disk)
//! - `HintGenerator` - Preload/prefetch `<link>` tags for a manifest
//! - `PreloadFiles` - Lazily derived preload file descriptors

mod hints;
mod manifest;
mod source;

pub use hints::*;
pub use manifest::*;
pub use source::*;
