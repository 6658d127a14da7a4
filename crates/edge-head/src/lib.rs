//! Document head metadata for the edge document metadata composer.
//!
//! This crate provides:
//! - `MetadataContext` - Ordered tag groups and attribute sets for one page
//! - `HeadConfig` - Application-level head configuration
//! - `MetadataExtractor` - Seam to the renderer that produces a context
//! - `StaticHeadExtractor` - Headless renderer for a `HeadConfig`

mod config;
mod context;
mod escape;
mod extractor;

pub use config::*;
pub use context::*;
pub use extractor::*;
