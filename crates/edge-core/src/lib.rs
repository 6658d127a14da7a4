//! Core types for the edge document metadata composer.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `PageId` / `KeyPolicy` - Cache identity of a requested page
//! - `HintPredicate` / `AssetFilter` - Resource hint eligibility
//! - `RenderOptions` / `CacheCapacity` - Recognized configuration options
//! - `ConfigError` - Configuration validation failures

mod config;
mod error;
mod page;
mod predicate;

pub use config::*;
pub use error::*;
pub use page::*;
pub use predicate::*;
