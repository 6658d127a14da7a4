//! Observability infrastructure for the edge document metadata composer.
//!
//! This crate provides:
//! - `init_logging` - `tracing` subscriber setup (JSON or human output)
//! - `CacheMetrics` - Lock-free fragment cache counters
//! - `CacheMetricsSnapshot` - Serializable point-in-time view of the counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
