//! Configuration error types.

use thiserror::Error;

/// Errors raised while validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Cache capacity must be a positive number of entries.
    #[error("Invalid cache capacity: {0} (must be at least 1, or omitted for unbounded)")]
    InvalidCapacity(u64),

    /// An asset filter pattern could not be compiled.
    #[error("Invalid asset pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}
