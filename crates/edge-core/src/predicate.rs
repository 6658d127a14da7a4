//! Resource hint eligibility predicates.

use std::sync::Arc;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Decides whether an asset file should receive a resource hint.
///
/// Implemented for any `Fn(&str) -> bool`, so closures can be passed directly.
pub trait HintPredicate: Send + Sync {
    /// Return `true` if `file` is eligible.
    fn accepts(&self, file: &str) -> bool;
}

impl<F> HintPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, file: &str) -> bool {
        self(file)
    }
}

/// Predicate used when none is configured.
pub fn accept_all() -> Arc<dyn HintPredicate> {
    Arc::new(|_: &str| true)
}

/// Glob-based filter definition as it appears in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilterConfig {
    /// Patterns a file must match (empty = every file).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Patterns that always reject a file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl AssetFilterConfig {
    /// Check whether the filter accepts everything.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Compile the patterns into a predicate.
    pub fn compile(&self) -> Result<AssetFilter, ConfigError> {
        Ok(AssetFilter {
            include: compile_patterns(&self.include)?,
            exclude: compile_patterns(&self.exclude)?,
        })
    }
}

/// Compiled glob filter.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl HintPredicate for AssetFilter {
    fn accepts(&self, file: &str) -> bool {
        if self.exclude.iter().any(|p| p.matches(file)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.matches(file))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw).map_err(|e| ConfigError::InvalidPattern {
                pattern: raw.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> AssetFilter {
        AssetFilterConfig {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_closure_is_predicate() {
        let pred = |f: &str| f != "vendor.js";
        assert!(pred.accepts("app.js"));
        assert!(!pred.accepts("vendor.js"));
    }

    #[test]
    fn test_accept_all() {
        let pred = accept_all();
        assert!(pred.accepts("anything.css"));
        assert!(pred.accepts(""));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let f = filter(&[], &[]);
        assert!(f.accepts("app.js"));
        assert!(AssetFilterConfig::default().is_empty());
    }

    #[test]
    fn test_include_patterns() {
        let f = filter(&["*.js"], &[]);
        assert!(f.accepts("app.js"));
        assert!(!f.accepts("app.css"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let f = filter(&["*.js"], &["vendor*"]);
        assert!(f.accepts("app.js"));
        assert!(!f.accepts("vendor.js"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = AssetFilterConfig {
            include: vec!["[".to_string()],
            exclude: Vec::new(),
        }
        .compile()
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "["));
    }
}
