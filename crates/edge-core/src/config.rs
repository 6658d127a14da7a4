//! Render and cache configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::page::KeyPolicy;
use crate::predicate::AssetFilterConfig;

/// Maximum number of records held by the fragment cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum CacheCapacity {
    /// No limit.
    #[default]
    Unbounded,
    /// At most this many entries; least recently used entries are evicted.
    Bounded(u64),
}

impl CacheCapacity {
    /// Check the capacity is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Bounded(0) => Err(ConfigError::InvalidCapacity(0)),
            _ => Ok(()),
        }
    }

    /// Whether the cache grows without limit.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Entry limit, if any.
    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(*n),
        }
    }
}

impl From<Option<u64>> for CacheCapacity {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Unbounded, Self::Bounded)
    }
}

impl From<CacheCapacity> for Option<u64> {
    fn from(value: CacheCapacity) -> Self {
        value.limit()
    }
}

/// Options recognized by the metadata renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Emit preload/prefetch hints derived from the client manifest.
    #[serde(default = "default_true")]
    pub resource_hints: bool,

    /// Fragment cache capacity (omitted = unbounded).
    #[serde(default, skip_serializing_if = "CacheCapacity::is_unbounded")]
    pub cache_capacity: CacheCapacity,

    /// How request URLs map onto cache keys.
    #[serde(default)]
    pub key_policy: KeyPolicy,

    /// Which `initial` assets get a preload hint.
    #[serde(default, skip_serializing_if = "AssetFilterConfig::is_empty")]
    pub preload: AssetFilterConfig,

    /// Which `async` assets get a prefetch hint.
    #[serde(default, skip_serializing_if = "AssetFilterConfig::is_empty")]
    pub prefetch: AssetFilterConfig,
}

fn default_true() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resource_hints: true,
            cache_capacity: CacheCapacity::Unbounded,
            key_policy: KeyPolicy::Raw,
            preload: AssetFilterConfig::default(),
            prefetch: AssetFilterConfig::default(),
        }
    }
}

impl RenderOptions {
    /// Parse options from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Enable or disable resource hints.
    pub fn with_resource_hints(mut self, enabled: bool) -> Self {
        self.resource_hints = enabled;
        self
    }

    /// Set the cache capacity.
    pub fn with_capacity(mut self, capacity: CacheCapacity) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the cache key policy.
    pub fn with_key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    /// Validate every option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache_capacity.validate()?;
        self.preload.compile()?;
        self.prefetch.compile()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_default() {
        let options = RenderOptions::default();

        assert!(options.resource_hints);
        assert_eq!(options.cache_capacity, CacheCapacity::Unbounded);
        assert_eq!(options.key_policy, KeyPolicy::Raw);
        assert!(options.preload.is_empty());
    }

    #[test]
    fn test_render_options_builders() {
        let options = RenderOptions::default()
            .with_resource_hints(false)
            .with_capacity(CacheCapacity::Bounded(10))
            .with_key_policy(KeyPolicy::PathOnly);

        assert!(!options.resource_hints);
        assert_eq!(options.cache_capacity.limit(), Some(10));
        assert_eq!(options.key_policy, KeyPolicy::PathOnly);
    }

    #[test]
    fn test_parse_empty_document_uses_defaults() {
        let options = RenderOptions::from_toml_str("").unwrap();
        assert_eq!(options, RenderOptions::default());
    }

    #[test]
    fn test_parse_full_document() {
        let options = RenderOptions::from_toml_str(
            r#"
            resource_hints = false
            cache_capacity = 250
            key_policy = "path_only"

            [preload]
            exclude = ["vendor.js"]
            "#,
        )
        .unwrap();

        assert!(!options.resource_hints);
        assert_eq!(options.cache_capacity, CacheCapacity::Bounded(250));
        assert_eq!(options.key_policy, KeyPolicy::PathOnly);
        assert_eq!(options.preload.exclude, vec!["vendor.js".to_string()]);
        assert!(options.prefetch.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = RenderOptions::from_toml_str("resource_hints = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let options = RenderOptions::default().with_capacity(CacheCapacity::Bounded(0));
        assert_eq!(options.validate(), Err(ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut options = RenderOptions::default();
        options.prefetch.include.push("[".to_string());
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_capacity_option_conversion() {
        assert_eq!(CacheCapacity::from(None), CacheCapacity::Unbounded);
        assert_eq!(CacheCapacity::from(Some(3)), CacheCapacity::Bounded(3));
        assert_eq!(Option::<u64>::from(CacheCapacity::Bounded(3)), Some(3));
        assert!(CacheCapacity::Unbounded.is_unbounded());
    }

    #[test]
    fn test_capacity_json_roundtrip() {
        let json = serde_json::to_string(&CacheCapacity::Bounded(5)).unwrap();
        assert_eq!(json, "5");
        let null: CacheCapacity = serde_json::from_str("null").unwrap();
        assert_eq!(null, CacheCapacity::Unbounded);
    }
}
