//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use edge_core::RenderOptions;
use edge_head::{HeadConfig, StaticHeadExtractor};
use serde::{Deserialize, Serialize};

/// Configuration file names searched for, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["edge-meta.toml", ".edge-meta.toml", "edge-meta.json"];

/// `edge-meta` configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaFileConfig {
    /// Render and cache options.
    #[serde(default)]
    pub render: RenderOptions,

    /// Application head configuration.
    #[serde(default)]
    pub head: HeadConfig,

    /// Client manifest location.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Tag marker settings.
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl MetaFileConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Serialize in the format implied by `path`.
    pub fn to_string_for(&self, path: impl AsRef<Path>) -> Result<String> {
        if is_json(path.as_ref()) {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(toml::to_string_pretty(self)?)
        }
    }

    /// Extractor configured by the `[extractor]` section.
    pub fn extractor(&self) -> StaticHeadExtractor {
        match self.extractor.marker.as_deref() {
            None => StaticHeadExtractor::new(),
            Some("") => StaticHeadExtractor::new().without_marker(),
            Some(marker) => StaticHeadExtractor::new().with_marker(marker),
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Where the client manifest lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path to the client manifest JSON, relative to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Marker attribute settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Marker attribute name (empty string disables the marker).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

/// Generate a default edge-meta.toml config file.
pub fn generate_default_config(title: &str) -> String {
    format!(
        r#"# edge-meta configuration

[render]
resource_hints = true
# cache_capacity = 1000
key_policy = "raw"

[render.preload]
include = ["*.js"]

[render.prefetch]
exclude = []

[manifest]
path = ".nuxt/dist/client-manifest.json"

[head]
title = "{title}"
title_template = "%s"

[head.html_attrs]
lang = "en"

[[head.meta]]
charset = "utf-8"

[[head.meta]]
hid = "viewport"
name = "viewport"
content = "width=device-width, initial-scale=1"
"#,
        title = title
    )
}
