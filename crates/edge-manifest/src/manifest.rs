//! Client bundle manifest.

use serde::Serialize;
use serde_json::Value;

/// Public path used when the manifest does not declare one.
pub const DEFAULT_PUBLIC_PATH: &str = "/_nuxt/";

/// Errors reading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client asset manifest produced by the build.
///
/// Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientManifest {
    /// Prefix prepended to every file name.
    pub public_path: String,
    /// Files needed for the first render, in load order.
    pub initial: Vec<String>,
    /// Files that may be loaded later, in declaration order.
    #[serde(rename = "async")]
    pub async_files: Vec<String>,
}

impl Default for ClientManifest {
    fn default() -> Self {
        Self {
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            initial: Vec::new(),
            async_files: Vec::new(),
        }
    }
}

impl ClientManifest {
    /// Create a manifest with the default public path.
    pub fn new<I, A>(initial: I, async_files: A) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            initial: initial.into_iter().map(Into::into).collect(),
            async_files: async_files.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the public path. An empty path falls back to the default.
    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into();
        self.public_path = if public_path.is_empty() {
            DEFAULT_PUBLIC_PATH.to_string()
        } else {
            public_path
        };
        self
    }

    /// Parse a manifest from JSON text.
    ///
    /// Only invalid JSON is an error; wrongly shaped fields are treated as empty.
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(&value))
    }

    /// Build a manifest from an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Self {
        let public_path = match value.get("publicPath") {
            Some(Value::String(p)) if !p.is_empty() => p.clone(),
            _ => DEFAULT_PUBLIC_PATH.to_string(),
        };

        Self {
            public_path,
            initial: file_list(value, "initial"),
            async_files: file_list(value, "async"),
        }
    }
}

fn file_list(manifest: &Value, field: &str) -> Vec<String> {
    match manifest.get(field) {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(file) => Some(file.clone()),
                other => {
                    tracing::warn!(field, entry = %other, "skipping non-string manifest entry");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(field, found = %json_kind(other), "manifest field is not an array, treating as empty");
            Vec::new()
        }
        None => {
            tracing::debug!(field, "manifest field missing, treating as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
