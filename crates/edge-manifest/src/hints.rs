//! Preload and prefetch hint generation.

use std::fmt;
use std::sync::Arc;

use edge_core::{accept_all, HintPredicate};
use serde::Serialize;

use crate::manifest::ClientManifest;

/// Kind of asset a preload descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Script,
}

impl AssetType {
    /// Value of the `as` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file that receives a preload hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadFile {
    /// File name as declared in the manifest.
    pub file: String,
    /// Same as `file`; query strings are not stripped.
    pub file_without_query: String,
    /// Asset kind (only scripts are modelled).
    #[serde(rename = "asType")]
    pub as_type: AssetType,
    /// File extension, always `js`.
    pub extension: &'static str,
}

impl PreloadFile {
    fn script(file: &str) -> Self {
        Self {
            file: file.to_string(),
            file_without_query: file.to_string(),
            as_type: AssetType::Script,
            extension: "js",
        }
    }
}

/// Lazily derived preload descriptors.
///
/// Holds the manifest and predicate rather than a materialized list; every
/// call to [`PreloadFiles::iter`] walks the manifest again.
#[derive(Clone, Default)]
pub struct PreloadFiles {
    source: Option<(Arc<ClientManifest>, Arc<dyn HintPredicate>)>,
}

impl PreloadFiles {
    /// A sequence that yields nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    fn new(manifest: Arc<ClientManifest>, predicate: Arc<dyn HintPredicate>) -> Self {
        Self {
            source: Some((manifest, predicate)),
        }
    }

    /// Iterate over the descriptors in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = PreloadFile> + '_ {
        self.source.iter().flat_map(|(manifest, predicate)| {
            manifest
                .initial
                .iter()
                .filter(move |file| predicate.accepts(file))
                .map(|file| PreloadFile::script(file))
        })
    }

    /// Collect the descriptors.
    pub fn to_vec(&self) -> Vec<PreloadFile> {
        self.iter().collect()
    }

    /// Whether no file would be yielded.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl fmt::Debug for PreloadFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for PreloadFiles {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

/// Output of one hint generation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceHints {
    /// Preload tags followed by prefetch tags.
    pub markup: String,
    /// Files behind the preload tags.
    pub preload: PreloadFiles,
}

impl ResourceHints {
    /// No hints at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any tag was produced.
    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }
}

/// Builds resource hint markup from a client manifest.
#[derive(Clone)]
pub struct HintGenerator {
    enabled: bool,
    preload: Arc<dyn HintPredicate>,
    prefetch: Arc<dyn HintPredicate>,
}

impl Default for HintGenerator {
    fn default() -> Self {
        Self {
            enabled: true,
            preload: accept_all(),
            prefetch: accept_all(),
        }
    }
}

impl fmt::Debug for HintGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintGenerator")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl HintGenerator {
    /// Generator that hints every file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator that never emits anything.
    pub fn disabled() -> Self {
        Self::default().enabled(false)
    }

    /// Turn hint generation on or off.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Restrict which `initial` files are preloaded.
    pub fn with_preload(mut self, predicate: Arc<dyn HintPredicate>) -> Self {
        self.preload = predicate;
        self
    }

    /// Restrict which `async` files are prefetched.
    pub fn with_prefetch(mut self, predicate: Arc<dyn HintPredicate>) -> Self {
        self.prefetch = predicate;
        self
    }

    /// Whether hints will be produced.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Produce hints for `manifest`.
    pub fn generate(&self, manifest: Option<Arc<ClientManifest>>) -> ResourceHints {
        let manifest = match manifest {
            Some(manifest) if self.enabled => manifest,
            _ => return ResourceHints::empty(),
        };

        let mut markup = String::new();
        for file in manifest.initial.iter().filter(|f| self.preload.accepts(f)) {
            markup.push_str(&format!(
                r#"<link rel="preload" href="{}{}" as="script" />"#,
                manifest.public_path, file
            ));
        }
        for file in manifest.async_files.iter().filter(|f| self.prefetch.accepts(f)) {
            markup.push_str(&format!(
                r#"<link rel="prefetch" href="{}{}" />"#,
                manifest.public_path, file
            ));
        }

        ResourceHints {
            markup,
            preload: PreloadFiles::new(manifest, self.preload.clone()),
        }
    }
}
