//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_cache::FragmentCache;
use edge_manifest::{FileManifest, ManifestSource, StaticManifest};
use edge_observability::CacheMetrics;

use crate::config::{MetaFileConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: MetaFileConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                (MetaFileConfig::load(&path)?, Some(path))
            }
            None => match find_config(&cwd) {
                Some(path) => (MetaFileConfig::load(&path)?, Some(path)),
                None => (MetaFileConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, path)
    }

    /// Manifest path from the command line or the config file.
    pub fn manifest_path(&self, override_path: Option<&str>) -> Option<PathBuf> {
        override_path
            .or(self.config.manifest.path.as_deref())
            .map(|path| self.resolve_path(path))
    }

    /// Build a fragment cache from the loaded configuration.
    pub fn build_cache(
        &self,
        manifest_override: Option<&str>,
        metrics: Arc<CacheMetrics>,
    ) -> Result<FragmentCache> {
        let builder = FragmentCache::builder(self.config.extractor())
            .head(self.config.head.clone())
            .options(self.config.render.clone())
            .manifest(self.manifest_source(manifest_override))
            .metrics(metrics);

        builder.build().context("Invalid render configuration")
    }

    fn manifest_source(&self, manifest_override: Option<&str>) -> Arc<dyn ManifestSource> {
        match self.manifest_path(manifest_override) {
            Some(path) => {
                self.output
                    .debug(&format!("Using client manifest {}", path.display()));
                Arc::new(FileManifest::new(path))
            }
            None => {
                self.output
                    .debug("No client manifest configured, resource hints will be empty");
                Arc::new(StaticManifest::none())
            }
        }
    }
}

/// Find a config file walking up from `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}
