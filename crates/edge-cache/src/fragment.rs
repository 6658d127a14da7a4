//! Per-page fragment cache with request coalescing.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use edge_core::{accept_all, AssetFilterConfig, ConfigError, HintPredicate, PageId, RenderOptions};
use edge_head::{ExtractRequest, HeadConfig, MetadataExtractor};
use edge_manifest::{HintGenerator, ManifestSource, StaticManifest};
use edge_observability::CacheMetrics;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::error::MetaError;
use crate::record::{compose, FragmentRecord};

/// Result of one render.
pub type RenderResult = Result<Arc<FragmentRecord>, MetaError>;

/// How a render was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Stored record returned.
    Hit,
    /// This caller started the computation.
    Miss,
    /// This caller waited on a computation started by another caller.
    Coalesced,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Coalesced => write!(f, "COALESCED"),
        }
    }
}

/// Outcome of the spawned computation, shared by every waiting caller.
#[derive(Clone)]
enum Settled {
    Done(RenderResult),
    Panicked(Arc<str>),
    Cancelled,
}

type PendingRender = Shared<BoxFuture<'static, Settled>>;

struct InFlight {
    id: u64,
    pending: PendingRender,
}

struct Inner {
    records: Cache<PageId, Arc<FragmentRecord>>,
    in_flight: Mutex<HashMap<PageId, InFlight>>,
    next_id: AtomicU64,
    extractor: Arc<dyn MetadataExtractor>,
    head: HeadConfig,
    manifest: Arc<dyn ManifestSource>,
    hints: HintGenerator,
    options: RenderOptions,
    metrics: Arc<CacheMetrics>,
}

/// LRU cache of fragment records keyed by page.
///
/// At most one computation runs per page at a time; concurrent callers for
/// the same uncached page share its result. Computations run on their own
/// Tokio task, so a caller that gives up does not cancel them.
///
/// Cloning is cheap and every clone shares the same storage.
#[derive(Clone)]
pub struct FragmentCache {
    inner: Arc<Inner>,
}

impl FragmentCache {
    /// Start building a cache around a metadata extractor.
    pub fn builder<E>(extractor: E) -> FragmentCacheBuilder
    where
        E: MetadataExtractor + 'static,
    {
        FragmentCacheBuilder::new(Arc::new(extractor))
    }

    /// Cache key for a request URL under the configured key policy.
    pub fn page_id(&self, url: &str) -> PageId {
        PageId::from_url(url, self.inner.options.key_policy)
    }

    /// Fragment record for `url`, computed on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn render(&self, url: &str) -> RenderResult {
        self.render_with_status(url).await.map(|(record, _)| record)
    }

    /// Like [`render`](Self::render), also reporting how the call was answered.
    pub async fn render_with_status(
        &self,
        url: &str,
    ) -> Result<(Arc<FragmentRecord>, CacheStatus), MetaError> {
        let page = self.page_id(url);

        if let Some(record) = self.lookup(&page) {
            return Ok((record, CacheStatus::Hit));
        }

        let (pending, status) = {
            let mut in_flight = self.inner.in_flight.lock();

            // The record may have landed while we waited for the lock.
            if let Some(record) = self.lookup(&page) {
                return Ok((record, CacheStatus::Hit));
            }

            match in_flight.entry(page.clone()) {
                Entry::Occupied(entry) => (entry.get().pending.clone(), CacheStatus::Coalesced),
                Entry::Vacant(slot) => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let pending = self.spawn(page.clone(), id);
                    slot.insert(InFlight {
                        id,
                        pending: pending.clone(),
                    });
                    (pending, CacheStatus::Miss)
                }
            }
        };

        match status {
            CacheStatus::Miss => self.inner.metrics.record_miss(),
            _ => {
                self.inner.metrics.record_coalesced();
                tracing::debug!(page = %page, "joining in-flight render");
            }
        }

        match pending.await {
            Settled::Done(result) => result.map(|record| (record, status)),
            Settled::Panicked(message) => panic::resume_unwind(Box::new(message.to_string())),
            Settled::Cancelled => Err(MetaError::Aborted { page }),
        }
    }

    /// Render, giving up after `after`.
    ///
    /// Only the wait is bounded; the computation still completes and stores
    /// its record for later callers.
    pub async fn render_timeout(&self, url: &str, after: Duration) -> RenderResult {
        self.render_with_status_timeout(url, after)
            .await
            .map(|(record, _)| record)
    }

    /// Like [`render_timeout`](Self::render_timeout), also reporting how the
    /// call was answered.
    pub async fn render_with_status_timeout(
        &self,
        url: &str,
        after: Duration,
    ) -> Result<(Arc<FragmentRecord>, CacheStatus), MetaError> {
        match tokio::time::timeout(after, self.render_with_status(url)).await {
            Ok(result) => result,
            Err(_) => {
                let page = self.page_id(url);
                tracing::warn!(page = %page, ?after, "render timed out, computation continues");
                Err(MetaError::Timeout { page, after })
            }
        }
    }

    /// Drop the stored record for `url`.
    ///
    /// A computation already in flight for the page still stores its result.
    pub fn invalidate(&self, url: &str) {
        let page = self.page_id(url);
        self.inner.records.invalidate(&page);
        tracing::debug!(page = %page, "fragment record invalidated");
    }

    /// Drop every stored record.
    pub fn invalidate_all(&self) {
        self.inner.records.invalidate_all();
        self.inner.records.run_pending_tasks();
        tracing::debug!("fragment cache cleared");
    }

    /// Whether a record is stored for `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.inner.records.contains_key(&self.page_id(url))
    }

    /// Number of stored records.
    pub fn entry_count(&self) -> u64 {
        self.inner.records.run_pending_tasks();
        self.inner.records.entry_count()
    }

    /// Options the cache was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.inner.options
    }

    /// Counters for this cache.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    fn lookup(&self, page: &PageId) -> Option<Arc<FragmentRecord>> {
        let record = self.inner.records.get(page)?;
        self.inner.metrics.record_hit();
        tracing::debug!(page = %page, "fragment cache hit");
        Some(record)
    }

    fn spawn(&self, page: PageId, id: u64) -> PendingRender {
        let inner = Arc::clone(&self.inner);
        let span = tracing::info_span!("render", page = %page);

        let handle = tokio::spawn(
            async move {
                let registration = Registration {
                    inner: Arc::clone(&inner),
                    page: page.clone(),
                    id,
                };

                let result = inner.compute(&page).await;
                if let Ok(record) = &result {
                    inner.store(page, Arc::clone(record));
                }

                // Deregister only after the record is visible.
                drop(registration);
                result
            }
            .instrument(span),
        );

        async move {
            match handle.await {
                Ok(result) => Settled::Done(result),
                Err(err) if err.is_panic() => Settled::Panicked(panic_message(err.into_panic())),
                Err(_) => Settled::Cancelled,
            }
        }
        .boxed()
        .shared()
    }
}

impl fmt::Debug for FragmentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentCache")
            .field("entries", &self.inner.records.entry_count())
            .field("in_flight", &self.inner.in_flight.lock().len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Inner {
    async fn compute(&self, page: &PageId) -> RenderResult {
        let started = Instant::now();
        let request = ExtractRequest {
            page,
            head: &self.head,
        };

        let (context, hints) = futures::join!(self.extractor.extract(request), async {
            let manifest = if self.hints.is_enabled() {
                self.manifest.load().await
            } else {
                None
            };
            self.hints.generate(manifest)
        });

        let context = match context {
            Ok(context) => context,
            Err(source) => {
                self.metrics.record_failure();
                tracing::error!(page = %page, error = %source, "metadata extraction failed");
                return Err(MetaError::Extraction {
                    page: page.clone(),
                    source: Arc::from(source),
                });
            }
        };

        let elapsed = started.elapsed();
        self.metrics.record_extraction(elapsed);

        let record = compose(context, hints);
        tracing::info!(
            page = %page,
            elapsed_us = elapsed.as_micros() as u64,
            head_bytes = record.head().len(),
            hint_bytes = record.resource_hints().len(),
            "fragment record computed"
        );
        Ok(Arc::new(record))
    }

    fn store(&self, page: PageId, record: Arc<FragmentRecord>) {
        self.records.insert(page, record);
        // Apply evictions now so capacity holds as soon as insert returns.
        self.records.run_pending_tasks();
    }
}

/// Removes the in-flight entry when the computation ends, however it ends.
struct Registration {
    inner: Arc<Inner>,
    page: PageId,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock();
        if in_flight
            .get(&self.page)
            .is_some_and(|entry| entry.id == self.id)
        {
            in_flight.remove(&self.page);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> Arc<str> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Arc::from(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Arc::from(message.as_str())
    } else {
        Arc::from("fragment computation panicked")
    }
}

/// Builder for [`FragmentCache`].
pub struct FragmentCacheBuilder {
    extractor: Arc<dyn MetadataExtractor>,
    head: HeadConfig,
    manifest: Arc<dyn ManifestSource>,
    options: RenderOptions,
    preload: Option<Arc<dyn HintPredicate>>,
    prefetch: Option<Arc<dyn HintPredicate>>,
    metrics: Option<Arc<CacheMetrics>>,
}

impl FragmentCacheBuilder {
    fn new(extractor: Arc<dyn MetadataExtractor>) -> Self {
        Self {
            extractor,
            head: HeadConfig::default(),
            manifest: Arc::new(StaticManifest::none()),
            options: RenderOptions::default(),
            preload: None,
            prefetch: None,
            metrics: None,
        }
    }

    /// Head configuration passed to every extraction.
    pub fn head(mut self, head: HeadConfig) -> Self {
        self.head = head;
        self
    }

    /// Where the client manifest comes from. Defaults to no manifest.
    pub fn manifest<M>(mut self, source: M) -> Self
    where
        M: ManifestSource + 'static,
    {
        self.manifest = Arc::new(source);
        self
    }

    /// Render and cache options.
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Preload predicate. Takes precedence over `options.preload`.
    pub fn preload(mut self, predicate: impl HintPredicate + 'static) -> Self {
        self.preload = Some(Arc::new(predicate));
        self
    }

    /// Prefetch predicate. Takes precedence over `options.prefetch`.
    pub fn prefetch(mut self, predicate: impl HintPredicate + 'static) -> Self {
        self.prefetch = Some(Arc::new(predicate));
        self
    }

    /// Share counters with the caller.
    pub fn metrics(mut self, metrics: Arc<CacheMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the options and create the cache.
    pub fn build(self) -> Result<FragmentCache, MetaError> {
        self.options.validate()?;

        let hints = HintGenerator::new()
            .enabled(self.options.resource_hints)
            .with_preload(resolve_predicate(self.preload, &self.options.preload)?)
            .with_prefetch(resolve_predicate(self.prefetch, &self.options.prefetch)?);

        let mut records = Cache::<PageId, Arc<FragmentRecord>>::builder()
            .name("fragment-records")
            .eviction_policy(EvictionPolicy::lru());
        if let Some(limit) = self.options.cache_capacity.limit() {
            records = records.max_capacity(limit);
        }

        tracing::debug!(
            capacity = ?self.options.cache_capacity.limit(),
            resource_hints = self.options.resource_hints,
            key_policy = ?self.options.key_policy,
            "fragment cache created"
        );

        Ok(FragmentCache {
            inner: Arc::new(Inner {
                records: records.build(),
                in_flight: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                extractor: self.extractor,
                head: self.head,
                manifest: self.manifest,
                hints,
                options: self.options,
                metrics: self.metrics.unwrap_or_default(),
            }),
        })
    }
}

fn resolve_predicate(
    explicit: Option<Arc<dyn HintPredicate>>,
    filter: &AssetFilterConfig,
) -> Result<Arc<dyn HintPredicate>, ConfigError> {
    match explicit {
        Some(predicate) => Ok(predicate),
        None if filter.is_empty() => Ok(accept_all()),
        None => Ok(Arc::new(filter.compile()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::CacheCapacity;
    use edge_head::StaticHeadExtractor;
    use edge_manifest::ClientManifest;

    fn cache(options: RenderOptions) -> FragmentCache {
        FragmentCache::builder(StaticHeadExtractor::new())
            .head(HeadConfig::new("Home"))
            .manifest(StaticManifest::new(ClientManifest::new(
                ["app.js", "vendor.js"],
                ["lazy.js"],
            )))
            .options(options)
            .build()
            .unwrap()
    }

    #[test]
    fn test_cache_status_display() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(CacheStatus::Coalesced.to_string(), "COALESCED");
    }

    #[test]
    fn test_zero_capacity_fails_fast() {
        let err = FragmentCache::builder(StaticHeadExtractor::new())
            .options(RenderOptions::default().with_capacity(CacheCapacity::Bounded(0)))
            .build()
            .unwrap_err();
        assert!(matches!(err, MetaError::CacheCapacityMisconfigured { capacity: 0 }));
    }

    #[test]
    fn test_bad_filter_fails_fast() {
        let mut options = RenderOptions::default();
        options.preload.exclude.push("[".to_string());
        let err = FragmentCache::builder(StaticHeadExtractor::new())
            .options(options)
            .build()
            .unwrap_err();
        assert!(matches!(err, MetaError::Config(ConfigError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_render_then_hit() {
        let cache = cache(RenderOptions::default());

        let (first, status) = cache.render_with_status("/").await.unwrap();
        assert_eq!(status, CacheStatus::Miss);
        let (second, status) = cache.render_with_status("/").await.unwrap();
        assert_eq!(status, CacheStatus::Hit);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.head().contains("<title>Home</title>"));
        assert!(first.head().contains(r#"<link rel="preload" href="/_nuxt/app.js" as="script" />"#));
    }

    #[tokio::test]
    async fn test_empty_url_is_root() {
        let cache = cache(RenderOptions::default());
        cache.render("").await.unwrap();
        assert!(cache.contains("/"));
    }

    #[tokio::test]
    async fn test_path_only_policy_shares_records() {
        let cache = cache(RenderOptions::default().with_key_policy(edge_core::KeyPolicy::PathOnly));

        cache.render("/p?page=1").await.unwrap();
        let (_, status) = cache.render_with_status("/p?page=2").await.unwrap();

        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_raw_policy_keeps_query() {
        let cache = cache(RenderOptions::default());
        cache.render("/p?page=1").await.unwrap();
        assert!(!cache.contains("/p?page=2"));
        assert!(cache.contains("/p?page=1"));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = cache(RenderOptions::default());
        cache.render("/a").await.unwrap();
        cache.render("/b").await.unwrap();

        cache.invalidate("/a");
        assert!(!cache.contains("/a"));
        assert!(cache.contains("/b"));

        cache.invalidate_all();
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_option_filters_apply() {
        let mut options = RenderOptions::default();
        options.preload.exclude.push("vendor*".to_string());
        let cache = cache(options);

        let record = cache.render("/").await.unwrap();
        assert!(record.resource_hints().contains("app.js"));
        assert!(!record.resource_hints().contains("vendor.js"));
    }

    #[tokio::test]
    async fn test_explicit_predicate_overrides_options() {
        let mut options = RenderOptions::default();
        options.prefetch.exclude.push("*".to_string());
        let cache = FragmentCache::builder(StaticHeadExtractor::new())
            .manifest(StaticManifest::new(ClientManifest::new(
                Vec::<String>::new(),
                ["lazy.js"],
            )))
            .options(options)
            .prefetch(|_: &str| true)
            .build()
            .unwrap();

        let record = cache.render("/").await.unwrap();
        assert_eq!(
            record.resource_hints(),
            r#"<link rel="prefetch" href="/_nuxt/lazy.js" />"#
        );
    }

    #[tokio::test]
    async fn test_metrics_shared() {
        let metrics = Arc::new(CacheMetrics::new());
        let cache = FragmentCache::builder(StaticHeadExtractor::new())
            .metrics(Arc::clone(&metrics))
            .build()
            .unwrap();

        cache.render("/").await.unwrap();
        cache.render("/").await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.extractions, 1);
        assert_eq!(cache.metrics().snapshot(), snapshot);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(&*panic_message(Box::new("boom")), "boom");
        assert_eq!(&*panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(&*panic_message(Box::new(7u8)), "fragment computation panicked");
    }
}
