//! Render fragment records for URLs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use edge_cache::{CacheStatus, FragmentCache, FragmentRecord, MetaError};
use edge_core::PageId;
use edge_manifest::PreloadFile;
use edge_observability::CacheMetrics;
use serde::Serialize;

use super::RenderArgs;
use crate::context::Context;
use crate::output::{format_bytes, format_duration, status_badge};

/// One render as reported to the user.
#[derive(Debug, Serialize)]
struct RenderReport {
    url: String,
    page: PageId,
    status: CacheStatus,
    elapsed_us: u64,
    record: FragmentRecord,
    preload_files: Vec<PreloadFile>,
}

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    if args.repeat == 0 {
        bail!("--repeat must be at least 1");
    }

    let metrics = Arc::new(CacheMetrics::new());
    let cache = ctx.build_cache(args.manifest.as_deref(), Arc::clone(&metrics))?;
    let timeout = args.timeout_ms.map(Duration::from_millis);

    let mut reports = Vec::new();
    for url in &args.urls {
        let outcomes = if args.concurrent {
            futures::future::join_all((0..args.repeat).map(|_| render_once(&cache, url, timeout)))
                .await
        } else {
            let mut outcomes = Vec::with_capacity(args.repeat);
            for _ in 0..args.repeat {
                outcomes.push(render_once(&cache, url, timeout).await);
            }
            outcomes
        };

        let url_reports = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
        print_url(ctx, url, &url_reports);
        reports.extend(url_reports);
    }

    let snapshot = metrics.snapshot();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "renders": reports,
            "entries": cache.entry_count(),
            "metrics": snapshot,
        }));
    } else {
        ctx.output.header("Cache");
        ctx.output.kv("entries", &cache.entry_count().to_string());
        for line in snapshot.to_summary().lines() {
            ctx.output.list_item(line.trim());
        }
    }

    Ok(())
}

async fn render_once(
    cache: &FragmentCache,
    url: &str,
    timeout: Option<Duration>,
) -> Result<RenderReport, MetaError> {
    let started = Instant::now();
    let (record, status) = match timeout {
        Some(after) => cache.render_with_status_timeout(url, after).await?,
        None => cache.render_with_status(url).await?,
    };

    Ok(RenderReport {
        url: url.to_string(),
        page: cache.page_id(url),
        status,
        elapsed_us: started.elapsed().as_micros() as u64,
        preload_files: record.preload_files().collect(),
        record: (*record).clone(),
    })
}

fn print_url(ctx: &Context, url: &str, reports: &[RenderReport]) {
    if ctx.output.is_json() {
        return;
    }

    ctx.output.header(url);
    for (i, report) in reports.iter().enumerate() {
        ctx.output.kv(
            &format!("#{}", i + 1),
            &format!(
                "{} in {}",
                status_badge(report.status),
                format_duration(Duration::from_micros(report.elapsed_us))
            ),
        );
    }

    let Some(last) = reports.last() else {
        return;
    };
    ctx.output.debug(&format!("cache key: {}", last.page));

    for (slot, value) in last.record.template_slots() {
        ctx.output
            .block(&format!("{} ({})", slot, format_bytes(value.len() as u64)), value);
    }

    if !last.preload_files.is_empty() {
        ctx.output.info("Preload files:");
        for file in &last.preload_files {
            ctx.output
                .list_item(&format!("{} (as={}, ext={})", file.file, file.as_type, file.extension));
        }
    }
}
