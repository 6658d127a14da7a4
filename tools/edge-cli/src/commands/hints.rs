//! Show the resource hints a manifest produces.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_core::RenderOptions;
use edge_manifest::{ClientManifest, FileManifest, HintGenerator, ResourceHints};

use super::HintsArgs;
use crate::context::Context;

/// Run the hints command.
pub async fn run(args: HintsArgs, ctx: &Context) -> Result<()> {
    let path = ctx.manifest_path(args.manifest.as_deref()).context(
        "No client manifest configured. Pass --manifest or set [manifest].path in edge-meta.toml",
    )?;

    let manifest = FileManifest::new(&path)
        .read()
        .await
        .with_context(|| format!("Failed to load client manifest: {}", path.display()))?;
    ctx.output.debug(&format!(
        "Loaded {} initial and {} async files from {}",
        manifest.initial.len(),
        manifest.async_files.len(),
        path.display()
    ));

    if !ctx.config.render.resource_hints {
        ctx.output
            .warn("Resource hints are disabled in the configuration ([render].resource_hints = false)");
    }

    let manifest = Arc::new(manifest);
    let hints = generator(&ctx.config.render)?.generate(Some(Arc::clone(&manifest)));

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "manifest": &*manifest,
            "markup": hints.markup,
            "preloadFiles": hints.preload.to_vec(),
        }));
        return Ok(());
    }

    print_hints(ctx, &manifest, &hints);
    Ok(())
}

/// Hint generator configured from the `[render]` section.
fn generator(options: &RenderOptions) -> Result<HintGenerator> {
    let preload = options.preload.compile().context("Invalid [render.preload] filter")?;
    let prefetch = options
        .prefetch
        .compile()
        .context("Invalid [render.prefetch] filter")?;

    Ok(HintGenerator::new()
        .enabled(options.resource_hints)
        .with_preload(Arc::new(preload))
        .with_prefetch(Arc::new(prefetch)))
}

fn print_hints(ctx: &Context, manifest: &ClientManifest, hints: &ResourceHints) {
    ctx.output.header("Resource hints");
    ctx.output.kv("public path", &manifest.public_path);

    let preloaded: Vec<_> = hints.preload.iter().map(|f| f.file).collect();
    ctx.output.info(&format!(
        "Preload ({} of {} initial files):",
        preloaded.len(),
        manifest.initial.len()
    ));
    for file in &manifest.initial {
        let marker = if preloaded.contains(file) { "preload" } else { "skipped" };
        ctx.output.list_item(&format!("{} [{}]", file, marker));
    }

    ctx.output.info(&format!("Async files ({}):", manifest.async_files.len()));
    for file in &manifest.async_files {
        let prefetched = hints
            .markup
            .contains(&format!(r#"rel="prefetch" href="{}{}""#, manifest.public_path, file));
        let marker = if prefetched { "prefetch" } else { "skipped" };
        ctx.output.list_item(&format!("{} [{}]", file, marker));
    }

    ctx.output.block("Markup", &hints.markup);
}
