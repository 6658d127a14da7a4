//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, MetaFileConfig, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "(defaults, no config file found)"),
    }

    let text = ctx.config.to_string_for(CONFIG_FILE_NAMES[0])?;
    println!();
    println!("{}", text.trim_end());

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let title = ctx
        .cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("My App");

    fs::write(&config_path, generate_default_config(title))?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check(&ctx.config, |path| ctx.resolve_path(path).is_file());

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Collect errors and warnings for a configuration.
fn check(config: &MetaFileConfig, file_exists: impl Fn(&str) -> bool) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Err(e) = config.render.validate() {
        errors.push(format!("render: {}", e));
    }

    match config.manifest.path.as_deref() {
        Some(path) if !file_exists(path) => warnings.push(format!(
            "manifest.path '{}' does not exist yet, resource hints will be empty",
            path
        )),
        None if config.render.resource_hints => warnings.push(
            "render.resource_hints is enabled but no manifest.path is set".to_string(),
        ),
        _ => {}
    }

    if config.head.title.is_none() {
        warnings.push("head.title is not set, pages will have no <title>".to_string());
    }

    if let Some(template) = &config.head.title_template {
        if !template.contains("%s") {
            warnings.push(format!(
                "head.title_template '{}' has no %s placeholder",
                template
            ));
        }
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::CacheCapacity;

    #[test]
    fn test_default_config_has_only_manifest_warning() {
        let config: MetaFileConfig = toml::from_str(&generate_default_config("Acme")).unwrap();
        let (errors, warnings) = check(&config, |_| false);

        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("does not exist"));

        let (_, warnings) = check(&config, |_| true);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_error() {
        let mut config = MetaFileConfig::default();
        config.render.cache_capacity = CacheCapacity::Bounded(0);
        let (errors, _) = check(&config, |_| true);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Invalid cache capacity"));
    }

    #[test]
    fn test_missing_title_and_placeholder() {
        let mut config = MetaFileConfig::default();
        config.render.resource_hints = false;
        config.head.title_template = Some("Acme".to_string());

        let (errors, warnings) = check(&config, |_| true);

        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("head.title is not set")));
        assert!(warnings.iter().any(|w| w.contains("no %s placeholder")));
    }
}
