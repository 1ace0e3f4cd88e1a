//! Build command - compiles the site in every language

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use glossa_generator::Builder;

use super::load_config;

/// Run the build command.
///
/// `output` overrides `build.output_dir`; `prod` enables production stages.
pub fn run(config_path: &Path, output: Option<&Path>, prod: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, prod, "Starting build");

    let (mut config, root) = load_config(config_path)?;
    if prod {
        config.build.production = true;
    }
    tracing::debug!(?config, "Loaded configuration");

    let mut builder = Builder::new(config, &root);
    if let Some(dir) = output {
        builder = builder.with_output_dir(dir);
    }
    let output_dir = builder.output_dir().to_path_buf();

    let stats = builder.build().wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Languages:    {}", stats.languages);
    println!("  Pages:        {}", stats.pages);
    println!("  Untranslated: {}", stats.untranslated);
    println!("  Assets:       {}", stats.assets);
    println!("  Stages:       {}", stats.stages);
    println!();
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    println!("  Output:       {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
